use paged_query::{Database, Model, PageRequest, PageResult, sanitizer};

#[derive(Debug, Clone, Model, PartialEq, sqlx::FromRow)]
struct Review {
    #[orm(primary_key)]
    id: i64,
    title: String,
    body: Option<String>,
    rating: i64,
}

#[tokio::test]
async fn test_sanitized_records_are_stored_encoded() -> Result<(), Box<dyn std::error::Error>> {
    let _ = env_logger::builder().is_test(true).try_init();

    let db = Database::builder().max_connections(1).connect("sqlite::memory:").await?;
    db.create_table::<Review>().await?;

    let mut review = Review {
        id: 1,
        title: "<script>alert(1)</script>".to_string(),
        body: Some("Caf\u{e9} & \"bar\"".to_string()),
        rating: 5,
    };
    sanitizer::sanitize_record(&mut review);
    db.model::<Review>().insert(&review).await?;

    let plain = Review { id: 2, title: "Quiet place".to_string(), body: None, rating: 3 };
    db.model::<Review>().insert(&plain).await?;

    let page = PageResult::build(db.model::<Review>(), &PageRequest::new(0, 10).sort("id", "asc")).await?;
    assert_eq!(page.total_count, 2);
    assert_eq!(page.data[0].title, "&lt;script&gt;alert(1)&lt;/script&gt;");
    assert_eq!(page.data[0].body.as_deref(), Some("Caf&#233; &amp; &quot;bar&quot;"));
    assert_eq!(page.data[0].rating, 5);
    assert_eq!(page.data[1], plain);

    let page = PageResult::build(db.model::<Review>(), &PageRequest::new(0, 10).filter("title", "&lt;")).await?;
    assert_eq!(page.total_count, 1);

    Ok(())
}
