//! # In-Memory Query Source
//!
//! `MemoryQuery` pages a `Vec<T>` with the same semantics as the SQL source.
//! Operations are recorded and only evaluated by `count`/`fetch`, which
//! keeps it a drop-in replacement for `QueryBuilder` in tests and for data
//! that is already loaded (caches, fixtures, API responses).
//!
//! Sorting is stable, so records with equal sort keys keep their source order
//! and repeated calls return identical pages.
//!
//! ```rust,ignore
//! use paged_query::{MemoryQuery, PageRequest, PageResult};
//!
//! let request = PageRequest::new(0, 10).filter("name", "San");
//! let page = PageResult::build(MemoryQuery::new(cities), &request).await?;
//! ```

use std::cmp::Ordering;

use async_trait::async_trait;

use crate::{
    Error,
    model::{ColumnInfo, Model, Value},
    pagination::SortOrder,
    queryable::Queryable,
};

type Predicate<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// A lazily-evaluated query over records held in memory.
pub struct MemoryQuery<T> {
    records: Vec<T>,
    predicates: Vec<Predicate<T>>,
    order: Vec<(&'static ColumnInfo, SortOrder)>,
    offset: usize,
    limit: Option<usize>,
}

impl<T: Model + Send + Sync + 'static> MemoryQuery<T> {
    /// Creates a query over `records`, in their current order.
    pub fn new(records: Vec<T>) -> Self {
        Self { records, predicates: Vec::new(), order: Vec::new(), offset: 0, limit: None }
    }

    fn matches(&self, record: &T) -> bool {
        self.predicates.iter().all(|p| p(record))
    }
}

impl<T: Model + Send + Sync + 'static> From<Vec<T>> for MemoryQuery<T> {
    fn from(records: Vec<T>) -> Self {
        Self::new(records)
    }
}

#[async_trait]
impl<T: Model + Send + Sync + 'static> Queryable<T> for MemoryQuery<T> {
    fn starts_with(mut self, column: &'static ColumnInfo, prefix: &str) -> Self {
        let prefix = prefix.to_lowercase();
        self.predicates.push(Box::new(move |record: &T| {
            record.value(column.name).is_some_and(|v| v.starts_with_lowercase(&prefix))
        }));
        self
    }

    fn order_by(mut self, column: &'static ColumnInfo, order: SortOrder) -> Self {
        self.order.push((column, order));
        self
    }

    fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    async fn count(&self) -> Result<i64, Error> {
        let count = self.records.iter().filter(|r| self.matches(r)).count();
        Ok(count as i64)
    }

    async fn fetch(self) -> Result<Vec<T>, Error> {
        let Self { records, predicates, order, offset, limit } = self;

        let mut keyed: Vec<(Vec<Value>, T)> = records
            .into_iter()
            .filter(|record| predicates.iter().all(|p| p(record)))
            .map(|record| {
                let key = order.iter().map(|(col, _)| record.value(col.name).unwrap_or(Value::Null)).collect();
                (key, record)
            })
            .collect();

        if !order.is_empty() {
            keyed.sort_by(|(a, _), (b, _)| {
                order
                    .iter()
                    .zip(a.iter().zip(b.iter()))
                    .map(|((_, direction), (x, y))| match direction {
                        SortOrder::Asc => x.sort_cmp(y),
                        SortOrder::Desc => y.sort_cmp(x),
                    })
                    .find(|o| o.is_ne())
                    .unwrap_or(Ordering::Equal)
            });
        }

        let page = keyed.into_iter().map(|(_, record)| record).skip(offset);
        Ok(match limit {
            Some(limit) => page.take(limit).collect(),
            None => page.collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::validate_field;

    #[derive(paged_query_macro::Model, Debug, Clone)]
    struct Product {
        #[orm(primary_key)]
        id: i64,
        sku: String,
        category: Option<String>,
        price: f64,
    }

    fn product(id: i64, sku: &str, category: Option<&str>, price: f64) -> Product {
        Product { id, sku: sku.to_string(), category: category.map(str::to_string), price }
    }

    fn products() -> Vec<Product> {
        vec![
            product(1, "100%-cotton", Some("shirts"), 20.0),
            product(2, "100-cotton", Some("shirts"), 15.5),
            product(3, "a_b", None, 15.5),
            product(4, "axb", Some("hats"), 9.0),
            product(5, "AXB-2", Some("hats"), 15.5),
        ]
    }

    fn column(name: &str) -> &'static ColumnInfo {
        validate_field::<Product>(name).unwrap()
    }

    fn ids(records: &[Product]) -> Vec<i64> {
        records.iter().map(|p| p.id).collect()
    }

    #[tokio::test]
    async fn test_wildcards_match_literally() {
        let query = MemoryQuery::new(products()).starts_with(column("sku"), "100%");
        assert_eq!(query.count().await.unwrap(), 1);
        assert_eq!(ids(&query.fetch().await.unwrap()), vec![1]);

        let query = MemoryQuery::new(products()).starts_with(column("sku"), "a_");
        assert_eq!(ids(&query.fetch().await.unwrap()), vec![3]);

        let query = MemoryQuery::new(products()).starts_with(column("sku"), "ax");
        assert_eq!(ids(&query.fetch().await.unwrap()), vec![4, 5]);
    }

    #[tokio::test]
    async fn test_null_fields_never_match_and_sort_first() {
        let query = MemoryQuery::new(products()).starts_with(column("category"), "s");
        assert_eq!(query.count().await.unwrap(), 2);

        let sorted = MemoryQuery::new(products()).order_by(column("category"), SortOrder::Asc).fetch().await.unwrap();
        assert_eq!(ids(&sorted), vec![3, 4, 5, 1, 2]);
    }

    #[tokio::test]
    async fn test_sort_is_stable_and_multi_column() {
        let sorted = MemoryQuery::new(products()).order_by(column("price"), SortOrder::Desc).fetch().await.unwrap();
        assert_eq!(ids(&sorted), vec![1, 2, 3, 5, 4]);

        let sorted = MemoryQuery::new(products())
            .order_by(column("price"), SortOrder::Asc)
            .order_by(column("sku"), SortOrder::Desc)
            .fetch()
            .await
            .unwrap();
        assert_eq!(ids(&sorted), vec![4, 3, 5, 2, 1]);
    }

    #[tokio::test]
    async fn test_count_ignores_paging() {
        let query = MemoryQuery::from(products()).offset(3).limit(1);
        assert_eq!(query.count().await.unwrap(), 5);
        assert_eq!(ids(&query.fetch().await.unwrap()), vec![4]);

        let query = MemoryQuery::from(products()).offset(10);
        assert!(query.fetch().await.unwrap().is_empty());
    }
}
