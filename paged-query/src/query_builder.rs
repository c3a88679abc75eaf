//! # Query Builder Module
//!
//! The SQL implementation of [`Queryable`], built on `sqlx::Any` so the same
//! code runs against PostgreSQL, MySQL and SQLite.
//!
//! Column names in generated SQL always come from the model's static column
//! table. Caller input only ever reaches the database as a bound parameter.

use std::marker::PhantomData;

use async_trait::async_trait;
use heck::ToSnakeCase;
use sqlx::{
    Any, Arguments, FromRow, Row,
    any::{AnyArguments, AnyRow},
    query::Query,
};

use crate::{
    Error,
    database::{Database, Drivers},
    model::{ColumnInfo, Model},
    pagination::SortOrder,
    queryable::Queryable,
};

/// A type alias for filter closures that support manual SQL construction and argument binding.
///
/// It receives:
/// 1. `&mut String`: The SQL query buffer being built.
/// 2. `&mut AnyArguments`: The argument container for binding values.
/// 3. `&Drivers`: The current database driver (to decide between `$n` or `?`).
/// 4. `&mut usize`: The argument counter (for PostgreSQL `$n` placeholders).
///
/// A failed bind is returned instead of leaving a placeholder without a value.
pub type FilterFn =
    Box<dyn Fn(&mut String, &mut AnyArguments<'_>, &Drivers, &mut usize) -> Result<(), Error> + Send + Sync>;

/// The escape character used in generated `LIKE` patterns.
const LIKE_ESCAPE: char = '!';

/// Adds a bind value, reporting encode failures as `Error::Conversion`.
fn push_arg<'q, V>(args: &mut AnyArguments<'q>, value: V) -> Result<(), Error>
where
    V: 'q + sqlx::Encode<'q, Any> + sqlx::Type<Any>,
{
    args.add(value).map_err(|e| Error::conversion(&e.to_string()))
}

/// Converts a row count to the `BIGINT` databases expect for LIMIT/OFFSET.
fn row_count_arg(name: &str, value: usize) -> Result<i64, Error> {
    i64::try_from(value).map_err(|_| Error::InvalidArgument(format!("{} {} exceeds the database range", name, value)))
}

/// Builds a case-insensitive `LIKE` pattern matching values that start with
/// `prefix`, with wildcard characters in `prefix` matched literally.
fn like_prefix_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for ch in prefix.to_lowercase().chars() {
        if ch == LIKE_ESCAPE || ch == '%' || ch == '_' {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// A query over the table of model `T`.
///
/// Usually created via `db.model::<T>()` and consumed by
/// [`PageResult::build`](crate::PageResult::build).
pub struct QueryBuilder<'a, T> {
    pub(crate) db: &'a Database,
    pub(crate) table_name: String,
    pub(crate) select_columns: Vec<String>,
    pub(crate) where_clauses: Vec<FilterFn>,
    pub(crate) order: Vec<(&'static ColumnInfo, SortOrder)>,
    pub(crate) limit: Option<usize>,
    pub(crate) offset: Option<usize>,
    pub(crate) _marker: PhantomData<T>,
}

impl<'a, T: Model + Send + Sync + Unpin> QueryBuilder<'a, T> {
    /// Creates a new QueryBuilder selecting every column of `T`.
    pub fn new(db: &'a Database) -> Self {
        let select_columns = T::columns().iter().map(|c| db.driver.quote(&c.sql_name())).collect();

        Self {
            db,
            table_name: T::table_name().to_snake_case(),
            select_columns,
            where_clauses: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
            _marker: PhantomData,
        }
    }

    /// Appends `FROM` and the `WHERE` clauses, binding filter arguments.
    fn push_from_where(
        &self,
        query: &mut String,
        args: &mut AnyArguments<'_>,
        arg_counter: &mut usize,
    ) -> Result<(), Error> {
        query.push_str(" FROM ");
        query.push_str(&self.db.driver.quote(&self.table_name));
        query.push_str(" WHERE 1=1");

        for clause in &self.where_clauses {
            clause(query, args, &self.db.driver, arg_counter)?;
        }
        Ok(())
    }

    /// Appends `ORDER BY`, with the primary key as a final tie-breaker.
    fn push_order_by(&self, query: &mut String) {
        if self.order.is_empty() {
            return;
        }

        let driver = &self.db.driver;
        let mut terms: Vec<String> =
            self.order.iter().map(|(col, order)| format!("{} {}", driver.quote(&col.sql_name()), order.as_sql())).collect();

        if let Some(pk) = T::columns().iter().find(|c| c.is_primary_key)
            && !self.order.iter().any(|(col, _)| col.name == pk.name)
        {
            terms.push(format!("{} ASC", driver.quote(&pk.sql_name())));
        }

        query.push_str(" ORDER BY ");
        query.push_str(&terms.join(", "));
    }

    /// Renders the full SELECT statement and its arguments.
    ///
    /// # Errors
    ///
    /// `Error::InvalidArgument` when the limit or offset does not fit in a
    /// `BIGINT`, `Error::Conversion` when a value cannot be bound.
    fn select_sql(&self) -> Result<(String, AnyArguments<'static>), Error> {
        let mut query = String::from("SELECT ");
        query.push_str(&self.select_columns.join(", "));

        let mut args = AnyArguments::default();
        let mut arg_counter = 1;
        self.push_from_where(&mut query, &mut args, &mut arg_counter)?;
        self.push_order_by(&mut query);

        let driver = &self.db.driver;
        if let Some(limit) = self.limit {
            query.push_str(" LIMIT ");
            query.push_str(&driver.placeholder(&mut arg_counter));
            push_arg(&mut args, row_count_arg("limit", limit)?)?;
        }

        if let Some(offset) = self.offset {
            // MySQL and SQLite only accept OFFSET after a LIMIT.
            match (self.limit, driver) {
                (None, Drivers::SQLite) => query.push_str(" LIMIT -1"),
                (None, Drivers::MySQL) => query.push_str(" LIMIT 18446744073709551615"),
                _ => {}
            }
            query.push_str(" OFFSET ");
            query.push_str(&driver.placeholder(&mut arg_counter));
            push_arg(&mut args, row_count_arg("offset", offset)?)?;
        }

        Ok((query, args))
    }

    /// Returns the generated SQL string (for debugging purposes, without arguments).
    pub fn to_sql(&self) -> Result<String, Error> {
        self.select_sql().map(|(query, _)| query)
    }

    /// Executes the query and maps each row into `R`.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let cities: Vec<City> = db.model::<City>().scan().await?;
    /// ```
    pub async fn scan<R>(self) -> Result<Vec<R>, Error>
    where
        R: for<'r> FromRow<'r, AnyRow> + Send + Unpin,
    {
        let (query, args) = self.select_sql()?;
        log::trace!("{}", query);

        Ok(sqlx::query_as_with::<_, R, _>(&query, args).fetch_all(&self.db.pool).await?)
    }

    /// Inserts a new record into the model's table.
    ///
    /// Values come from `Model::to_map` and are bound with the Rust type that
    /// matches each column's SQL type. Returns the number of affected rows.
    ///
    /// # Errors
    ///
    /// `Error::Conversion` when a value cannot be parsed as its column type.
    pub async fn insert(&self, model: &T) -> Result<u64, Error> {
        let data_map = model.to_map();
        let driver = &self.db.driver;

        let mut target_columns = Vec::new();
        let mut placeholders = Vec::new();
        let mut bindings: Vec<(&'static ColumnInfo, &str)> = Vec::new();
        let mut arg_counter = 1;

        for col in T::columns() {
            let Some(value) = data_map.get(col.name) else {
                continue;
            };

            target_columns.push(driver.quote(&col.sql_name()));
            let placeholder = driver.placeholder(&mut arg_counter);
            placeholders.push(match (driver, col.sql_type) {
                (Drivers::Postgres, "TIMESTAMPTZ" | "TIMESTAMP" | "DATE" | "TIME" | "UUID") => {
                    format!("{}::{}", placeholder, col.sql_type)
                }
                _ => placeholder,
            });
            bindings.push((col, value.as_str()));
        }

        if bindings.is_empty() {
            return Ok(0);
        }

        let query_str = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            driver.quote(&self.table_name),
            target_columns.join(", "),
            placeholders.join(", ")
        );
        log::trace!("{}", query_str);

        let mut query = sqlx::query::<Any>(&query_str);
        for (col, value) in bindings {
            query = bind_typed(query, col, value)?;
        }

        Ok(query.execute(&self.db.pool).await?.rows_affected())
    }
}

/// Binds `value` using the Rust type matching the column's SQL type.
fn bind_typed<'q>(
    query: Query<'q, Any, AnyArguments<'q>>,
    col: &ColumnInfo,
    value: &'q str,
) -> Result<Query<'q, Any, AnyArguments<'q>>, Error> {
    fn parse<V: std::str::FromStr>(col: &ColumnInfo, value: &str) -> Result<V, Error> {
        value
            .parse::<V>()
            .map_err(|_| Error::conversion(&format!("column '{}': cannot parse '{}' as {}", col.name, value, col.sql_type)))
    }

    Ok(match col.sql_type {
        "SMALLINT" => query.bind(parse::<i16>(col, value)?),
        "INTEGER" => query.bind(parse::<i32>(col, value)?),
        "BIGINT" => query.bind(parse::<i64>(col, value)?),
        "BOOLEAN" => query.bind(parse::<bool>(col, value)?),
        "REAL" => query.bind(parse::<f32>(col, value)?),
        "DOUBLE PRECISION" => query.bind(parse::<f64>(col, value)?),
        _ => query.bind(value),
    })
}

#[async_trait]
impl<'a, T> Queryable<T> for QueryBuilder<'a, T>
where
    T: Model + for<'r> FromRow<'r, AnyRow> + Send + Sync + Unpin,
{
    fn starts_with(mut self, column: &'static ColumnInfo, prefix: &str) -> Self {
        let quoted = self.db.driver.quote(&column.sql_name());
        let pattern = like_prefix_pattern(prefix);
        let is_text = column.is_text();

        let clause: FilterFn = Box::new(move |query, args, driver, arg_counter| {
            let expr = if is_text { quoted.clone() } else { driver.cast_text(&quoted) };
            query.push_str(" AND LOWER(");
            query.push_str(&expr);
            query.push_str(") LIKE ");
            query.push_str(&driver.placeholder(arg_counter));
            query.push_str(&format!(" ESCAPE '{}'", LIKE_ESCAPE));
            push_arg(args, pattern.clone())
        });
        self.where_clauses.push(clause);
        self
    }

    fn order_by(mut self, column: &'static ColumnInfo, order: SortOrder) -> Self {
        self.order.push((column, order));
        self
    }

    fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    async fn count(&self) -> Result<i64, Error> {
        let mut query = String::from("SELECT COUNT(*)");
        let mut args = AnyArguments::default();
        let mut arg_counter = 1;
        self.push_from_where(&mut query, &mut args, &mut arg_counter)?;
        log::trace!("{}", query);

        let row = sqlx::query_with(&query, args).fetch_one(&self.db.pool).await?;
        Ok(row.try_get::<i64, _>(0)?)
    }

    async fn fetch(self) -> Result<Vec<T>, Error> {
        self.scan::<T>().await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_prefix_pattern() {
        assert_eq!(like_prefix_pattern("San"), "san%");
        assert_eq!(like_prefix_pattern("100%"), "100!%%");
        assert_eq!(like_prefix_pattern("a_b!"), "a!_b!!%");
        assert_eq!(like_prefix_pattern(""), "%");
        assert_eq!(like_prefix_pattern(" "), " %");
    }

    #[test]
    fn test_row_count_arg_rejects_values_beyond_bigint() {
        assert_eq!(row_count_arg("offset", 20).unwrap(), 20);
        assert!(matches!(row_count_arg("offset", usize::MAX), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_push_arg_binds_values() {
        let mut args = AnyArguments::default();
        push_arg(&mut args, 10_i64).unwrap();
        push_arg(&mut args, "san%".to_string()).unwrap();
        assert_eq!(args.len(), 2);
    }
}
