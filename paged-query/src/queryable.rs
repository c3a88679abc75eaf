//! # Queryable Module
//!
//! The seam between the page builder and whatever holds the records.
//!
//! A `Queryable` is a lazily-evaluated collection: filter, order and
//! skip/take are recorded first and only executed by `count` or `fetch`.
//! Two sources ship with the crate:
//!
//! - [`QueryBuilder`](crate::QueryBuilder) - SQL over `sqlx::Any`
//! - [`MemoryQuery`](crate::MemoryQuery) - a `Vec<T>` evaluated in process
//!
//! Every column argument is a `&'static ColumnInfo` taken from the model's
//! generated column table, so implementations never see caller strings as
//! column names.

use async_trait::async_trait;

use crate::{Error, model::ColumnInfo, pagination::SortOrder};

/// A composable, not yet materialized query over records of type `T`.
#[async_trait]
pub trait Queryable<T>: Sized + Send + Sync {
    /// Restricts the query to records whose `column` starts with `prefix`,
    /// ignoring case.
    fn starts_with(self, column: &'static ColumnInfo, prefix: &str) -> Self;

    /// Orders the query by `column`.
    fn order_by(self, column: &'static ColumnInfo, order: SortOrder) -> Self;

    /// Skips the first `offset` records.
    fn offset(self, offset: usize) -> Self;

    /// Returns at most `limit` records.
    fn limit(self, limit: usize) -> Self;

    /// Counts the records matching the filters, ignoring ordering and paging.
    async fn count(&self) -> Result<i64, Error>;

    /// Executes the query and returns the matching records.
    async fn fetch(self) -> Result<Vec<T>, Error>;
}
