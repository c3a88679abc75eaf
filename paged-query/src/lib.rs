//! # paged-query
//!
//! Paginated, sortable and filterable query results for list endpoints.
//!
//! A list request names a page, an optional sort column and an optional
//! prefix filter. [`PageResult::build`] validates the column names against the
//! record type, applies filter then sort to a [`Queryable`] source, counts the
//! filtered records and fetches one page.
//!
//! ```rust,ignore
//! use paged_query::{Database, Model, PageRequest, PageResult};
//!
//! #[derive(Model, Debug, Clone, sqlx::FromRow, serde::Serialize)]
//! struct City {
//!     #[orm(primary_key)]
//!     id: i64,
//!     name: String,
//!     population: i64,
//! }
//!
//! let db = Database::connect("sqlite::memory:").await?;
//! let request = PageRequest::new(0, 10).sort("population", "desc").filter("name", "San");
//! let page = PageResult::build(db.model::<City>(), &request).await?;
//! ```

extern crate self as paged_query;

pub use paged_query_macro::Model;

pub mod database;
pub mod errors;
pub mod memory;
pub mod model;
pub mod pagination;
pub mod query_builder;
pub mod queryable;
pub mod sanitizer;

pub use database::{Database, DatabaseBuilder, Drivers};
pub use errors::Error;
pub use memory::MemoryQuery;
pub use model::{ColumnInfo, Model, Value, is_valid_field, validate_field};
pub use pagination::{PageRequest, PageResult, SortOrder};
pub use query_builder::QueryBuilder;
pub use queryable::Queryable;
