//! # Pagination Module
//!
//! This module turns a query source plus a `PageRequest` into a `PageResult`:
//! one page of records and the metadata a data table needs to render paging,
//! sorting and filtering controls.
//!
//! ## Features
//!
//! - **Serde Compatibility**: `PageRequest` deserializes from query strings
//!   (`?pageIndex=1&pageSize=20&sortColumn=name&sortOrder=desc`) and
//!   `PageResult` serializes to the matching camelCase JSON envelope
//! - **Defaults**: page 0, size 10, no sorting, no filtering
//! - **Injection Defense**: sort and filter columns must name a field of the
//!   record type; unknown names fail the build instead of being ignored
//!
//! ## Example with Axum
//!
//! ```rust,ignore
//! use axum::{extract::{Query, State}, Json};
//! use paged_query::{Database, PageRequest, PageResult};
//!
//! async fn list_cities(
//!     State(db): State<Database>,
//!     Query(request): Query<PageRequest>,
//! ) -> Result<Json<PageResult<City>>, ApiError> {
//!     Ok(Json(PageResult::build(db.model::<City>(), &request).await?))
//! }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    Error,
    model::{Model, validate_field},
    queryable::Queryable,
};

// ============================================================================
// Sort Order
// ============================================================================

/// Direction of the ordering applied to a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    #[serde(rename = "ASC")]
    Asc,
    #[serde(rename = "DESC")]
    Desc,
}

impl SortOrder {
    /// Normalizes a caller-supplied sort order.
    ///
    /// Only a case-insensitive `"desc"` selects descending order; anything
    /// else, including an absent or unrecognized value, sorts ascending.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("desc") => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }

    /// The SQL keyword for this direction.
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

// ============================================================================
// Page Request
// ============================================================================

/// The paging, sorting and filtering parameters of a list request.
///
/// Can be deserialized from query parameters; missing values take their
/// defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    /// The page number (0-indexed). Default: 0.
    #[serde(default)]
    pub page_index: i64,

    /// The number of records per page. Default: 10.
    #[serde(default = "default_page_size")]
    pub page_size: i64,

    /// Field to order by. No ordering when absent or empty.
    #[serde(default)]
    pub sort_column: Option<String>,

    /// `"asc"` or `"desc"`, case-insensitive. Default: ascending.
    #[serde(default)]
    pub sort_order: Option<String>,

    /// Field to filter on. Ignored unless `filter_query` is also set.
    #[serde(default)]
    pub filter_column: Option<String>,

    /// Prefix the filter field must start with.
    #[serde(default)]
    pub filter_query: Option<String>,
}

fn default_page_size() -> i64 {
    10
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, default_page_size())
    }
}

/// Returns the value if it is present and not empty. Whitespace counts as
/// content.
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl PageRequest {
    /// Creates a request for one page with no sorting or filtering.
    pub fn new(page_index: i64, page_size: i64) -> Self {
        Self { page_index, page_size, sort_column: None, sort_order: None, filter_column: None, filter_query: None }
    }

    /// Sets the sort column and order.
    pub fn sort(mut self, column: impl Into<String>, order: impl Into<String>) -> Self {
        self.sort_column = Some(column.into());
        self.sort_order = Some(order.into());
        self
    }

    /// Sets the filter column and the prefix to match.
    pub fn filter(mut self, column: impl Into<String>, query: impl Into<String>) -> Self {
        self.filter_column = Some(column.into());
        self.filter_query = Some(query.into());
        self
    }

    /// Checks the paging values and returns `(offset, limit)`.
    ///
    /// # Errors
    ///
    /// `Error::InvalidArgument` for a non-positive page size, a negative
    /// page index, or an offset beyond `i64::MAX` (the largest offset a
    /// database accepts).
    pub fn bounds(&self) -> Result<(usize, usize), Error> {
        if self.page_size <= 0 {
            return Err(Error::InvalidArgument(format!("page size must be positive, got {}", self.page_size)));
        }
        if self.page_index < 0 {
            return Err(Error::InvalidArgument(format!("page index cannot be negative, got {}", self.page_index)));
        }

        let overflow = || Error::InvalidArgument(format!("page {} of size {} is out of range", self.page_index, self.page_size));
        let offset = self.page_index.checked_mul(self.page_size).ok_or_else(overflow)?;
        let offset = usize::try_from(offset).map_err(|_| overflow())?;
        let limit = usize::try_from(self.page_size).map_err(|_| overflow())?;

        Ok((offset, limit))
    }
}

// ============================================================================
// Page Result
// ============================================================================

/// One page of records plus paging metadata.
///
/// Built once per request by [`PageResult::build`] and never mutated
/// afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult<T> {
    /// The records of the current page.
    pub data: Vec<T>,
    /// The current page number (0-indexed).
    pub page_index: i64,
    /// The number of records per page.
    pub page_size: i64,
    /// The number of records matching the filter, before paging.
    pub total_count: i64,
    /// `ceil(total_count / page_size)`.
    pub total_pages: i64,
    /// The field the page was ordered by, if any.
    pub sort_column: Option<String>,
    /// The direction the page was ordered in, if it was ordered.
    pub sort_order: Option<SortOrder>,
    /// The field the records were filtered on, if any.
    pub filter_column: Option<String>,
    /// The prefix the records were filtered by, if any.
    pub filter_query: Option<String>,
    /// `page_index > 0`.
    pub has_previous_page: bool,
    /// `page_index + 1 < total_pages`.
    pub has_next_page: bool,
}

impl<T: Model> PageResult<T> {
    /// Filters, sorts, counts and pages `source` according to `request`.
    ///
    /// The steps run in a fixed order:
    ///
    /// 1. validate page size and index
    /// 2. filter: when both `filter_column` and `filter_query` are set, keep
    ///    records whose field starts with the query (case-insensitive)
    /// 3. sort: when `sort_column` is set, order by it
    /// 4. count the filtered records
    /// 5. skip `page_index * page_size`, take `page_size`, materialize
    ///
    /// # Errors
    ///
    /// * `Error::InvalidArgument` - bad page size or index
    /// * `Error::FieldNotFound` - unknown sort or filter column
    /// * `Error::DatabaseError` - the source failed while counting or fetching
    pub async fn build<Q: Queryable<T>>(mut source: Q, request: &PageRequest) -> Result<Self, Error> {
        log::debug!(
            "building {} page: index={} size={} sort={:?} {:?} filter={:?} {:?}",
            T::table_name(),
            request.page_index,
            request.page_size,
            request.sort_column,
            request.sort_order,
            request.filter_column,
            request.filter_query
        );

        let (offset, limit) = request.bounds()?;

        let mut filter_column = None;
        let mut filter_query = None;
        if let (Some(column), Some(query)) = (non_empty(&request.filter_column), non_empty(&request.filter_query)) {
            let info = validate_field::<T>(column)?;
            source = source.starts_with(info, query);
            filter_column = Some(info.field_name().to_string());
            filter_query = Some(query.to_string());
        }

        let mut sort_column = None;
        let mut sort_order = None;
        if let Some(column) = non_empty(&request.sort_column) {
            let info = validate_field::<T>(column)?;
            let order = SortOrder::parse(request.sort_order.as_deref());
            source = source.order_by(info, order);
            sort_column = Some(info.field_name().to_string());
            sort_order = Some(order);
        }

        let total_count = source.count().await?;
        let data = source.offset(offset).limit(limit).fetch().await?;

        let total_pages = total_pages(total_count, request.page_size);
        log::debug!(
            "{} page {}: {} of {} records, {} pages",
            T::table_name(),
            request.page_index,
            data.len(),
            total_count,
            total_pages
        );

        Ok(Self {
            data,
            page_index: request.page_index,
            page_size: request.page_size,
            total_count,
            total_pages,
            sort_column,
            sort_order,
            filter_column,
            filter_query,
            has_previous_page: request.page_index > 0,
            has_next_page: request.page_index.saturating_add(1) < total_pages,
        })
    }
}

impl<T> PageResult<T> {
    /// Projects every record of the page, keeping the metadata.
    ///
    /// Sorting and filtering were validated against `T`, so the echoed
    /// column names refer to the source record type, not to `U`.
    pub fn map<U, F>(self, f: F) -> PageResult<U>
    where
        F: FnMut(T) -> U,
    {
        PageResult {
            data: self.data.into_iter().map(f).collect(),
            page_index: self.page_index,
            page_size: self.page_size,
            total_count: self.total_count,
            total_pages: self.total_pages,
            sort_column: self.sort_column,
            sort_order: self.sort_order,
            filter_column: self.filter_column,
            filter_query: self.filter_query,
            has_previous_page: self.has_previous_page,
            has_next_page: self.has_next_page,
        }
    }
}

/// `ceil(total_count / page_size)`; `page_size` must be positive.
fn total_pages(total_count: i64, page_size: i64) -> i64 {
    total_count / page_size + i64::from(total_count % page_size != 0)
}

// ============================================================================
// Tests
// ============================================================================
