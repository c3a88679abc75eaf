//! # Error Handling Module
//!
//! This module defines the error type returned by every fallible operation in
//! paged-query. Errors fall into two groups, and callers at an API boundary
//! are expected to tell them apart:
//!
//! - **Client errors**: the request itself is wrong (unknown sort/filter
//!   column, non-positive page size, negative page index). These map to a
//!   400-class response.
//! - **Server errors**: the backing store failed or a stored value could not
//!   be converted. These map to a 500-class response.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use paged_query::{Error, PageRequest, PageResult};
//!
//! match PageResult::build(db.model::<City>(), &request).await {
//!     Ok(page) => Json(page).into_response(),
//!     Err(e) if e.is_client_error() => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
//!     Err(e) => {
//!         log::error!("listing cities failed: {}", e);
//!         StatusCode::INTERNAL_SERVER_ERROR.into_response()
//!     }
//! }
//! ```

// ============================================================================
// External Crate Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// Error Enum Definition
// ============================================================================

/// The main error type for paged-query operations.
///
/// Every variant is raised at the point of detection and aborts the whole
/// build; a `PageResult` is never returned together with an error.
#[derive(Error, Debug)]
pub enum Error {
    /// A sort or filter column does not name a field of the record type.
    ///
    /// The payload is the column name exactly as the caller supplied it, so
    /// the message identifies the offending input.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let request = PageRequest::new(0, 10).sort("doesNotExist", "asc");
    /// let err = PageResult::build(MemoryQuery::new(cities), &request).await.unwrap_err();
    /// assert!(matches!(err, Error::FieldNotFound(ref name) if name == "doesNotExist"));
    /// ```
    #[error("Field '{0}' does not exist")]
    FieldNotFound(String),

    /// Invalid argument error.
    ///
    /// Raised for a page size that is zero or negative, a negative page
    /// index, paging values whose offset overflows, and empty field names
    /// passed directly to field validation.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Type conversion error.
    ///
    /// Raised when a model value cannot be parsed into the SQL type declared
    /// for its column while binding an INSERT.
    #[error("Type conversion error: {0}")]
    Conversion(String),

    /// Database operation error.
    ///
    /// Wraps errors from sqlx (connection failures, query failures, row
    /// decoding). Converted automatically via `?`.
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

// ============================================================================
// Helper Functions
// ============================================================================

impl Error {
    /// Creates an `InvalidArgument` error from a string slice.
    pub fn invalid_argument(msg: &str) -> Self {
        Error::InvalidArgument(msg.to_string())
    }

    /// Creates a `FieldNotFound` error for the given field name.
    pub fn field_not_found(name: &str) -> Self {
        Error::FieldNotFound(name.to_string())
    }

    /// Creates a `Conversion` error from a string slice.
    pub fn conversion(msg: &str) -> Self {
        Error::Conversion(msg.to_string())
    }

    /// Returns `true` when the error was caused by caller input.
    ///
    /// API layers should answer these with a 400-class status and everything
    /// else with a 500-class status.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::FieldNotFound(_) | Error::InvalidArgument(_))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        assert!(Error::field_not_found("nope").is_client_error());
        assert!(Error::invalid_argument("page size must be positive").is_client_error());
        assert!(!Error::conversion("bad int").is_client_error());
        assert!(!Error::DatabaseError(sqlx::Error::PoolClosed).is_client_error());
    }

    #[test]
    fn test_field_not_found_names_the_field() {
        let err = Error::field_not_found("nonExistentField");
        assert_eq!(err.to_string(), "Field 'nonExistentField' does not exist");
    }
}
