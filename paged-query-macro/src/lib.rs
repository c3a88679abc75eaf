//! # paged-query Procedural Macros
//!
//! This crate provides `#[derive(Model)]` for the paged-query framework. It is
//! re-exported by the main `paged-query` crate and is not meant to be used
//! directly.
//!
//! ## Architecture
//!
//! - **`lib.rs`** (this file): Entry point and macro definitions
//! - **`derive_model.rs`**: Implementation of the Model derive macro
//! - **`types.rs`**: Type mapping utilities (Rust → SQL, string detection)
//!
//! ## Why a derive
//!
//! Sort and filter columns arrive as strings from HTTP query parameters. The
//! derive turns each struct into a registration table (column metadata plus a
//! `match`-based accessor) at compile time, so a caller-supplied name can be
//! checked against the real fields of the record without runtime reflection.
//!
//! ## Supported Attributes
//!
//! ```rust,ignore
//! use paged_query::Model;
//!
//! #[derive(Model)]
//! struct City {
//!     #[orm(primary_key)]
//!     id: i64,
//!
//!     #[orm(size = 100, index)]
//!     name: String,
//!
//!     #[orm(foreign_key = "Country::id", index)]
//!     country_id: i64,
//! }
//! ```
//!
//! - `primary_key` - Marks the field as the table's primary key
//! - `unique` - Adds a `UNIQUE` constraint
//! - `index` - Creates a database index on the column
//! - `size = N` - Sets `VARCHAR(N)` for String fields (default `TEXT`)
//! - `foreign_key = "Table::column"` - Declares a foreign key relationship
//!
//! ## Generated Field Constants
//!
//! The macro also generates a `{model}_fields` module with one constant per
//! field, usable wherever a column name is expected:
//!
//! ```rust,ignore
//! let request = PageRequest::new(0, 10).sort(city_fields::NAME, "asc");
//! ```

#![warn(missing_docs)]

// ============================================================================
// External Crate Imports
// ============================================================================

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

// ============================================================================
// Module Declarations
// ============================================================================

/// Type mapping module - converts Rust types to SQL types.
mod types;

/// Model derive implementation module.
mod derive_model;

// ============================================================================
// Procedural Macro Definitions
// ============================================================================

/// Derives the `Model` trait for a struct with named fields.
///
/// # Generated Implementation
///
/// 1. `table_name()` - The struct name as a static string
/// 2. `columns()` - A `'static` slice of `ColumnInfo`
/// 3. `active_columns()` - The field names in declaration order
/// 4. `to_map()` - Serializes the instance to `HashMap<String, String>`
/// 5. `value()` - Reads a field by name as a `paged_query::Value`
/// 6. `sanitize_strings()` - HTML-encodes every `String`/`Option<String>` field
///
/// Every field type must convert into `paged_query::Value` and implement
/// `Clone` and `Display`.
///
/// # Compile Errors
///
/// - The input is not a struct, or has unnamed fields
/// - An `#[orm(...)]` attribute is unknown or malformed
/// - A `foreign_key` attribute doesn't follow the "Table::column" format
#[proc_macro_derive(Model, attributes(orm))]
pub fn model_derive(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    derive_model::expand(ast).unwrap_or_else(syn::Error::into_compile_error).into()
}
