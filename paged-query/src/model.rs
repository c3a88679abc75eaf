//! # Model Module
//!
//! This module defines the `Model` trait, the column metadata it exposes and
//! the dynamic `Value` type used to read record fields by name.
//!
//! ## Overview
//!
//! Query shaping needs to answer two questions about a record type at
//! runtime: "does a field with this name exist?" and "what is the value of
//! that field on this record?". Rust has no runtime reflection, so both
//! answers come from a registration table generated once per type by
//! `#[derive(Model)]`:
//!
//! - `columns()` is a `'static` slice of `ColumnInfo`, one per field
//! - `value()` is a `match` over the declared field names
//!
//! User-supplied column names are resolved against that table through
//! [`validate_field`]. Only the resulting `&'static ColumnInfo` is ever handed
//! to a query source, so no caller string reaches generated SQL.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use paged_query::Model;
//! use sqlx::FromRow;
//!
//! #[derive(Model, Debug, Clone, FromRow)]
//! struct City {
//!     #[orm(primary_key)]
//!     id: i64,
//!
//!     #[orm(size = 100, index)]
//!     name: String,
//!
//!     latitude: f64,
//!     longitude: f64,
//!
//!     #[orm(foreign_key = "Country::id")]
//!     country_id: i64,
//! }
//! ```
//!
//! ## Supported ORM Attributes
//!
//! - `#[orm(primary_key)]` - Marks field as primary key
//! - `#[orm(unique)]` - Adds UNIQUE constraint
//! - `#[orm(index)]` - Creates database index
//! - `#[orm(size = N)]` - Sets VARCHAR size (for String fields)
//! - `#[orm(foreign_key = "Table::Column")]` - Defines foreign key relationship

// ============================================================================
// External Crate Imports
// ============================================================================

use std::{cmp::Ordering, collections::HashMap, fmt};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use heck::{ToLowerCamelCase, ToSnakeCase};
use uuid::Uuid;

use crate::Error;

// ============================================================================
// Column Metadata Structure
// ============================================================================

/// Metadata information about a model field and its database column.
///
/// Instances live in a `'static` table generated by `#[derive(Model)]`; the
/// builder hands out references into that table after validating a
/// caller-supplied name.
///
/// # SQL Type Mapping
///
/// - `i8`, `i16` → `"SMALLINT"`
/// - `i32`, `u16`, `u32` → `"INTEGER"`
/// - `i64`, `u64` → `"BIGINT"`
/// - `String` → `"TEXT"` or `"VARCHAR(N)"` with size attribute
/// - `bool` → `"BOOLEAN"`
/// - `f64` → `"DOUBLE PRECISION"`, `f32` → `"REAL"`
/// - `Uuid` → `"UUID"`
/// - `DateTime<Utc>` → `"TIMESTAMPTZ"`
/// - `NaiveDateTime` → `"TIMESTAMP"`
/// - `NaiveDate` → `"DATE"`
/// - `NaiveTime` → `"TIME"`
/// - `Option<T>` → Same as T, but `is_nullable = true`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnInfo {
    /// The field name as declared on the struct.
    ///
    /// The `r#` prefix of raw identifiers is kept here and stripped when the
    /// SQL column name is generated.
    pub name: &'static str,

    /// The SQL type of the column (e.g., "TEXT", "INTEGER", "VARCHAR(100)").
    pub sql_type: &'static str,

    /// Whether this column is the Primary Key.
    pub is_primary_key: bool,

    /// Whether this column allows NULL values (field type is `Option<T>`).
    pub is_nullable: bool,

    /// Whether a UNIQUE constraint should be added.
    pub unique: bool,

    /// Whether an index should be created for this column.
    pub index: bool,

    /// The name of the referenced table, if this is a Foreign Key.
    pub foreign_table: Option<&'static str>,

    /// The name of the referenced column, if this is a Foreign Key.
    pub foreign_key: Option<&'static str>,
}

impl ColumnInfo {
    /// Returns the field name without a raw identifier prefix.
    pub fn field_name(&self) -> &'static str {
        self.name.strip_prefix("r#").unwrap_or(self.name)
    }

    /// Returns the column name used in SQL (snake_case, unquoted).
    pub fn sql_name(&self) -> String {
        self.field_name().to_snake_case()
    }

    /// Whether the column stores text natively.
    pub fn is_text(&self) -> bool {
        self.sql_type == "TEXT" || self.sql_type.starts_with("VARCHAR")
    }

    /// Checks a caller-supplied name against this column.
    ///
    /// Matching ignores ASCII case and accepts both the declared name and its
    /// lowerCamelCase form, so `country_id`, `countryId` and `CountryID` all
    /// resolve to the same column.
    pub fn matches(&self, name: &str) -> bool {
        let field = self.field_name();
        field.eq_ignore_ascii_case(name) || field.to_lower_camel_case().eq_ignore_ascii_case(name)
    }
}

// ============================================================================
// Dynamic Value
// ============================================================================

/// A field value read through [`Model::value`].
///
/// This is what in-memory filtering and sorting operate on. Every supported
/// field type converts into one of these variants via `From`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Int(_) | Value::Float(_) => 2,
            Value::Text(_) => 3,
        }
    }

    /// Total order used for sorting.
    ///
    /// Nulls first, then booleans, then numbers (integers and floats compared
    /// numerically), then text compared by code point.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Int(a), Value::Float(b)) => (*a as f64).total_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.total_cmp(&(*b as f64)),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    /// Case-insensitive prefix test. `prefix` must already be lowercase.
    ///
    /// Non-text values are compared through their display form, where
    /// floats keep a trailing `.0` (`3.0`, not `3`) as SQL text casts do.
    /// `Null` never matches.
    pub fn starts_with_lowercase(&self, prefix: &str) -> bool {
        match self {
            Value::Null => false,
            Value::Text(s) => s.to_lowercase().starts_with(prefix),
            other => other.to_string().to_lowercase().starts_with(prefix),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{:?}", v),
            Value::Text(v) => f.write_str(v),
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        i64::try_from(v).map(Value::Int).unwrap_or(Value::Float(v as f64))
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Text(v.hyphenated().to_string())
    }
}

// Temporal values are rendered fixed-width so text order matches time order.

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Text(v.to_rfc3339_opts(SecondsFormat::Micros, true))
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Text(v.format("%Y-%m-%dT%H:%M:%S%.6f").to_string())
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Text(v.format("%Y-%m-%d").to_string())
    }
}

impl From<NaiveTime> for Value {
    fn from(v: NaiveTime) -> Self {
        Value::Text(v.format("%H:%M:%S%.6f").to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

// ============================================================================
// Model Trait
// ============================================================================

/// The core trait describing a record type that can be paged, sorted and
/// filtered.
///
/// This trait is implemented by `#[derive(Model)]`. Manual implementations
/// are possible; they must keep `columns()` and `value()` in agreement.
///
/// # Example Manual Implementation
///
/// ```rust,ignore
/// use paged_query::{ColumnInfo, Model, Value};
/// use std::collections::HashMap;
///
/// struct Tag {
///     id: i64,
///     label: String,
/// }
///
/// impl Model for Tag {
///     fn table_name() -> &'static str {
///         "Tag"
///     }
///
///     fn columns() -> &'static [ColumnInfo] {
///         const COLUMNS: &[ColumnInfo] = &[
///             ColumnInfo { name: "id", sql_type: "BIGINT", is_primary_key: true, is_nullable: false,
///                          unique: false, index: false, foreign_table: None, foreign_key: None },
///             ColumnInfo { name: "label", sql_type: "TEXT", is_primary_key: false, is_nullable: false,
///                          unique: false, index: false, foreign_table: None, foreign_key: None },
///         ];
///         COLUMNS
///     }
///
///     fn active_columns() -> &'static [&'static str] {
///         &["id", "label"]
///     }
///
///     fn to_map(&self) -> HashMap<String, String> {
///         HashMap::from([("id".into(), self.id.to_string()), ("label".into(), self.label.clone())])
///     }
///
///     fn value(&self, column: &str) -> Option<Value> {
///         match column {
///             "id" => Some(self.id.into()),
///             "label" => Some(self.label.clone().into()),
///             _ => None,
///         }
///     }
///
///     fn sanitize_strings(&mut self) {
///         self.label = paged_query::sanitizer::html_encode(&self.label);
///     }
/// }
/// ```
pub trait Model {
    /// Returns the table name (the struct name; SQL uses its snake_case form).
    fn table_name() -> &'static str;

    /// Returns the static column table for this model.
    fn columns() -> &'static [ColumnInfo];

    /// Returns the declared field names, in declaration order.
    fn active_columns() -> &'static [&'static str];

    /// Converts the model instance into a value map (Column Name → String Value).
    ///
    /// Used for INSERT operations. `Option<T>` fields are only included if
    /// they contain a value.
    fn to_map(&self) -> HashMap<String, String>;

    /// Reads a field by its declared name.
    ///
    /// Returns `None` when `column` is not a declared field.
    fn value(&self, column: &str) -> Option<Value>;

    /// HTML-encodes every `String` and `Option<String>` field in place.
    fn sanitize_strings(&mut self);
}

// ============================================================================
// Field Validation
// ============================================================================

/// Resolves a caller-supplied field name against the model's column table.
///
/// # Errors
///
/// * `Error::InvalidArgument` - `name` is empty
/// * `Error::FieldNotFound` - no field of `T` matches `name`, including names
///   with surrounding whitespace
pub fn validate_field<T: Model>(name: &str) -> Result<&'static ColumnInfo, Error> {
    if name.is_empty() {
        return Err(Error::invalid_argument("field name cannot be empty"));
    }

    T::columns().iter().find(|c| c.matches(name)).ok_or_else(|| {
        log::warn!("rejected field '{}' for model {}", name, T::table_name());
        Error::field_not_found(name)
    })
}

/// Returns `true` when `name` resolves to a field of `T`.
pub fn is_valid_field<T: Model>(name: &str) -> bool {
    validate_field::<T>(name).is_ok()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(paged_query_macro::Model)]
    struct Country {
        #[orm(primary_key)]
        id: i64,
        #[orm(size = 100, index)]
        name: String,
        #[orm(size = 2)]
        iso2: String,
        numbers_of_cities: Option<i32>,
        r#type: String,
    }

    #[test]
    fn test_generated_column_table() {
        let columns = Country::columns();
        assert_eq!(columns.len(), 5);
        assert!(columns[0].is_primary_key);
        assert_eq!(columns[1].sql_type, "VARCHAR(100)");
        assert!(columns[1].index);
        assert!(columns[3].is_nullable);
        assert_eq!(columns[4].sql_name(), "type");
        assert_eq!(Country::active_columns(), &["id", "name", "iso2", "numbers_of_cities", "r#type"]);
        assert_eq!(country_fields::ISO2, "iso2");
    }

    #[test]
    fn test_validate_field_is_case_insensitive() {
        assert_eq!(validate_field::<Country>("NAME").unwrap().name, "name");
        assert_eq!(validate_field::<Country>("numbersOfCities").unwrap().name, "numbers_of_cities");
        assert_eq!(validate_field::<Country>("NumbersOfCities").unwrap().name, "numbers_of_cities");
        assert_eq!(validate_field::<Country>("type").unwrap().name, "r#type");
    }

    #[test]
    fn test_validate_field_rejects_unknown_and_empty() {
        assert!(matches!(
            validate_field::<Country>("nonExistentField"),
            Err(Error::FieldNotFound(ref name)) if name == "nonExistentField"
        ));
        assert!(matches!(validate_field::<Country>(""), Err(Error::InvalidArgument(_))));
        assert!(matches!(validate_field::<Country>("  "), Err(Error::FieldNotFound(_))));
        assert!(matches!(validate_field::<Country>(" name"), Err(Error::FieldNotFound(ref name)) if name == " name"));
        assert!(!is_valid_field::<Country>("name; DROP TABLE country"));
        assert!(is_valid_field::<Country>("iso2"));
    }

    #[test]
    fn test_value_accessor() {
        let country = Country {
            id: 7,
            name: "Italy".to_string(),
            iso2: "IT".to_string(),
            numbers_of_cities: None,
            r#type: "state".to_string(),
        };
        assert_eq!(country.value("id"), Some(Value::Int(7)));
        assert_eq!(country.value("name"), Some(Value::Text("Italy".to_string())));
        assert_eq!(country.value("numbers_of_cities"), Some(Value::Null));
        assert_eq!(country.value("r#type"), Some(Value::Text("state".to_string())));
        assert_eq!(country.value("missing"), None);
    }

    #[test]
    fn test_value_sort_order() {
        let mut values =
            vec![Value::Text("b".into()), Value::Float(2.5), Value::Null, Value::Int(3), Value::Int(-1), Value::Bool(true)];
        values.sort_by(|a, b| a.sort_cmp(b));
        assert_eq!(
            values,
            vec![Value::Null, Value::Bool(true), Value::Int(-1), Value::Float(2.5), Value::Int(3), Value::Text("b".into())]
        );
    }

    #[test]
    fn test_value_prefix_match() {
        assert!(Value::Text("San Diego".into()).starts_with_lowercase("san"));
        assert!(Value::Int(12345).starts_with_lowercase("123"));
        assert!(Value::Float(3.0).starts_with_lowercase("3."));
        assert!(Value::Float(3.5).starts_with_lowercase("3.5"));
        assert_eq!(Value::Float(3.0).to_string(), "3.0");
        assert!(!Value::Null.starts_with_lowercase(""));
        assert!(!Value::Text("Santa".into()).starts_with_lowercase("san_"));
    }
}
