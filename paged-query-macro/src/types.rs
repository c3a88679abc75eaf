//! # Type Mapping Module
//!
//! Classifies field types for the `Model` derive:
//!
//! - [`rust_type_to_sql`] picks the SQL column type and nullability
//! - [`string_kind`] tells the sanitizer which fields hold text
//!
//! ## Supported Type Mappings
//!
//! | Rust | SQL |
//! |---|---|
//! | `i8`, `i16`, `u8` | `SMALLINT` |
//! | `i32`, `u16`, `u32` | `INTEGER` |
//! | `i64`, `u64` | `BIGINT` |
//! | `f32` | `REAL` |
//! | `f64` | `DOUBLE PRECISION` |
//! | `bool` | `BOOLEAN` |
//! | `String` | `TEXT` |
//! | `Uuid` | `UUID` |
//! | `DateTime<Utc>` | `TIMESTAMPTZ` |
//! | `NaiveDateTime` | `TIMESTAMP` |
//! | `NaiveDate` | `DATE` |
//! | `NaiveTime` | `TIME` |
//! | `Option<T>` | SQL type of `T`, nullable |

use syn::{GenericArgument, PathArguments, Type};

/// Returns the inner type of `Option<T>`, or `None` for any other type.
fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    match &segment.arguments {
        PathArguments::AngleBracketed(args) => match args.args.first() {
            Some(GenericArgument::Type(inner)) => Some(inner),
            _ => None,
        },
        _ => None,
    }
}

/// Returns the last path segment of a type as a string (`chrono::NaiveDate` → `NaiveDate`).
fn last_segment(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(type_path) => type_path.path.segments.last().map(|s| s.ident.to_string()),
        _ => None,
    }
}

/// Maps a Rust field type to its SQL type and nullability.
///
/// `Option<T>` maps to the SQL type of `T` and is marked nullable. Unknown
/// types fall back to `TEXT`.
///
/// # Examples
///
/// ```rust,ignore
/// assert_eq!(rust_type_to_sql(&parse_quote!(i64)), ("BIGINT".to_string(), false));
/// assert_eq!(rust_type_to_sql(&parse_quote!(Option<String>)), ("TEXT".to_string(), true));
/// ```
pub fn rust_type_to_sql(ty: &Type) -> (String, bool) {
    if let Some(inner) = option_inner(ty) {
        let (inner_sql_type, _) = rust_type_to_sql(inner);
        return (inner_sql_type, true);
    }

    let sql_type = match last_segment(ty).as_deref() {
        Some("i8" | "i16" | "u8") => "SMALLINT",
        Some("i32" | "u16" | "u32") => "INTEGER",
        Some("i64" | "u64") => "BIGINT",
        Some("f32") => "REAL",
        Some("f64") => "DOUBLE PRECISION",
        Some("bool") => "BOOLEAN",
        Some("Uuid") => "UUID",
        Some("DateTime") => "TIMESTAMPTZ",
        Some("NaiveDateTime") => "TIMESTAMP",
        Some("NaiveDate") => "DATE",
        Some("NaiveTime") => "TIME",
        _ => "TEXT",
    };

    (sql_type.to_string(), false)
}

/// Whether a field holds text the sanitizer should encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringKind {
    /// `String`
    Plain,
    /// `Option<String>`
    Optional,
}

/// Classifies `String` and `Option<String>` fields; `None` for anything else.
pub fn string_kind(ty: &Type) -> Option<StringKind> {
    if let Some(inner) = option_inner(ty) {
        return (last_segment(inner).as_deref() == Some("String")).then_some(StringKind::Optional);
    }
    (last_segment(ty).as_deref() == Some("String")).then_some(StringKind::Plain)
}
