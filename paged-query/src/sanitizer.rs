//! # Sanitizer Module
//!
//! HTML-encoding for string fields that will later be rendered by a UI.
//!
//! This guards the write path against reflected script injection. It is
//! unrelated to sort/filter column validation, which lives in
//! [`crate::model::validate_field`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use paged_query::sanitizer;
//!
//! let mut city = City { id: 1, name: "<script>alert(1)</script>".into(), /* ... */ };
//! sanitizer::sanitize_record(&mut city);
//! assert_eq!(city.name, "&lt;script&gt;alert(1)&lt;/script&gt;");
//! ```

use std::fmt::Write;

use crate::model::Model;

/// HTML-encodes a string.
///
/// `&`, `<`, `>`, `"` and `'` become entity references; characters in the
/// range U+00A0..=U+00FF become decimal character references.
pub fn html_encode(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());

    for ch in value.chars() {
        match ch {
            '&' => encoded.push_str("&amp;"),
            '<' => encoded.push_str("&lt;"),
            '>' => encoded.push_str("&gt;"),
            '"' => encoded.push_str("&quot;"),
            '\'' => encoded.push_str("&#39;"),
            '\u{a0}'..='\u{ff}' => {
                let _ = write!(encoded, "&#{};", ch as u32);
            }
            _ => encoded.push(ch),
        }
    }

    encoded
}

/// HTML-encodes every string field of `record` in place.
pub fn sanitize_record<T: Model>(record: &mut T) {
    if log::log_enabled!(log::Level::Trace) {
        log::trace!("sanitizing {} record: {:?}", T::table_name(), record.to_map());
    }

    record.sanitize_strings();

    if log::log_enabled!(log::Level::Trace) {
        log::trace!("sanitized {} record: {:?}", T::table_name(), record.to_map());
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(paged_query_macro::Model)]
    struct Comment {
        #[orm(primary_key)]
        id: i64,
        body: String,
        author: Option<String>,
        editor: Option<String>,
        score: f64,
    }

    #[test]
    fn test_html_encode() {
        assert_eq!(html_encode("<b>Tom & \"Jerry\"</b>"), "&lt;b&gt;Tom &amp; &quot;Jerry&quot;&lt;/b&gt;");
        assert_eq!(html_encode("it's"), "it&#39;s");
        assert_eq!(html_encode("São Paulo"), "S&#227;o Paulo");
        assert_eq!(html_encode("Zürich\u{a0}"), "Z&#252;rich&#160;");
        assert_eq!(html_encode("東京"), "東京");
        assert_eq!(html_encode(""), "");
    }

    #[test]
    fn test_sanitize_record_encodes_string_fields_only() {
        let mut comment = Comment {
            id: 1,
            body: "<script>alert('x')</script>".to_string(),
            author: Some("<i>bob</i>".to_string()),
            editor: None,
            score: 2.5,
        };

        sanitize_record(&mut comment);

        assert_eq!(comment.body, "&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;");
        assert_eq!(comment.author.as_deref(), Some("&lt;i&gt;bob&lt;/i&gt;"));
        assert_eq!(comment.editor, None);
        assert_eq!(comment.id, 1);
        assert_eq!(comment.score, 2.5);
    }
}
