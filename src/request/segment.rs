//! Path segments handed to the resolver.
//!
//! A [`Segment`] is one element of an already split request path: a raw
//! identifier, an optional key predicate, and an optional navigation
//! indicator. Segments are produced by the host (or by [`parse_path`]) and are
//! never mutated by the pipeline.
//!
//! # Text Form
//!
//! ```text
//! Products              identifier only
//! Products(1)           single key value
//! Customers('ALFKI')    quoted string key ('' escapes a quote)
//! Lines(Order=1,Nr=2)   composite key
//! $count                count segment
//! ```
//!
//! # Example
//!
//! ```rust
//! use resource_query::request::{parse_path, KeyPredicate, KeyValue, Segment};
//!
//! let segments = parse_path("/Products(1)/Category").unwrap();
//! assert_eq!(segments.len(), 2);
//! assert_eq!(segments[0].identifier(), "Products");
//! assert_eq!(
//!     segments[0].key(),
//!     Some(&KeyPredicate::Single(KeyValue::Integer(1)))
//! );
//!
//! let segment: Segment = "Customers('O''Neil')".parse().unwrap();
//! assert_eq!(segment.to_string(), "Customers('O''Neil')");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

/// Identifier of the trailing count segment.
pub const COUNT_SEGMENT: &str = "$count";

/// A single key value inside a key predicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum KeyValue {
    /// An integer literal such as `42`.
    Integer(i64),
    /// A quoted string literal such as `'ALFKI'` (stored unescaped).
    Text(String),
    /// Any other bare literal (GUIDs, decimals, dates), stored verbatim.
    Literal(String),
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "'{}'", value.replace('\'', "''")),
            Self::Literal(value) => f.write_str(value),
        }
    }
}

/// The key part of a segment, e.g. the `(1)` in `Products(1)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum KeyPredicate {
    /// A single unnamed key value.
    Single(KeyValue),
    /// Named key values in the order they were written.
    Composite(Vec<(String, KeyValue)>),
}

impl KeyPredicate {
    /// Returns the key property names, or `None` for an unnamed single value.
    #[must_use]
    pub fn names(&self) -> Option<Vec<&str>> {
        match self {
            Self::Single(_) => None,
            Self::Composite(parts) => Some(parts.iter().map(|(name, _)| name.as_str()).collect()),
        }
    }
}

impl fmt::Display for KeyPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(value) => write!(f, "({value})"),
            Self::Composite(parts) => {
                f.write_str("(")?;
                for (i, (name, value)) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{name}={value}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// One element of a request path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Segment {
    identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<KeyPredicate>,
    navigation: bool,
}

impl Segment {
    /// Creates a segment without key or navigation indicator.
    #[must_use]
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            key: None,
            navigation: false,
        }
    }

    /// Creates the trailing `$count` segment.
    #[must_use]
    pub fn count() -> Self {
        Self::new(COUNT_SEGMENT)
    }

    /// Attaches a key predicate.
    #[must_use]
    pub fn with_key(mut self, key: KeyPredicate) -> Self {
        self.key = Some(key);
        self
    }

    /// Marks the segment as an explicit navigation step.
    ///
    /// The resolver then rejects the segment unless it names a navigation
    /// property.
    #[must_use]
    pub const fn as_navigation(mut self) -> Self {
        self.navigation = true;
        self
    }

    /// Returns the raw identifier.
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Returns the key predicate, if any.
    #[must_use]
    pub const fn key(&self) -> Option<&KeyPredicate> {
        self.key.as_ref()
    }

    /// Returns `true` if the segment carries the navigation indicator.
    #[must_use]
    pub const fn is_navigation(&self) -> bool {
        self.navigation
    }

    /// Returns `true` for the `$count` segment.
    #[must_use]
    pub fn is_count(&self) -> bool {
        self.identifier == COUNT_SEGMENT
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identifier)?;
        if let Some(key) = &self.key {
            write!(f, "{key}")?;
        }
        Ok(())
    }
}

/// Errors produced while parsing segment text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SegmentParseError {
    /// The segment text is empty.
    #[error("Segment is empty")]
    Empty,

    /// Parentheses are missing, unbalanced, or followed by trailing text.
    #[error("Segment '{segment}' has unbalanced parentheses")]
    UnbalancedParentheses {
        /// The offending segment text.
        segment: String,
    },

    /// The identifier part is empty or contains reserved characters.
    #[error("Segment '{segment}' has an invalid identifier")]
    InvalidIdentifier {
        /// The offending segment text.
        segment: String,
    },

    /// The key predicate is empty, e.g. `Products()`.
    #[error("Segment '{segment}' has an empty key predicate")]
    EmptyKey {
        /// The offending segment text.
        segment: String,
    },

    /// A key value could not be read.
    #[error("Segment '{segment}' has an invalid key value '{value}'")]
    InvalidKeyValue {
        /// The offending segment text.
        segment: String,
        /// The unreadable value.
        value: String,
    },

    /// Named and unnamed key values are mixed, or a single value is named twice.
    #[error("Segment '{segment}' mixes named and unnamed key values")]
    MixedKeyForm {
        /// The offending segment text.
        segment: String,
    },

    /// The segment is not valid percent-encoded UTF-8.
    #[error("Segment '{segment}' is not valid percent-encoded UTF-8")]
    InvalidEncoding {
        /// The offending raw segment text.
        segment: String,
    },
}

impl FromStr for Segment {
    type Err = SegmentParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SegmentParseError::Empty);
        }

        let Some(open) = text.find('(') else {
            if text.contains([')', '\'', ',', '=']) {
                return Err(SegmentParseError::InvalidIdentifier {
                    segment: text.to_string(),
                });
            }
            return Ok(Self::new(text));
        };

        let identifier = &text[..open];
        if identifier.is_empty() || identifier.contains([')', '\'', ',', '=']) {
            return Err(SegmentParseError::InvalidIdentifier {
                segment: text.to_string(),
            });
        }

        let Some(inner) = text[open + 1..].strip_suffix(')') else {
            return Err(SegmentParseError::UnbalancedParentheses {
                segment: text.to_string(),
            });
        };

        let key = parse_key(text, inner)?;
        Ok(Self::new(identifier).with_key(key))
    }
}

/// Splits a raw path into segments, percent-decoding each one.
///
/// Empty parts (leading, trailing, or doubled `/`) are ignored.
///
/// # Errors
///
/// Returns a [`SegmentParseError`] for the first part that cannot be decoded
/// or parsed.
pub fn parse_path(path: &str) -> Result<Vec<Segment>, SegmentParseError> {
    path.split('/')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let decoded =
                urlencoding::decode(part).map_err(|_| SegmentParseError::InvalidEncoding {
                    segment: part.to_string(),
                })?;
            decoded.parse()
        })
        .collect()
}

fn parse_key(segment: &str, inner: &str) -> Result<KeyPredicate, SegmentParseError> {
    if inner.trim().is_empty() {
        return Err(SegmentParseError::EmptyKey {
            segment: segment.to_string(),
        });
    }

    let parts = split_top_level(segment, inner)?;

    // A lone unnamed value is the common case.
    if let [only] = parts.as_slice() {
        if find_unquoted(only, '=').is_none() {
            return parse_value(segment, only).map(KeyPredicate::Single);
        }
    }

    let mut named: Vec<(String, KeyValue)> = Vec::with_capacity(parts.len());
    for part in parts {
        let Some(eq) = find_unquoted(part, '=') else {
            return Err(SegmentParseError::MixedKeyForm {
                segment: segment.to_string(),
            });
        };
        let name = part[..eq].trim();
        if name.is_empty() || named.iter().any(|(existing, _)| existing == name) {
            return Err(SegmentParseError::MixedKeyForm {
                segment: segment.to_string(),
            });
        }
        let value = parse_value(segment, &part[eq + 1..])?;
        named.push((name.to_string(), value));
    }

    Ok(KeyPredicate::Composite(named))
}

// Splits on commas that are not inside a quoted literal.
fn split_top_level<'a>(segment: &str, inner: &'a str) -> Result<Vec<&'a str>, SegmentParseError> {
    let mut parts = Vec::new();
    let mut in_quote = false;
    let mut start = 0;

    for (i, c) in inner.char_indices() {
        match c {
            '\'' => in_quote = !in_quote,
            ',' if !in_quote => {
                parts.push(&inner[start..i]);
                start = i + 1;
            }
            '(' | ')' if !in_quote => {
                return Err(SegmentParseError::UnbalancedParentheses {
                    segment: segment.to_string(),
                });
            }
            _ => {}
        }
    }

    if in_quote {
        return Err(SegmentParseError::InvalidKeyValue {
            segment: segment.to_string(),
            value: inner.to_string(),
        });
    }

    parts.push(&inner[start..]);
    Ok(parts)
}

fn find_unquoted(text: &str, needle: char) -> Option<usize> {
    let mut in_quote = false;
    for (i, c) in text.char_indices() {
        if c == '\'' {
            in_quote = !in_quote;
        } else if c == needle && !in_quote {
            return Some(i);
        }
    }
    None
}

fn parse_value(segment: &str, raw: &str) -> Result<KeyValue, SegmentParseError> {
    let raw = raw.trim();
    let invalid = || SegmentParseError::InvalidKeyValue {
        segment: segment.to_string(),
        value: raw.to_string(),
    };

    if let Some(quoted) = raw.strip_prefix('\'') {
        let body = quoted.strip_suffix('\'').ok_or_else(invalid)?;
        // Inside the literal every quote must be doubled.
        if body.replace("''", "").contains('\'') {
            return Err(invalid());
        }
        return Ok(KeyValue::Text(body.replace("''", "'")));
    }

    if raw.is_empty() {
        return Err(invalid());
    }

    if let Ok(value) = raw.parse::<i64>() {
        return Ok(KeyValue::Integer(value));
    }

    let literal_chars = raw
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | ':' | '_' | '+'));
    if literal_chars {
        Ok(KeyValue::Literal(raw.to_string()))
    } else {
        Err(invalid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_plain_identifier() {
        let segment: Segment = "Products".parse().unwrap();
        assert_eq!(segment.identifier(), "Products");
        assert!(segment.key().is_none());
        assert!(!segment.is_navigation());
        assert!(!segment.is_count());
    }

    #[test]
    fn test_parses_count_segment() {
        let segment: Segment = "$count".parse().unwrap();
        assert!(segment.is_count());
        assert_eq!(segment, Segment::count());
    }

    #[test]
    fn test_parses_integer_and_string_keys() {
        let segment: Segment = "Products(42)".parse().unwrap();
        assert_eq!(
            segment.key(),
            Some(&KeyPredicate::Single(KeyValue::Integer(42)))
        );

        let segment: Segment = "Customers('O''Neil')".parse().unwrap();
        assert_eq!(
            segment.key(),
            Some(&KeyPredicate::Single(KeyValue::Text("O'Neil".to_string())))
        );
    }

    #[test]
    fn test_parses_literal_key() {
        let segment: Segment = "Sessions(6f9619ff-8b86-d011-b42d-00c04fc964ff)"
            .parse()
            .unwrap();
        assert!(matches!(
            segment.key(),
            Some(KeyPredicate::Single(KeyValue::Literal(_)))
        ));
    }

    #[test]
    fn test_parses_composite_key() {
        let segment: Segment = "Lines(Order=1, Nr='a,b')".parse().unwrap();
        assert_eq!(
            segment.key(),
            Some(&KeyPredicate::Composite(vec![
                ("Order".to_string(), KeyValue::Integer(1)),
                ("Nr".to_string(), KeyValue::Text("a,b".to_string())),
            ]))
        );
        assert_eq!(segment.key().unwrap().names(), Some(vec!["Order", "Nr"]));
    }

    #[test]
    fn test_rejects_malformed_segments() {
        assert_eq!("".parse::<Segment>(), Err(SegmentParseError::Empty));
        assert!(matches!(
            "Products(1".parse::<Segment>(),
            Err(SegmentParseError::UnbalancedParentheses { .. })
        ));
        assert!(matches!(
            "Products()".parse::<Segment>(),
            Err(SegmentParseError::EmptyKey { .. })
        ));
        assert!(matches!(
            "(1)".parse::<Segment>(),
            Err(SegmentParseError::InvalidIdentifier { .. })
        ));
        assert!(matches!(
            "Products('abc)".parse::<Segment>(),
            Err(SegmentParseError::InvalidKeyValue { .. })
        ));
        assert!(matches!(
            "Lines(1,Nr=2)".parse::<Segment>(),
            Err(SegmentParseError::MixedKeyForm { .. })
        ));
        assert!(matches!(
            "Lines(Nr=1,Nr=2)".parse::<Segment>(),
            Err(SegmentParseError::MixedKeyForm { .. })
        ));
        assert!(matches!(
            "Products(a b)".parse::<Segment>(),
            Err(SegmentParseError::InvalidKeyValue { .. })
        ));
    }

    #[test]
    fn test_display_matches_text_form() {
        for text in ["Products", "Products(1)", "Lines(Order=1,Nr='x')", "$count"] {
            let segment: Segment = text.parse().unwrap();
            assert_eq!(segment.to_string(), text);
        }
    }

    #[test]
    fn test_parse_path_skips_empty_parts_and_decodes() {
        let segments = parse_path("/Customers('A%20B')//Orders/").unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(
            segments[0].key(),
            Some(&KeyPredicate::Single(KeyValue::Text("A B".to_string())))
        );
        assert_eq!(segments[1].identifier(), "Orders");

        assert!(parse_path("").unwrap().is_empty());
    }

    #[test]
    fn test_navigation_indicator() {
        let segment = Segment::new("Category").as_navigation();
        assert!(segment.is_navigation());
    }
}
