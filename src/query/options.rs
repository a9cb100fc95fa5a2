//! Raw query option handling.
//!
//! [`QueryOptions`] holds the option text the host extracted from the request
//! URL. Only `$count` and `$select` are interpreted by the pipeline; every
//! other option is carried verbatim to the data source as an opaque hint.

use std::collections::BTreeMap;

use thiserror::Error;

/// Name of the count query option.
pub const COUNT_OPTION: &str = "$count";

/// Name of the projection query option.
pub const SELECT_OPTION: &str = "$select";

/// Malformed query option text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryOptionError {
    /// The same option was supplied more than once.
    #[error("Query option '{option}' is specified more than once")]
    Duplicate {
        /// The repeated option name.
        option: String,
    },

    /// A `name=value` pair has no name.
    #[error("Query option pair '{pair}' has no name")]
    MissingName {
        /// The offending pair text.
        pair: String,
    },

    /// Option text is not valid percent-encoded UTF-8.
    #[error("Query option text '{text}' is not valid percent-encoded UTF-8")]
    InvalidEncoding {
        /// The offending raw text.
        text: String,
    },

    /// A `$select` list contains an empty item.
    #[error("$select contains an empty item")]
    EmptySelectItem,

    /// A `$select` list is longer than the configured limit.
    #[error("$select lists more than {limit} properties")]
    TooManySelectItems {
        /// The configured limit.
        limit: usize,
    },
}

/// The query options of one request.
///
/// # Example
///
/// ```rust
/// use resource_query::query::QueryOptions;
///
/// let options = QueryOptions::parse("$count=true&$select=Name,%20Price&$top=5").unwrap();
/// assert_eq!(options.count(), Some("true"));
/// assert_eq!(options.select(), Some("Name, Price"));
/// assert_eq!(options.extra().get("$top").map(String::as_str), Some("5"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    count: Option<String>,
    select: Option<String>,
    extra: BTreeMap<String, String>,
}

impl QueryOptions {
    /// Creates an empty option set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `&`-separated `name=value` pairs, percent-decoding both parts.
    ///
    /// A leading `?` is ignored, as are empty pairs. A pair without `=` is an
    /// option with an empty value.
    ///
    /// # Errors
    ///
    /// Returns a [`QueryOptionError`] for undecodable text, nameless pairs,
    /// or repeated options.
    pub fn parse(raw: &str) -> Result<Self, QueryOptionError> {
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        let mut pairs = Vec::new();

        for pair in raw.split('&').filter(|pair| !pair.is_empty()) {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            let name = decode(name)?;
            if name.trim().is_empty() {
                return Err(QueryOptionError::MissingName {
                    pair: pair.to_string(),
                });
            }
            pairs.push((name, decode(value)?));
        }

        Self::from_pairs(pairs)
    }

    /// Builds an option set from already decoded pairs.
    ///
    /// # Errors
    ///
    /// Returns [`QueryOptionError::Duplicate`] if a name appears twice.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, QueryOptionError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut options = Self::default();
        for (name, value) in pairs {
            options.insert(name.into(), value.into())?;
        }
        Ok(options)
    }

    /// Sets the raw `$count` value.
    #[must_use]
    pub fn with_count(mut self, value: impl Into<String>) -> Self {
        self.count = Some(value.into());
        self
    }

    /// Sets the raw `$select` text.
    #[must_use]
    pub fn with_select(mut self, text: impl Into<String>) -> Self {
        self.select = Some(text.into());
        self
    }

    /// Returns the raw `$count` value, if supplied.
    #[must_use]
    pub fn count(&self) -> Option<&str> {
        self.count.as_deref()
    }

    /// Returns the raw `$select` text, if supplied.
    #[must_use]
    pub fn select(&self) -> Option<&str> {
        self.select.as_deref()
    }

    /// Returns every option the pipeline does not interpret.
    #[must_use]
    pub const fn extra(&self) -> &BTreeMap<String, String> {
        &self.extra
    }

    fn insert(&mut self, name: String, value: String) -> Result<(), QueryOptionError> {
        let slot = match name.as_str() {
            COUNT_OPTION => &mut self.count,
            SELECT_OPTION => &mut self.select,
            _ => {
                if self.extra.contains_key(&name) {
                    return Err(QueryOptionError::Duplicate { option: name });
                }
                self.extra.insert(name, value);
                return Ok(());
            }
        };

        if slot.is_some() {
            return Err(QueryOptionError::Duplicate { option: name });
        }
        *slot = Some(value);
        Ok(())
    }
}

fn decode(text: &str) -> Result<String, QueryOptionError> {
    let spaced = text.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => Ok(decoded.into_owned()),
        Err(_) => Err(QueryOptionError::InvalidEncoding {
            text: text.to_string(),
        }),
    }
}
