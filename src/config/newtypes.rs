//! Validated newtype wrappers for configuration and schema values.
//!
//! This module provides type-safe wrappers around string values that validate
//! their contents on construction. Invalid values are rejected with clear error messages.

use crate::error::ConfigError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A validated schema identifier.
///
/// Entity sets, structured types, properties, and service operations are all
/// named by identifiers. An identifier starts with an ASCII letter or `_` and
/// continues with ASCII letters, digits, `_`, or `.` (for namespace-qualified
/// type names such as `Catalog.Product`).
///
/// # Example
///
/// ```rust
/// use resource_query::Identifier;
///
/// let name = Identifier::new("Catalog.Product").unwrap();
/// assert_eq!(name.as_ref(), "Catalog.Product");
///
/// assert!(Identifier::new("9Lives").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(String);

impl Identifier {
    /// Creates a new validated identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyIdentifier`] if the value is empty, or
    /// [`ConfigError::InvalidIdentifier`] if it contains disallowed characters.
    pub fn new(value: impl Into<String>) -> Result<Self, ConfigError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ConfigError::EmptyIdentifier);
        }
        if !Self::is_valid(&value) {
            return Err(ConfigError::InvalidIdentifier { value });
        }
        Ok(Self(value))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_valid(value: &str) -> bool {
        let mut chars = value.chars();
        let Some(first) = chars.next() else {
            return false;
        };
        if !(first.is_ascii_alphabetic() || first == '_') {
            return false;
        }
        if value.ends_with('.') {
            return false;
        }
        chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Identifier {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(de::Error::custom)
    }
}

/// A validated service root URL.
///
/// The service root is the absolute URL the resource paths are relative to.
/// It is echoed into response metadata so serializers can emit context URLs.
/// A trailing `/` is removed during normalization.
///
/// # Example
///
/// ```rust
/// use resource_query::ServiceRoot;
///
/// let root = ServiceRoot::new("https://example.com/catalog/").unwrap();
/// assert_eq!(root.as_ref(), "https://example.com/catalog");
/// assert_eq!(root.scheme(), "https");
/// assert_eq!(root.host_name(), "example.com");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceRoot {
    url: String,
    scheme_end: usize,
    host_start: usize,
    host_end: usize,
}

impl ServiceRoot {
    /// Creates a new validated service root.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidServiceRoot`] if the URL is not an
    /// absolute `http` or `https` URL with a host.
    pub fn new(url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into();
        let url = url.trim().trim_end_matches('/').to_string();

        let scheme_end = url
            .find("://")
            .ok_or_else(|| ConfigError::InvalidServiceRoot { url: url.clone() })?;

        let scheme = &url[..scheme_end];
        if !scheme.eq_ignore_ascii_case("http") && !scheme.eq_ignore_ascii_case("https") {
            return Err(ConfigError::InvalidServiceRoot { url });
        }

        let host_start = scheme_end + 3;
        let remainder = url.get(host_start..).unwrap_or_default();
        let host_end = remainder
            .find([':', '/', '?', '#'])
            .map_or(url.len(), |i| host_start + i);

        if host_end <= host_start {
            return Err(ConfigError::InvalidServiceRoot { url });
        }
        if url.contains(['?', '#']) {
            return Err(ConfigError::InvalidServiceRoot { url });
        }

        Ok(Self {
            url,
            scheme_end,
            host_start,
            host_end,
        })
    }

    /// Returns the URL scheme (e.g., "https").
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.url[..self.scheme_end]
    }

    /// Returns the host name portion of the URL.
    #[must_use]
    pub fn host_name(&self) -> &str {
        &self.url[self.host_start..self.host_end]
    }

    /// Returns the metadata context URL for the given element type.
    ///
    /// ```rust
    /// use resource_query::ServiceRoot;
    ///
    /// let root = ServiceRoot::new("https://example.com/svc").unwrap();
    /// assert_eq!(
    ///     root.context_url("Catalog.Product"),
    ///     "https://example.com/svc/$metadata#Catalog.Product"
    /// );
    /// ```
    #[must_use]
    pub fn context_url(&self, fragment: &str) -> String {
        if fragment.is_empty() {
            format!("{}/$metadata", self.url)
        } else {
            format!("{}/$metadata#{fragment}", self.url)
        }
    }
}

impl AsRef<str> for ServiceRoot {
    fn as_ref(&self) -> &str {
        &self.url
    }
}
