//! Configuration error types.
//!
//! This module contains the error type used when building a
//! [`ServiceConfig`](crate::ServiceConfig) or validating the identifiers and
//! URLs it holds.
//!
//! # Error Handling
//!
//! All configuration constructors return `Result<T, ConfigError>` to enable
//! fail-fast validation. Error messages are designed to be clear and actionable.
//!
//! # Example
//!
//! ```rust
//! use resource_query::{ConfigError, Identifier};
//!
//! let result = Identifier::new("");
//! assert!(matches!(result, Err(ConfigError::EmptyIdentifier)));
//! ```

use thiserror::Error;

/// Errors that can occur while configuring the request pipeline.
///
/// Each variant provides a clear, actionable error message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An identifier cannot be empty.
    #[error("Identifier cannot be empty. Schema names must contain at least one character.")]
    EmptyIdentifier,

    /// An identifier contains characters outside the allowed set.
    #[error("Invalid identifier '{value}'. Expected a letter or '_' followed by letters, digits, '_' or '.'.")]
    InvalidIdentifier {
        /// The invalid identifier that was provided.
        value: String,
    },

    /// A numeric limit was set to a value the pipeline cannot honor.
    #[error("Invalid limit for '{field}': {value}. Limits must be at least 1.")]
    InvalidLimit {
        /// The name of the limit.
        field: &'static str,
        /// The rejected value.
        value: usize,
    },

    /// The service root URL is invalid.
    #[error("Invalid service root '{url}'. Please provide an absolute URL with scheme (e.g., 'https://example.com/service').")]
    InvalidServiceRoot {
        /// The invalid URL that was provided.
        url: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_identifier_error_message() {
        let message = ConfigError::EmptyIdentifier.to_string();
        assert!(message.contains("cannot be empty"));
    }

    #[test]
    fn test_invalid_identifier_error_message() {
        let error = ConfigError::InvalidIdentifier {
            value: "9lives".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("9lives"));
        assert!(message.contains("Expected a letter"));
    }

    #[test]
    fn test_invalid_limit_error_message() {
        let error = ConfigError::InvalidLimit {
            field: "max_segments",
            value: 0,
        };
        let message = error.to_string();
        assert!(message.contains("max_segments"));
        assert!(message.contains("at least 1"));
    }

    #[test]
    fn test_error_implements_std_error() {
        let error = ConfigError::EmptyIdentifier;
        let _: &dyn std::error::Error = &error;
    }
}
