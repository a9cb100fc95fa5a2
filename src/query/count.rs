//! Count semantics for a resolved request.
//!
//! A request carries at most one count directive: the `$count=true` query
//! option, or a trailing `$count` path segment. [`CountPolicy::enforce`]
//! checks the directive against the resolved terminal node and yields exactly
//! one [`CountPolicy`].
//!
//! # Example
//!
//! ```rust
//! use resource_query::query::{CountPolicy, CountPolicyError};
//! use resource_query::request::{parse_path, RequestTargetResolver};
//! use resource_query::schema::{ServiceSchema, StructuredTypeBuilder};
//! use resource_query::ServiceConfig;
//!
//! let schema = ServiceSchema::builder()
//!     .structured_type(
//!         StructuredTypeBuilder::entity("Catalog.Product")
//!             .key("Id")
//!             .property("Id", "Edm.Int32"),
//!     )
//!     .entity_set("Products", "Catalog.Product")
//!     .build()
//!     .unwrap();
//! let config = ServiceConfig::default();
//! let resolver = RequestTargetResolver::new(&schema, &config);
//!
//! let resolved = resolver.resolve(&parse_path("Products/$count").unwrap()).unwrap();
//! let policy = CountPolicy::enforce(&resolved.chain, resolved.count_segment, None, &config);
//! assert_eq!(policy, Ok(CountPolicy::CountSegment));
//!
//! let conflict = CountPolicy::enforce(&resolved.chain, true, Some("true"), &config);
//! assert_eq!(conflict, Err(CountPolicyError::Conflicting));
//! ```

use serde::Serialize;
use thiserror::Error;

use crate::config::ServiceConfig;
use crate::request::{TargetChain, TargetSource};

/// How counting interacts with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CountPolicy {
    /// No counting.
    #[default]
    None,
    /// `$count=true`: the element count is returned alongside the data.
    CountQuery,
    /// Trailing `$count` segment: the count is the sole scalar result.
    CountSegment,
}

/// An illegal or conflicting count directive.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CountPolicyError {
    /// Both a `$count` segment and `$count=true` were supplied.
    #[error("$count segment and $count=true cannot be combined")]
    Conflicting,

    /// A `$count` segment followed a single item.
    #[error("$count segment requires a collection, but '{target}' is a single item")]
    SegmentOnSingle {
        /// The counted target in path form.
        target: String,
    },

    /// `$count=true` was applied to a single item.
    #[error("$count=true requires a collection, but '{target}' is a single item")]
    QueryOnSingle {
        /// The counted target in path form.
        target: String,
    },

    /// `$count` had a value other than `true` or `false`.
    #[error("Invalid $count value '{value}'. Expected 'true' or 'false'.")]
    InvalidValue {
        /// The rejected value.
        value: String,
    },

    /// Counting a service-operation result is disabled by configuration.
    #[error("Counting the result of service operation '{operation}' is not enabled")]
    OperationResultNotCountable {
        /// The operation name.
        operation: String,
    },
}

impl CountPolicy {
    /// Validates the count directive of a request and selects its policy.
    ///
    /// `count_segment` reports whether the resolver consumed a trailing
    /// `$count` segment; `count_query` is the raw `$count` option value.
    /// `$count=false` is equivalent to an absent option.
    ///
    /// # Errors
    ///
    /// Returns a [`CountPolicyError`] if the directive is malformed, both
    /// forms are present, or the counted target is not a collection.
    pub fn enforce(
        chain: &TargetChain,
        count_segment: bool,
        count_query: Option<&str>,
        config: &ServiceConfig,
    ) -> Result<Self, CountPolicyError> {
        let count_query = parse_count_value(count_query)?;
        let terminal = chain.terminal();

        let policy = match (count_segment, count_query) {
            (true, true) => return Err(CountPolicyError::Conflicting),
            (true, false) => {
                if !terminal.is_collection() {
                    return Err(CountPolicyError::SegmentOnSingle {
                        target: chain.to_string(),
                    });
                }
                Self::CountSegment
            }
            (false, true) => {
                if !terminal.is_collection() {
                    return Err(CountPolicyError::QueryOnSingle {
                        target: chain.to_string(),
                    });
                }
                Self::CountQuery
            }
            (false, false) => Self::None,
        };

        if policy.is_counting() && !config.count_operation_results() {
            if let TargetSource::ServiceOperation { name } = terminal.source() {
                return Err(CountPolicyError::OperationResultNotCountable {
                    operation: name.clone(),
                });
            }
        }

        Ok(policy)
    }

    /// Returns `true` unless the policy is [`CountPolicy::None`].
    #[must_use]
    pub const fn is_counting(self) -> bool {
        !matches!(self, Self::None)
    }

    /// Returns the policy name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::CountQuery => "count_query",
            Self::CountSegment => "count_segment",
        }
    }
}

fn parse_count_value(raw: Option<&str>) -> Result<bool, CountPolicyError> {
    match raw.map(str::trim) {
        None => Ok(false),
        Some(value) if value.eq_ignore_ascii_case("true") => Ok(true),
        Some(value) if value.eq_ignore_ascii_case("false") => Ok(false),
        Some(value) => Err(CountPolicyError::InvalidValue {
            value: value.to_string(),
        }),
    }
}
