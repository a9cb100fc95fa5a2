//! The data-access collaborator.
//!
//! The dispatcher calls a [`DataSource`] exactly once per request, after
//! resolution and validation have succeeded. The [`DataRequest`] it receives
//! carries everything that can be pushed down to the store: the resolved
//! chain, the count policy, the selected columns and the opaque options the
//! pipeline does not interpret.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use super::dispatcher::PreparedRequest;
use crate::projection::ProjectedResult;
use crate::query::{CountPolicy, ProjectionSpec};
use crate::request::{ResolvedTarget, TargetChain};

/// Paging options a count must not be narrowed by.
pub const PAGING_OPTIONS: [&str; 2] = ["$top", "$skip"];

/// A failure reported by a data source.
///
/// A source that finds a keyed resource on the request's chain missing
/// reports it with [`DataSourceError::not_found`]; the dispatcher turns that
/// into a not-found response instead of a server fault.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct DataSourceError {
    message: String,
    not_found: bool,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl DataSourceError {
    /// Creates an error with a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            not_found: false,
            source: None,
        }
    }

    /// Creates an error stating that an addressed resource does not exist.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            not_found: true,
            ..Self::new(message)
        }
    }

    /// Attaches the underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns `true` if an addressed resource does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        self.not_found
    }
}

/// What a data source is asked to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRequest {
    chain: TargetChain,
    count: CountPolicy,
    projection: Option<ProjectionSpec>,
    extra: BTreeMap<String, String>,
}

impl DataRequest {
    /// Returns the resolved chain.
    #[must_use]
    pub const fn chain(&self) -> &TargetChain {
        &self.chain
    }

    /// Returns the terminal node the rows must describe.
    #[must_use]
    pub fn target(&self) -> &ResolvedTarget {
        self.chain.terminal()
    }

    /// Returns the count policy.
    #[must_use]
    pub const fn count_policy(&self) -> CountPolicy {
        self.count
    }

    /// Returns the validated projection, if `$select` was supplied.
    #[must_use]
    pub const fn projection(&self) -> Option<&ProjectionSpec> {
        self.projection.as_ref()
    }

    /// Returns the only columns the response will read, if restricted.
    #[must_use]
    pub fn selected_columns(&self) -> Option<&[String]> {
        self.projection.as_ref().map(ProjectionSpec::names)
    }

    /// Returns query options the pipeline passes through uninterpreted.
    #[must_use]
    pub const fn extra(&self) -> &BTreeMap<String, String> {
        &self.extra
    }

    /// Returns a copy of this request with `$top` and `$skip` removed.
    #[must_use]
    pub fn without_paging(&self) -> Self {
        let mut request = self.clone();
        request
            .extra
            .retain(|name, _| !PAGING_OPTIONS.contains(&name.as_str()));
        request
    }
}

impl From<PreparedRequest> for DataRequest {
    fn from(prepared: PreparedRequest) -> Self {
        Self {
            chain: prepared.chain,
            count: prepared.count,
            projection: prepared.projection,
            extra: prepared.extra,
        }
    }
}

/// Executes resolved requests against a store.
///
/// Rows must describe the terminal target of the request. For a
/// single-item target a source returns at most one row.
///
/// # Example
///
/// ```rust
/// use resource_query::dispatch::{DataRequest, DataSource, DataSourceError};
/// use resource_query::projection::JsonResource;
///
/// struct Empty;
///
/// impl DataSource for Empty {
///     type Row = JsonResource;
///
///     async fn fetch(&self, _request: &DataRequest) -> Result<Vec<JsonResource>, DataSourceError> {
///         Ok(Vec::new())
///     }
/// }
/// ```
#[allow(async_fn_in_trait)]
pub trait DataSource: Send + Sync {
    /// The row type this source produces.
    type Row: ProjectedResult + Serialize + Send;

    /// Produces the rows of the request's terminal target.
    ///
    /// # Errors
    ///
    /// Returns a [`DataSourceError`] if the store cannot serve the request.
    async fn fetch(&self, request: &DataRequest) -> Result<Vec<Self::Row>, DataSourceError>;

    /// Counts the elements of the request's terminal collection.
    ///
    /// Used for both `$count=true` and a `$count` segment. The count covers
    /// the whole collection; `$top` and `$skip` do not narrow it. The default
    /// fetches the rows of [`DataRequest::without_paging`] and counts them.
    ///
    /// # Errors
    ///
    /// Returns a [`DataSourceError`] if the store cannot serve the request.
    async fn count(&self, request: &DataRequest) -> Result<u64, DataSourceError> {
        let rows = self.fetch(&request.without_paging()).await?;
        Ok(u64::try_from(rows.len()).unwrap_or(u64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_keeps_source() {
        use std::error::Error as _;

        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "store timed out");
        let err = DataSourceError::new("query failed").with_source(io);
        assert_eq!(err.to_string(), "query failed");
        assert_eq!(err.message(), "query failed");
        assert!(err.source().is_some());
        assert!(DataSourceError::new("plain").source().is_none());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_not_found_error() {
        let err = DataSourceError::not_found("no product 999");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "no product 999");
    }

    #[test]
    fn test_without_paging_keeps_other_options() {
        let request = DataRequest {
            chain: TargetChain::root(),
            count: CountPolicy::CountQuery,
            projection: None,
            extra: [("$top", "2"), ("$skip", "4"), ("$filter", "Price gt 20")]
                .into_iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        };

        let unpaged = request.without_paging();
        assert_eq!(unpaged.extra().len(), 1);
        assert_eq!(
            unpaged.extra().get("$filter").map(String::as_str),
            Some("Price gt 20")
        );
        assert_eq!(unpaged.count_policy(), CountPolicy::CountQuery);
        assert_eq!(request.extra().len(), 3);
    }
}
