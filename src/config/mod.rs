//! Configuration types for the request pipeline.
//!
//! This module provides the configuration consulted while resolving and
//! shaping a request.
//!
//! # Overview
//!
//! The main types in this module are:
//!
//! - [`ServiceConfig`]: The configuration struct holding all pipeline limits and switches
//! - [`ServiceConfigBuilder`]: A builder for constructing [`ServiceConfig`] instances
//! - [`Identifier`]: A validated schema name
//! - [`ServiceRoot`]: A validated absolute service root URL
//!
//! # Example
//!
//! ```rust
//! use resource_query::{ServiceConfig, ServiceRoot};
//!
//! let config = ServiceConfig::builder()
//!     .service_root(ServiceRoot::new("https://example.com/catalog").unwrap())
//!     .max_segments(16)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.max_segments(), 16);
//! ```

mod newtypes;

pub use newtypes::{Identifier, ServiceRoot};

use crate::error::ConfigError;

/// Default maximum number of path segments in one request.
pub const DEFAULT_MAX_SEGMENTS: usize = 32;

/// Default maximum number of names in one `$select` list.
pub const DEFAULT_MAX_SELECT_ITEMS: usize = 64;

/// Configuration for the request pipeline.
///
/// # Thread Safety
///
/// `ServiceConfig` is `Clone`, `Send`, and `Sync`, so one instance can be
/// shared by every concurrently dispatched request.
///
/// # Example
///
/// ```rust
/// use resource_query::ServiceConfig;
///
/// let config = ServiceConfig::default();
/// assert!(config.count_operation_results());
/// assert!(config.service_root().is_none());
/// ```
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    max_segments: usize,
    max_select_items: usize,
    count_operation_results: bool,
    service_root: Option<ServiceRoot>,
}

impl ServiceConfig {
    /// Creates a new builder for constructing a `ServiceConfig`.
    #[must_use]
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::new()
    }

    /// Returns the maximum number of path segments a request may carry.
    #[must_use]
    pub const fn max_segments(&self) -> usize {
        self.max_segments
    }

    /// Returns the maximum number of names a `$select` list may carry.
    #[must_use]
    pub const fn max_select_items(&self) -> usize {
        self.max_select_items
    }

    /// Returns whether `$count` may target a collection produced by a
    /// service operation.
    #[must_use]
    pub const fn count_operation_results(&self) -> bool {
        self.count_operation_results
    }

    /// Returns the service root, if configured.
    #[must_use]
    pub const fn service_root(&self) -> Option<&ServiceRoot> {
        self.service_root.as_ref()
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_segments: DEFAULT_MAX_SEGMENTS,
            max_select_items: DEFAULT_MAX_SELECT_ITEMS,
            count_operation_results: true,
            service_root: None,
        }
    }
}

// Verify ServiceConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ServiceConfig>();
};

/// Builder for constructing [`ServiceConfig`] instances.
///
/// Every field is optional.
///
/// # Defaults
///
/// - `max_segments`: [`DEFAULT_MAX_SEGMENTS`]
/// - `max_select_items`: [`DEFAULT_MAX_SELECT_ITEMS`]
/// - `count_operation_results`: `true`
/// - `service_root`: `None`
///
/// # Example
///
/// ```rust
/// use resource_query::ServiceConfig;
///
/// let config = ServiceConfig::builder()
///     .max_select_items(8)
///     .count_operation_results(false)
///     .build()
///     .unwrap();
///
/// assert_eq!(config.max_select_items(), 8);
/// assert!(!config.count_operation_results());
/// ```
#[derive(Debug, Default)]
pub struct ServiceConfigBuilder {
    max_segments: Option<usize>,
    max_select_items: Option<usize>,
    count_operation_results: Option<bool>,
    service_root: Option<ServiceRoot>,
}

impl ServiceConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of path segments per request.
    #[must_use]
    pub const fn max_segments(mut self, limit: usize) -> Self {
        self.max_segments = Some(limit);
        self
    }

    /// Sets the maximum number of names per `$select` list.
    #[must_use]
    pub const fn max_select_items(mut self, limit: usize) -> Self {
        self.max_select_items = Some(limit);
        self
    }

    /// Sets whether service-operation collections may be counted.
    #[must_use]
    pub const fn count_operation_results(mut self, allowed: bool) -> Self {
        self.count_operation_results = Some(allowed);
        self
    }

    /// Sets the service root echoed into response metadata.
    #[must_use]
    pub fn service_root(mut self, root: ServiceRoot) -> Self {
        self.service_root = Some(root);
        self
    }

    /// Builds the [`ServiceConfig`], validating the configured limits.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidLimit`] if a limit is zero.
    pub fn build(self) -> Result<ServiceConfig, ConfigError> {
        let max_segments = self.max_segments.unwrap_or(DEFAULT_MAX_SEGMENTS);
        if max_segments == 0 {
            return Err(ConfigError::InvalidLimit {
                field: "max_segments",
                value: max_segments,
            });
        }

        let max_select_items = self.max_select_items.unwrap_or(DEFAULT_MAX_SELECT_ITEMS);
        if max_select_items == 0 {
            return Err(ConfigError::InvalidLimit {
                field: "max_select_items",
                value: max_select_items,
            });
        }

        Ok(ServiceConfig {
            max_segments,
            max_select_items,
            count_operation_results: self.count_operation_results.unwrap_or(true),
            service_root: self.service_root,
        })
    }
}
