//! Error taxonomy of the dispatch pipeline.
//!
//! Every failure a request can hit converges on [`ProcessingError`], which
//! keeps the originating kind intact and tells the host how to report it.

use thiserror::Error;

use super::source::DataSourceError;
use super::state::DispatchState;
use crate::projection::{ProjectionFailure, ProjectionTypeMismatch};
use crate::query::{CountPolicyError, ProjectionValidationError, QueryOptionError};
use crate::request::{SegmentParseError, TargetResolutionError};

/// Why a request could not be processed.
///
/// # Example
///
/// ```rust
/// use resource_query::dispatch::{DispatchState, ProcessingError};
/// use resource_query::query::CountPolicyError;
///
/// let error = ProcessingError::from(CountPolicyError::Conflicting);
/// assert!(error.is_client_error());
/// assert_eq!(error.status_code(), 400);
/// assert_eq!(error.phase(), DispatchState::Validating);
/// ```
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// The path contains an illegal segment transition.
    #[error(transparent)]
    TargetResolution(#[from] TargetResolutionError),

    /// The count directive is illegal or conflicting.
    #[error(transparent)]
    CountPolicy(#[from] CountPolicyError),

    /// `$select` names a property the target type does not declare.
    #[error(transparent)]
    ProjectionValidation(#[from] ProjectionValidationError),

    /// A row reported a type other than the one the projection was validated for.
    #[error(transparent)]
    ProjectionTypeMismatch(#[from] ProjectionTypeMismatch),

    /// Query option text is malformed.
    #[error("Invalid query option: {0}")]
    InvalidQueryOption(#[from] QueryOptionError),

    /// Path text could not be split into segments.
    #[error("Malformed request path: {0}")]
    MalformedPath(#[from] SegmentParseError),

    /// A keyed single-item target matched no row, or the data source
    /// reported a keyed resource on the chain as missing.
    #[error("No resource found at '{target}'")]
    NotFound {
        /// The target in path form.
        target: String,
    },

    /// The data source failed.
    #[error("Data source failed: {0}")]
    DataSource(#[from] DataSourceError),

    /// A single-item target produced more than one row.
    #[error("Expected at most one row for '{target}', but the data source returned {rows}")]
    UnexpectedRowCount {
        /// The target in path form.
        target: String,
        /// The number of rows returned.
        rows: usize,
    },

    /// A row could not supply a property the projection selected.
    #[error("Row of type '{type_name}' did not supply selected property '{property}'")]
    ProjectedPropertyUnavailable {
        /// The selected property.
        property: String,
        /// The row's type name.
        type_name: String,
    },

    /// A full row could not be rendered as JSON.
    #[error("Failed to serialize row: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The host cancelled the request.
    #[error("Request was cancelled after the {state} stage")]
    Cancelled {
        /// The last stage that completed or was entered.
        state: DispatchState,
    },
}

impl ProcessingError {
    /// Returns `true` if the request itself is at fault.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::TargetResolution(_)
                | Self::CountPolicy(_)
                | Self::ProjectionValidation(_)
                | Self::InvalidQueryOption(_)
                | Self::MalformedPath(_)
                | Self::NotFound { .. }
        )
    }

    /// Returns the transport status a host should report.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Cancelled { .. } => 499,
            _ if self.is_client_error() => 400,
            _ => 500,
        }
    }

    /// Returns the dispatch stage this kind of failure is raised in.
    #[must_use]
    pub const fn phase(&self) -> DispatchState {
        match self {
            Self::TargetResolution(_) | Self::MalformedPath(_) => DispatchState::Resolving,
            Self::CountPolicy(_) | Self::ProjectionValidation(_) | Self::InvalidQueryOption(_) => {
                DispatchState::Validating
            }
            Self::DataSource(_) => DispatchState::Invoking,
            Self::NotFound { .. }
            | Self::UnexpectedRowCount { .. }
            | Self::ProjectionTypeMismatch(_)
            | Self::ProjectedPropertyUnavailable { .. }
            | Self::Serialization(_) => DispatchState::Materializing,
            Self::Cancelled { state } => *state,
        }
    }
}

impl From<ProjectionFailure> for ProcessingError {
    fn from(failure: ProjectionFailure) -> Self {
        match failure {
            ProjectionFailure::TypeMismatch(mismatch) => Self::ProjectionTypeMismatch(mismatch),
            ProjectionFailure::PropertyUnavailable {
                property,
                type_name,
            } => Self::ProjectedPropertyUnavailable {
                property,
                type_name,
            },
        }
    }
}
