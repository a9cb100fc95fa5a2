//! Dispatch states and host cancellation.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

/// A stage of the single-pass dispatch machine.
///
/// A request moves `Resolving → Validating → Invoking → Materializing → Done`
/// and may stop in `Errored` from any stage. No stage is re-entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchState {
    /// Segments are being resolved into a target chain.
    Resolving,
    /// The count directive and projection are being checked.
    Validating,
    /// The data source is being called.
    Invoking,
    /// Rows are being shaped into a response.
    Materializing,
    /// A response was produced.
    Done,
    /// The request failed.
    Errored,
}

impl DispatchState {
    /// Returns the state name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Resolving => "resolving",
            Self::Validating => "validating",
            Self::Invoking => "invoking",
            Self::Materializing => "materializing",
            Self::Done => "done",
            Self::Errored => "errored",
        }
    }

    /// Returns `true` for `Done` and `Errored`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Errored)
    }
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cancellation signal shared between a host and a dispatch.
///
/// The dispatcher checks the flag only when moving between states, so a
/// cancelled request never exposes a partially materialized response.
///
/// # Example
///
/// ```rust
/// use resource_query::dispatch::CancellationFlag;
///
/// let flag = CancellationFlag::new();
/// let host_side = flag.clone();
/// assert!(!flag.is_cancelled());
///
/// host_side.cancel();
/// assert!(flag.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancellationFlag {
    /// Creates a flag that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called on any clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
