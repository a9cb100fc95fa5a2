//! Request path handling.
//!
//! This module provides:
//!
//! - **[`Segment`]**: one already-split path element, with [`parse_path`] for raw paths
//! - **[`TargetSource`]** and **[`ResolvedTarget`]**: what a resolved node refers to
//! - **[`TargetChain`]**: the owned, index-linked chain of resolved nodes
//! - **[`RequestTargetResolver`]**: the left-to-right segment walker
//! - **[`TargetResolutionError`]**: illegal transitions, with the offending segment index

mod resolver;
mod segment;
mod target;

pub use resolver::{RequestTargetResolver, ResolutionFailure, ResolvedRequest, TargetResolutionError};
pub use segment::{parse_path, KeyPredicate, KeyValue, Segment, SegmentParseError, COUNT_SEGMENT};
pub use target::{ResolvedTarget, TargetChain, TargetSource};
