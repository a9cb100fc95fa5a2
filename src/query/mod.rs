//! Query shaping: option text, count policy, and projection.
//!
//! - **[`QueryOptions`]**: raw option text split into `$count`, `$select` and opaque extras
//! - **[`CountPolicy`]**: the single count directive of a request
//! - **[`SelectList`]** / **[`ProjectionSpec`]**: parsed and validated `$select` names

mod count;
mod options;
mod select;

pub use count::{CountPolicy, CountPolicyError};
pub use options::{QueryOptionError, QueryOptions, COUNT_OPTION, SELECT_OPTION};
pub use select::{ProjectionSpec, ProjectionValidationError, SelectList};
