//! Request dispatch.
//!
//! This module provides:
//!
//! - **[`RequestDispatcher`]**: runs a [`Request`] through resolution, validation,
//!   data access and materialization
//! - **[`DataSource`]** / **[`DataRequest`]**: the data-access collaborator and what it is asked for
//! - **[`Response`]** / **[`ResponsePayload`]**: the shaped result handed back to the host
//! - **[`DispatchState`]** / **[`CancellationFlag`]**: the stages of a dispatch and host cancellation
//! - **[`ProcessingError`]**: every failure kind, with its status and stage

mod dispatcher;
mod errors;
mod response;
mod source;
mod state;

pub use dispatcher::{PreparedRequest, Request, RequestDispatcher};
pub use errors::ProcessingError;
pub use response::{Response, ResponsePayload};
pub use source::{DataRequest, DataSource, DataSourceError, PAGING_OPTIONS};
pub use state::{CancellationFlag, DispatchState};
