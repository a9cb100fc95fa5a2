//! # Resource Query
//!
//! Request-target resolution and query shaping for resource-oriented data
//! services. Given the path segments and query options of one request, this
//! crate determines what part of a modeled data graph the request addresses,
//! enforces `$count` and `$select` semantics, calls a data source once, and
//! produces a response payload for the host to serialize.
//!
//! ## Overview
//!
//! This crate provides:
//! - Type-safe configuration via [`ServiceConfig`] and [`ServiceConfigBuilder`]
//! - An in-memory schema via [`schema::ServiceSchema`], or any [`schema::SchemaProvider`]
//! - Segment parsing and target resolution via [`request::RequestTargetResolver`]
//! - Count and projection rules via [`query::CountPolicy`] and [`query::ProjectionSpec`]
//! - The [`projection::ProjectedResult`] capability for partial-field output
//! - The single-pass [`dispatch::RequestDispatcher`] over an async [`dispatch::DataSource`]
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use resource_query::dispatch::{DataRequest, DataSource, DataSourceError, Request, RequestDispatcher};
//! use resource_query::projection::JsonResource;
//! use resource_query::schema::{ServiceSchema, StructuredTypeBuilder};
//! use resource_query::{ServiceConfig, ServiceRoot};
//! use serde_json::json;
//!
//! struct Products;
//!
//! impl DataSource for Products {
//!     type Row = JsonResource;
//!
//!     async fn fetch(&self, _request: &DataRequest) -> Result<Vec<JsonResource>, DataSourceError> {
//!         Ok(vec![JsonResource::new("Catalog.Product")
//!             .with("Id", json!(1))
//!             .with("Name", json!("Lamp"))])
//!     }
//! }
//!
//! let schema = ServiceSchema::builder()
//!     .structured_type(
//!         StructuredTypeBuilder::entity("Catalog.Product")
//!             .key("Id")
//!             .property("Id", "Edm.Int32")
//!             .property("Name", "Edm.String"),
//!     )
//!     .entity_set("Products", "Catalog.Product")
//!     .build()
//!     .unwrap();
//!
//! let config = ServiceConfig::builder()
//!     .service_root(ServiceRoot::new("https://example.com/catalog").unwrap())
//!     .build()
//!     .unwrap();
//!
//! let dispatcher = RequestDispatcher::new(Arc::new(schema), Products, config);
//! let request = Request::parse("/Products", "$select=Name&$count=true").unwrap();
//! let response = tokio_test::block_on(dispatcher.dispatch(&request)).unwrap();
//!
//! assert_eq!(
//!     response.to_json(),
//!     json!({
//!         "@context": "https://example.com/catalog/$metadata#Collection(Catalog.Product)",
//!         "@count": 1,
//!         "value": [{ "Name": "Lamp" }]
//!     })
//! );
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: Configuration and schema are passed explicitly
//! - **Fail-fast validation**: Paths, counts and projections are checked before any data is fetched
//! - **Thread-safe**: Schemas are immutable and shared; every request owns its own state
//! - **No partial output**: A row that cannot be projected aborts the whole response

pub mod config;
pub mod dispatch;
pub mod error;
pub mod projection;
pub mod query;
pub mod request;
pub mod schema;

// Re-export public types at crate root for convenience
pub use config::{Identifier, ServiceConfig, ServiceConfigBuilder, ServiceRoot};
pub use error::ConfigError;

pub use dispatch::{
    DataRequest, DataSource, DataSourceError, ProcessingError, Request, RequestDispatcher,
    Response, ResponsePayload,
};
pub use projection::ProjectedResult;
pub use query::{CountPolicy, ProjectionSpec};
pub use request::{ResolvedTarget, TargetChain, TargetSource};
