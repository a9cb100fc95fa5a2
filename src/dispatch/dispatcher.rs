//! The request dispatcher.
//!
//! [`RequestDispatcher`] runs one request through the single-pass machine
//! described by [`DispatchState`]: resolve the path, validate the count
//! directive and projection, call the data source, then shape the rows into
//! a [`Response`]. A `$count=true` request asks the source for the rows and
//! for the element count of the whole collection.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use resource_query::dispatch::{DataRequest, DataSource, DataSourceError, Request, RequestDispatcher, ResponsePayload};
//! use resource_query::projection::JsonResource;
//! use resource_query::schema::{ServiceSchema, StructuredTypeBuilder};
//! use resource_query::ServiceConfig;
//! use serde_json::json;
//!
//! struct Catalog;
//!
//! impl DataSource for Catalog {
//!     type Row = JsonResource;
//!
//!     async fn fetch(&self, _request: &DataRequest) -> Result<Vec<JsonResource>, DataSourceError> {
//!         Ok(vec![
//!             JsonResource::new("Catalog.Product").with("Id", json!(1)).with("Name", json!("Lamp")),
//!             JsonResource::new("Catalog.Product").with("Id", json!(2)).with("Name", json!("Desk")),
//!         ])
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
//! let dispatcher = RequestDispatcher::new(Arc::new(schema), Catalog, ServiceConfig::default());
//! let request = Request::parse("Products/$count", "").unwrap();
//!
//! let response = tokio_test::block_on(dispatcher.dispatch(&request)).unwrap();
//! assert_eq!(response.payload, ResponsePayload::Count(2));
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use super::errors::ProcessingError;
use super::response::{Response, ResponsePayload};
use super::source::{DataRequest, DataSource, DataSourceError};
use super::state::{CancellationFlag, DispatchState};
use crate::config::ServiceConfig;
use crate::projection::{materialize, project_row, ProjectedResult};
use crate::query::{CountPolicy, ProjectionSpec, QueryOptions, SelectList};
use crate::request::{parse_path, RequestTargetResolver, ResolvedRequest, Segment, TargetChain};
use crate::schema::SchemaProvider;

/// One incoming request: segments plus query options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    segments: Vec<Segment>,
    options: QueryOptions,
}

impl Request {
    /// Creates a request from already split segments.
    #[must_use]
    pub const fn new(segments: Vec<Segment>, options: QueryOptions) -> Self {
        Self { segments, options }
    }

    /// Creates a request from raw path and query text.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessingError::MalformedPath`] or
    /// [`ProcessingError::InvalidQueryOption`] if either text is malformed.
    pub fn parse(path: &str, query: &str) -> Result<Self, ProcessingError> {
        Ok(Self {
            segments: parse_path(path)?,
            options: QueryOptions::parse(query)?,
        })
    }

    /// Returns the path segments.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the query options.
    #[must_use]
    pub const fn options(&self) -> &QueryOptions {
        &self.options
    }
}

/// A request that passed resolution and validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    /// The resolved target chain.
    pub chain: TargetChain,
    /// The single count policy of the request.
    pub count: CountPolicy,
    /// The validated projection; `None` means all properties.
    pub projection: Option<ProjectionSpec>,
    /// Options passed through to the data source uninterpreted.
    pub extra: BTreeMap<String, String>,
}

enum Fetched<R> {
    ServiceDocument,
    Count(u64),
    Rows { rows: Vec<R>, total: Option<u64> },
}

/// Tracks the current state and enforces cancellation at boundaries.
struct Progress<'c> {
    state: DispatchState,
    cancel: &'c CancellationFlag,
}

impl<'c> Progress<'c> {
    const fn new(cancel: &'c CancellationFlag) -> Self {
        Self {
            state: DispatchState::Resolving,
            cancel,
        }
    }

    fn ensure_live(&self) -> Result<(), ProcessingError> {
        if self.cancel.is_cancelled() {
            return Err(ProcessingError::Cancelled { state: self.state });
        }
        Ok(())
    }

    fn advance(&mut self, next: DispatchState) -> Result<(), ProcessingError> {
        if next != DispatchState::Done {
            self.ensure_live()?;
        }
        tracing::debug!(from = %self.state, to = %next, "Dispatch state transition");
        self.state = next;
        Ok(())
    }

    fn fail(&mut self, error: ProcessingError) -> ProcessingError {
        if error.is_client_error() {
            tracing::debug!(state = %self.state, error = %error, "Request rejected");
        } else {
            tracing::warn!(
                state = %self.state,
                error = %error,
                status = error.status_code(),
                "Request failed"
            );
        }
        self.state = DispatchState::Errored;
        error
    }
}

/// Runs requests against a schema and a data source.
///
/// The dispatcher holds no per-request state; it can serve any number of
/// concurrent requests through a shared reference.
pub struct RequestDispatcher<S, D> {
    schema: Arc<S>,
    source: D,
    config: ServiceConfig,
}

impl<S, D> RequestDispatcher<S, D>
where
    S: SchemaProvider,
    D: DataSource,
{
    /// Creates a dispatcher.
    #[must_use]
    pub const fn new(schema: Arc<S>, source: D, config: ServiceConfig) -> Self {
        Self {
            schema,
            source,
            config,
        }
    }

    /// Returns the schema.
    #[must_use]
    pub fn schema(&self) -> &S {
        &self.schema
    }

    /// Returns the data source.
    #[must_use]
    pub const fn source(&self) -> &D {
        &self.source
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Resolves and validates a request without calling the data source.
    ///
    /// # Errors
    ///
    /// Returns the first resolution or validation failure.
    pub fn prepare(&self, request: &Request) -> Result<PreparedRequest, ProcessingError> {
        let resolved = self.resolve(request)?;
        self.validate(resolved, request.options())
    }

    /// Processes a request to completion.
    ///
    /// # Errors
    ///
    /// Returns a [`ProcessingError`] carrying the kind of the first failure.
    pub async fn dispatch(&self, request: &Request) -> Result<Response, ProcessingError> {
        self.dispatch_with(request, &CancellationFlag::new()).await
    }

    /// Processes a request, honoring a host cancellation flag.
    ///
    /// The flag is checked before each stage begins, never in the middle of
    /// one.
    ///
    /// # Errors
    ///
    /// Returns a [`ProcessingError`] carrying the kind of the first failure,
    /// or [`ProcessingError::Cancelled`] if the flag was set.
    pub async fn dispatch_with(
        &self,
        request: &Request,
        cancel: &CancellationFlag,
    ) -> Result<Response, ProcessingError> {
        let mut progress = Progress::new(cancel);
        match self.run(request, &mut progress).await {
            Ok(response) => Ok(response),
            Err(error) => Err(progress.fail(error)),
        }
    }

    async fn run(&self, request: &Request, progress: &mut Progress<'_>) -> Result<Response, ProcessingError> {
        progress.ensure_live()?;
        let resolved = self.resolve(request)?;

        progress.advance(DispatchState::Validating)?;
        let prepared = self.validate(resolved, request.options())?;

        progress.advance(DispatchState::Invoking)?;
        let data_request = DataRequest::from(prepared);
        let fetched = self.invoke(&data_request).await?;

        progress.advance(DispatchState::Materializing)?;
        let response = self.materialize(&data_request, fetched)?;

        progress.advance(DispatchState::Done)?;
        Ok(response)
    }

    fn resolve(&self, request: &Request) -> Result<ResolvedRequest, ProcessingError> {
        let resolver = RequestTargetResolver::new(self.schema.as_ref(), &self.config);
        Ok(resolver.resolve(request.segments())?)
    }

    fn validate(
        &self,
        resolved: ResolvedRequest,
        options: &QueryOptions,
    ) -> Result<PreparedRequest, ProcessingError> {
        let ResolvedRequest {
            chain,
            count_segment,
        } = resolved;

        let count = CountPolicy::enforce(&chain, count_segment, options.count(), &self.config)?;

        let mut projection = match options.select() {
            Some(text) => match SelectList::parse(text, self.config.max_select_items())? {
                Some(list) => Some(list.validate(self.schema.as_ref(), chain.terminal().element_type())?),
                None => None,
            },
            None => None,
        };
        // A scalar count has no properties to project.
        if count == CountPolicy::CountSegment {
            projection = None;
        }

        Ok(PreparedRequest {
            chain,
            count,
            projection,
            extra: options.extra().clone(),
        })
    }

    async fn invoke(&self, request: &DataRequest) -> Result<Fetched<D::Row>, ProcessingError> {
        if request.chain().is_root_only() {
            return Ok(Fetched::ServiceDocument);
        }

        let reject = |error| source_failure(request, error);

        if request.count_policy() == CountPolicy::CountSegment {
            let count = self.source.count(request).await.map_err(reject)?;
            return Ok(Fetched::Count(count));
        }

        let rows = self.source.fetch(request).await.map_err(reject)?;
        let total = if request.count_policy() == CountPolicy::CountQuery {
            Some(self.source.count(request).await.map_err(reject)?)
        } else {
            None
        };
        tracing::debug!(
            target_path = %request.chain(),
            rows = rows.len(),
            total = ?total,
            "Fetched rows from data source"
        );
        Ok(Fetched::Rows { rows, total })
    }

    fn materialize(
        &self,
        request: &DataRequest,
        fetched: Fetched<D::Row>,
    ) -> Result<Response, ProcessingError> {
        let payload = match fetched {
            Fetched::ServiceDocument => ResponsePayload::ServiceDocument {
                entity_sets: self
                    .schema
                    .entity_set_names()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            },
            Fetched::Count(count) => ResponsePayload::Count(count),
            Fetched::Rows { rows, total } => Self::shape_rows(request, rows, total)?,
        };

        let context = payload.context_fragment().and_then(|fragment| {
            self.config
                .service_root()
                .map(|root| root.context_url(&fragment))
        });

        Ok(Response { payload, context })
    }

    fn shape_rows(
        request: &DataRequest,
        rows: Vec<D::Row>,
        total: Option<u64>,
    ) -> Result<ResponsePayload, ProcessingError> {
        let target = request.target();
        let element_type = target.element_type().to_string();

        if target.is_collection() {
            let items = render_rows(&rows, request.projection())?;
            return Ok(ResponsePayload::Collection {
                element_type,
                items,
                count: total,
            });
        }

        if rows.len() > 1 {
            return Err(ProcessingError::UnexpectedRowCount {
                target: request.chain().to_string(),
                rows: rows.len(),
            });
        }

        let item = match rows.first() {
            Some(row) => render_row(row, request.projection())?,
            None if target.key().is_some() => {
                return Err(ProcessingError::NotFound {
                    target: request.chain().to_string(),
                });
            }
            None => serde_json::Value::Null,
        };

        Ok(ResponsePayload::Single { element_type, item })
    }
}

fn source_failure(request: &DataRequest, error: DataSourceError) -> ProcessingError {
    if error.is_not_found() {
        return ProcessingError::NotFound {
            target: request.chain().to_string(),
        };
    }
    error.into()
}

fn render_rows<R>(rows: &[R], projection: Option<&ProjectionSpec>) -> Result<Vec<serde_json::Value>, ProcessingError>
where
    R: ProjectedResult + serde::Serialize,
{
    match projection {
        Some(spec) => Ok(materialize(rows, spec)?),
        None => rows
            .iter()
            .map(|row| serde_json::to_value(row).map_err(ProcessingError::from))
            .collect(),
    }
}

fn render_row<R>(row: &R, projection: Option<&ProjectionSpec>) -> Result<serde_json::Value, ProcessingError>
where
    R: ProjectedResult + serde::Serialize,
{
    match projection {
        Some(spec) => Ok(serde_json::Value::Object(project_row(row, spec)?)),
        None => Ok(serde_json::to_value(row)?),
    }
}

// Verify types are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Request>();
    assert_send_sync::<PreparedRequest>();
    assert_send_sync::<CancellationFlag>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::DataSourceError;
    use crate::projection::JsonResource;
    use crate::schema::{Cardinality, ServiceSchema, StructuredTypeBuilder};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        rows: Vec<JsonResource>,
        fetches: Arc<AtomicUsize>,
    }

    impl DataSource for Fixed {
        type Row = JsonResource;

        async fn fetch(&self, _request: &DataRequest) -> Result<Vec<JsonResource>, DataSourceError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.rows.clone())
        }
    }

    fn schema() -> ServiceSchema {
        ServiceSchema::builder()
            .structured_type(
                StructuredTypeBuilder::entity("Catalog.Product")
                    .key("Id")
                    .property("Id", "Edm.Int32")
                    .property("Name", "Edm.String")
                    .navigation("Category", "Catalog.Category", Cardinality::Single),
            )
            .structured_type(
                StructuredTypeBuilder::entity("Catalog.Category")
                    .key("Id")
                    .property("Id", "Edm.Int32"),
            )
            .entity_set("Products", "Catalog.Product")
            .entity_set("Categories", "Catalog.Category")
            .build()
            .unwrap()
    }

    fn build(rows: Vec<JsonResource>) -> (RequestDispatcher<ServiceSchema, Fixed>, Arc<AtomicUsize>) {
        let fetches = Arc::new(AtomicUsize::new(0));
        let source = Fixed {
            rows,
            fetches: Arc::clone(&fetches),
        };
        (
            RequestDispatcher::new(Arc::new(schema()), source, ServiceConfig::default()),
            fetches,
        )
    }

    fn product(id: i64) -> JsonResource {
        JsonResource::new("Catalog.Product")
            .with("Id", json!(id))
            .with("Name", json!(format!("P{id}")))
    }

    #[test]
    fn test_prepare_does_not_fetch() {
        let (dispatcher, fetches) = build(vec![product(1)]);
        let request = Request::parse("Products", "$count=true&$select=Name&$top=2").unwrap();

        let prepared = dispatcher.prepare(&request).unwrap();
        assert_eq!(prepared.count, CountPolicy::CountQuery);
        assert_eq!(prepared.projection.unwrap().names(), ["Name"]);
        assert_eq!(prepared.extra.get("$top").map(String::as_str), Some("2"));
        assert_eq!(fetches.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_count_segment_drops_projection() {
        let (dispatcher, _) = build(vec![]);
        let request = Request::parse("Products/$count", "$select=Name").unwrap();
        let prepared = dispatcher.prepare(&request).unwrap();
        assert_eq!(prepared.count, CountPolicy::CountSegment);
        assert!(prepared.projection.is_none());

        // Unknown names are still rejected.
        let request = Request::parse("Products/$count", "$select=Title").unwrap();
        assert!(matches!(
            dispatcher.prepare(&request),
            Err(ProcessingError::ProjectionValidation(_))
        ));
    }

    #[test]
    fn test_service_document_skips_data_source() {
        let (dispatcher, fetches) = build(vec![]);
        let response = tokio_test::block_on(dispatcher.dispatch(&Request::parse("", "").unwrap())).unwrap();
        assert_eq!(
            response.payload,
            ResponsePayload::ServiceDocument {
                entity_sets: vec!["Products".to_string(), "Categories".to_string()],
            }
        );
        assert!(response.context.is_none());
        assert_eq!(fetches.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_single_target_row_rules() {
        let (dispatcher, _) = build(vec![]);
        let missing = tokio_test::block_on(dispatcher.dispatch(&Request::parse("Products(9)", "").unwrap()));
        assert!(matches!(missing, Err(ProcessingError::NotFound { .. })));

        let null = tokio_test::block_on(dispatcher.dispatch(&Request::parse("Products(9)/Category", "").unwrap()))
            .unwrap();
        assert_eq!(
            null.payload,
            ResponsePayload::Single {
                element_type: "Catalog.Category".to_string(),
                item: serde_json::Value::Null,
            }
        );

        let (dispatcher, _) = build(vec![product(1), product(2)]);
        let many = tokio_test::block_on(dispatcher.dispatch(&Request::parse("Products(1)", "").unwrap()));
        assert!(matches!(
            many,
            Err(ProcessingError::UnexpectedRowCount { rows: 2, .. })
        ));
    }

    #[test]
    fn test_cancelled_before_start() {
        let (dispatcher, fetches) = build(vec![product(1)]);
        let flag = CancellationFlag::new();
        flag.cancel();

        let err = tokio_test::block_on(dispatcher.dispatch_with(&Request::parse("Products", "").unwrap(), &flag))
            .unwrap_err();
        assert!(matches!(
            err,
            ProcessingError::Cancelled {
                state: DispatchState::Resolving
            }
        ));
        assert_eq!(fetches.load(Ordering::SeqCst), 0);
    }
}
