//! Left-to-right resolution of segments into a [`TargetChain`].
//!
//! # Transition Rules
//!
//! | Current node                | Segment may name                                         |
//! |-----------------------------|----------------------------------------------------------|
//! | service root                | an entity set, then a root operation                     |
//! | single structured item      | a declared property, then an operation bound to the type |
//! | collection                  | an operation bound to the element type as a collection   |
//! | single primitive value      | nothing                                                  |
//!
//! A key predicate collapses a collection of entities to a single item. A
//! trailing `$count` segment is not resolved into the chain; it is reported
//! on [`ResolvedRequest::count_segment`] for the count stage.
//!
//! # Example
//!
//! ```rust
//! use resource_query::request::{parse_path, RequestTargetResolver, TargetSource};
//! use resource_query::schema::{ServiceSchema, StructuredTypeBuilder};
//! use resource_query::ServiceConfig;
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
//! let config = ServiceConfig::default();
//! let resolver = RequestTargetResolver::new(&schema, &config);
//!
//! let resolved = resolver.resolve(&parse_path("Products(1)/Name").unwrap()).unwrap();
//! let terminal = resolved.chain.terminal();
//! assert!(!terminal.is_collection());
//! assert_eq!(terminal.element_type(), "Edm.String");
//! ```

use thiserror::Error;

use super::segment::{KeyPredicate, Segment};
use super::target::{ResolvedTarget, TargetChain, TargetSource};
use crate::config::ServiceConfig;
use crate::schema::{Cardinality, OperationBinding, PropertyKind, SchemaProvider};

/// Why a segment could not be resolved.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolutionFailure {
    /// The path is longer than the configured limit.
    #[error("path exceeds the limit of {limit} segments")]
    TooManySegments {
        /// The configured limit.
        limit: usize,
    },

    /// Nothing with this name is addressable at this position.
    #[error("no entity set, property, or operation with this name is addressable here")]
    UnknownSegment,

    /// A property was addressed on a collection without a key.
    #[error("properties cannot be addressed on a collection; select a single item with a key first")]
    PropertyOnCollection,

    /// A segment followed a primitive value.
    #[error("nothing can be addressed below a primitive value")]
    PropertyOnPrimitive,

    /// The segment carries the navigation indicator but is not a navigation property.
    #[error("segment is marked as navigation but does not name a navigation property")]
    NotNavigation,

    /// A key was applied to something that is already a single item.
    #[error("a key can only be applied to a collection")]
    KeyOnSingle,

    /// A key was applied to a collection whose elements have no identity.
    #[error("a key can only be applied to a collection of entities")]
    KeyOnNonEntity,

    /// The key predicate does not match the declared key properties.
    #[error("key predicate does not match the declared key ({expected})")]
    KeyMismatch {
        /// The declared key property names, comma separated.
        expected: String,
    },

    /// `$count` appeared before the last position.
    #[error("$count must be the last segment")]
    CountNotTrailing,

    /// `$count` carried a key predicate or navigation indicator.
    #[error("$count cannot carry a key or navigation indicator")]
    MalformedCount,
}

/// An illegal segment transition.
///
/// Carries the offending segment index and text for diagnostics.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Cannot resolve segment {index} ('{segment}'): {reason}")]
pub struct TargetResolutionError {
    /// Zero-based index of the offending segment.
    pub index: usize,
    /// The offending segment in text form.
    pub segment: String,
    /// Why the transition is illegal.
    pub reason: ResolutionFailure,
}

impl TargetResolutionError {
    fn new(index: usize, segment: &Segment, reason: ResolutionFailure) -> Self {
        Self {
            index,
            segment: segment.to_string(),
            reason,
        }
    }
}

/// The resolver's output for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRequest {
    /// The resolved chain, starting at the service root.
    pub chain: TargetChain,
    /// `true` if a trailing `$count` segment was consumed.
    pub count_segment: bool,
}

/// Walks segments left to right against a schema.
///
/// The resolver borrows the schema and holds no request state, so one
/// instance can resolve any number of requests.
pub struct RequestTargetResolver<'a, S: SchemaProvider + ?Sized> {
    schema: &'a S,
    max_segments: usize,
}

impl<'a, S: SchemaProvider + ?Sized> RequestTargetResolver<'a, S> {
    /// Creates a resolver over `schema` honoring the limits in `config`.
    #[must_use]
    pub const fn new(schema: &'a S, config: &ServiceConfig) -> Self {
        Self {
            schema,
            max_segments: config.max_segments(),
        }
    }

    /// Resolves a segment sequence.
    ///
    /// An empty sequence resolves to the service root alone.
    ///
    /// # Errors
    ///
    /// Returns a [`TargetResolutionError`] naming the first segment that
    /// cannot be resolved.
    pub fn resolve(&self, segments: &[Segment]) -> Result<ResolvedRequest, TargetResolutionError> {
        if let Some(excess) = segments.get(self.max_segments) {
            return Err(TargetResolutionError::new(
                self.max_segments,
                excess,
                ResolutionFailure::TooManySegments {
                    limit: self.max_segments,
                },
            ));
        }

        let mut chain = TargetChain::root();
        let mut count_segment = false;
        let last = segments.len().saturating_sub(1);

        for (index, segment) in segments.iter().enumerate() {
            if segment.is_count() {
                if index != last {
                    return Err(TargetResolutionError::new(
                        index,
                        segment,
                        ResolutionFailure::CountNotTrailing,
                    ));
                }
                if segment.key().is_some() || segment.is_navigation() {
                    return Err(TargetResolutionError::new(
                        index,
                        segment,
                        ResolutionFailure::MalformedCount,
                    ));
                }
                count_segment = true;
                continue;
            }

            let node = self
                .step(chain.terminal(), segment)
                .map_err(|reason| TargetResolutionError::new(index, segment, reason))?;

            tracing::trace!(
                index,
                source = node.source().label(),
                element_type = node.element_type(),
                is_collection = node.is_collection(),
                "Resolved segment"
            );

            chain.push(node, index);
        }

        Ok(ResolvedRequest {
            chain,
            count_segment,
        })
    }

    fn step(
        &self,
        current: &ResolvedTarget,
        segment: &Segment,
    ) -> Result<ResolvedTarget, ResolutionFailure> {
        let name = segment.identifier();

        let node = match current.source() {
            TargetSource::None => self.step_from_root(name)?,
            TargetSource::EntitySet { .. }
            | TargetSource::ServiceOperation { .. }
            | TargetSource::Property { .. } => {
                if current.is_collection() {
                    self.step_from_collection(current, name)?
                } else {
                    self.step_from_single(current, name)?
                }
            }
        };

        if segment.is_navigation()
            && !matches!(
                node.source(),
                TargetSource::Property {
                    kind: PropertyKind::Navigation,
                    ..
                }
            )
        {
            return Err(ResolutionFailure::NotNavigation);
        }

        match segment.key() {
            Some(key) => self.apply_key(node, key),
            None => Ok(node),
        }
    }

    fn step_from_root(&self, name: &str) -> Result<ResolvedTarget, ResolutionFailure> {
        if let Some(set) = self.schema.entity_set(name) {
            return Ok(ResolvedTarget::new(
                TargetSource::EntitySet {
                    name: set.name().to_string(),
                },
                true,
                set.entity_type(),
            ));
        }

        self.operation_node(name, OperationBinding::Root)
            .ok_or(ResolutionFailure::UnknownSegment)
    }

    fn step_from_collection(
        &self,
        current: &ResolvedTarget,
        name: &str,
    ) -> Result<ResolvedTarget, ResolutionFailure> {
        let binding = OperationBinding::Bound {
            type_name: current.element_type(),
            cardinality: Cardinality::Collection,
        };
        if let Some(node) = self.operation_node(name, binding) {
            return Ok(node);
        }

        if self.schema.declares_property(current.element_type(), name) {
            return Err(ResolutionFailure::PropertyOnCollection);
        }
        Err(ResolutionFailure::UnknownSegment)
    }

    fn step_from_single(
        &self,
        current: &ResolvedTarget,
        name: &str,
    ) -> Result<ResolvedTarget, ResolutionFailure> {
        let Some(ty) = self.schema.structured_type(current.element_type()) else {
            return Err(ResolutionFailure::PropertyOnPrimitive);
        };

        if let Some(property) = ty.property(name) {
            return Ok(ResolvedTarget::new(
                TargetSource::Property {
                    name: property.name().to_string(),
                    kind: property.kind(),
                },
                property.cardinality().is_collection(),
                property.type_name(),
            ));
        }

        let binding = OperationBinding::Bound {
            type_name: current.element_type(),
            cardinality: Cardinality::Single,
        };
        self.operation_node(name, binding)
            .ok_or(ResolutionFailure::UnknownSegment)
    }

    fn operation_node(&self, name: &str, binding: OperationBinding<'_>) -> Option<ResolvedTarget> {
        self.schema.operation(name, binding).map(|op| {
            ResolvedTarget::new(
                TargetSource::ServiceOperation {
                    name: op.name().to_string(),
                },
                op.returns().is_collection(),
                op.result_type(),
            )
        })
    }

    fn apply_key(
        &self,
        node: ResolvedTarget,
        key: &KeyPredicate,
    ) -> Result<ResolvedTarget, ResolutionFailure> {
        if !node.is_collection() {
            return Err(ResolutionFailure::KeyOnSingle);
        }

        let Some(ty) = self
            .schema
            .structured_type(node.element_type())
            .filter(|ty| ty.is_entity())
        else {
            return Err(ResolutionFailure::KeyOnNonEntity);
        };

        let declared: Vec<&str> = ty.keys().collect();
        let matches = match key.names() {
            None => declared.len() == 1,
            Some(mut names) => {
                names.sort_unstable();
                let mut expected = declared.clone();
                expected.sort_unstable();
                names == expected
            }
        };
        if !matches {
            return Err(ResolutionFailure::KeyMismatch {
                expected: declared.join(","),
            });
        }

        Ok(node.keyed(key.clone()))
    }
}
