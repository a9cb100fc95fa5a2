//! Read-only schema lookups consulted during resolution and projection.
//!
//! The resolver never owns schema data; it asks a [`SchemaProvider`] three
//! kinds of questions:
//!
//! - "what is the element type of entity set E" ([`SchemaProvider::entity_set`])
//! - "does type T declare property P" ([`SchemaProvider::declares_property`])
//! - "is segment S at this position operation-capable" ([`SchemaProvider::operation`])
//!
//! [`ServiceSchema`] is the in-memory implementation. It is built once and
//! shared immutably (typically behind an `Arc`) by every concurrent request.
//!
//! # Example
//!
//! ```rust
//! use resource_query::schema::{
//!     Cardinality, OperationBuilder, SchemaProvider, ServiceSchema, StructuredTypeBuilder,
//! };
//!
//! let schema = ServiceSchema::builder()
//!     .structured_type(
//!         StructuredTypeBuilder::entity("Catalog.Product")
//!             .key("Id")
//!             .property("Id", "Edm.Int32")
//!             .property("Name", "Edm.String"),
//!     )
//!     .entity_set("Products", "Catalog.Product")
//!     .operation(OperationBuilder::new("TopProducts").returns_collection_of("Catalog.Product"))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(schema.entity_set_element_type("Products"), Some("Catalog.Product"));
//! assert!(schema.declares_property("Catalog.Product", "Name"));
//! assert!(!schema.declares_property("Catalog.Product", "Price"));
//! ```

mod errors;
mod types;

pub use errors::SchemaError;
pub use types::{
    Cardinality, EntitySetDescriptor, OperationBinding, OperationBuilder, OperationDescriptor,
    PropertyDescriptor, PropertyKind, StructuredType, StructuredTypeBuilder,
};

use std::collections::HashMap;

use crate::config::Identifier;

/// Read-only schema queries used by the request pipeline.
///
/// Implementations must be safe to share across concurrently processed
/// requests; the pipeline never mutates them.
pub trait SchemaProvider: Send + Sync {
    /// Looks up an entity set by name.
    fn entity_set(&self, name: &str) -> Option<&EntitySetDescriptor>;

    /// Looks up an entity or complex type by qualified name.
    fn structured_type(&self, name: &str) -> Option<&StructuredType>;

    /// Looks up an operation addressable by `name` at the given binding.
    fn operation(&self, name: &str, binding: OperationBinding<'_>)
        -> Option<&OperationDescriptor>;

    /// Returns the entity set names in declaration order.
    fn entity_set_names(&self) -> Vec<&str>;

    /// Returns `true` if `type_name` is structured and declares `property`.
    fn declares_property(&self, type_name: &str, property: &str) -> bool {
        self.structured_type(type_name)
            .is_some_and(|ty| ty.property(property).is_some())
    }

    /// Returns the element type of an entity set.
    fn entity_set_element_type(&self, name: &str) -> Option<&str> {
        self.entity_set(name).map(EntitySetDescriptor::entity_type)
    }
}

/// An in-memory, immutable schema.
#[derive(Debug, Clone, Default)]
pub struct ServiceSchema {
    types: HashMap<String, StructuredType>,
    entity_sets: HashMap<String, EntitySetDescriptor>,
    entity_set_order: Vec<String>,
    operations: Vec<OperationDescriptor>,
}

impl ServiceSchema {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> ServiceSchemaBuilder {
        ServiceSchemaBuilder::default()
    }

    /// Returns all declared operations.
    #[must_use]
    pub fn operations(&self) -> &[OperationDescriptor] {
        &self.operations
    }
}

impl SchemaProvider for ServiceSchema {
    fn entity_set(&self, name: &str) -> Option<&EntitySetDescriptor> {
        self.entity_sets.get(name)
    }

    fn structured_type(&self, name: &str) -> Option<&StructuredType> {
        self.types.get(name)
    }

    fn operation(
        &self,
        name: &str,
        binding: OperationBinding<'_>,
    ) -> Option<&OperationDescriptor> {
        self.operations
            .iter()
            .find(|op| op.name() == name && op.binding() == binding)
    }

    fn entity_set_names(&self) -> Vec<&str> {
        self.entity_set_order.iter().map(String::as_str).collect()
    }
}

// Verify ServiceSchema is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ServiceSchema>();
};

/// Builder for [`ServiceSchema`].
///
/// Declarations may appear in any order; cross references are checked by
/// [`build`](Self::build).
#[derive(Debug, Default)]
pub struct ServiceSchemaBuilder {
    types: Vec<StructuredTypeBuilder>,
    entity_sets: Vec<(String, String)>,
    operations: Vec<OperationBuilder>,
}

impl ServiceSchemaBuilder {
    /// Declares an entity or complex type.
    #[must_use]
    pub fn structured_type(mut self, ty: StructuredTypeBuilder) -> Self {
        self.types.push(ty);
        self
    }

    /// Declares an entity set of the given entity type.
    #[must_use]
    pub fn entity_set(mut self, name: impl Into<String>, entity_type: impl Into<String>) -> Self {
        self.entity_sets.push((name.into(), entity_type.into()));
        self
    }

    /// Declares a service operation.
    #[must_use]
    pub fn operation(mut self, operation: OperationBuilder) -> Self {
        self.operations.push(operation);
        self
    }

    /// Builds the schema, validating names and cross references.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] describing the first inconsistency found.
    pub fn build(self) -> Result<ServiceSchema, SchemaError> {
        let mut types: HashMap<String, StructuredType> = HashMap::new();
        for builder in self.types {
            let ty = builder.build()?;
            if types.contains_key(ty.name()) {
                return Err(SchemaError::DuplicateType {
                    type_name: ty.name().to_string(),
                });
            }
            types.insert(ty.name().to_string(), ty);
        }

        for ty in types.values() {
            for property in ty.properties().iter().filter(|p| p.is_navigation()) {
                let target_is_entity = types
                    .get(property.type_name())
                    .is_some_and(StructuredType::is_entity);
                if !target_is_entity {
                    return Err(SchemaError::UnknownNavigationTarget {
                        type_name: ty.name().to_string(),
                        property: property.name().to_string(),
                        target: property.type_name().to_string(),
                    });
                }
            }
        }

        let mut entity_sets: HashMap<String, EntitySetDescriptor> = HashMap::new();
        let mut entity_set_order = Vec::with_capacity(self.entity_sets.len());
        for (name, entity_type) in self.entity_sets {
            let descriptor = EntitySetDescriptor {
                name: Identifier::new(name)?,
                entity_type: Identifier::new(entity_type)?,
            };
            if entity_sets.contains_key(descriptor.name()) {
                return Err(SchemaError::DuplicateEntitySet {
                    entity_set: descriptor.name().to_string(),
                });
            }
            let is_entity = types
                .get(descriptor.entity_type())
                .is_some_and(StructuredType::is_entity);
            if !is_entity {
                return Err(SchemaError::UnknownEntityType {
                    entity_set: descriptor.name().to_string(),
                    type_name: descriptor.entity_type().to_string(),
                });
            }
            entity_set_order.push(descriptor.name().to_string());
            entity_sets.insert(descriptor.name().to_string(), descriptor);
        }

        let mut operations: Vec<OperationDescriptor> = Vec::with_capacity(self.operations.len());
        for builder in self.operations {
            let operation = builder.build()?;
            if let Some(bound) = operation.bound_type() {
                if !types.contains_key(bound) {
                    return Err(SchemaError::UnknownBindingType {
                        operation: operation.name().to_string(),
                        type_name: bound.to_string(),
                    });
                }
            }
            let duplicate = operations
                .iter()
                .any(|op| op.name() == operation.name() && op.binding() == operation.binding());
            if duplicate {
                return Err(SchemaError::DuplicateOperation {
                    operation: operation.name().to_string(),
                });
            }
            operations.push(operation);
        }

        tracing::debug!(
            types = types.len(),
            entity_sets = entity_sets.len(),
            operations = operations.len(),
            "Built service schema"
        );

        Ok(ServiceSchema {
            types,
            entity_sets,
            entity_set_order,
            operations,
        })
    }
}
