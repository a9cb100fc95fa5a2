//! Schema descriptor types.
//!
//! Descriptors are immutable once a [`ServiceSchema`](super::ServiceSchema)
//! has been built. They are produced by the builders in this module and read
//! by the resolver and the projection validator.

use serde::Serialize;

use crate::config::Identifier;

/// Whether a schema element denotes a single item or a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    /// Exactly one item (possibly absent).
    Single,
    /// Zero or more items.
    Collection,
}

impl Cardinality {
    /// Returns `true` for [`Cardinality::Collection`].
    #[must_use]
    pub const fn is_collection(self) -> bool {
        matches!(self, Self::Collection)
    }

    /// Maps a collection flag onto a cardinality.
    #[must_use]
    pub const fn from_collection(is_collection: bool) -> Self {
        if is_collection {
            Self::Collection
        } else {
            Self::Single
        }
    }
}

/// How a property relates its owner to its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    /// A primitive or complex value stored on the owner.
    Structural,
    /// A reference to one or more other entities.
    Navigation,
}

/// A property declared on a structured type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDescriptor {
    name: Identifier,
    kind: PropertyKind,
    type_name: Identifier,
    cardinality: Cardinality,
}

impl PropertyDescriptor {
    /// Returns the property name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns whether this is a structural or navigation property.
    #[must_use]
    pub const fn kind(&self) -> PropertyKind {
        self.kind
    }

    /// Returns the element type name of the property value.
    #[must_use]
    pub fn type_name(&self) -> &str {
        self.type_name.as_str()
    }

    /// Returns the property cardinality.
    #[must_use]
    pub const fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    /// Returns `true` for navigation properties.
    #[must_use]
    pub const fn is_navigation(&self) -> bool {
        matches!(self.kind, PropertyKind::Navigation)
    }
}

/// An entity or complex type with named properties.
///
/// Entity types declare key properties and can back entity sets; complex
/// types are structured values without identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredType {
    name: Identifier,
    is_entity: bool,
    keys: Vec<Identifier>,
    properties: Vec<PropertyDescriptor>,
}

impl StructuredType {
    /// Returns the qualified type name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns `true` for entity types.
    #[must_use]
    pub const fn is_entity(&self) -> bool {
        self.is_entity
    }

    /// Returns the key property names in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(Identifier::as_str)
    }

    /// Returns all declared properties in declaration order.
    #[must_use]
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    /// Looks up a declared property by name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name() == name)
    }

    /// Returns the declared property names in declaration order.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(PropertyDescriptor::name)
    }
}

/// A named collection of entities of one type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySetDescriptor {
    pub(super) name: Identifier,
    pub(super) entity_type: Identifier,
}

impl EntitySetDescriptor {
    /// Returns the entity set name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the element entity type name.
    #[must_use]
    pub fn entity_type(&self) -> &str {
        self.entity_type.as_str()
    }
}

/// The position at which a service operation may be addressed.
///
/// Used both to declare an operation and to ask the schema whether a segment
/// at the current position is operation-capable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationBinding<'a> {
    /// Addressed directly below the service root.
    Root,
    /// Addressed below a target of the given type and cardinality.
    Bound {
        /// The element type of the binding target.
        type_name: &'a str,
        /// Whether the binding target is a single item or a collection.
        cardinality: Cardinality,
    },
}

/// A schema-declared callable endpoint.
///
/// The result cardinality is declared explicitly here rather than inferred
/// at request time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationDescriptor {
    name: Identifier,
    result_type: Identifier,
    returns: Cardinality,
    bound_to: Option<(Identifier, Cardinality)>,
}

impl OperationDescriptor {
    /// Returns the operation name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the element type name of the operation result.
    #[must_use]
    pub fn result_type(&self) -> &str {
        self.result_type.as_str()
    }

    /// Returns whether the operation produces a single item or a collection.
    #[must_use]
    pub const fn returns(&self) -> Cardinality {
        self.returns
    }

    /// Returns the binding this operation is declared at.
    #[must_use]
    pub fn binding(&self) -> OperationBinding<'_> {
        match &self.bound_to {
            None => OperationBinding::Root,
            Some((type_name, cardinality)) => OperationBinding::Bound {
                type_name: type_name.as_str(),
                cardinality: *cardinality,
            },
        }
    }

    /// Returns the binding type name, if the operation is bound.
    #[must_use]
    pub fn bound_type(&self) -> Option<&str> {
        self.bound_to.as_ref().map(|(name, _)| name.as_str())
    }
}

/// Builder for a [`StructuredType`].
///
/// Names are validated when the owning schema is built.
///
/// # Example
///
/// ```rust
/// use resource_query::schema::{Cardinality, StructuredTypeBuilder};
///
/// let product = StructuredTypeBuilder::entity("Catalog.Product")
///     .key("Id")
///     .property("Id", "Edm.Int32")
///     .property("Name", "Edm.String")
///     .navigation("Category", "Catalog.Category", Cardinality::Single);
/// ```
#[derive(Debug, Clone)]
pub struct StructuredTypeBuilder {
    name: String,
    is_entity: bool,
    keys: Vec<String>,
    properties: Vec<RawProperty>,
}

#[derive(Debug, Clone)]
struct RawProperty {
    name: String,
    kind: PropertyKind,
    type_name: String,
    cardinality: Cardinality,
}

impl StructuredTypeBuilder {
    /// Starts an entity type declaration.
    #[must_use]
    pub fn entity(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_entity: true,
            keys: Vec::new(),
            properties: Vec::new(),
        }
    }

    /// Starts a complex type declaration.
    #[must_use]
    pub fn complex(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_entity: false,
            keys: Vec::new(),
            properties: Vec::new(),
        }
    }

    /// Adds a key property name.
    #[must_use]
    pub fn key(mut self, name: impl Into<String>) -> Self {
        self.keys.push(name.into());
        self
    }

    /// Adds a single-valued structural property.
    #[must_use]
    pub fn property(self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.push(name, PropertyKind::Structural, type_name, Cardinality::Single)
    }

    /// Adds a collection-valued structural property.
    #[must_use]
    pub fn collection_property(
        self,
        name: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        self.push(
            name,
            PropertyKind::Structural,
            type_name,
            Cardinality::Collection,
        )
    }

    /// Adds a navigation property to another entity type.
    #[must_use]
    pub fn navigation(
        self,
        name: impl Into<String>,
        target: impl Into<String>,
        cardinality: Cardinality,
    ) -> Self {
        self.push(name, PropertyKind::Navigation, target, cardinality)
    }

    fn push(
        mut self,
        name: impl Into<String>,
        kind: PropertyKind,
        type_name: impl Into<String>,
        cardinality: Cardinality,
    ) -> Self {
        self.properties.push(RawProperty {
            name: name.into(),
            kind,
            type_name: type_name.into(),
            cardinality,
        });
        self
    }

    pub(super) fn build(self) -> Result<StructuredType, super::SchemaError> {
        use super::SchemaError;

        let name = Identifier::new(self.name)?;

        let mut properties: Vec<PropertyDescriptor> = Vec::with_capacity(self.properties.len());
        for raw in self.properties {
            let property = PropertyDescriptor {
                name: Identifier::new(raw.name)?,
                kind: raw.kind,
                type_name: Identifier::new(raw.type_name)?,
                cardinality: raw.cardinality,
            };
            if properties.iter().any(|p| p.name == property.name) {
                return Err(SchemaError::DuplicateProperty {
                    type_name: name.to_string(),
                    property: property.name.to_string(),
                });
            }
            properties.push(property);
        }

        if !self.is_entity && !self.keys.is_empty() {
            return Err(SchemaError::KeyOnComplexType {
                type_name: name.to_string(),
            });
        }
        if self.is_entity && self.keys.is_empty() {
            return Err(SchemaError::MissingKey {
                type_name: name.to_string(),
            });
        }

        let mut keys = Vec::with_capacity(self.keys.len());
        for key in self.keys {
            let key = Identifier::new(key)?;
            let declared = properties
                .iter()
                .find(|p| p.name == key)
                .is_some_and(|p| {
                    p.kind == PropertyKind::Structural && !p.cardinality.is_collection()
                });
            if !declared {
                return Err(SchemaError::UnknownKeyProperty {
                    type_name: name.to_string(),
                    property: key.to_string(),
                });
            }
            keys.push(key);
        }

        Ok(StructuredType {
            name,
            is_entity: self.is_entity,
            keys,
            properties,
        })
    }
}

/// Builder for an [`OperationDescriptor`].
///
/// # Example
///
/// ```rust
/// use resource_query::schema::{Cardinality, OperationBuilder};
///
/// let top_products = OperationBuilder::new("TopProducts")
///     .returns_collection_of("Catalog.Product");
///
/// let discontinue = OperationBuilder::new("Discontinue")
///     .bound_to("Catalog.Product", Cardinality::Single)
///     .returns_single("Catalog.Product");
/// ```
#[derive(Debug, Clone)]
pub struct OperationBuilder {
    name: String,
    result_type: Option<String>,
    returns: Cardinality,
    bound_to: Option<(String, Cardinality)>,
}

impl OperationBuilder {
    /// Starts an operation declaration. Unbound and single-valued until
    /// configured otherwise.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            result_type: None,
            returns: Cardinality::Single,
            bound_to: None,
        }
    }

    /// Declares a single-item result of the given type.
    #[must_use]
    pub fn returns_single(mut self, type_name: impl Into<String>) -> Self {
        self.result_type = Some(type_name.into());
        self.returns = Cardinality::Single;
        self
    }

    /// Declares a collection result of the given element type.
    #[must_use]
    pub fn returns_collection_of(mut self, type_name: impl Into<String>) -> Self {
        self.result_type = Some(type_name.into());
        self.returns = Cardinality::Collection;
        self
    }

    /// Binds the operation to targets of the given type and cardinality.
    #[must_use]
    pub fn bound_to(mut self, type_name: impl Into<String>, cardinality: Cardinality) -> Self {
        self.bound_to = Some((type_name.into(), cardinality));
        self
    }

    pub(super) fn build(self) -> Result<OperationDescriptor, super::SchemaError> {
        let name = Identifier::new(self.name)?;
        let result_type = self
            .result_type
            .ok_or_else(|| super::SchemaError::MissingResultType {
                operation: name.to_string(),
            })?;

        let bound_to = match self.bound_to {
            Some((type_name, cardinality)) => Some((Identifier::new(type_name)?, cardinality)),
            None => None,
        };

        Ok(OperationDescriptor {
            name,
            result_type: Identifier::new(result_type)?,
            returns: self.returns,
            bound_to,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaError;

    #[test]
    fn test_cardinality_from_collection() {
        assert_eq!(Cardinality::from_collection(true), Cardinality::Collection);
        assert_eq!(Cardinality::from_collection(false), Cardinality::Single);
        assert!(Cardinality::Collection.is_collection());
        assert!(!Cardinality::Single.is_collection());
    }

    #[test]
    fn test_structured_type_builder_keeps_declaration_order() {
        let ty = StructuredTypeBuilder::entity("Catalog.Product")
            .key("Id")
            .property("Id", "Edm.Int32")
            .property("Name", "Edm.String")
            .collection_property("Tags", "Edm.String")
            .build()
            .unwrap();

        let names: Vec<&str> = ty.property_names().collect();
        assert_eq!(names, vec!["Id", "Name", "Tags"]);
        assert_eq!(ty.keys().collect::<Vec<_>>(), vec!["Id"]);
        assert!(ty.is_entity());
        assert_eq!(
            ty.property("Tags").unwrap().cardinality(),
            Cardinality::Collection
        );
    }

    #[test]
    fn test_structured_type_rejects_duplicate_property() {
        let result = StructuredTypeBuilder::complex("Address")
            .property("City", "Edm.String")
            .property("City", "Edm.String")
            .build();

        assert!(matches!(
            result,
            Err(SchemaError::DuplicateProperty { ref property, .. }) if property == "City"
        ));
    }

    #[test]
    fn test_entity_type_requires_declared_key() {
        let missing = StructuredTypeBuilder::entity("Order")
            .property("Id", "Edm.Int32")
            .build();
        assert!(matches!(missing, Err(SchemaError::MissingKey { .. })));

        let unknown = StructuredTypeBuilder::entity("Order")
            .key("Number")
            .property("Id", "Edm.Int32")
            .build();
        assert!(matches!(
            unknown,
            Err(SchemaError::UnknownKeyProperty { .. })
        ));
    }

    #[test]
    fn test_complex_type_cannot_declare_key() {
        let result = StructuredTypeBuilder::complex("Address")
            .key("City")
            .property("City", "Edm.String")
            .build();
        assert!(matches!(result, Err(SchemaError::KeyOnComplexType { .. })));
    }

    #[test]
    fn test_operation_builder_binding() {
        let op = OperationBuilder::new("Discontinue")
            .bound_to("Catalog.Product", Cardinality::Single)
            .returns_single("Catalog.Product")
            .build()
            .unwrap();

        assert_eq!(
            op.binding(),
            OperationBinding::Bound {
                type_name: "Catalog.Product",
                cardinality: Cardinality::Single,
            }
        );
        assert_eq!(op.returns(), Cardinality::Single);
        assert_eq!(op.bound_type(), Some("Catalog.Product"));
    }

    #[test]
    fn test_operation_builder_requires_result_type() {
        let result = OperationBuilder::new("Ping").build();
        assert!(matches!(
            result,
            Err(SchemaError::MissingResultType { .. })
        ));
    }
}
