//! Schema construction errors.

use thiserror::Error;

use crate::error::ConfigError;

/// Errors raised while building a [`ServiceSchema`](super::ServiceSchema).
///
/// These surface at service start-up; a built schema is always consistent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A declared name is not a valid identifier.
    #[error("Invalid schema name: {0}")]
    InvalidName(#[from] ConfigError),

    /// Two structured types share a name.
    #[error("Type '{type_name}' is declared more than once")]
    DuplicateType {
        /// The repeated type name.
        type_name: String,
    },

    /// A structured type declares the same property twice.
    #[error("Property '{property}' is declared more than once on type '{type_name}'")]
    DuplicateProperty {
        /// The owning type.
        type_name: String,
        /// The repeated property name.
        property: String,
    },

    /// An entity type declares no key.
    #[error("Entity type '{type_name}' must declare at least one key property")]
    MissingKey {
        /// The entity type name.
        type_name: String,
    },

    /// A key names a property that is missing or not a single structural value.
    #[error("Key property '{property}' on type '{type_name}' is not a declared single-valued structural property")]
    UnknownKeyProperty {
        /// The entity type name.
        type_name: String,
        /// The key property name.
        property: String,
    },

    /// A complex type declares a key.
    #[error("Complex type '{type_name}' cannot declare key properties")]
    KeyOnComplexType {
        /// The complex type name.
        type_name: String,
    },

    /// Two entity sets share a name.
    #[error("Entity set '{entity_set}' is declared more than once")]
    DuplicateEntitySet {
        /// The repeated entity set name.
        entity_set: String,
    },

    /// An entity set refers to a type that is missing or not an entity type.
    #[error("Entity set '{entity_set}' refers to unknown entity type '{type_name}'")]
    UnknownEntityType {
        /// The entity set name.
        entity_set: String,
        /// The referenced type name.
        type_name: String,
    },

    /// A navigation property targets a type that is missing or not an entity type.
    #[error("Navigation property '{type_name}.{property}' targets unknown entity type '{target}'")]
    UnknownNavigationTarget {
        /// The owning type.
        type_name: String,
        /// The navigation property name.
        property: String,
        /// The referenced target type.
        target: String,
    },

    /// An operation is declared without a result type.
    #[error("Operation '{operation}' does not declare a result type")]
    MissingResultType {
        /// The operation name.
        operation: String,
    },

    /// An operation is bound to a type that is not declared.
    #[error("Operation '{operation}' is bound to unknown type '{type_name}'")]
    UnknownBindingType {
        /// The operation name.
        operation: String,
        /// The referenced binding type.
        type_name: String,
    },

    /// Two operations share a name at the same binding.
    #[error("Operation '{operation}' is declared more than once for the same binding")]
    DuplicateOperation {
        /// The repeated operation name.
        operation: String,
    },
}
