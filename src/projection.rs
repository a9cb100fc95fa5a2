//! The projected-result capability.
//!
//! Any row type can take part in `$select` by reporting the type it
//! represents and supplying property values by name. The dispatcher never
//! inspects rows any other way when a projection is present.
//!
//! # Example
//!
//! ```rust
//! use resource_query::projection::{JsonResource, ProjectedResult};
//! use serde_json::json;
//!
//! let row = JsonResource::new("Catalog.Product")
//!     .with("Id", json!(1))
//!     .with("Name", json!("Lamp"));
//!
//! assert_eq!(row.resource_type_name(), "Catalog.Product");
//! assert_eq!(row.projected_property_value("Name"), Some(json!("Lamp")));
//! assert_eq!(row.projected_property_value("Price"), None);
//! ```

use std::sync::Arc;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::query::ProjectionSpec;

/// A result object that can expose a subset of its properties.
pub trait ProjectedResult {
    /// Returns the name of the type this object represents.
    fn resource_type_name(&self) -> &str;

    /// Returns the value of the named property, or `None` if this object
    /// cannot supply it.
    fn projected_property_value(&self, name: &str) -> Option<Value>;
}

impl<T: ProjectedResult + ?Sized> ProjectedResult for &T {
    fn resource_type_name(&self) -> &str {
        (**self).resource_type_name()
    }

    fn projected_property_value(&self, name: &str) -> Option<Value> {
        (**self).projected_property_value(name)
    }
}

impl<T: ProjectedResult + ?Sized> ProjectedResult for Box<T> {
    fn resource_type_name(&self) -> &str {
        (**self).resource_type_name()
    }

    fn projected_property_value(&self, name: &str) -> Option<Value> {
        (**self).projected_property_value(name)
    }
}

impl<T: ProjectedResult + ?Sized> ProjectedResult for Arc<T> {
    fn resource_type_name(&self) -> &str {
        (**self).resource_type_name()
    }

    fn projected_property_value(&self, name: &str) -> Option<Value> {
        (**self).projected_property_value(name)
    }
}

/// A row whose reported type differs from the type the projection was
/// validated against.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Projection was validated for type '{expected}' but a row reported type '{actual}'")]
pub struct ProjectionTypeMismatch {
    /// The validated type name.
    pub expected: String,
    /// The type name the row reported.
    pub actual: String,
}

/// Why a row could not be projected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProjectionFailure {
    /// The row reported the wrong type.
    #[error(transparent)]
    TypeMismatch(#[from] ProjectionTypeMismatch),

    /// The row could not supply a property the projection selected.
    #[error("Row of type '{type_name}' did not supply selected property '{property}'")]
    PropertyUnavailable {
        /// The selected property.
        property: String,
        /// The row's type name.
        type_name: String,
    },
}

/// Projects one row onto the selected names, in selection order.
///
/// # Errors
///
/// Returns a [`ProjectionFailure`] if the row reports a different type or
/// cannot supply one of the names.
pub fn project_row<R>(row: &R, spec: &ProjectionSpec) -> Result<Map<String, Value>, ProjectionFailure>
where
    R: ProjectedResult + ?Sized,
{
    let actual = row.resource_type_name();
    if actual != spec.type_name() {
        return Err(ProjectionTypeMismatch {
            expected: spec.type_name().to_string(),
            actual: actual.to_string(),
        }
        .into());
    }

    spec.names()
        .iter()
        .map(|name| {
            row.projected_property_value(name)
                .map(|value| (name.clone(), value))
                .ok_or_else(|| ProjectionFailure::PropertyUnavailable {
                    property: name.clone(),
                    type_name: actual.to_string(),
                })
        })
        .collect()
}

/// Projects every row, or none.
///
/// The first failing row aborts the whole batch; no partial output is
/// returned.
///
/// # Errors
///
/// Returns the [`ProjectionFailure`] of the first row that cannot be
/// projected.
pub fn materialize<R: ProjectedResult>(rows: &[R], spec: &ProjectionSpec) -> Result<Vec<Value>, ProjectionFailure> {
    rows.iter()
        .map(|row| project_row(row, spec).map(Value::Object))
        .collect()
}

/// A dynamically typed row backed by a JSON object.
///
/// Serializes as its property map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonResource {
    type_name: String,
    properties: Map<String, Value>,
}

impl JsonResource {
    /// Creates a row of `type_name` with no properties.
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            properties: Map::new(),
        }
    }

    /// Creates a row of `type_name` from an existing property map.
    #[must_use]
    pub fn from_map(type_name: impl Into<String>, properties: Map<String, Value>) -> Self {
        Self {
            type_name: type_name.into(),
            properties,
        }
    }

    /// Sets a property.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    /// Returns the property map.
    #[must_use]
    pub const fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }
}

impl ProjectedResult for JsonResource {
    fn resource_type_name(&self) -> &str {
        &self.type_name
    }

    fn projected_property_value(&self, name: &str) -> Option<Value> {
        self.properties.get(name).cloned()
    }
}

impl Serialize for JsonResource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.properties.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::SelectList;
    use crate::schema::{ServiceSchema, StructuredTypeBuilder};
    use serde_json::json;

    fn spec(select: &str) -> ProjectionSpec {
        let schema = ServiceSchema::builder()
            .structured_type(
                StructuredTypeBuilder::entity("Catalog.Product")
                    .key("Id")
                    .property("Id", "Edm.Int32")
                    .property("Name", "Edm.String")
                    .property("Price", "Edm.Decimal"),
            )
            .entity_set("Products", "Catalog.Product")
            .build()
            .unwrap();
        SelectList::parse(select, 64)
            .unwrap()
            .unwrap()
            .validate(&schema, "Catalog.Product")
            .unwrap()
    }

    fn lamp() -> JsonResource {
        JsonResource::new("Catalog.Product")
            .with("Id", json!(1))
            .with("Name", json!("Lamp"))
            .with("Price", json!(12.5))
    }

    /// A computed row that only knows how to produce its name.
    struct NameOnly;

    impl ProjectedResult for NameOnly {
        fn resource_type_name(&self) -> &str {
            "Catalog.Product"
        }

        fn projected_property_value(&self, name: &str) -> Option<Value> {
            (name == "Name").then(|| json!("computed"))
        }
    }

    #[test]
    fn test_project_row_keeps_only_selected() {
        let projected = project_row(&lamp(), &spec("Name")).unwrap();
        assert_eq!(Value::Object(projected), json!({ "Name": "Lamp" }));
    }

    #[test]
    fn test_project_row_follows_select_order() {
        let projected = project_row(&lamp(), &spec("Price,Id,Name")).unwrap();
        let keys: Vec<&str> = projected.keys().map(String::as_str).collect();
        assert_eq!(keys, ["Price", "Id", "Name"]);
    }

    #[test]
    fn test_project_row_rejects_other_type() {
        let row = JsonResource::new("Catalog.Category").with("Name", json!("Lights"));
        let err = project_row(&row, &spec("Name")).unwrap_err();
        assert_eq!(
            err,
            ProjectionFailure::TypeMismatch(ProjectionTypeMismatch {
                expected: "Catalog.Product".to_string(),
                actual: "Catalog.Category".to_string(),
            })
        );
    }

    #[test]
    fn test_project_row_reports_missing_value() {
        let err = project_row(&NameOnly, &spec("Name,Price")).unwrap_err();
        assert!(matches!(
            err,
            ProjectionFailure::PropertyUnavailable { ref property, .. } if property == "Price"
        ));
    }

    #[test]
    fn test_any_representation_can_be_projected() {
        let boxed: Box<dyn ProjectedResult> = Box::new(NameOnly);
        let projected = project_row(&boxed, &spec("Name")).unwrap();
        assert_eq!(projected.get("Name"), Some(&json!("computed")));

        let shared = Arc::new(lamp());
        assert_eq!(shared.resource_type_name(), "Catalog.Product");
    }

    #[test]
    fn test_materialize_is_all_or_nothing() {
        let rows = vec![lamp(), JsonResource::new("Catalog.Category")];
        assert!(materialize(&rows, &spec("Name")).is_err());

        let rows = vec![lamp(), lamp().with("Name", json!("Desk"))];
        let values = materialize(&rows, &spec("Id,Name")).unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[1], json!({ "Id": 1, "Name": "Desk" }));
    }

    #[test]
    fn test_json_resource_serializes_as_properties() {
        let value = serde_json::to_value(lamp()).unwrap();
        assert_eq!(value, json!({ "Id": 1, "Name": "Lamp", "Price": 12.5 }));
    }
}
