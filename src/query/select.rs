//! `$select` parsing and validation.
//!
//! Parsing produces a [`SelectList`] of unique names. Validation checks the
//! list once against the resolved terminal type and yields a
//! [`ProjectionSpec`] scoped to that type; no row is fetched before this
//! succeeds.

use serde::Serialize;
use thiserror::Error;

use super::options::QueryOptionError;
use crate::schema::SchemaProvider;

const SELECT_ALL: &str = "*";

/// A selected property name the target type does not declare.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Type '{type_name}' does not declare a property named '{property}'")]
pub struct ProjectionValidationError {
    /// The unknown property name.
    pub property: String,
    /// The type the projection was validated against.
    pub type_name: String,
}

/// Parsed, not yet validated `$select` names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectList {
    names: Vec<String>,
}

impl SelectList {
    /// Parses comma-separated `$select` text.
    ///
    /// Items are trimmed and duplicates dropped, keeping the first
    /// occurrence. Returns `Ok(None)` when the list contains `*`, meaning
    /// every property is selected.
    ///
    /// # Errors
    ///
    /// Returns [`QueryOptionError::EmptySelectItem`] for an empty item and
    /// [`QueryOptionError::TooManySelectItems`] when more than `max_items`
    /// unique names are listed.
    pub fn parse(text: &str, max_items: usize) -> Result<Option<Self>, QueryOptionError> {
        let mut names: Vec<String> = Vec::new();
        let mut select_all = false;

        for item in text.split(',').map(str::trim) {
            if item.is_empty() {
                return Err(QueryOptionError::EmptySelectItem);
            }
            if item == SELECT_ALL {
                select_all = true;
            } else if !names.iter().any(|name| name == item) {
                names.push(item.to_string());
            }
        }

        if names.len() > max_items {
            return Err(QueryOptionError::TooManySelectItems { limit: max_items });
        }

        Ok(if select_all { None } else { Some(Self { names }) })
    }

    /// Returns the selected names in request order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Checks every name against the properties `type_name` declares.
    ///
    /// # Errors
    ///
    /// Returns a [`ProjectionValidationError`] naming the first unknown
    /// property.
    pub fn validate<S>(self, schema: &S, type_name: &str) -> Result<ProjectionSpec, ProjectionValidationError>
    where
        S: SchemaProvider + ?Sized,
    {
        if let Some(unknown) = self
            .names
            .iter()
            .find(|name| !schema.declares_property(type_name, name))
        {
            return Err(ProjectionValidationError {
                property: unknown.clone(),
                type_name: type_name.to_string(),
            });
        }

        Ok(ProjectionSpec {
            type_name: type_name.to_string(),
            names: self.names,
        })
    }
}

/// A validated projection: unique property names scoped to one type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ProjectionSpec {
    type_name: String,
    names: Vec<String>,
}

impl ProjectionSpec {
    /// Returns the type the names were validated against.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Returns the selected names in request order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Returns `true` if `name` is selected.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|selected| selected == name)
    }
}
