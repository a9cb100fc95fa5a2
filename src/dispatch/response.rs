//! Response payloads handed back to the host.
//!
//! The payload carries enough metadata (element type, collection or single)
//! for a serializer to encode it. [`Response::to_json`] is a plain JSON
//! rendering for hosts that have no serializer of their own.

use serde_json::{json, Map, Value};

/// The shaped result of one request.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponsePayload {
    /// The service root: the names of all entity sets.
    ServiceDocument {
        /// Entity set names in declaration order.
        entity_sets: Vec<String>,
    },
    /// A collection of items.
    Collection {
        /// The element type name.
        element_type: String,
        /// Full or projected items.
        items: Vec<Value>,
        /// The element count, when `$count=true` was requested.
        count: Option<u64>,
    },
    /// A single item, `null` when an unkeyed single target has no value.
    Single {
        /// The item type name.
        element_type: String,
        /// The full or projected item.
        item: Value,
    },
    /// The scalar result of a `$count` segment.
    Count(u64),
}

impl ResponsePayload {
    /// Returns the element type name, if the payload carries items.
    #[must_use]
    pub fn element_type(&self) -> Option<&str> {
        match self {
            Self::Collection { element_type, .. } | Self::Single { element_type, .. } => {
                Some(element_type)
            }
            Self::ServiceDocument { .. } | Self::Count(_) => None,
        }
    }

    /// Returns `true` for collection payloads.
    #[must_use]
    pub const fn is_collection(&self) -> bool {
        matches!(self, Self::Collection { .. })
    }

    /// Returns the count carried by the payload, in either form.
    #[must_use]
    pub const fn count(&self) -> Option<u64> {
        match self {
            Self::Collection { count, .. } => *count,
            Self::Count(count) => Some(*count),
            Self::ServiceDocument { .. } | Self::Single { .. } => None,
        }
    }

    /// Returns the fragment naming this payload's shape in context metadata.
    #[must_use]
    pub fn context_fragment(&self) -> Option<String> {
        match self {
            Self::ServiceDocument { .. } => Some(String::new()),
            Self::Collection { element_type, .. } => Some(format!("Collection({element_type})")),
            Self::Single { element_type, .. } => Some(element_type.clone()),
            Self::Count(_) => None,
        }
    }

    /// Renders the payload as JSON.
    ///
    /// Collections become `{"value": [...]}` with an `@count` member when
    /// counted; a `$count` result is a bare number; a single structured
    /// item is its own object, other single values are wrapped in `value`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::ServiceDocument { entity_sets } => {
                let sets: Vec<Value> = entity_sets
                    .iter()
                    .map(|name| json!({ "name": name, "url": name }))
                    .collect();
                json!({ "value": sets })
            }
            Self::Collection { items, count, .. } => {
                let mut body = Map::new();
                if let Some(count) = count {
                    body.insert("@count".to_string(), json!(count));
                }
                body.insert("value".to_string(), Value::Array(items.clone()));
                Value::Object(body)
            }
            Self::Single { item, .. } => match item {
                Value::Object(_) => item.clone(),
                _ => json!({ "value": item }),
            },
            Self::Count(count) => json!(count),
        }
    }
}

/// A payload plus protocol metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// The shaped result.
    pub payload: ResponsePayload,
    /// The context URL, when a service root is configured.
    pub context: Option<String>,
}

impl Response {
    /// Renders the response as JSON, adding `@context` as the first member of
    /// object bodies.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let body = self.payload.to_json();
        match (&self.context, body) {
            (Some(context), Value::Object(members)) => {
                let mut map = Map::with_capacity(members.len() + 1);
                map.insert("@context".to_string(), json!(context));
                map.extend(members);
                Value::Object(map)
            }
            (_, body) => body,
        }
    }
}
