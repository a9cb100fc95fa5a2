//! Resolved request targets.
//!
//! The resolver turns a segment list into a [`TargetChain`]: an owned vector
//! of [`ResolvedTarget`] nodes where each node refers to its predecessor by
//! index. The first node is always the intrinsic service root.

use std::fmt;

use serde::Serialize;

use super::segment::KeyPredicate;
use crate::schema::PropertyKind;

/// What a resolved node refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum TargetSource {
    /// The intrinsic service root; nothing has been addressed yet.
    None,
    /// A root collection reference to a named entity set.
    EntitySet {
        /// The entity set name.
        name: String,
    },
    /// The result of a service operation.
    ServiceOperation {
        /// The operation name.
        name: String,
    },
    /// A structural or navigation property of the preceding node.
    Property {
        /// The property name.
        name: String,
        /// Whether the property is structural or navigation.
        kind: PropertyKind,
    },
}

impl TargetSource {
    /// Returns the addressed name, or `None` for the service root.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::EntitySet { name }
            | Self::ServiceOperation { name }
            | Self::Property { name, .. } => Some(name),
        }
    }

    /// Returns a short label for diagnostics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::None => "service root",
            Self::EntitySet { .. } => "entity set",
            Self::ServiceOperation { .. } => "service operation",
            Self::Property {
                kind: PropertyKind::Structural,
                ..
            } => "structural property",
            Self::Property {
                kind: PropertyKind::Navigation,
                ..
            } => "navigation property",
        }
    }
}

/// One node of a resolved target chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedTarget {
    source: TargetSource,
    is_collection: bool,
    element_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<KeyPredicate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    segment_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    previous: Option<usize>,
}

impl ResolvedTarget {
    pub(crate) fn root() -> Self {
        Self {
            source: TargetSource::None,
            is_collection: false,
            element_type: String::new(),
            key: None,
            segment_index: None,
            previous: None,
        }
    }

    pub(crate) fn new(source: TargetSource, is_collection: bool, element_type: &str) -> Self {
        Self {
            source,
            is_collection,
            element_type: element_type.to_string(),
            key: None,
            segment_index: None,
            previous: None,
        }
    }

    /// Applies a key predicate, collapsing the node to a single item.
    pub(crate) fn keyed(mut self, key: KeyPredicate) -> Self {
        self.key = Some(key);
        self.is_collection = false;
        self
    }

    /// Returns what this node refers to.
    #[must_use]
    pub const fn source(&self) -> &TargetSource {
        &self.source
    }

    /// Returns `true` if this node denotes a collection.
    #[must_use]
    pub const fn is_collection(&self) -> bool {
        self.is_collection
    }

    /// Returns the element type name (empty for the service root).
    #[must_use]
    pub fn element_type(&self) -> &str {
        &self.element_type
    }

    /// Returns the key predicate that collapsed this node, if any.
    #[must_use]
    pub const fn key(&self) -> Option<&KeyPredicate> {
        self.key.as_ref()
    }

    /// Returns the index of the segment this node was resolved from.
    #[must_use]
    pub const fn segment_index(&self) -> Option<usize> {
        self.segment_index
    }

    /// Returns the index of the preceding node in the chain.
    #[must_use]
    pub const fn previous(&self) -> Option<usize> {
        self.previous
    }

    /// Returns `true` for the intrinsic service root.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        matches!(self.source, TargetSource::None)
    }
}

impl fmt::Display for ResolvedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.source.name() {
            None => f.write_str("/"),
            Some(name) => {
                f.write_str(name)?;
                if let Some(key) = &self.key {
                    write!(f, "{key}")?;
                }
                Ok(())
            }
        }
    }
}

/// An ordered, back-reference-only chain of resolved nodes.
///
/// The chain is never empty: index `0` is always the service root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TargetChain {
    nodes: Vec<ResolvedTarget>,
}

impl TargetChain {
    /// Creates a chain holding only the service root.
    #[must_use]
    pub fn root() -> Self {
        Self {
            nodes: vec![ResolvedTarget::root()],
        }
    }

    pub(crate) fn push(&mut self, mut node: ResolvedTarget, segment_index: usize) {
        node.previous = Some(self.nodes.len() - 1);
        node.segment_index = Some(segment_index);
        self.nodes.push(node);
    }

    /// Returns the last resolved node.
    #[must_use]
    pub fn terminal(&self) -> &ResolvedTarget {
        // The root node is pushed on construction and nodes are never removed.
        &self.nodes[self.nodes.len() - 1]
    }

    /// Returns the node preceding `node`, if any.
    #[must_use]
    pub fn previous_of(&self, node: &ResolvedTarget) -> Option<&ResolvedTarget> {
        node.previous.and_then(|index| self.nodes.get(index))
    }

    /// Returns the node at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ResolvedTarget> {
        self.nodes.get(index)
    }

    /// Returns the number of nodes including the root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the chain holds no nodes. A chain always holds the
    /// root, so this is `false` for every chain the resolver produces.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns `true` if nothing beyond the service root was addressed.
    #[must_use]
    pub fn is_root_only(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Iterates over the nodes from the root to the terminal.
    pub fn iter(&self) -> std::slice::Iter<'_, ResolvedTarget> {
        self.nodes.iter()
    }

    /// Iterates from the terminal back to the root by following `previous`.
    pub fn walk_back(&self) -> impl Iterator<Item = &ResolvedTarget> {
        std::iter::successors(Some(self.terminal()), move |node| self.previous_of(node))
    }

    /// Returns the entity set the chain is rooted in, if any.
    #[must_use]
    pub fn entity_set(&self) -> Option<&str> {
        self.nodes.get(1).and_then(|node| match node.source() {
            TargetSource::EntitySet { name } => Some(name.as_str()),
            _ => None,
        })
    }
}

impl fmt::Display for TargetChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root_only() {
            return f.write_str("/");
        }
        for node in self.nodes.iter().skip(1) {
            write!(f, "/{node}")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a TargetChain {
    type Item = &'a ResolvedTarget;
    type IntoIter = std::slice::Iter<'a, ResolvedTarget>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

// Verify types are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<TargetSource>();
    assert_send_sync::<TargetChain>();
};
