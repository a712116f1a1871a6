//! Collected values
//!
//! A [`ValueNode`] tree is what the collector produces for one run: leaf
//! strings, composites keyed by child name in schema declaration order,
//! and the instances of a repeatable section.

use indexmap::IndexMap;

use crate::namespaces::QName;

/// A collected value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueNode {
    /// Text of a simple-typed element
    Leaf(String),
    /// Mandatory children of a complex element, in declaration order
    Composite(IndexMap<QName, ValueNode>),
    /// Instances of a repeatable child, in collection order
    Repeated(Vec<ValueNode>),
}

impl ValueNode {
    /// Create a leaf
    pub fn leaf(text: impl Into<String>) -> Self {
        ValueNode::Leaf(text.into())
    }

    /// Create an empty composite
    pub fn composite() -> Self {
        ValueNode::Composite(IndexMap::new())
    }

    /// Leaf text, if this is a leaf
    pub fn as_leaf(&self) -> Option<&str> {
        match self {
            ValueNode::Leaf(text) => Some(text),
            _ => None,
        }
    }

    /// Child entry of a composite
    pub fn get(&self, name: &QName) -> Option<&ValueNode> {
        match self {
            ValueNode::Composite(children) => children.get(name),
            _ => None,
        }
    }

    /// Child names of a composite, in insertion order
    pub fn keys(&self) -> Vec<&QName> {
        match self {
            ValueNode::Composite(children) => children.keys().collect(),
            _ => Vec::new(),
        }
    }

    /// Instances of a repeated entry
    pub fn instances(&self) -> &[ValueNode] {
        match self {
            ValueNode::Repeated(items) => items,
            _ => std::slice::from_ref(self),
        }
    }

    /// Number of leaves in the tree
    pub fn leaf_count(&self) -> usize {
        match self {
            ValueNode::Leaf(_) => 1,
            ValueNode::Composite(children) => children.values().map(ValueNode::leaf_count).sum(),
            ValueNode::Repeated(items) => items.iter().map(ValueNode::leaf_count).sum(),
        }
    }
}
