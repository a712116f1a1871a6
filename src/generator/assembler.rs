//! Document assembly
//!
//! Maps a collected [`ValueNode`] tree onto a [`DocumentNode`] tree: leaves
//! become text elements, composites become branches in key order, and the
//! instances of a repeated entry become consecutive same-named siblings.

use crate::documents::DocumentNode;
use crate::error::{Error, Result};
use crate::namespaces::QName;

use super::values::ValueNode;

/// Build the document tree rooted at `tag`
pub fn assemble(tag: &QName, value: &ValueNode) -> Result<DocumentNode> {
    assemble_node(tag, value, &format!("/{}", tag.local_name))
}

fn assemble_node(tag: &QName, value: &ValueNode, path: &str) -> Result<DocumentNode> {
    match value {
        ValueNode::Leaf(text) => Ok(DocumentNode::leaf(tag.clone(), text.as_str())),
        ValueNode::Composite(entries) => {
            let mut children = Vec::with_capacity(entries.len());
            for (name, entry) in entries {
                let child_path = format!("{}/{}", path, name.local_name);
                match entry {
                    ValueNode::Repeated(instances) => {
                        for (index, instance) in instances.iter().enumerate() {
                            if matches!(instance, ValueNode::Repeated(_)) {
                                return Err(mismatch(&child_path, "repeated value nested in a repeated value"));
                            }
                            let instance_path = format!("{}[{}]", child_path, index + 1);
                            children.push(assemble_node(name, instance, &instance_path)?);
                        }
                    }
                    other => children.push(assemble_node(name, other, &child_path)?),
                }
            }
            Ok(DocumentNode::branch(tag.clone(), children))
        }
        ValueNode::Repeated(_) => Err(mismatch(path, "a repeated value needs an enclosing element")),
    }
}

fn mismatch(path: &str, message: &str) -> Error {
    Error::StructureMismatch {
        path: path.to_string(),
        message: message.to_string(),
    }
}
