//! XSD Complex Type descriptors
//!
//! A complex type has either element content (a [`ContentModel`]) or
//! simple content (text of a simple type), plus attribute uses.
//! Derivations are resolved at load time: an extension already contains
//! the base model followed by its own.
//!
//! Reference: https://www.w3.org/TR/xmlschema11-1/#Complex_Type_Definitions

use crate::namespaces::QName;
use std::fmt;

use super::attributes::AttributeDescriptor;
use super::groups::ContentModel;
use super::particles::Occurs;
use super::schemas::TypeId;
use super::wildcards::{AttributeWildcard, WildcardDescriptor};

/// Derivation method of a complex type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivationMethod {
    /// complexContent/simpleContent extension
    Extension,
    /// complexContent/simpleContent restriction
    Restriction,
}

/// Content of a complex type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComplexContent {
    /// Child elements arranged by a content model (possibly empty)
    Elements(ContentModel),
    /// Text of the given simple type
    Simple(TypeId),
}

/// Immutable description of a complex type
#[derive(Debug, Clone)]
pub struct ComplexTypeDescriptor {
    /// Type name, `None` for anonymous types
    pub name: Option<QName>,
    /// Content
    pub content: ComplexContent,
    /// Attribute uses, inherited ones included
    pub attributes: Vec<AttributeDescriptor>,
    /// Attribute wildcard, if any
    pub any_attribute: Option<AttributeWildcard>,
    /// Whether character data may be interleaved with element content
    pub mixed: bool,
    /// Base type and derivation method, if derived
    pub derivation: Option<(TypeId, DerivationMethod)>,
    /// Abstract types need `xsi:type` naming a concrete derived type
    pub is_abstract: bool,
}

impl ComplexTypeDescriptor {
    /// A complex type with empty element content
    pub fn new(name: Option<QName>) -> Self {
        Self {
            name,
            content: ComplexContent::Elements(ContentModel::empty()),
            attributes: Vec::new(),
            any_attribute: None,
            mixed: false,
            derivation: None,
            is_abstract: false,
        }
    }

    /// `xs:anyType`: any attributes, any mixed element content
    pub fn any_type() -> Self {
        let mut content = ContentModel::empty();
        content.items.push(super::groups::ModelItem::Any(WildcardDescriptor::any(
            Occurs::zero_or_more(),
        )));
        Self {
            name: Some(QName::namespaced(super::builtins::XSD_NAMESPACE, "anyType")),
            content: ComplexContent::Elements(content),
            attributes: Vec::new(),
            any_attribute: Some(AttributeWildcard::default()),
            mixed: true,
            derivation: None,
            is_abstract: false,
        }
    }

    /// Content model, for element content
    pub fn content_model(&self) -> Option<&ContentModel> {
        match &self.content {
            ComplexContent::Elements(model) => Some(model),
            ComplexContent::Simple(_) => None,
        }
    }

    /// Text type, for simple content
    pub fn simple_content(&self) -> Option<TypeId> {
        match self.content {
            ComplexContent::Simple(id) => Some(id),
            ComplexContent::Elements(_) => None,
        }
    }

    /// Find an attribute use by name
    pub fn attribute(&self, name: &QName) -> Option<&AttributeDescriptor> {
        self.attributes.iter().find(|a| &a.name == name)
    }

    /// Human-readable label
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.local_name.clone(),
            None => "anonymous".to_string(),
        }
    }
}

impl fmt::Display for ComplexTypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "complexType '{}'", name),
            None => write!(f, "anonymous complexType"),
        }
    }
}
