//! XSD attribute declarations
//!
//! Attribute groups are expanded when the schema is loaded, so a
//! complex type simply carries the flat list of its attribute uses.

use crate::error::ParseError;
use crate::namespaces::QName;
use std::fmt;

use super::elements::ValueConstraint;
use super::schemas::TypeId;

/// Attribute use mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttributeUse {
    /// Attribute is optional (default)
    #[default]
    Optional,
    /// Attribute is required
    Required,
    /// Attribute is prohibited
    Prohibited,
}

impl AttributeUse {
    /// Parse from string value
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        match s {
            "optional" => Ok(AttributeUse::Optional),
            "required" => Ok(AttributeUse::Required),
            "prohibited" => Ok(AttributeUse::Prohibited),
            _ => Err(ParseError::new(format!(
                "invalid attribute use value '{}': must be 'optional', 'required' or 'prohibited'",
                s
            ))),
        }
    }

    /// Get the use as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeUse::Optional => "optional",
            AttributeUse::Required => "required",
            AttributeUse::Prohibited => "prohibited",
        }
    }
}

impl fmt::Display for AttributeUse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An attribute use on a complex type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDescriptor {
    /// Qualified attribute name
    pub name: QName,
    /// Simple type of the value
    pub type_id: TypeId,
    /// Use mode
    pub use_mode: AttributeUse,
    /// Default or fixed value
    pub value_constraint: Option<ValueConstraint>,
}

impl AttributeDescriptor {
    /// Whether the attribute must be present
    pub fn is_required(&self) -> bool {
        self.use_mode == AttributeUse::Required
    }

    /// Whether the attribute must be absent
    pub fn is_prohibited(&self) -> bool {
        self.use_mode == AttributeUse::Prohibited
    }

    /// Fixed value, if any
    pub fn fixed(&self) -> Option<&str> {
        self.value_constraint.as_ref().and_then(ValueConstraint::fixed)
    }
}

/// Merge attribute uses from a derivation step into an inherited list.
///
/// A use with the same name replaces the inherited one in place (that is
/// how restrictions tighten or prohibit attributes); new names are appended.
pub fn merge_attributes(inherited: &mut Vec<AttributeDescriptor>, declared: Vec<AttributeDescriptor>) {
    for attribute in declared {
        match inherited.iter_mut().find(|a| a.name == attribute.name) {
            Some(existing) => *existing = attribute,
            None => inherited.push(attribute),
        }
    }
}
