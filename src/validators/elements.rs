//! XSD Element declarations
//!
//! Global declarations ([`ElementDescriptor`]) are what a document root
//! is resolved against; local occurrences inside a content model
//! ([`ParticleDescriptor`]) carry their own multiplicity.
//!
//! Reference: https://www.w3.org/TR/xmlschema11-1/#Element_Declarations

use crate::namespaces::QName;
use std::fmt;

use super::particles::Occurs;
use super::schemas::TypeId;

/// Element form (qualified or unqualified)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormDefault {
    /// Local names are namespace-qualified
    Qualified,
    /// Local names are in no namespace
    #[default]
    Unqualified,
}

impl FormDefault {
    /// Parse from string attribute value
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "qualified" => Some(Self::Qualified),
            "unqualified" => Some(Self::Unqualified),
            _ => None,
        }
    }

    /// Check if qualified
    pub fn is_qualified(&self) -> bool {
        matches!(self, Self::Qualified)
    }
}

/// Value constraint of an element or attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueConstraint {
    /// Default value applied when the content is empty
    Default(String),
    /// The only admissible value
    Fixed(String),
}

impl ValueConstraint {
    /// The fixed value, if this is a fixed constraint
    pub fn fixed(&self) -> Option<&str> {
        match self {
            ValueConstraint::Fixed(value) => Some(value),
            ValueConstraint::Default(_) => None,
        }
    }
}

/// A global element declaration
#[derive(Debug, Clone)]
pub struct ElementDescriptor {
    /// Qualified element name
    pub name: QName,
    /// Declared type
    pub type_id: TypeId,
    /// Whether `xsi:nil` is admitted
    pub nillable: bool,
    /// Default or fixed value
    pub value_constraint: Option<ValueConstraint>,
    /// Abstract elements can not appear in documents
    pub is_abstract: bool,
    /// Head of the substitution group this element belongs to
    pub substitution_group: Option<QName>,
}

impl ElementDescriptor {
    /// Particle for this declaration as a document root (exactly once)
    pub fn as_particle(&self) -> ParticleDescriptor {
        ParticleDescriptor {
            name: self.name.clone(),
            occurs: Occurs::once(),
            type_id: self.type_id,
            nillable: self.nillable,
            value_constraint: self.value_constraint.clone(),
            is_abstract: self.is_abstract,
        }
    }
}

impl fmt::Display for ElementDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element '{}'", self.name)
    }
}

/// An element occurrence inside a content model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticleDescriptor {
    /// Qualified element name
    pub name: QName,
    /// Occurrence bounds (effective, once folded through enclosing groups)
    pub occurs: Occurs,
    /// Element type
    pub type_id: TypeId,
    /// Whether `xsi:nil` is admitted
    pub nillable: bool,
    /// Default or fixed value
    pub value_constraint: Option<ValueConstraint>,
    /// Set when the particle refers to an abstract global element
    pub is_abstract: bool,
}

impl ParticleDescriptor {
    /// Create a particle with no value constraint
    pub fn new(name: QName, occurs: Occurs, type_id: TypeId) -> Self {
        Self {
            name,
            occurs,
            type_id,
            nillable: false,
            value_constraint: None,
            is_abstract: false,
        }
    }

    /// Fixed value, if any
    pub fn fixed(&self) -> Option<&str> {
        self.value_constraint.as_ref().and_then(ValueConstraint::fixed)
    }

    /// Copy with different occurrence bounds
    pub fn with_occurs(&self, occurs: Occurs) -> Self {
        Self {
            occurs,
            ..self.clone()
        }
    }
}

impl fmt::Display for ParticleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.occurs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_default() {
        assert_eq!(FormDefault::parse("qualified"), Some(FormDefault::Qualified));
        assert!(!FormDefault::default().is_qualified());
        assert_eq!(FormDefault::parse("sometimes"), None);
    }

    #[test]
    fn test_root_particle() {
        let element = ElementDescriptor {
            name: QName::namespaced("urn:x", "Root"),
            type_id: TypeId(3),
            nillable: false,
            value_constraint: Some(ValueConstraint::Fixed("1".into())),
            is_abstract: false,
            substitution_group: None,
        };
        let particle = element.as_particle();
        assert_eq!(particle.occurs, Occurs::once());
        assert_eq!(particle.fixed(), Some("1"));
        assert_eq!(particle.to_string(), "{urn:x}Root [1..1]");
    }

    #[test]
    fn test_with_occurs() {
        let particle = ParticleDescriptor::new(QName::local("Id"), Occurs::once(), TypeId(0));
        let optional = particle.with_occurs(Occurs::optional());
        assert_eq!(optional.name, particle.name);
        assert!(!optional.occurs.is_mandatory());
    }
}
