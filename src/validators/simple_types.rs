//! XSD Simple Type descriptors
//!
//! A simple type is either a built-in type or a restriction, list or
//! union derived from other simple types. Derivation is recorded as a
//! chain of [`TypeId`]s; facets stay with the step that declared them.
//!
//! Reference: https://www.w3.org/TR/xmlschema11-2/#Simple_Type_Definitions

use super::builtins::Builtin;
use super::facets::FacetSet;
use super::schemas::TypeId;
use crate::namespaces::QName;
use std::fmt;

/// Variety of a simple type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Variety {
    /// Single values of a built-in primitive
    Atomic,
    /// Whitespace-separated items of the given item type
    List(TypeId),
    /// A value of any of the member types, tried in order
    Union(Vec<TypeId>),
}

/// Immutable description of a simple type
#[derive(Debug, Clone)]
pub struct SimpleTypeDescriptor {
    /// Type name, `None` for anonymous types
    pub name: Option<QName>,
    /// Built-in type whose lexical space governs atomic values
    pub builtin: Builtin,
    /// Restriction base; `None` for built-in types and for list/union roots
    pub base: Option<TypeId>,
    /// Atomic, list or union
    pub variety: Variety,
    /// Facets declared by this derivation step
    pub facets: FacetSet,
}

impl SimpleTypeDescriptor {
    /// Descriptor for a built-in type
    pub fn builtin(builtin: Builtin) -> Self {
        Self {
            name: Some(QName::namespaced(super::builtins::XSD_NAMESPACE, builtin.name())),
            builtin,
            base: None,
            variety: Variety::Atomic,
            facets: FacetSet::default(),
        }
    }

    /// Restriction of `base`, inheriting its built-in and variety
    pub fn restriction(name: Option<QName>, base_id: TypeId, base: &SimpleTypeDescriptor) -> Self {
        Self {
            name,
            builtin: base.builtin,
            base: Some(base_id),
            variety: base.variety.clone(),
            facets: FacetSet::default(),
        }
    }

    /// List of `item`
    pub fn list(name: Option<QName>, item: TypeId) -> Self {
        Self {
            name,
            builtin: Builtin::AnySimpleType,
            base: None,
            variety: Variety::List(item),
            facets: FacetSet::default(),
        }
    }

    /// Union of `members`
    pub fn union(name: Option<QName>, members: Vec<TypeId>) -> Self {
        Self {
            name,
            builtin: Builtin::AnySimpleType,
            base: None,
            variety: Variety::Union(members),
            facets: FacetSet::default(),
        }
    }

    /// Whether this is a list type
    pub fn is_list(&self) -> bool {
        matches!(self.variety, Variety::List(_))
    }

    /// Whether this is a union type
    pub fn is_union(&self) -> bool {
        matches!(self.variety, Variety::Union(_))
    }

    /// Human-readable label: the type name, or the built-in for anonymous types
    pub fn label(&self) -> String {
        match (&self.name, &self.variety) {
            (Some(name), _) => name.local_name.clone(),
            (None, Variety::Atomic) => format!("restricted {}", self.builtin),
            (None, Variety::List(_)) => "list".to_string(),
            (None, Variety::Union(_)) => "union".to_string(),
        }
    }
}

impl fmt::Display for SimpleTypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "simpleType '{}'", name),
            None => write!(f, "anonymous simpleType ({})", self.builtin),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_descriptor() {
        let desc = SimpleTypeDescriptor::builtin(Builtin::Token);
        assert_eq!(desc.base, None);
        assert_eq!(desc.variety, Variety::Atomic);
        assert_eq!(desc.label(), "token");
    }

    #[test]
    fn test_restriction_inherits_variety() {
        let base = SimpleTypeDescriptor::list(None, TypeId(0));
        let derived = SimpleTypeDescriptor::restriction(None, TypeId(1), &base);
        assert!(derived.is_list());
        assert_eq!(derived.base, Some(TypeId(1)));
        assert!(derived.facets.enumeration.is_empty());
    }

    #[test]
    fn test_labels() {
        let restricted = SimpleTypeDescriptor::restriction(
            None,
            TypeId(0),
            &SimpleTypeDescriptor::builtin(Builtin::Int),
        );
        assert_eq!(restricted.label(), "restricted xs:int");
        assert_eq!(SimpleTypeDescriptor::union(None, vec![]).label(), "union");
    }
}
