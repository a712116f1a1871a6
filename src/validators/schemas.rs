//! The loaded schema model
//!
//! [`SchemaModel`] is an immutable arena of type descriptors built once
//! by [`load_schema`](super::parsing::load_schema). Every later
//! operation (root resolution, enumeration lookup, particle iteration,
//! simple value checks) is a pure read, so one model can be shared by
//! any number of concurrent runs through an `Arc`.

use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use super::complex_types::ComplexTypeDescriptor;
use super::elements::{ElementDescriptor, ParticleDescriptor};
use super::facets::WhiteSpace;
use super::groups::ContentModel;
use super::helpers::CheckResult;
use super::simple_types::{SimpleTypeDescriptor, Variety};
use super::builtins::{Builtin, XSD_NAMESPACE};
use super::validation::ValidationResult;

use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::locations::Location;
use crate::namespaces::{PrefixMap, QName};

/// Index of a type descriptor in a [`SchemaModel`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub(crate) usize);

impl TypeId {
    /// Arena index
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A simple or complex type
#[derive(Debug, Clone)]
pub enum TypeDescriptor {
    /// Simple type
    Simple(SimpleTypeDescriptor),
    /// Complex type
    Complex(ComplexTypeDescriptor),
}

impl TypeDescriptor {
    /// Whether this is a simple type
    pub fn is_simple(&self) -> bool {
        matches!(self, TypeDescriptor::Simple(_))
    }

    /// The simple type descriptor, if simple
    pub fn as_simple(&self) -> Option<&SimpleTypeDescriptor> {
        match self {
            TypeDescriptor::Simple(simple) => Some(simple),
            TypeDescriptor::Complex(_) => None,
        }
    }

    /// The complex type descriptor, if complex
    pub fn as_complex(&self) -> Option<&ComplexTypeDescriptor> {
        match self {
            TypeDescriptor::Complex(complex) => Some(complex),
            TypeDescriptor::Simple(_) => None,
        }
    }

    /// Type name, `None` for anonymous types
    pub fn name(&self) -> Option<&QName> {
        match self {
            TypeDescriptor::Simple(simple) => simple.name.as_ref(),
            TypeDescriptor::Complex(complex) => complex.name.as_ref(),
        }
    }

    /// Human-readable label
    pub fn label(&self) -> String {
        match self {
            TypeDescriptor::Simple(simple) => simple.label(),
            TypeDescriptor::Complex(complex) => complex.label(),
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Simple(simple) => simple.fmt(f),
            TypeDescriptor::Complex(complex) => complex.fmt(f),
        }
    }
}

/// Immutable model of a loaded schema (with its includes and imports)
#[derive(Debug, Clone)]
pub struct SchemaModel {
    pub(crate) types: Vec<TypeDescriptor>,
    pub(crate) elements: IndexMap<QName, ElementDescriptor>,
    pub(crate) named_types: IndexMap<QName, TypeId>,
    pub(crate) builtins: HashMap<Builtin, TypeId>,
    pub(crate) any_type: Option<TypeId>,
    pub(crate) target_namespace: Option<String>,
    pub(crate) bindings: PrefixMap,
    pub(crate) sources: Vec<Location>,
}

impl SchemaModel {
    /// Load a schema from a location with default limits
    pub fn load(location: &Location) -> Result<Self> {
        super::parsing::load_schema(location, &Limits::default())
    }

    /// Load a schema from a file path
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::load(&Location::path(path))
    }

    /// Load a schema from in-memory text.
    ///
    /// Relative `schemaLocation` hints can not be resolved without a base
    /// location and are reported as load errors.
    pub fn from_string(xsd: &str) -> Result<Self> {
        Self::load(&Location::String(xsd.to_string()))
    }

    /// Target namespace of the main schema document
    pub fn target_namespace(&self) -> Option<&str> {
        self.target_namespace.as_deref()
    }

    /// Prefix bindings declared in the schema sources, in discovery order
    pub fn prefix_bindings(&self) -> &PrefixMap {
        &self.bindings
    }

    /// Locations of every schema document that was loaded
    pub fn sources(&self) -> &[Location] {
        &self.sources
    }

    /// Global element declarations in declaration order
    pub fn global_elements(&self) -> impl Iterator<Item = &ElementDescriptor> {
        self.elements.values()
    }

    /// Look up a global element by qualified name
    pub fn lookup_element(&self, name: &QName) -> Option<&ElementDescriptor> {
        self.elements.get(name)
    }

    /// Look up a named type.
    ///
    /// Built-in types answer only when the schema uses them.
    pub fn lookup_type(&self, name: &QName) -> Option<TypeId> {
        if let Some(id) = self.named_types.get(name) {
            return Some(*id);
        }
        if name.namespace() != Some(XSD_NAMESPACE) {
            return None;
        }
        if name.local_name == "anyType" {
            return self.any_type;
        }
        Builtin::from_local_name(&name.local_name).and_then(|builtin| self.builtins.get(&builtin).copied())
    }

    /// Whether `member` may stand in for `head` through substitution groups
    pub fn substitutes_for(&self, member: &QName, head: &QName) -> bool {
        let mut current = self.elements.get(member).and_then(|e| e.substitution_group.as_ref());
        let mut remaining = self.elements.len();
        while let Some(name) = current {
            if name == head {
                return true;
            }
            if remaining == 0 {
                return false;
            }
            remaining -= 1;
            current = self.elements.get(name).and_then(|e| e.substitution_group.as_ref());
        }
        false
    }

    /// Whether `derived` is `base` or reaches it through its derivation chain
    pub fn is_derived_from(&self, derived: TypeId, base: TypeId) -> bool {
        if Some(base) == self.any_type {
            return true;
        }
        let mut current = Some(derived);
        let mut remaining = self.types.len();
        while let Some(id) = current {
            if id == base {
                return true;
            }
            if remaining == 0 {
                return false;
            }
            remaining -= 1;
            current = match self.type_of(id) {
                TypeDescriptor::Simple(simple) => simple.base,
                TypeDescriptor::Complex(complex) => complex.derivation.map(|(base, _)| base),
            };
        }
        false
    }

    /// Number of type descriptors (built-ins in use and anonymous types included)
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Type descriptor for an id minted by this model
    pub fn type_of(&self, id: TypeId) -> &TypeDescriptor {
        &self.types[id.0]
    }

    /// Resolve the root element a document should be generated for.
    ///
    /// Accepts Clark notation (`{uri}local`), a prefixed name using the
    /// schema's own prefix bindings (`p:local`) or a bare local name. A
    /// bare name declared in more than one namespace is ambiguous and
    /// fails with the candidates listed.
    pub fn resolve_root_element(&self, name: &str) -> Result<&ElementDescriptor> {
        let name = name.trim();
        let not_found = |candidates: Vec<String>| Error::ElementNotFound {
            name: name.to_string(),
            candidates,
        };

        if name.starts_with('{') {
            let qname = QName::from_clark(name)?;
            return self.elements.get(&qname).ok_or_else(|| not_found(Vec::new()));
        }

        if let Some((prefix, local)) = name.split_once(':') {
            let namespace = self
                .bindings
                .namespace_for(prefix)
                .ok_or_else(|| not_found(Vec::new()))?;
            return self
                .elements
                .get(&QName::namespaced(namespace, local))
                .ok_or_else(|| not_found(Vec::new()));
        }

        let mut matches = self.elements.values().filter(|e| e.name.local_name == name);
        match (matches.next(), matches.next()) {
            (Some(element), None) => Ok(element),
            (None, _) => Err(not_found(Vec::new())),
            (Some(first), Some(second)) => {
                let mut candidates = vec![first.name.to_string(), second.name.to_string()];
                candidates.extend(matches.map(|e| e.name.to_string()));
                Err(not_found(candidates))
            }
        }
    }

    /// Enumeration constraining a type, in schema order.
    ///
    /// Walks the restriction chain until a step declares an enumeration;
    /// empty when the chain ends at a built-in without one. Complex types
    /// with simple content answer for their text type.
    pub fn enumeration_of(&self, id: TypeId) -> &[String] {
        match self.leaf_type_of(id) {
            Some(simple) => self
                .simple_chain(simple)
                .find(|step| step.facets.has_enumeration())
                .map(|step| step.facets.enumeration.as_slice())
                .unwrap_or(&[]),
            None => &[],
        }
    }

    /// Element particles of a content model in declaration order
    pub fn particles_of(&self, content: &ContentModel) -> Vec<ParticleDescriptor> {
        content.particles()
    }

    /// The simple type carried as text by values of `id`: the type itself
    /// when simple, the content type for simple content, otherwise `None`
    pub fn leaf_type_of(&self, id: TypeId) -> Option<TypeId> {
        match self.type_of(id) {
            TypeDescriptor::Simple(_) => Some(id),
            TypeDescriptor::Complex(complex) => complex.simple_content(),
        }
    }

    /// Iterate over a simple type and its restriction bases
    pub fn simple_chain(&self, id: TypeId) -> impl Iterator<Item = &SimpleTypeDescriptor> {
        let mut next = Some(id);
        // The parser rejects circular derivation; the bound keeps this total anyway
        let mut remaining = self.types.len();
        std::iter::from_fn(move || {
            let current = next?;
            if remaining == 0 {
                return None;
            }
            remaining -= 1;
            let simple = self.type_of(current).as_simple()?;
            next = simple.base;
            Some(simple)
        })
    }

    /// Effective white space handling of a simple type
    pub fn white_space_of(&self, id: TypeId) -> WhiteSpace {
        if let Some(ws) = self.simple_chain(id).find_map(|step| step.facets.white_space) {
            return ws;
        }
        match self.type_of(id).as_simple() {
            Some(simple) if simple.variety == Variety::Atomic => simple.builtin.white_space(),
            _ => WhiteSpace::Collapse,
        }
    }

    /// Check a lexical value against a simple type (or the text type of a
    /// complex type with simple content): white space normalization, the
    /// built-in lexical space, list items, union members and every facet
    /// along the derivation chain.
    pub fn validate_simple(&self, id: TypeId, raw: &str) -> CheckResult {
        let simple = match self.type_of(id) {
            TypeDescriptor::Simple(simple) => simple,
            TypeDescriptor::Complex(complex) => match complex.simple_content() {
                Some(text) => return self.validate_simple(text, raw),
                None => return Ok(()),
            },
        };
        let value = self.white_space_of(id).normalize(raw);

        let measured = match &simple.variety {
            Variety::Atomic => {
                simple.builtin.validate(&value)?;
                Some(atomic_length(simple.builtin, &value))
            }
            Variety::List(item) => {
                for token in value.split_whitespace() {
                    self.validate_simple(*item, token)
                        .map_err(|reason| format!("list item '{}': {}", token, reason))?;
                }
                Some(value.split_whitespace().count())
            }
            Variety::Union(members) => {
                if !members.iter().any(|m| self.validate_simple(*m, &value).is_ok()) {
                    return Err(format!(
                        "value '{}' does not match any member type of the union",
                        value
                    ));
                }
                None
            }
        };

        for step in self.simple_chain(id) {
            if let Some(len) = measured {
                step.facets.check_length(len)?;
            }
            step.facets.validate(&value)?;
        }
        Ok(())
    }

    /// Validate a serialized document against this schema
    pub fn validate(&self, xml: &[u8]) -> Result<ValidationResult> {
        super::document_validation::validate(xml, self)
    }
}

fn atomic_length(builtin: Builtin, value: &str) -> usize {
    match builtin {
        Builtin::HexBinary => value.len() / 2,
        Builtin::Base64Binary => {
            let symbols = value.chars().filter(|c| !c.is_whitespace() && *c != '=').count();
            symbols * 3 / 4
        }
        _ if builtin.list_item().is_some() => value.split_whitespace().count(),
        _ => value.chars().count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDERS: &str = r#"<?xml version="1.0"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns:ord="urn:orders" targetNamespace="urn:orders"
           elementFormDefault="qualified">
  <xs:simpleType name="StatusBase">
    <xs:restriction base="xs:token">
      <xs:enumeration value="OPEN"/>
      <xs:enumeration value="CLOSED"/>
    </xs:restriction>
  </xs:simpleType>
  <xs:simpleType name="Status">
    <xs:restriction base="ord:StatusBase">
      <xs:maxLength value="6"/>
    </xs:restriction>
  </xs:simpleType>
  <xs:simpleType name="Codes">
    <xs:list itemType="xs:int"/>
  </xs:simpleType>
  <xs:simpleType name="ShortCodes">
    <xs:restriction base="ord:Codes">
      <xs:maxLength value="2"/>
    </xs:restriction>
  </xs:simpleType>
  <xs:simpleType name="IntOrNA">
    <xs:union memberTypes="xs:int">
      <xs:simpleType>
        <xs:restriction base="xs:string"><xs:enumeration value="N/A"/></xs:restriction>
      </xs:simpleType>
    </xs:union>
  </xs:simpleType>
  <xs:element name="Order">
    <xs:complexType>
      <xs:sequence>
        <xs:element name="Status" type="ord:Status"/>
      </xs:sequence>
    </xs:complexType>
  </xs:element>
  <xs:element name="Note" type="xs:string"/>
</xs:schema>"#;

    fn model() -> SchemaModel {
        SchemaModel::from_string(ORDERS).unwrap()
    }

    #[test]
    fn test_model_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SchemaModel>();
    }

    #[test]
    fn test_resolve_root_element_forms() {
        let model = model();
        assert_eq!(
            model.resolve_root_element("Order").unwrap().name,
            QName::namespaced("urn:orders", "Order")
        );
        assert!(model.resolve_root_element("{urn:orders}Order").is_ok());
        assert!(model.resolve_root_element("ord:Order").is_ok());
        assert!(matches!(
            model.resolve_root_element("Invoice"),
            Err(Error::ElementNotFound { .. })
        ));
        assert!(model.resolve_root_element("nope:Order").is_err());
    }

    #[test]
    fn test_enumeration_walks_base_chain() {
        let model = model();
        let status = model.lookup_type(&QName::namespaced("urn:orders", "Status")).unwrap();
        assert_eq!(model.enumeration_of(status), ["OPEN", "CLOSED"]);

        let note = model
            .resolve_root_element("Note")
            .map(|e| e.type_id)
            .unwrap();
        assert!(model.enumeration_of(note).is_empty());
    }

    #[test]
    fn test_validate_simple_applies_every_step() {
        let model = model();
        let status = model.lookup_type(&QName::namespaced("urn:orders", "Status")).unwrap();
        assert!(model.validate_simple(status, " OPEN ").is_ok());
        assert!(model.validate_simple(status, "PENDING").is_err());
    }

    #[test]
    fn test_validate_list_and_union() {
        let model = model();
        let codes = model.lookup_type(&QName::namespaced("urn:orders", "ShortCodes")).unwrap();
        assert!(model.validate_simple(codes, "1 2").is_ok());
        assert!(model.validate_simple(codes, "1 2 3").is_err());
        assert!(model.validate_simple(codes, "1 x").is_err());

        let union = model.lookup_type(&QName::namespaced("urn:orders", "IntOrNA")).unwrap();
        assert!(model.validate_simple(union, "42").is_ok());
        assert!(model.validate_simple(union, "N/A").is_ok());
        assert!(model.validate_simple(union, "many").is_err());
    }

    #[test]
    fn test_particles_of_root() {
        let model = model();
        let order = model.resolve_root_element("Order").unwrap();
        let complex = model.type_of(order.type_id).as_complex().unwrap();
        let particles = model.particles_of(complex.content_model().unwrap());
        assert_eq!(particles.len(), 1);
        assert_eq!(particles[0].name, QName::namespaced("urn:orders", "Status"));
    }

    #[test]
    fn test_ambiguous_local_name() {
        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                               targetNamespace="urn:a" xmlns:a="urn:a">
              <xs:import namespace="urn:b" schemaLocation="b.xsd"/>
              <xs:element name="Item" type="xs:string"/>
            </xs:schema>"#;
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.xsd"), xsd).unwrap();
        std::fs::write(
            dir.path().join("b.xsd"),
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:b">
                 <xs:element name="Item" type="xs:string"/>
               </xs:schema>"#,
        )
        .unwrap();

        let model = SchemaModel::from_file(dir.path().join("a.xsd")).unwrap();
        match model.resolve_root_element("Item") {
            Err(Error::ElementNotFound { candidates, .. }) => {
                assert_eq!(candidates, vec!["{urn:a}Item", "{urn:b}Item"]);
            }
            other => panic!("expected an ambiguity error, got {:?}", other.map(|e| &e.name)),
        }
        assert!(model.resolve_root_element("{urn:b}Item").is_ok());
    }

    const SUBSTITUTIONS: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
      <xs:complexType name="Shape" abstract="true">
        <xs:sequence><xs:element name="Id" type="xs:int"/></xs:sequence>
      </xs:complexType>
      <xs:complexType name="Circle">
        <xs:complexContent>
          <xs:extension base="Shape">
            <xs:sequence><xs:element name="Radius" type="xs:decimal"/></xs:sequence>
          </xs:extension>
        </xs:complexContent>
      </xs:complexType>
      <xs:element name="Head" type="xs:string" abstract="true"/>
      <xs:element name="Member" substitutionGroup="Head"/>
      <xs:element name="Nested" type="xs:string" substitutionGroup="Member"/>
      <xs:element name="Other" type="xs:string"/>
    </xs:schema>"#;

    #[test]
    fn test_substitution_groups() {
        let model = SchemaModel::from_string(SUBSTITUTIONS).unwrap();
        let head = QName::local("Head");
        assert!(model.substitutes_for(&QName::local("Member"), &head));
        assert!(model.substitutes_for(&QName::local("Nested"), &head));
        assert!(!model.substitutes_for(&QName::local("Other"), &head));
        assert!(!model.substitutes_for(&head, &QName::local("Member")));

        let head_type = model.lookup_element(&head).unwrap().type_id;
        assert_eq!(model.lookup_element(&QName::local("Member")).unwrap().type_id, head_type);
    }

    #[test]
    fn test_derivation_chain() {
        let model = SchemaModel::from_string(SUBSTITUTIONS).unwrap();
        let shape = model.lookup_type(&QName::local("Shape")).unwrap();
        let circle = model.lookup_type(&QName::local("Circle")).unwrap();
        assert!(model.type_of(shape).as_complex().unwrap().is_abstract);
        assert!(model.is_derived_from(circle, shape));
        assert!(!model.is_derived_from(shape, circle));

        let string = model.lookup_type(&QName::namespaced(XSD_NAMESPACE, "string")).unwrap();
        assert!(!model.is_derived_from(string, shape));
    }

    #[test]
    fn test_unresolved_substitution_head() {
        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
              <xs:element name="Member" type="xs:string" substitutionGroup="Missing"/>
            </xs:schema>"#;
        match SchemaModel::from_string(xsd) {
            Err(Error::SchemaLoad(err)) => assert!(err.to_string().contains("substitutionGroup"), "{}", err),
            other => panic!("expected a load error, got {:?}", other.map(|m| m.type_count())),
        }
    }
}
