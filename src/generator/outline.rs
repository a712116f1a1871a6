//! Mandatory-structure outline
//!
//! What the collector would ask for, without asking: the tree of mandatory
//! particles below a root element with their bounds, types and allowed
//! values. A type already being expanded higher up is marked recursive
//! instead of expanded again.

use std::fmt;

use serde::Serialize;

use crate::error::Result;
use crate::validators::{ComplexContent, SchemaModel, TypeDescriptor, TypeId};

use super::collector::type_label;

/// Kind of outline entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlineKind {
    /// A value is asked for
    Leaf,
    /// Children are visited
    Section,
}

/// One mandatory element of the outline
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutlineNode {
    /// Qualified name in Clark notation
    pub name: String,
    /// Schema path without repetition indexes
    pub path: String,
    /// Occurrence bounds (`1..1`, `1..*`)
    pub occurs: String,
    /// Type label
    #[serde(rename = "type")]
    pub type_name: String,
    /// Leaf or section
    pub kind: OutlineKind,
    /// Allowed values, for enumerated leaves
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub enumeration: Vec<String>,
    /// Fixed value, never asked for
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed: Option<String>,
    /// Whether the continuation is consulted
    pub repeatable: bool,
    /// Whether the type recurses into itself here
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub recursive: bool,
    /// Mandatory children
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<OutlineNode>,
}

/// Outline of the mandatory structure below a global element
pub fn outline(model: &SchemaModel, root: &str) -> Result<OutlineNode> {
    let element = model.resolve_root_element(root)?;
    let particle = element.as_particle();
    let mut builder = OutlineBuilder {
        model,
        expanding: Vec::new(),
    };
    Ok(builder.node(
        &particle.name.to_string(),
        particle.name.local_name.clone(),
        particle.occurs.to_string(),
        false,
        particle.type_id,
        particle.fixed().map(str::to_string),
    ))
}

struct OutlineBuilder<'m> {
    model: &'m SchemaModel,
    expanding: Vec<TypeId>,
}

impl OutlineBuilder<'_> {
    fn node(
        &mut self,
        name: &str,
        path: String,
        occurs: String,
        repeatable: bool,
        type_id: TypeId,
        fixed: Option<String>,
    ) -> OutlineNode {
        let mut node = OutlineNode {
            name: name.to_string(),
            path,
            occurs,
            type_name: type_label(self.model, type_id),
            kind: OutlineKind::Leaf,
            enumeration: Vec::new(),
            fixed,
            repeatable,
            recursive: false,
            children: Vec::new(),
        };

        let content = match self.model.type_of(type_id) {
            TypeDescriptor::Complex(complex) => match &complex.content {
                ComplexContent::Elements(content) => Some(content),
                ComplexContent::Simple(_) => None,
            },
            TypeDescriptor::Simple(_) => None,
        };
        let content = match (content, &node.fixed) {
            (Some(content), None) => content,
            _ => {
                node.enumeration = self.model.enumeration_of(type_id).to_vec();
                return node;
            }
        };

        node.kind = OutlineKind::Section;
        if self.expanding.contains(&type_id) {
            node.recursive = true;
            return node;
        }

        self.expanding.push(type_id);
        for particle in self.model.particles_of(content) {
            if !particle.occurs.is_mandatory() {
                continue;
            }
            let child = self.node(
                &particle.name.to_string(),
                format!("{}/{}", node.path, particle.name.local_name),
                particle.occurs.to_string(),
                particle.occurs.is_repeatable(),
                particle.type_id,
                particle.fixed().map(str::to_string),
            );
            node.children.push(child);
        }
        self.expanding.pop();
        node
    }
}

impl OutlineNode {
    /// Number of values a single-instance run asks for
    pub fn leaf_count(&self) -> usize {
        match self.kind {
            OutlineKind::Leaf if self.fixed.is_none() => 1,
            OutlineKind::Leaf => 0,
            OutlineKind::Section => self.children.iter().map(OutlineNode::leaf_count).sum(),
        }
    }

    fn render(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        write!(f, "{:indent$}{} [{}] {}", "", self.path, self.occurs, self.type_name, indent = depth * 2)?;
        if let Some(fixed) = &self.fixed {
            write!(f, " = '{}'", fixed)?;
        }
        if !self.enumeration.is_empty() {
            write!(f, " {{{}}}", self.enumeration.join(", "))?;
        }
        if self.recursive {
            write!(f, " (recursive)")?;
        }
        writeln!(f)?;
        for child in &self.children {
            child.render(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for OutlineNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SCHEMA: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
      <xs:complexType name="Part">
        <xs:sequence>
          <xs:element name="Code">
            <xs:simpleType>
              <xs:restriction base="xs:string">
                <xs:enumeration value="X"/>
                <xs:enumeration value="Y"/>
              </xs:restriction>
            </xs:simpleType>
          </xs:element>
          <xs:element name="Sub" type="Part" minOccurs="0"/>
          <xs:element name="Self" type="Part" maxOccurs="unbounded"/>
        </xs:sequence>
      </xs:complexType>
      <xs:element name="Kit">
        <xs:complexType>
          <xs:sequence>
            <xs:element name="Version" type="xs:string" fixed="2"/>
            <xs:element name="Part" type="Part"/>
          </xs:sequence>
        </xs:complexType>
      </xs:element>
    </xs:schema>"#;

    #[test]
    fn test_outline_marks_recursion() {
        let model = SchemaModel::from_string(SCHEMA).unwrap();
        let tree = outline(&model, "Kit").unwrap();

        assert_eq!(tree.kind, OutlineKind::Section);
        let paths: Vec<_> = tree.children.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["Kit/Version", "Kit/Part"]);

        let part = &tree.children[1];
        assert_eq!(part.children.len(), 2);
        assert_eq!(part.children[0].enumeration, vec!["X", "Y"]);
        assert_eq!(part.children[0].type_name, "xs:string");
        assert!(part.children[1].recursive);
        assert!(part.children[1].repeatable);
        assert_eq!(tree.leaf_count(), 1);
    }

    #[test]
    fn test_outline_display_and_json() {
        let model = SchemaModel::from_string(SCHEMA).unwrap();
        let tree = outline(&model, "Kit").unwrap();

        assert_eq!(
            tree.to_string(),
            "Kit [1..1] anonymous\n  Kit/Version [1..1] xs:string = '2'\n  Kit/Part [1..1] Part\n    Kit/Part/Code [1..1] xs:string {X, Y}\n    Kit/Part/Self [1..*] Part (recursive)\n"
        );

        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json["children"][0]["fixed"], "2");
        assert_eq!(json["children"][1]["kind"], "section");
        assert!(json.get("enumeration").is_none());
    }
}
