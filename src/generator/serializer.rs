//! Document serialization
//!
//! Renders a [`DocumentNode`] tree as a UTF-8 XML 1.0 document through
//! quick-xml. Every namespace used in the tree is declared once on the
//! root element; prefixes come from the run's [`PrefixMap`] first, then
//! from the schema's own bindings, and are generated (`ns0`, `ns1`, ...)
//! for anything left.

use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use tracing::debug;

use crate::documents::{DocumentNode, NodeContent};
use crate::error::{Error, Result};
use crate::namespaces::{PrefixMap, QName};

/// Serializer for generated documents
#[derive(Debug, Clone, Default)]
pub struct Serializer {
    prefixes: PrefixMap,
    schema_bindings: PrefixMap,
    indent: Option<usize>,
}

impl Serializer {
    /// Create a serializer with the run's preferred prefixes
    pub fn new(prefixes: PrefixMap) -> Self {
        Self {
            prefixes,
            schema_bindings: PrefixMap::new(),
            indent: None,
        }
    }

    /// Fall back to the schema's prefix bindings
    pub fn with_schema_bindings(mut self, bindings: &PrefixMap) -> Self {
        self.schema_bindings = bindings.clone();
        self
    }

    /// Indent nested elements by `indent` spaces
    pub fn with_indent(mut self, indent: Option<usize>) -> Self {
        self.indent = indent.filter(|n| *n > 0);
        self
    }

    /// Serialize a document into a byte vector
    pub fn serialize(&self, root: &DocumentNode) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.serialize_to(root, &mut out)?;
        Ok(out)
    }

    /// Serialize a document into `sink`
    pub fn serialize_to<W: Write>(&self, root: &DocumentNode, sink: W) -> Result<()> {
        check_characters(root, &format!("/{}", root.tag.local_name))?;
        let prefixes = self.assign_prefixes(&namespaces_used(root))?;

        let mut writer = match self.indent {
            Some(width) => Writer::new_with_indent(sink, b' ', width),
            None => Writer::new(sink),
        };
        write(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut declarations = Vec::new();
        for (prefix, uri) in prefixes.iter() {
            declarations.push((format!("xmlns:{}", prefix), uri.to_string()));
        }
        write_node(&mut writer, root, &prefixes, &declarations)?;
        debug!(root = %root.tag, namespaces = declarations.len(), "document serialized");
        Ok(())
    }

    fn assign_prefixes(&self, namespaces: &[&str]) -> Result<PrefixMap> {
        let mut assigned = PrefixMap::new();
        let mut generated = 0usize;
        let is_free = |assigned: &PrefixMap, prefix: &str| {
            assigned.namespace_for(prefix).is_none() && self.prefixes.namespace_for(prefix).is_none()
        };

        for namespace in namespaces {
            let preferred = self.prefixes.prefix_for(namespace).map(str::to_string).or_else(|| {
                self.schema_bindings
                    .prefix_for(namespace)
                    .filter(|prefix| is_free(&assigned, prefix))
                    .map(str::to_string)
            });
            let prefix = match preferred {
                Some(prefix) => prefix,
                None => loop {
                    let candidate = format!("ns{}", generated);
                    generated += 1;
                    if is_free(&assigned, &candidate) && self.schema_bindings.namespace_for(&candidate).is_none() {
                        break candidate;
                    }
                },
            };
            assigned.bind(prefix, *namespace)?;
        }
        Ok(assigned)
    }
}

/// Distinct namespaces in document order
fn namespaces_used(root: &DocumentNode) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if let Some(ns) = node.tag.namespace() {
            if !out.contains(&ns) {
                out.push(ns);
            }
        }
        stack.extend(node.children().iter().rev());
    }
    out
}

fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r') || (c >= '\u{20}' && c != '\u{FFFE}' && c != '\u{FFFF}')
}

fn check_characters(node: &DocumentNode, path: &str) -> Result<()> {
    match &node.content {
        NodeContent::Text(text) => {
            if let Some(c) = text.chars().find(|c| !is_xml_char(*c)) {
                return Err(Error::Serialization {
                    path: path.to_string(),
                    message: format!("character U+{:04X} is not allowed in XML 1.0", c as u32),
                });
            }
        }
        NodeContent::Children(children) => {
            for (child, child_path) in children.iter().zip(child_paths(children, path)) {
                check_characters(child, &child_path)?;
            }
        }
    }
    Ok(())
}

/// Paths of siblings, indexed only where a name repeats
fn child_paths(children: &[DocumentNode], parent: &str) -> Vec<String> {
    children
        .iter()
        .enumerate()
        .map(|(index, child)| {
            let same = children.iter().filter(|c| c.tag == child.tag).count();
            if same > 1 {
                let position = children[..=index].iter().filter(|c| c.tag == child.tag).count();
                format!("{}/{}[{}]", parent, child.tag.local_name, position)
            } else {
                format!("{}/{}", parent, child.tag.local_name)
            }
        })
        .collect()
}

fn tag_name(tag: &QName, prefixes: &PrefixMap) -> String {
    match tag.namespace().and_then(|ns| prefixes.prefix_for(ns)) {
        Some(prefix) => format!("{}:{}", prefix, tag.local_name),
        None => tag.local_name.clone(),
    }
}

fn write<W: Write>(writer: &mut Writer<W>, event: Event<'_>) -> Result<()> {
    writer.write_event(event).map_err(|e| Error::Xml(e.to_string()))
}

fn write_node<W: Write>(
    writer: &mut Writer<W>,
    node: &DocumentNode,
    prefixes: &PrefixMap,
    declarations: &[(String, String)],
) -> Result<()> {
    let name = tag_name(&node.tag, prefixes);
    let mut start = BytesStart::new(name.as_str());
    for (attribute, uri) in declarations {
        start.push_attribute((attribute.as_str(), uri.as_str()));
    }

    match &node.content {
        NodeContent::Text(text) if !text.is_empty() => {
            write(writer, Event::Start(start))?;
            write(writer, Event::Text(BytesText::new(text)))?;
            write(writer, Event::End(BytesEnd::new(name.as_str())))
        }
        NodeContent::Children(children) if !children.is_empty() => {
            write(writer, Event::Start(start))?;
            for child in children {
                write_node(writer, child, prefixes, &[])?;
            }
            write(writer, Event::End(BytesEnd::new(name.as_str())))
        }
        _ => write(writer, Event::Empty(start)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn order(ns: &str) -> DocumentNode {
        let q = |local: &str| QName::namespaced(ns, local);
        DocumentNode::branch(
            q("Order"),
            vec![
                DocumentNode::leaf(q("Id"), "7"),
                DocumentNode::leaf(QName::local("Note"), "fish & <chips>"),
                DocumentNode::branch(q("Entry"), vec![DocumentNode::leaf(q("Sku"), "A")]),
                DocumentNode::branch(q("Entry"), vec![]),
            ],
        )
    }

    fn render(serializer: &Serializer, root: &DocumentNode) -> String {
        String::from_utf8(serializer.serialize(root).unwrap()).unwrap()
    }

    #[test]
    fn test_compact_output_with_generated_prefix() {
        let xml = render(&Serializer::default(), &order("urn:orders"));
        assert_eq!(
            xml,
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8"?>"#,
                r#"<ns0:Order xmlns:ns0="urn:orders"><ns0:Id>7</ns0:Id>"#,
                r#"<Note>fish &amp; &lt;chips&gt;</Note>"#,
                r#"<ns0:Entry><ns0:Sku>A</ns0:Sku></ns0:Entry><ns0:Entry/></ns0:Order>"#
            )
        );
    }

    #[test]
    fn test_prefix_preference_order() {
        let run = PrefixMap::new().with("ord", "urn:orders").unwrap();
        let schema = PrefixMap::new()
            .with("o", "urn:orders")
            .unwrap()
            .with("ord", "urn:other")
            .unwrap();

        let xml = render(&Serializer::new(run).with_schema_bindings(&schema), &order("urn:orders"));
        assert!(xml.contains(r#"<ord:Order xmlns:ord="urn:orders">"#));

        let xml = render(&Serializer::default().with_schema_bindings(&schema), &order("urn:orders"));
        assert!(xml.contains(r#"<o:Order xmlns:o="urn:orders">"#));

        // A schema prefix already taken by the run map is not reused
        let run = PrefixMap::new().with("o", "urn:elsewhere").unwrap();
        let xml = render(&Serializer::new(run).with_schema_bindings(&schema), &order("urn:orders"));
        assert!(xml.contains(r#"<ns0:Order xmlns:ns0="urn:orders">"#));
    }

    #[test]
    fn test_unqualified_document_has_no_declarations() {
        let root = DocumentNode::branch(QName::local("Root"), vec![DocumentNode::leaf(QName::local("A"), "")]);
        let xml = render(&Serializer::default(), &root);
        assert!(xml.ends_with("<Root><A/></Root>"));
        assert!(!xml.contains("xmlns"));
    }

    #[test]
    fn test_indented_output() {
        let xml = render(&Serializer::default().with_indent(Some(2)), &order("urn:orders"));
        assert!(xml.contains("\n  <ns0:Id>7</ns0:Id>"));
        assert!(xml.contains("\n    <ns0:Sku>A</ns0:Sku>"));
    }

    #[test]
    fn test_illegal_character_names_the_element() {
        let ns = "urn:orders";
        let root = DocumentNode::branch(
            QName::namespaced(ns, "Order"),
            vec![
                DocumentNode::leaf(QName::namespaced(ns, "Entry"), "ok"),
                DocumentNode::leaf(QName::namespaced(ns, "Entry"), "bell\u{7}"),
            ],
        );
        match Serializer::default().serialize(&root) {
            Err(Error::Serialization { path, message }) => {
                assert_eq!(path, "/Order/Entry[2]");
                assert!(message.contains("U+0007"));
            }
            other => panic!("expected a serialization error, got {:?}", other),
        }
    }
}
