//! XML document trees
//!
//! Two trees live here. [`DocumentNode`] is the write-once tree the
//! assembler builds and the serializer reads: every node is either a
//! text leaf or a branch of child nodes. [`Document`] is the
//! namespace-resolved parse of an arbitrary byte stream, used by the
//! validator, and keeps whatever mix of text and children it finds.

use crate::error::{Error, Result};
use crate::namespaces::{QName, XSI_NAMESPACE};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{QName as RawName, ResolveResult};
use quick_xml::reader::NsReader;

/// Content of a generated document node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeContent {
    /// Text payload of a leaf element
    Text(String),
    /// Ordered child elements
    Children(Vec<DocumentNode>),
}

/// Element of a generated document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentNode {
    /// Qualified tag
    pub tag: QName,
    /// Text or children, never both
    pub content: NodeContent,
}

impl DocumentNode {
    /// Create a text leaf
    pub fn leaf(tag: QName, text: impl Into<String>) -> Self {
        Self {
            tag,
            content: NodeContent::Text(text.into()),
        }
    }

    /// Create a branch with the given children
    pub fn branch(tag: QName, children: Vec<DocumentNode>) -> Self {
        Self {
            tag,
            content: NodeContent::Children(children),
        }
    }

    /// Text payload, for leaves
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            NodeContent::Text(text) => Some(text),
            NodeContent::Children(_) => None,
        }
    }

    /// Child nodes (empty for leaves)
    pub fn children(&self) -> &[DocumentNode] {
        match &self.content {
            NodeContent::Text(_) => &[],
            NodeContent::Children(children) => children,
        }
    }

    /// Find child nodes by local name
    pub fn find_children(&self, local_name: &str) -> Vec<&DocumentNode> {
        self.children()
            .iter()
            .filter(|c| c.tag.local_name == local_name)
            .collect()
    }

    /// Iterate over this node and all descendants, depth first
    pub fn descendants(&self) -> Vec<&DocumentNode> {
        let mut out = vec![self];
        let mut index = 0;
        while index < out.len() {
            let node = out[index];
            out.extend(node.children().iter());
            index += 1;
        }
        out
    }
}

/// XML Element in a parsed document tree
#[derive(Debug, Clone)]
pub struct Element {
    /// Element qualified name
    pub qname: QName,
    /// Element attributes, in document order, without namespace declarations
    pub attributes: Vec<(QName, String)>,
    /// Character data directly inside this element (if any)
    pub text: Option<String>,
    /// Child elements
    pub children: Vec<Element>,
    /// 1-based line of the start tag
    pub line: usize,
    /// Type named by `xsi:type`, resolved in the element's scope
    pub xsi_type: Option<QName>,
}

impl Element {
    /// Create a new element
    pub fn new(qname: QName) -> Self {
        Self {
            qname,
            attributes: Vec::new(),
            text: None,
            children: Vec::new(),
            line: 0,
            xsi_type: None,
        }
    }

    /// Get the local name of the element
    pub fn local_name(&self) -> &str {
        &self.qname.local_name
    }

    /// Get the namespace of the element
    pub fn namespace(&self) -> Option<&str> {
        self.qname.namespace.as_deref()
    }

    /// Get an attribute value by qualified name
    pub fn get_attribute_qname(&self, qname: &QName) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name == qname)
            .map(|(_, value)| value.as_str())
    }

    /// Add a child element
    pub fn add_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Append character data
    pub fn push_text(&mut self, text: &str) {
        match self.text {
            Some(ref mut existing) => existing.push_str(text),
            None => self.text = Some(text.to_string()),
        }
    }

    /// Text content, or the empty string
    pub fn text_content(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// Whether the element carries non-whitespace character data
    pub fn has_significant_text(&self) -> bool {
        self.text.as_deref().is_some_and(|t| !t.trim().is_empty())
    }

    /// Find child elements by local name
    pub fn find_children(&self, local_name: &str) -> Vec<&Element> {
        self.children
            .iter()
            .filter(|e| e.local_name() == local_name)
            .collect()
    }
}

/// The XML declaration of a parsed document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDeclaration {
    /// Declared version
    pub version: String,
    /// Declared encoding, if any
    pub encoding: Option<String>,
}

/// XML Document representation
#[derive(Debug)]
pub struct Document {
    /// Root element of the document
    pub root: Option<Element>,
    /// XML declaration, if present
    pub declaration: Option<XmlDeclaration>,
}

impl Document {
    /// Parse an XML document from a string
    pub fn from_string(xml: &str) -> Result<Self> {
        Self::parse(xml.as_bytes())
    }

    /// Parse an XML document from bytes, resolving element and attribute namespaces
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let lines = LineIndex::new(xml);
        let mut reader = NsReader::from_reader(xml);

        let mut doc = Document {
            root: None,
            declaration: None,
        };
        let mut element_stack: Vec<Element> = Vec::new();
        let mut buf = Vec::new();

        loop {
            let position = reader.buffer_position();
            let event = reader.read_event_into(&mut buf).map_err(|e| {
                Error::Xml(format!(
                    "line {}: {}",
                    lines.line_of(reader.buffer_position()),
                    e
                ))
            })?;

            match event {
                Event::Decl(decl) => {
                    let version = decl
                        .version()
                        .map_err(|e| Error::Xml(format!("Invalid XML declaration: {}", e)))?;
                    let encoding = match decl.encoding() {
                        Some(enc) => Some(
                            String::from_utf8_lossy(
                                &enc.map_err(|e| Error::Xml(format!("Invalid encoding: {}", e)))?,
                            )
                            .to_string(),
                        ),
                        None => None,
                    };
                    doc.declaration = Some(XmlDeclaration {
                        version: String::from_utf8_lossy(&version).to_string(),
                        encoding,
                    });
                }
                Event::Start(e) => {
                    if doc.root.is_some() && element_stack.is_empty() {
                        return Err(Error::Xml(format!(
                            "line {}: content after the root element",
                            lines.line_of(position)
                        )));
                    }
                    let mut element = Self::parse_element(&reader, &e)?;
                    element.line = lines.line_of(position);
                    element_stack.push(element);
                }
                Event::Empty(e) => {
                    let mut element = Self::parse_element(&reader, &e)?;
                    element.line = lines.line_of(position);
                    if let Some(parent) = element_stack.last_mut() {
                        parent.add_child(element);
                    } else if doc.root.is_none() {
                        doc.root = Some(element);
                    } else {
                        return Err(Error::Xml(format!(
                            "line {}: content after the root element",
                            lines.line_of(position)
                        )));
                    }
                }
                Event::End(_) => {
                    if let Some(current) = element_stack.pop() {
                        if let Some(parent) = element_stack.last_mut() {
                            parent.add_child(current);
                        } else {
                            doc.root = Some(current);
                        }
                    }
                }
                Event::Text(e) => {
                    let text = e
                        .unescape()
                        .map_err(|e| Error::Xml(format!("Failed to unescape text: {}", e)))?;
                    if let Some(current) = element_stack.last_mut() {
                        current.push_text(&text);
                    } else if !text.trim().is_empty() {
                        return Err(Error::Xml(format!(
                            "line {}: text outside the root element",
                            lines.line_of(position)
                        )));
                    }
                }
                Event::CData(e) => {
                    let text = std::str::from_utf8(e.as_ref())
                        .map_err(|e| Error::Xml(format!("Invalid UTF-8 in CDATA: {}", e)))?;
                    if let Some(current) = element_stack.last_mut() {
                        current.push_text(text);
                    }
                }
                Event::Eof => break,
                _ => {} // Comments, processing instructions, doctype
            }
            buf.clear();
        }

        if let Some(open) = element_stack.last() {
            return Err(Error::Xml(format!(
                "unexpected end of document: element '{}' opened at line {} is not closed",
                open.local_name(),
                open.line
            )));
        }

        Ok(doc)
    }

    /// Build an element from a start tag, resolving its namespaces
    fn parse_element(reader: &NsReader<&[u8]>, start: &BytesStart) -> Result<Element> {
        let (resolved, local) = reader.resolve_element(start.name());
        let local = std::str::from_utf8(local.as_ref())
            .map_err(|e| Error::Xml(format!("Invalid element name: {}", e)))?;
        let namespace = bound_namespace(resolved, start.name().as_ref())?;
        let mut element = Element::new(QName::new(namespace, local));

        for attr_result in start.attributes() {
            let attr = attr_result
                .map_err(|e| Error::Xml(format!("Failed to parse attribute: {}", e)))?;

            let key = attr.key.as_ref();
            if key == b"xmlns" || key.starts_with(b"xmlns:") {
                continue;
            }

            let (resolved, attr_local) = reader.resolve_attribute(attr.key);
            let attr_local = std::str::from_utf8(attr_local.as_ref())
                .map_err(|e| Error::Xml(format!("Invalid attribute name: {}", e)))?
                .to_string();
            let attr_namespace = bound_namespace(resolved, key)?;

            let attr_value = attr
                .unescape_value()
                .map_err(|e| Error::Xml(format!("Failed to unescape attribute value: {}", e)))?
                .to_string();

            if attr_namespace.as_deref() == Some(XSI_NAMESPACE) && attr_local == "type" {
                let raw = attr_value.trim();
                let (resolved, type_local) = reader.resolve_element(RawName(raw.as_bytes()));
                let type_local = String::from_utf8_lossy(type_local.as_ref()).to_string();
                element.xsi_type = Some(QName::new(bound_namespace(resolved, raw.as_bytes())?, type_local));
            }

            element
                .attributes
                .push((QName::new(attr_namespace, attr_local), attr_value));
        }

        Ok(element)
    }

    /// Get the root element
    pub fn root(&self) -> Option<&Element> {
        self.root.as_ref()
    }
}

fn bound_namespace(resolved: ResolveResult, raw_name: &[u8]) -> Result<Option<String>> {
    match resolved {
        ResolveResult::Bound(ns) => Ok(Some(String::from_utf8_lossy(ns.as_ref()).to_string())),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(Error::Namespace(format!(
            "Unknown prefix '{}' in '{}'",
            String::from_utf8_lossy(&prefix),
            String::from_utf8_lossy(raw_name)
        ))),
    }
}

/// Byte offset to line number lookup
struct LineIndex {
    newlines: Vec<usize>,
}

impl LineIndex {
    fn new(xml: &[u8]) -> Self {
        Self {
            newlines: xml
                .iter()
                .enumerate()
                .filter(|(_, b)| **b == b'\n')
                .map(|(i, _)| i)
                .collect(),
        }
    }

    fn line_of(&self, offset: usize) -> usize {
        match self.newlines.binary_search(&offset) {
            Ok(index) | Err(index) => index + 1,
        }
    }
}
