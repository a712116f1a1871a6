//! XML namespace handling
//!
//! This module provides qualified names (QNames), prefix resolution for
//! parsed documents, and [`PrefixMap`], the per-run prefix bindings the
//! serializer uses when it writes namespace declarations.

use crate::error::{Error, Result};
use crate::names::validate_ncname;
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

/// XML Namespace URI
pub type NamespaceUri = String;

/// Namespace prefix
pub type Prefix = String;

/// XML namespace
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// XML Schema instance namespace
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Qualified name (QName) - combination of namespace and local name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    /// Namespace URI (None for no namespace)
    pub namespace: Option<NamespaceUri>,
    /// Local name
    pub local_name: String,
}

impl QName {
    /// Create a new QName
    pub fn new(namespace: Option<impl Into<String>>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.map(|s| s.into()).filter(|s: &String| !s.is_empty()),
            local_name: local_name.into(),
        }
    }

    /// Create a QName without a namespace
    pub fn local(local_name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local_name: local_name.into(),
        }
    }

    /// Create a QName with a namespace
    pub fn namespaced(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self::new(Some(namespace), local_name)
    }

    /// Parse Clark notation (`{uri}local`) or a bare local name
    pub fn from_clark(s: &str) -> Result<Self> {
        if let Some(rest) = s.strip_prefix('{') {
            let (ns, local) = rest
                .split_once('}')
                .ok_or_else(|| Error::Name(format!("Unterminated namespace in '{}'", s)))?;
            validate_ncname(local)?;
            Ok(QName::namespaced(ns, local))
        } else {
            validate_ncname(s)?;
            Ok(QName::local(s))
        }
    }

    /// Namespace as a string slice
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local_name),
            None => write!(f, "{}", self.local_name),
        }
    }
}

/// Namespace context for resolving prefixes
#[derive(Debug, Clone, Default)]
pub struct NamespaceContext {
    /// Mapping from prefix to namespace URI
    prefixes: HashMap<Prefix, NamespaceUri>,
    /// Default namespace (no prefix)
    default_namespace: Option<NamespaceUri>,
}

impl NamespaceContext {
    /// Create a new empty namespace context
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a namespace prefix mapping
    pub fn add_prefix(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) {
        self.prefixes.insert(prefix.into(), namespace.into());
    }

    /// Set the default namespace
    pub fn set_default_namespace(&mut self, namespace: impl Into<String>) {
        self.default_namespace = Some(namespace.into()).filter(|ns| !ns.is_empty());
    }

    /// Get the namespace for a prefix
    pub fn get_namespace(&self, prefix: &str) -> Option<&str> {
        if prefix == "xml" {
            return Some(XML_NAMESPACE);
        }
        self.prefixes.get(prefix).map(|s| s.as_str())
    }

    /// Get the default namespace
    pub fn get_default_namespace(&self) -> Option<&str> {
        self.default_namespace.as_deref()
    }

    /// Resolve a prefixed name to a QName
    pub fn resolve(&self, prefixed_name: &str) -> Result<QName> {
        if let Some((prefix, local)) = prefixed_name.split_once(':') {
            let namespace = self
                .get_namespace(prefix)
                .ok_or_else(|| Error::Namespace(format!("Unknown prefix: {}", prefix)))?;
            Ok(QName::namespaced(namespace, local))
        } else {
            Ok(QName::new(self.default_namespace.clone(), prefixed_name))
        }
    }

    /// Iterate over prefix bindings
    pub fn iter(&self) -> impl Iterator<Item = (&Prefix, &NamespaceUri)> {
        self.prefixes.iter()
    }
}

/// Prefix preferences for serialization.
///
/// Bindings are kept in insertion order so that namespace declarations
/// come out deterministically. A value is passed into each serializer;
/// nothing here is process-wide.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "IndexMap<String, String>")]
pub struct PrefixMap {
    bindings: IndexMap<Prefix, NamespaceUri>,
}

impl PrefixMap {
    /// Create an empty prefix map
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a prefix to a namespace. Rebinding a prefix replaces it.
    pub fn bind(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) -> Result<()> {
        let prefix = prefix.into();
        validate_ncname(&prefix)?;
        if prefix.eq_ignore_ascii_case("xml") || prefix.eq_ignore_ascii_case("xmlns") {
            return Err(Error::Namespace(format!("Reserved prefix: {}", prefix)));
        }
        let namespace = namespace.into();
        if namespace.is_empty() {
            return Err(Error::Namespace(format!(
                "Prefix '{}' cannot be bound to the empty namespace",
                prefix
            )));
        }
        self.bindings.insert(prefix, namespace);
        Ok(())
    }

    /// Builder-style [`bind`](Self::bind)
    pub fn with(mut self, prefix: impl Into<String>, namespace: impl Into<String>) -> Result<Self> {
        self.bind(prefix, namespace)?;
        Ok(self)
    }

    /// Parse a `prefix=uri` binding, as given on the command line
    pub fn parse_binding(binding: &str) -> Result<(String, String)> {
        let (prefix, uri) = binding.split_once('=').ok_or_else(|| {
            Error::Namespace(format!("Expected prefix=uri, got '{}'", binding))
        })?;
        Ok((prefix.trim().to_string(), uri.trim().to_string()))
    }

    /// First prefix bound to a namespace
    pub fn prefix_for(&self, namespace: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|(_, uri)| uri.as_str() == namespace)
            .map(|(prefix, _)| prefix.as_str())
    }

    /// Namespace bound to a prefix
    pub fn namespace_for(&self, prefix: &str) -> Option<&str> {
        self.bindings.get(prefix).map(|s| s.as_str())
    }

    /// Add the bindings of `other` whose prefix and namespace are both unused here
    pub fn merge_missing(&mut self, other: &PrefixMap) {
        for (prefix, uri) in &other.bindings {
            if !self.bindings.contains_key(prefix) && self.prefix_for(uri).is_none() {
                self.bindings.insert(prefix.clone(), uri.clone());
            }
        }
    }

    /// Iterate over bindings in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings.iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }

    /// Whether there are no bindings
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl TryFrom<IndexMap<String, String>> for PrefixMap {
    type Error = Error;

    fn try_from(map: IndexMap<String, String>) -> Result<Self> {
        let mut prefixes = PrefixMap::new();
        for (prefix, uri) in map {
            prefixes.bind(prefix, uri)?;
        }
        Ok(prefixes)
    }
}
