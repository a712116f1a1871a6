//! XSD Wildcards
//!
//! `xs:any` and `xs:anyAttribute`. The generator never fills a wildcard
//! (there is no declaration to collect against); the validator uses the
//! namespace constraint to decide which foreign elements and attributes
//! are admissible.
//!
//! Reference: https://www.w3.org/TR/xmlschema11-1/#Wildcards

use crate::error::ParseError;
use std::collections::BTreeSet;

use super::particles::Occurs;

/// Process contents mode for wildcards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessContents {
    /// Element must be declared globally
    #[default]
    Strict,
    /// Validate if a declaration is found, otherwise accept
    Lax,
    /// Accept without validation
    Skip,
}

impl ProcessContents {
    /// Parse from string value
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "strict" => Some(Self::Strict),
            "lax" => Some(Self::Lax),
            "skip" => Some(Self::Skip),
            _ => None,
        }
    }
}

/// Namespace constraint for wildcards.
///
/// The empty string stands for "no namespace" in the enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NamespaceConstraint {
    /// Any namespace is allowed (##any)
    #[default]
    Any,
    /// Any namespace except the target namespace and no namespace (##other)
    Other {
        /// The target namespace to exclude
        target_namespace: Option<String>,
    },
    /// Specific set of allowed namespaces
    Enumeration(BTreeSet<String>),
}

impl NamespaceConstraint {
    /// Create from the `namespace` attribute of a wildcard
    pub fn from_namespace_attr(
        value: &str,
        target_namespace: Option<&str>,
    ) -> Result<Self, ParseError> {
        match value.trim() {
            "##any" => Ok(Self::Any),
            "##other" => Ok(Self::Other {
                target_namespace: target_namespace.map(String::from),
            }),
            value => {
                let mut namespaces = BTreeSet::new();
                for ns in value.split_whitespace() {
                    match ns {
                        "##local" => {
                            namespaces.insert(String::new());
                        }
                        "##targetNamespace" => {
                            namespaces.insert(target_namespace.unwrap_or_default().to_string());
                        }
                        s if s.starts_with("##") => {
                            return Err(ParseError::new(format!(
                                "wrong value '{}' in 'namespace' attribute",
                                s
                            )));
                        }
                        uri => {
                            namespaces.insert(uri.to_string());
                        }
                    }
                }
                Ok(Self::Enumeration(namespaces))
            }
        }
    }

    /// Whether a namespace (None = no namespace) is admitted
    pub fn allows(&self, namespace: Option<&str>) -> bool {
        match self {
            Self::Any => true,
            Self::Other { target_namespace } => {
                namespace.is_some() && namespace != target_namespace.as_deref()
            }
            Self::Enumeration(set) => set.contains(namespace.unwrap_or("")),
        }
    }
}

/// An `xs:any` particle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WildcardDescriptor {
    /// Occurrence bounds
    pub occurs: Occurs,
    /// Admitted namespaces
    pub namespaces: NamespaceConstraint,
    /// How matched elements are validated
    pub process_contents: ProcessContents,
}

impl WildcardDescriptor {
    /// Wildcard admitting anything, as in `xs:anyType`
    pub fn any(occurs: Occurs) -> Self {
        Self {
            occurs,
            namespaces: NamespaceConstraint::Any,
            process_contents: ProcessContents::Lax,
        }
    }
}

/// An `xs:anyAttribute`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttributeWildcard {
    /// Admitted namespaces
    pub namespaces: NamespaceConstraint,
    /// How matched attributes are validated
    pub process_contents: ProcessContents,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_constraint_parsing() {
        let any = NamespaceConstraint::from_namespace_attr("##any", None).unwrap();
        assert!(any.allows(None));
        assert!(any.allows(Some("urn:x")));

        let other = NamespaceConstraint::from_namespace_attr("##other", Some("urn:tns")).unwrap();
        assert!(other.allows(Some("urn:x")));
        assert!(!other.allows(Some("urn:tns")));
        assert!(!other.allows(None));

        let list =
            NamespaceConstraint::from_namespace_attr("##local ##targetNamespace urn:a", Some("urn:tns"))
                .unwrap();
        assert!(list.allows(None));
        assert!(list.allows(Some("urn:tns")));
        assert!(list.allows(Some("urn:a")));
        assert!(!list.allows(Some("urn:b")));
    }

    #[test]
    fn test_bad_namespace_keyword() {
        assert!(NamespaceConstraint::from_namespace_attr("##bogus", None).is_err());
    }

    #[test]
    fn test_process_contents() {
        assert_eq!(ProcessContents::parse("lax"), Some(ProcessContents::Lax));
        assert_eq!(ProcessContents::parse("loose"), None);
        assert_eq!(ProcessContents::default(), ProcessContents::Strict);
    }
}
