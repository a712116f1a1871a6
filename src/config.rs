//! Generator configuration
//!
//! Everything a generation run can be tuned with, deserializable from a
//! JSON file. Missing fields take their defaults:
//!
//! ```json
//! {
//!   "retry": { "max_attempts": 3 },
//!   "max_repetitions": 10,
//!   "check_lexical": true,
//!   "indent": 2,
//!   "namespaces": { "ord": "urn:orders" },
//!   "limits": { "max_collection_depth": 32 }
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::namespaces::PrefixMap;

/// How often a rejected leaf is asked again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts per leaf, `None` for unlimited
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    /// Ask until the input surface closes
    pub fn unlimited() -> Self {
        Self { max_attempts: None }
    }

    /// At most `attempts` attempts per leaf
    pub fn limited(attempts: u32) -> Self {
        Self {
            max_attempts: Some(attempts),
        }
    }

    /// Whether another attempt may follow attempt number `attempt`
    pub fn allows_retry_after(&self, attempt: u32) -> bool {
        self.max_attempts.map_or(true, |max| attempt < max)
    }
}

/// Configuration of a generation run
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Retry policy for rejected leaf values
    pub retry: RetryPolicy,
    /// Upper bound on instances of one repeatable section
    pub max_repetitions: Option<u32>,
    /// Reject values outside the leaf type's lexical space and facets
    pub check_lexical: bool,
    /// Indentation width for the serialized document, `None` for compact output
    pub indent: Option<usize>,
    /// Preferred namespace prefixes
    pub namespaces: PrefixMap,
    /// Resource limits
    pub limits: Limits,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            max_repetitions: None,
            check_lexical: true,
            indent: None,
            namespaces: PrefixMap::new(),
            limits: Limits::default(),
        }
    }
}

impl GeneratorConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_json(&text).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Set the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the repetition bound
    pub fn with_max_repetitions(mut self, max: u32) -> Self {
        self.max_repetitions = Some(max);
        self
    }

    /// Set the prefix preferences
    pub fn with_namespaces(mut self, namespaces: PrefixMap) -> Self {
        self.namespaces = namespaces;
        self
    }

    /// Set the indentation width
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = Some(indent);
        self
    }

    /// Set the resource limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::default();
        assert!(config.check_lexical);
        assert_eq!(config.retry, RetryPolicy::unlimited());
        assert!(config.namespaces.is_empty());
        assert_eq!(GeneratorConfig::from_json("{}").unwrap(), config);
    }

    #[test]
    fn test_from_json() {
        let config = GeneratorConfig::from_json(
            r#"{
                "retry": { "max_attempts": 2 },
                "max_repetitions": 5,
                "check_lexical": false,
                "indent": 4,
                "namespaces": { "ord": "urn:orders" },
                "limits": { "max_collection_depth": 8 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.retry.max_attempts, Some(2));
        assert_eq!(config.max_repetitions, Some(5));
        assert!(!config.check_lexical);
        assert_eq!(config.indent, Some(4));
        assert_eq!(config.namespaces.namespace_for("ord"), Some("urn:orders"));
        assert_eq!(config.limits.max_collection_depth, 8);
        assert_eq!(config.limits.max_xml_depth, Limits::default().max_xml_depth);
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        assert!(matches!(
            GeneratorConfig::from_json(r#"{ "retry": 3 }"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            GeneratorConfig::from_json(r#"{ "namespaces": { "xml": "urn:x" } }"#),
            Err(Error::Config(_))
        ));
        assert!(GeneratorConfig::from_json(r#"{ "unknown": 1 }"#).is_err());
    }

    #[test]
    fn test_retry_policy() {
        assert!(RetryPolicy::unlimited().allows_retry_after(1000));
        let policy = RetryPolicy::limited(2);
        assert!(policy.allows_retry_after(1));
        assert!(!policy.allows_retry_after(2));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "indent": 2 }"#).unwrap();
        assert_eq!(GeneratorConfig::from_file(&path).unwrap().indent, Some(2));
        assert!(matches!(
            GeneratorConfig::from_file(dir.path().join("missing.json")),
            Err(Error::Config(_))
        ));
    }
}
