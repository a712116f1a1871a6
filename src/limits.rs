//! Limits and constraints for schema loading, collection and validation
//!
//! This module defines limits that keep a run bounded: oversized schema
//! sources, runaway include chains, mandatory recursive types and deeply
//! nested instance documents.

use crate::error::{Error, Result};
use serde::Deserialize;

/// Global limits configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum size of a single schema or instance document in bytes
    pub max_xml_size: usize,

    /// Maximum number of schema documents reachable through include/import
    pub max_schema_documents: usize,

    /// Maximum nesting of mandatory complex content during collection
    pub max_collection_depth: usize,

    /// Maximum element depth checked by the validator
    pub max_xml_depth: usize,

    /// Hard cap on instances of one repeatable section
    pub max_repetitions: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_xml_size: 100 * 1024 * 1024, // 100 MB
            max_schema_documents: 500,
            max_collection_depth: 64,
            max_xml_depth: 1000,
            max_repetitions: 10_000,
        }
    }
}

impl Limits {
    /// Create a new Limits with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create strict limits (more restrictive)
    pub fn strict() -> Self {
        Self {
            max_xml_size: 10 * 1024 * 1024, // 10 MB
            max_schema_documents: 50,
            max_collection_depth: 16,
            max_xml_depth: 100,
            max_repetitions: 100,
        }
    }

    /// Create permissive limits (less restrictive, use with caution)
    pub fn permissive() -> Self {
        Self {
            max_xml_size: 1024 * 1024 * 1024, // 1 GB
            max_schema_documents: 10_000,
            max_collection_depth: 1024,
            max_xml_depth: 10_000,
            max_repetitions: 1_000_000,
        }
    }

    /// Check if a document size is within limits
    pub fn check_xml_size(&self, size: usize) -> Result<()> {
        if size > self.max_xml_size {
            Err(Error::LimitExceeded(format!(
                "document size {} bytes exceeds maximum {} bytes",
                size, self.max_xml_size
            )))
        } else {
            Ok(())
        }
    }

    /// Check if the number of loaded schema documents is within limits
    pub fn check_schema_documents(&self, count: usize) -> Result<()> {
        if count > self.max_schema_documents {
            Err(Error::LimitExceeded(format!(
                "schema document count {} exceeds maximum {}",
                count, self.max_schema_documents
            )))
        } else {
            Ok(())
        }
    }

    /// Check if XML depth is within limits
    pub fn check_xml_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_xml_depth {
            Err(Error::LimitExceeded(format!(
                "XML depth {} exceeds maximum {}",
                depth, self.max_xml_depth
            )))
        } else {
            Ok(())
        }
    }

    /// Whether a collection depth is still allowed
    pub fn allows_collection_depth(&self, depth: usize) -> bool {
        depth <= self.max_collection_depth
    }
}
