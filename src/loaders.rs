//! Resource loading utilities
//!
//! This module handles loading of schema documents from their locations.

use crate::error::{ParseError, Result};
use crate::limits::Limits;
use crate::locations::Location;
use std::fs;

/// Resource loader for schema documents
#[derive(Debug, Clone)]
pub struct Loader {
    /// Resource limits
    limits: Limits,
}

impl Loader {
    /// Create a new loader with default settings
    pub fn new() -> Self {
        Self {
            limits: Limits::default(),
        }
    }

    /// Set the limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Load a resource as a string
    pub fn load(&self, location: &Location) -> Result<String> {
        let content = match location {
            Location::Path(path) => fs::read_to_string(path).map_err(|e| {
                ParseError::new(format!("failed to read schema: {}", e))
                    .with_location(path.display().to_string())
            })?,
            Location::Url(url) => {
                return Err(ParseError::new("remote schema locations are not supported")
                    .with_location(url.to_string())
                    .into());
            }
            Location::String(s) => s.clone(),
        };

        self.limits.check_xml_size(content.len()).map_err(|e| {
            ParseError::new(e.to_string()).with_location(location.as_str())
        })?;

        Ok(content)
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}
