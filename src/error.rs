//! Error types for xsdform
//!
//! This module defines all error types used throughout the library.
//! Fatal errors abort a generation run; [`Rejection`] describes the
//! recoverable outcomes that the collector retries at the point of
//! occurrence.

use std::fmt;
use thiserror::Error;

/// Result type alias using xsdform Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for xsdform operations
#[derive(Error, Debug)]
pub enum Error {
    /// The schema source is missing, malformed or internally inconsistent
    #[error("schema load error: {0}")]
    SchemaLoad(#[from] ParseError),

    /// The requested root element is not declared by the schema
    #[error("element '{name}' not found in schema{}", candidates_hint(.candidates))]
    ElementNotFound {
        /// Name as requested by the caller
        name: String,
        /// Global elements with the same local name (ambiguous lookups)
        candidates: Vec<String>,
    },

    /// The schema lacks a structure the run depends on
    #[error("structure mismatch at {path}: {message}")]
    StructureMismatch {
        /// Schema path where the mismatch was detected
        path: String,
        /// What was expected
        message: String,
    },

    /// Collection of a mandatory value was aborted
    #[error("collection error: {0}")]
    Collection(#[from] CollectionError),

    /// The assembled tree cannot be rendered
    #[error("serialization error at {path}: {message}")]
    Serialization {
        /// Instance path of the offending element
        path: String,
        /// Cause
        message: String,
    },

    /// Namespace error
    #[error("namespace error: {0}")]
    Namespace(String),

    /// Name error (invalid XML name)
    #[error("name error: {0}")]
    Name(String),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// Configuration or answer sheet could not be read
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML parsing error
    #[error("XML error: {0}")]
    Xml(String),

    /// URL parsing error
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

fn candidates_hint(candidates: &[String]) -> String {
    if candidates.is_empty() {
        String::new()
    } else {
        format!(" (ambiguous, candidates: {})", candidates.join(", "))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}

/// XML Schema parsing error
#[derive(Debug, Clone)]
pub struct ParseError {
    /// Error message
    pub message: String,
    /// Schema component or document the error refers to
    pub location: Option<String>,
}

impl ParseError {
    /// Create a new parse error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
        }
    }

    /// Set the location
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(ref loc) = self.location {
            write!(f, " (at {})", loc)?;
        }

        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// Why a single resolved leaf value was not accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The resolver returned nothing (or only whitespace) for a required leaf
    MissingRequiredValue,
    /// The value is not a member of the leaf's enumeration
    ConstraintViolation {
        /// Rejected value
        value: String,
        /// Allowed values, in schema order
        allowed: Vec<String>,
    },
    /// The value is outside the lexical space of the leaf's type
    InvalidLexical {
        /// Rejected value
        value: String,
        /// Facet or built-in type that failed
        reason: String,
    },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::MissingRequiredValue => write!(f, "value is required"),
            Rejection::ConstraintViolation { value, allowed } => write!(
                f,
                "'{}' is not one of the allowed values: {}",
                value,
                allowed.join(", ")
            ),
            Rejection::InvalidLexical { value, reason } => {
                write!(f, "'{}' is not valid: {}", value, reason)
            }
        }
    }
}

/// Reason a collection run was aborted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionFailure {
    /// The retry policy ran out while the value was still rejected
    RetriesExhausted {
        /// Number of attempts made
        attempts: u32,
        /// Last rejection
        last: Rejection,
    },
    /// The input surface stopped supplying values
    InputClosed,
    /// Mandatory structure nests deeper than the configured limit
    DepthExceeded {
        /// Depth reached
        depth: usize,
    },
}

/// A fatal collection error, located at a schema path
#[derive(Debug, Clone)]
pub struct CollectionError {
    /// Path of the leaf or section being collected
    pub path: String,
    /// What went wrong
    pub failure: CollectionFailure,
}

impl CollectionError {
    /// Create a new collection error
    pub fn new(path: impl Into<String>, failure: CollectionFailure) -> Self {
        Self {
            path: path.into(),
            failure,
        }
    }
}

impl fmt::Display for CollectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.failure {
            CollectionFailure::RetriesExhausted { attempts, last } => write!(
                f,
                "no acceptable value for {} after {} attempt(s): {}",
                self.path, attempts, last
            ),
            CollectionFailure::InputClosed => {
                write!(f, "input closed while collecting {}", self.path)
            }
            CollectionFailure::DepthExceeded { depth } => write!(
                f,
                "mandatory structure at {} nests deeper than {} levels",
                self.path, depth
            ),
        }
    }
}

impl std::error::Error for CollectionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::new("unresolved type reference 'tns:Missing'")
            .with_location("device.xsd: element 'Code'");

        let msg = format!("{}", err);
        assert!(msg.contains("unresolved type reference"));
        assert!(msg.contains("device.xsd: element 'Code'"));
    }

    #[test]
    fn test_collection_error_names_path() {
        let err = CollectionError::new(
            "/Root/Code",
            CollectionFailure::RetriesExhausted {
                attempts: 3,
                last: Rejection::MissingRequiredValue,
            },
        );
        let msg = Error::from(err).to_string();
        assert!(msg.contains("/Root/Code"));
        assert!(msg.contains("3 attempt(s)"));
    }

    #[test]
    fn test_element_not_found_candidates() {
        let err = Error::ElementNotFound {
            name: "Device".to_string(),
            candidates: vec!["{urn:a}Device".to_string(), "{urn:b}Device".to_string()],
        };
        assert!(err.to_string().contains("ambiguous"));

        let err = Error::ElementNotFound {
            name: "Device".to_string(),
            candidates: Vec::new(),
        };
        assert_eq!(err.to_string(), "element 'Device' not found in schema");
    }

    #[test]
    fn test_rejection_display() {
        let rejection = Rejection::ConstraintViolation {
            value: "PENDING".to_string(),
            allowed: vec!["OPEN".to_string(), "CLOSED".to_string()],
        };
        assert_eq!(
            rejection.to_string(),
            "'PENDING' is not one of the allowed values: OPEN, CLOSED"
        );
    }

    #[test]
    fn test_error_conversion() {
        let parse_err = ParseError::new("test");
        let err: Error = parse_err.into();
        assert!(matches!(err, Error::SchemaLoad(_)));
    }
}
