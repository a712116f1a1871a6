//! XML Validation Infrastructure
//!
//! This module provides the validation result and the context that
//! tracks where in an instance document the validator currently is.

use std::fmt;

/// A single validation defect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Instance path of the offending node, e.g. `/Order/Entry[2]/Id`
    pub location: String,
    /// Human-readable description
    pub message: String,
    /// Source line, when known
    pub line: Option<usize>,
}

impl Diagnostic {
    /// Create a diagnostic without a line number
    pub fn new(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            message: message.into(),
            line: None,
        }
    }

    /// Set the source line
    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{} (line {}): {}", self.location, line, self.message),
            None => write!(f, "{}: {}", self.location, self.message),
        }
    }
}

/// Outcome of validating a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// The document conforms to the schema
    Valid,
    /// Every independent defect, in document order
    Invalid(Vec<Diagnostic>),
}

impl ValidationResult {
    /// Build a result from collected diagnostics
    pub fn from_diagnostics(diagnostics: Vec<Diagnostic>) -> Self {
        if diagnostics.is_empty() {
            ValidationResult::Valid
        } else {
            ValidationResult::Invalid(diagnostics)
        }
    }

    /// Whether the document is valid
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    /// Diagnostics (empty when valid)
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            ValidationResult::Valid => &[],
            ValidationResult::Invalid(diagnostics) => diagnostics,
        }
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationResult::Valid => write!(f, "valid"),
            ValidationResult::Invalid(diagnostics) => {
                write!(f, "invalid ({} diagnostics)", diagnostics.len())
            }
        }
    }
}

/// Validation context for walking an instance document
///
/// Keeps the path from the root to the element being checked and collects
/// diagnostics instead of stopping at the first one.
#[derive(Debug)]
pub struct ValidationContext {
    /// Path segments from the root
    path: Vec<String>,
    /// Line of the element being validated
    lines: Vec<usize>,
    /// Collected diagnostics
    errors: Vec<Diagnostic>,
    /// Maximum element depth
    max_depth: usize,
}

impl ValidationContext {
    /// Create a new validation context
    pub fn new(max_depth: usize) -> Self {
        Self {
            path: Vec::new(),
            lines: Vec::new(),
            errors: Vec::new(),
            max_depth,
        }
    }

    /// Enter an element; `segment` is its name with an optional `[n]` index
    pub fn enter_level(&mut self, segment: impl Into<String>, line: usize) {
        self.path.push(segment.into());
        self.lines.push(line);
    }

    /// Exit the current element
    pub fn exit_level(&mut self) {
        self.path.pop();
        self.lines.pop();
    }

    /// Current nesting level
    pub fn level(&self) -> usize {
        self.path.len()
    }

    /// Check if we've exceeded max depth
    pub fn is_max_depth_exceeded(&self) -> bool {
        self.level() > self.max_depth
    }

    /// Current instance path
    pub fn current_path(&self) -> String {
        if self.path.is_empty() {
            "/".to_string()
        } else {
            format!("/{}", self.path.join("/"))
        }
    }

    /// Add a diagnostic at the current path
    pub fn add_error(&mut self, message: impl Into<String>) {
        let mut diagnostic = Diagnostic::new(self.current_path(), message);
        if let Some(line) = self.lines.last().copied().filter(|line| *line > 0) {
            diagnostic = diagnostic.with_line(line);
        }
        self.errors.push(diagnostic);
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Get the error count
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Consume the context into a result
    pub fn finish(self) -> ValidationResult {
        ValidationResult::from_diagnostics(self.errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_paths() {
        let mut ctx = ValidationContext::new(10);
        assert_eq!(ctx.current_path(), "/");
        ctx.enter_level("Order", 1);
        ctx.enter_level("Entry[2]", 4);
        assert_eq!(ctx.current_path(), "/Order/Entry[2]");
        ctx.add_error("missing Id");
        ctx.exit_level();
        assert_eq!(ctx.current_path(), "/Order");
        assert_eq!(ctx.error_count(), 1);

        let result = ctx.finish();
        assert!(!result.is_valid());
        assert_eq!(result.diagnostics()[0].to_string(), "/Order/Entry[2] (line 4): missing Id");
    }

    #[test]
    fn test_empty_context_is_valid() {
        let ctx = ValidationContext::new(10);
        assert!(!ctx.has_errors());
        assert_eq!(ctx.finish(), ValidationResult::Valid);
        assert!(ValidationResult::Valid.diagnostics().is_empty());
    }

    #[test]
    fn test_depth_limit() {
        let mut ctx = ValidationContext::new(1);
        ctx.enter_level("a", 0);
        assert!(!ctx.is_max_depth_exceeded());
        ctx.enter_level("b", 0);
        assert!(ctx.is_max_depth_exceeded());
    }
}
