//! XSD constraining facets
//!
//! This module implements the facets that constrain simple types. A
//! [`FacetSet`] holds the facets declared by one restriction step; the
//! schema model applies the sets of a whole derivation chain in turn.

use super::helpers::CheckResult;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

/// White space handling modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhiteSpace {
    /// Preserve all white space
    Preserve,
    /// Replace tabs and newlines with spaces
    Replace,
    /// Replace and collapse multiple spaces
    Collapse,
}

impl WhiteSpace {
    /// Parse from string value
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "preserve" => Some(WhiteSpace::Preserve),
            "replace" => Some(WhiteSpace::Replace),
            "collapse" => Some(WhiteSpace::Collapse),
            _ => None,
        }
    }

    /// Normalize a string according to this white space mode
    pub fn normalize(&self, s: &str) -> String {
        match self {
            WhiteSpace::Preserve => s.to_string(),
            WhiteSpace::Replace => s.replace(['\t', '\n', '\r'], " "),
            WhiteSpace::Collapse => s.split_whitespace().collect::<Vec<_>>().join(" "),
        }
    }
}

/// A compiled `xs:pattern` value
#[derive(Debug, Clone)]
pub struct PatternFacet {
    /// Pattern as written in the schema
    pub source: String,
    regex: Regex,
}

impl PatternFacet {
    /// Compile an XSD regular expression.
    ///
    /// XSD patterns are implicitly anchored and know the `\i` / `\c`
    /// name-character escapes, which are rewritten to explicit classes.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let translated = pattern
            .replace(r"\i", r"[_:A-Za-z]")
            .replace(r"\I", r"[^_:A-Za-z]")
            .replace(r"\c", r"[\-._:A-Za-z0-9]")
            .replace(r"\C", r"[^\-._:A-Za-z0-9]");
        let regex = Regex::new(&format!("^(?:{})$", translated))?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// Whether the value matches
    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

/// A numeric bound facet value (minInclusive etc.)
#[derive(Debug, Clone, PartialEq)]
pub struct Bound {
    /// Literal from the schema
    pub literal: String,
    /// Decimal value, when the literal is numeric
    pub decimal: Option<Decimal>,
}

impl Bound {
    /// Create a bound from its schema literal
    pub fn new(literal: &str) -> Self {
        Self {
            literal: literal.trim().to_string(),
            decimal: Decimal::from_str(literal.trim()).ok(),
        }
    }
}

/// Facets declared by one restriction step
#[derive(Debug, Clone, Default)]
pub struct FacetSet {
    /// Exact length (characters, or items for list types)
    pub length: Option<usize>,
    /// Minimum length
    pub min_length: Option<usize>,
    /// Maximum length
    pub max_length: Option<usize>,
    /// Patterns declared at this step; a value must match one of them
    pub patterns: Vec<PatternFacet>,
    /// Enumeration, in schema declaration order
    pub enumeration: Vec<String>,
    /// White space handling
    pub white_space: Option<WhiteSpace>,
    /// Minimum inclusive
    pub min_inclusive: Option<Bound>,
    /// Maximum inclusive
    pub max_inclusive: Option<Bound>,
    /// Minimum exclusive
    pub min_exclusive: Option<Bound>,
    /// Maximum exclusive
    pub max_exclusive: Option<Bound>,
    /// Total digits
    pub total_digits: Option<u32>,
    /// Fraction digits
    pub fraction_digits: Option<u32>,
}

impl FacetSet {
    /// Create an empty facet set
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether this step declares an enumeration
    pub fn has_enumeration(&self) -> bool {
        !self.enumeration.is_empty()
    }

    /// Check the length facets against a measured length
    pub fn check_length(&self, len: usize) -> CheckResult {
        if let Some(length) = self.length {
            if len != length {
                return Err(format!("length must be exactly {} (actual {})", length, len));
            }
        }
        if let Some(min) = self.min_length {
            if len < min {
                return Err(format!("length must be at least {} (actual {})", min, len));
            }
        }
        if let Some(max) = self.max_length {
            if len > max {
                return Err(format!("length must be at most {} (actual {})", max, len));
            }
        }
        Ok(())
    }

    /// Validate an already normalized value against the lexical and
    /// value facets of this step (length is checked separately, since
    /// list types measure items rather than characters)
    pub fn validate(&self, value: &str) -> CheckResult {
        if !self.patterns.is_empty() && !self.patterns.iter().any(|p| p.is_match(value)) {
            let sources: Vec<&str> = self.patterns.iter().map(|p| p.source.as_str()).collect();
            return Err(format!("value does not match pattern '{}'", sources.join("' | '")));
        }

        if self.has_enumeration() && !self.enumeration.iter().any(|e| e == value) {
            return Err(format!(
                "value must be one of: {}",
                self.enumeration.join(", ")
            ));
        }

        self.validate_bounds(value)
    }

    fn validate_bounds(&self, value: &str) -> CheckResult {
        let needs_number = self.min_inclusive.is_some()
            || self.max_inclusive.is_some()
            || self.min_exclusive.is_some()
            || self.max_exclusive.is_some()
            || self.total_digits.is_some()
            || self.fraction_digits.is_some();
        if !needs_number {
            return Ok(());
        }
        // Non-numeric values (dates, floats in exponent form) are left to
        // the built-in check; bounds only compare decimals.
        let number = match Decimal::from_str(value.trim()) {
            Ok(number) => number,
            Err(_) => return Ok(()),
        };

        if let Some(Bound { decimal: Some(min), literal }) = &self.min_inclusive {
            if number < *min {
                return Err(format!("value must be >= {}", literal));
            }
        }
        if let Some(Bound { decimal: Some(max), literal }) = &self.max_inclusive {
            if number > *max {
                return Err(format!("value must be <= {}", literal));
            }
        }
        if let Some(Bound { decimal: Some(min), literal }) = &self.min_exclusive {
            if number <= *min {
                return Err(format!("value must be > {}", literal));
            }
        }
        if let Some(Bound { decimal: Some(max), literal }) = &self.max_exclusive {
            if number >= *max {
                return Err(format!("value must be < {}", literal));
            }
        }

        let normalized = number.normalize();
        if let Some(fraction) = self.fraction_digits {
            if normalized.scale() > fraction {
                return Err(format!("value must have at most {} fraction digits", fraction));
            }
        }
        if let Some(total) = self.total_digits {
            let digits = normalized
                .abs()
                .to_string()
                .chars()
                .filter(|c| c.is_ascii_digit())
                .collect::<String>();
            let significant = digits.trim_start_matches('0').len().max(1) as u32;
            if significant > total {
                return Err(format!("value must have at most {} digits", total));
            }
        }

        Ok(())
    }
}
