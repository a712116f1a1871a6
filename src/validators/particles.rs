//! XSD Particle occurrence bounds
//!
//! Particles define occurrence constraints (minOccurs, maxOccurs) for
//! elements, model groups and wildcards.
//!
//! Reference: https://www.w3.org/TR/xmlschema11-1/#p

use crate::error::{ParseError, Result};
use std::fmt;

/// Occurrence bounds for a particle (minOccurs, maxOccurs)
/// None for max means unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurs {
    /// Minimum number of occurrences (default 1)
    pub min: u32,
    /// Maximum number of occurrences (None = unbounded, default 1)
    pub max: Option<u32>,
}

impl Occurs {
    /// Create new occurrence bounds
    pub fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    /// Default occurrence (1, 1)
    pub fn once() -> Self {
        Self { min: 1, max: Some(1) }
    }

    /// Optional occurrence (0, 1)
    pub fn optional() -> Self {
        Self { min: 0, max: Some(1) }
    }

    /// Zero or more (0, unbounded)
    pub fn zero_or_more() -> Self {
        Self { min: 0, max: None }
    }

    /// One or more (1, unbounded)
    pub fn one_or_more() -> Self {
        Self { min: 1, max: None }
    }

    /// minOccurs >= 1
    pub fn is_mandatory(&self) -> bool {
        self.min >= 1
    }

    /// Check if this particle can be empty (minOccurs == 0)
    pub fn is_emptiable(&self) -> bool {
        self.min == 0
    }

    /// maxOccurs > 1 or unbounded
    pub fn is_repeatable(&self) -> bool {
        self.max.map_or(true, |max| max > 1)
    }

    /// Check if occurrence count is at or over the maximum
    pub fn is_over(&self, count: u32) -> bool {
        match self.max {
            Some(max) => count >= max,
            None => false,
        }
    }

    /// Bounds of a particle nested in a group with `outer` bounds, for
    /// a single instance of that group: optional groups make their
    /// members optional; group repetition is not multiplied in.
    pub fn within(self, outer: Occurs) -> Occurs {
        if outer.min == 0 {
            Occurs::new(0, self.max)
        } else {
            self
        }
    }
}

impl Default for Occurs {
    fn default() -> Self {
        Self::once()
    }
}

impl fmt::Display for Occurs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "{}..{}", self.min, max),
            None => write!(f, "{}..*", self.min),
        }
    }
}

/// Parse minOccurs/maxOccurs from XML attribute values
pub fn parse_occurs(min_occurs: Option<&str>, max_occurs: Option<&str>) -> Result<Occurs> {
    let mut occurs = Occurs::once();

    if let Some(min_str) = min_occurs {
        occurs.min = min_str.trim().parse::<u32>().map_err(|_| {
            ParseError::new(format!(
                "minOccurs value '{}' is not a valid non-negative integer",
                min_str
            ))
        })?;
    }

    match max_occurs.map(str::trim) {
        Some("unbounded") => occurs.max = None,
        Some(max_str) => {
            let max = max_str.parse::<u32>().map_err(|_| {
                ParseError::new(format!(
                    "maxOccurs value '{}' must be a non-negative integer or 'unbounded'",
                    max_str
                ))
            })?;
            if occurs.min > max {
                return Err(ParseError::new(format!(
                    "maxOccurs ({}) must be greater than or equal to minOccurs ({})",
                    max, occurs.min
                ))
                .into());
            }
            occurs.max = Some(max);
        }
        None => {
            // Default maxOccurs is 1, but must be >= minOccurs
            if occurs.min > 1 {
                return Err(ParseError::new(format!(
                    "minOccurs ({}) exceeds the default maxOccurs of 1",
                    occurs.min
                ))
                .into());
            }
        }
    }

    Ok(occurs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_occurs_defaults() {
        let occurs = Occurs::default();
        assert_eq!(occurs.min, 1);
        assert_eq!(occurs.max, Some(1));
        assert!(occurs.is_mandatory());
        assert!(!occurs.is_repeatable());
    }

    #[test]
    fn test_repeatable() {
        assert!(Occurs::one_or_more().is_repeatable());
        assert!(Occurs::new(1, Some(2)).is_repeatable());
        assert!(!Occurs::optional().is_repeatable());
    }

    #[test]
    fn test_within_optional_group() {
        let inner = Occurs::once().within(Occurs::optional());
        assert!(!inner.is_mandatory());

        let inner = Occurs::one_or_more().within(Occurs::new(1, None));
        assert_eq!(inner, Occurs::one_or_more());
    }

    #[test]
    fn test_parse_occurs() {
        assert_eq!(parse_occurs(None, None).unwrap(), Occurs::once());
        assert_eq!(parse_occurs(Some("0"), None).unwrap(), Occurs::optional());
        assert_eq!(
            parse_occurs(Some("1"), Some("unbounded")).unwrap(),
            Occurs::one_or_more()
        );
        assert_eq!(parse_occurs(Some("2"), Some("5")).unwrap(), Occurs::new(2, Some(5)));
    }

    #[test]
    fn test_parse_occurs_errors() {
        assert!(parse_occurs(Some("-1"), None).is_err());
        assert!(parse_occurs(Some("3"), Some("2")).is_err());
        assert!(parse_occurs(Some("2"), None).is_err());
        assert!(parse_occurs(None, Some("many")).is_err());
    }

    #[test]
    fn test_occurs_display() {
        assert_eq!(Occurs::one_or_more().to_string(), "1..*");
        assert_eq!(Occurs::optional().to_string(), "0..1");
    }
}
