//! XSD built-in types
//!
//! This module defines the built-in primitive and derived types that
//! user simple types ultimately restrict, together with their white
//! space handling and lexical validation.

use crate::names::{is_valid_ncname, is_valid_qname};
use crate::validators::facets::WhiteSpace;
use crate::validators::helpers::{
    any_uri_validator, base64_binary_validator, boolean_validator, date_validator,
    datetime_validator, decimal_validator, duration_validator, float_validator,
    gregorian_validator, hex_binary_validator, integer_validator, language_validator,
    nmtoken_validator, time_validator, CheckResult,
};
use std::fmt;

/// XSD 1.0 Namespace
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// Built-in simple types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    // String family
    AnySimpleType,
    String,
    NormalizedString,
    Token,
    Language,
    Name,
    NCName,
    Id,
    IdRef,
    Entity,
    NmToken,
    // Lists of the above
    IdRefs,
    Entities,
    NmTokens,
    // Numeric
    Boolean,
    Decimal,
    Integer,
    Long,
    Int,
    Short,
    Byte,
    NonNegativeInteger,
    PositiveInteger,
    NonPositiveInteger,
    NegativeInteger,
    UnsignedLong,
    UnsignedInt,
    UnsignedShort,
    UnsignedByte,
    Float,
    Double,
    // Date/time
    Duration,
    DateTime,
    Time,
    Date,
    GYearMonth,
    GYear,
    GMonthDay,
    GDay,
    GMonth,
    // Other
    HexBinary,
    Base64Binary,
    AnyUri,
    QName,
    Notation,
}

impl Builtin {
    /// Look a built-in type up by its local name in the XSD namespace
    pub fn from_local_name(name: &str) -> Option<Self> {
        use Builtin::*;
        let builtin = match name {
            "anySimpleType" | "anyAtomicType" => AnySimpleType,
            "string" => String,
            "normalizedString" => NormalizedString,
            "token" => Token,
            "language" => Language,
            "Name" => Name,
            "NCName" => NCName,
            "ID" => Id,
            "IDREF" => IdRef,
            "IDREFS" => IdRefs,
            "ENTITY" => Entity,
            "ENTITIES" => Entities,
            "NMTOKEN" => NmToken,
            "NMTOKENS" => NmTokens,
            "boolean" => Boolean,
            "decimal" => Decimal,
            "integer" => Integer,
            "long" => Long,
            "int" => Int,
            "short" => Short,
            "byte" => Byte,
            "nonNegativeInteger" => NonNegativeInteger,
            "positiveInteger" => PositiveInteger,
            "nonPositiveInteger" => NonPositiveInteger,
            "negativeInteger" => NegativeInteger,
            "unsignedLong" => UnsignedLong,
            "unsignedInt" => UnsignedInt,
            "unsignedShort" => UnsignedShort,
            "unsignedByte" => UnsignedByte,
            "float" => Float,
            "double" => Double,
            "duration" => Duration,
            "dateTime" => DateTime,
            "time" => Time,
            "date" => Date,
            "gYearMonth" => GYearMonth,
            "gYear" => GYear,
            "gMonthDay" => GMonthDay,
            "gDay" => GDay,
            "gMonth" => GMonth,
            "hexBinary" => HexBinary,
            "base64Binary" => Base64Binary,
            "anyURI" => AnyUri,
            "QName" => QName,
            "NOTATION" => Notation,
            _ => return None,
        };
        Some(builtin)
    }

    /// Local name in the XSD namespace
    pub fn name(&self) -> &'static str {
        use Builtin::*;
        match self {
            AnySimpleType => "anySimpleType",
            String => "string",
            NormalizedString => "normalizedString",
            Token => "token",
            Language => "language",
            Name => "Name",
            NCName => "NCName",
            Id => "ID",
            IdRef => "IDREF",
            IdRefs => "IDREFS",
            Entity => "ENTITY",
            Entities => "ENTITIES",
            NmToken => "NMTOKEN",
            NmTokens => "NMTOKENS",
            Boolean => "boolean",
            Decimal => "decimal",
            Integer => "integer",
            Long => "long",
            Int => "int",
            Short => "short",
            Byte => "byte",
            NonNegativeInteger => "nonNegativeInteger",
            PositiveInteger => "positiveInteger",
            NonPositiveInteger => "nonPositiveInteger",
            NegativeInteger => "negativeInteger",
            UnsignedLong => "unsignedLong",
            UnsignedInt => "unsignedInt",
            UnsignedShort => "unsignedShort",
            UnsignedByte => "unsignedByte",
            Float => "float",
            Double => "double",
            Duration => "duration",
            DateTime => "dateTime",
            Time => "time",
            Date => "date",
            GYearMonth => "gYearMonth",
            GYear => "gYear",
            GMonthDay => "gMonthDay",
            GDay => "gDay",
            GMonth => "gMonth",
            HexBinary => "hexBinary",
            Base64Binary => "base64Binary",
            AnyUri => "anyURI",
            QName => "QName",
            Notation => "NOTATION",
        }
    }

    /// White space handling of values of this type
    pub fn white_space(&self) -> WhiteSpace {
        match self {
            Builtin::String | Builtin::AnySimpleType => WhiteSpace::Preserve,
            Builtin::NormalizedString => WhiteSpace::Replace,
            _ => WhiteSpace::Collapse,
        }
    }

    /// Whether this is one of the numeric types
    pub fn is_numeric(&self) -> bool {
        self.integer_bounds().is_some()
            || matches!(self, Builtin::Decimal | Builtin::Float | Builtin::Double)
    }

    /// Item type of the built-in list types
    pub fn list_item(&self) -> Option<Builtin> {
        match self {
            Builtin::IdRefs => Some(Builtin::IdRef),
            Builtin::Entities => Some(Builtin::Entity),
            Builtin::NmTokens => Some(Builtin::NmToken),
            _ => None,
        }
    }

    /// Value range of the integer types; `None` for non-integer types
    #[allow(clippy::type_complexity)]
    fn integer_bounds(&self) -> Option<(Option<i128>, Option<i128>)> {
        use Builtin::*;
        let bounds = match self {
            Integer => (None, None),
            Long => (Some(i64::MIN as i128), Some(i64::MAX as i128)),
            Int => (Some(i32::MIN as i128), Some(i32::MAX as i128)),
            Short => (Some(i16::MIN as i128), Some(i16::MAX as i128)),
            Byte => (Some(i8::MIN as i128), Some(i8::MAX as i128)),
            NonNegativeInteger => (Some(0), None),
            PositiveInteger => (Some(1), None),
            NonPositiveInteger => (None, Some(0)),
            NegativeInteger => (None, Some(-1)),
            UnsignedLong => (Some(0), Some(u64::MAX as i128)),
            UnsignedInt => (Some(0), Some(u32::MAX as i128)),
            UnsignedShort => (Some(0), Some(u16::MAX as i128)),
            UnsignedByte => (Some(0), Some(u8::MAX as i128)),
            _ => return None,
        };
        Some(bounds)
    }

    /// Check that a white-space-normalized value is in the lexical space
    pub fn validate(&self, value: &str) -> CheckResult {
        use Builtin::*;
        if let Some(item) = self.list_item() {
            if value.is_empty() {
                return Err(format!("xs:{} needs at least one item", self.name()));
            }
            return value.split(' ').try_for_each(|token| item.validate(token));
        }
        if let Some((min, max)) = self.integer_bounds() {
            return integer_validator(value, min, max);
        }
        match self {
            AnySimpleType | String | NormalizedString => Ok(()),
            Token => {
                if value.contains("  ") || value.starts_with(' ') || value.ends_with(' ') {
                    Err("xs:token must not contain leading, trailing or double spaces".into())
                } else {
                    Ok(())
                }
            }
            Language => language_validator(value),
            Name => {
                let ok = !value.is_empty()
                    && value.split(':').all(|part| part.is_empty() || is_valid_ncname(part))
                    && !value.starts_with(|c: char| c == '-' || c == '.' || c.is_ascii_digit());
                if ok {
                    Ok(())
                } else {
                    Err("value is not a valid xs:Name".to_string())
                }
            }
            NCName | Id | IdRef | Entity => {
                if is_valid_ncname(value) {
                    Ok(())
                } else {
                    Err(format!("value is not a valid xs:{}", self.name()))
                }
            }
            NmToken => nmtoken_validator(value),
            Boolean => boolean_validator(value),
            Decimal => decimal_validator(value),
            Float | Double => float_validator(value),
            Duration => duration_validator(value),
            DateTime => datetime_validator(value),
            Time => time_validator(value),
            Date => date_validator(value),
            GYearMonth | GYear | GMonthDay | GDay | GMonth => {
                gregorian_validator(self.name(), value)
            }
            HexBinary => hex_binary_validator(value),
            Base64Binary => base64_binary_validator(value),
            AnyUri => any_uri_validator(value),
            QName | Notation => {
                if is_valid_qname(value) {
                    Ok(())
                } else {
                    Err(format!("value is not a valid xs:{}", self.name()))
                }
            }
            // Integer and list types were handled above
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "xs:{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_round_trips_names() {
        for name in ["string", "NCName", "unsignedByte", "dateTime", "anyURI", "NMTOKENS"] {
            let builtin = Builtin::from_local_name(name).unwrap();
            assert_eq!(builtin.name(), name);
        }
        assert_eq!(Builtin::from_local_name("anyAtomicType"), Some(Builtin::AnySimpleType));
        assert_eq!(Builtin::from_local_name("nope"), None);
    }

    #[test]
    fn test_white_space() {
        assert_eq!(Builtin::String.white_space(), WhiteSpace::Preserve);
        assert_eq!(Builtin::NormalizedString.white_space(), WhiteSpace::Replace);
        assert_eq!(Builtin::Token.white_space(), WhiteSpace::Collapse);
        assert_eq!(Builtin::Int.white_space(), WhiteSpace::Collapse);
    }

    #[test]
    fn test_integer_family() {
        assert!(Builtin::Byte.validate("127").is_ok());
        assert!(Builtin::Byte.validate("128").is_err());
        assert!(Builtin::UnsignedInt.validate("-1").is_err());
        assert!(Builtin::PositiveInteger.validate("0").is_err());
        assert!(Builtin::NegativeInteger.validate("-5").is_ok());
        assert!(Builtin::Integer.validate("12a").is_err());
        assert!(Builtin::Int.is_numeric());
        assert!(!Builtin::Date.is_numeric());
    }

    #[test]
    fn test_string_family() {
        assert!(Builtin::String.validate("  anything <goes> ").is_ok());
        assert!(Builtin::Token.validate("a b").is_ok());
        assert!(Builtin::Token.validate("a  b").is_err());
        assert!(Builtin::NCName.validate("device-1").is_ok());
        assert!(Builtin::NCName.validate("a:b").is_err());
        assert!(Builtin::Name.validate("a:b").is_ok());
        assert!(Builtin::QName.validate("udi:device").is_ok());
    }

    #[test]
    fn test_list_builtins() {
        assert!(Builtin::NmTokens.validate("a b c").is_ok());
        assert!(Builtin::NmTokens.validate("").is_err());
        assert!(Builtin::IdRefs.validate("a 1b").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Builtin::Date.to_string(), "xs:date");
    }
}
