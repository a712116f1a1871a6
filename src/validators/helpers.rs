//! Validator helper functions
//!
//! Lexical checks for the built-in types. Each validator returns a
//! [`CheckResult`] whose error is a short human-readable reason; callers
//! wrap it into a rejection or a diagnostic.

use base64::Engine;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::HashMap;

/// Outcome of a lexical or facet check; the error is the reason
pub type CheckResult = std::result::Result<(), String>;

lazy_static::lazy_static! {
    /// XSD boolean value mapping
    pub static ref XSD_BOOLEAN_MAP: HashMap<&'static str, bool> = {
        let mut m = HashMap::new();
        m.insert("false", false);
        m.insert("0", false);
        m.insert("true", true);
        m.insert("1", true);
        m
    };

    static ref HEX_BINARY_REGEX: regex::Regex =
        regex::Regex::new(r"^([0-9a-fA-F]{2})*$").unwrap();

    static ref INTEGER_REGEX: regex::Regex = regex::Regex::new(r"^[+-]?[0-9]+$").unwrap();

    static ref DECIMAL_REGEX: regex::Regex =
        regex::Regex::new(r"^[+-]?([0-9]+(\.[0-9]*)?|\.[0-9]+)$").unwrap();

    static ref FLOAT_REGEX: regex::Regex =
        regex::Regex::new(r"^([+-]?([0-9]+(\.[0-9]*)?|\.[0-9]+)([eE][+-]?[0-9]+)?|[+-]?INF|NaN)$")
            .unwrap();

    static ref TIMEZONE_REGEX: regex::Regex =
        regex::Regex::new(r"(Z|[+-](0[0-9]|1[0-3]):[0-5][0-9]|[+-]14:00)$").unwrap();

    static ref DURATION_REGEX: regex::Regex = regex::Regex::new(
        r"^-?P(([0-9]+Y)?([0-9]+M)?([0-9]+D)?)(T([0-9]+H)?([0-9]+M)?([0-9]+(\.[0-9]+)?S)?)?$"
    )
    .unwrap();

    static ref GYEAR_REGEX: regex::Regex = regex::Regex::new(r"^-?[0-9]{4,}$").unwrap();

    static ref GYEAR_MONTH_REGEX: regex::Regex =
        regex::Regex::new(r"^-?[0-9]{4,}-(0[1-9]|1[0-2])$").unwrap();

    static ref GMONTH_REGEX: regex::Regex = regex::Regex::new(r"^--(0[1-9]|1[0-2])$").unwrap();

    static ref GDAY_REGEX: regex::Regex =
        regex::Regex::new(r"^---(0[1-9]|[12][0-9]|3[01])$").unwrap();

    static ref GMONTH_DAY_REGEX: regex::Regex =
        regex::Regex::new(r"^--(0[1-9]|1[0-2])-(0[1-9]|[12][0-9]|3[01])$").unwrap();

    static ref LANGUAGE_REGEX: regex::Regex =
        regex::Regex::new(r"^[a-zA-Z]{1,8}(-[a-zA-Z0-9]{1,8})*$").unwrap();

    static ref NMTOKEN_REGEX: regex::Regex =
        regex::Regex::new(r"^[\-._:A-Za-z0-9\u{B7}\u{C0}-\u{2FF}\u{300}-\u{37D}\u{37F}-\u{1FFF}\u{200C}-\u{200D}\u{203F}-\u{2040}\u{2070}-\u{218F}\u{2C00}-\u{2FEF}\u{3001}-\u{D7FF}\u{F900}-\u{FDCF}\u{FDF0}-\u{FFFD}]+$")
            .unwrap();
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validate a decimal value
pub fn decimal_validator(value: &str) -> CheckResult {
    if DECIMAL_REGEX.is_match(value) {
        Ok(())
    } else {
        Err("value is not a valid xs:decimal".to_string())
    }
}

/// Validate an integer and check it lies within `min..=max` when given.
///
/// Uses i128 internally so that unsignedLong still fits.
pub fn integer_validator(value: &str, min: Option<i128>, max: Option<i128>) -> CheckResult {
    if !INTEGER_REGEX.is_match(value) {
        return Err("value is not a valid xs:integer".to_string());
    }
    let number = match value.parse::<i128>() {
        Ok(number) => number,
        // Arbitrarily large xs:integer with no bound to check
        Err(_) if min.is_none() && max.is_none() => return Ok(()),
        Err(_) => return Err(format!("value '{}' is out of range", value)),
    };
    match (min, max) {
        (Some(min), Some(max)) if !(min..=max).contains(&number) => {
            Err(format!("value must be {} <= x <= {}", min, max))
        }
        (Some(min), None) if number < min => Err(format!("value must be >= {}", min)),
        (None, Some(max)) if number > max => Err(format!("value must be <= {}", max)),
        _ => Ok(()),
    }
}

/// Validate a float or double value
pub fn float_validator(value: &str) -> CheckResult {
    if FLOAT_REGEX.is_match(value) {
        Ok(())
    } else {
        Err("value is not a valid xs:float/xs:double".to_string())
    }
}

/// Validate a boolean value
pub fn boolean_validator(value: &str) -> CheckResult {
    if XSD_BOOLEAN_MAP.contains_key(value) {
        Ok(())
    } else {
        Err("value is not a valid xs:boolean (true, false, 1, 0)".to_string())
    }
}

// =============================================================================
// Binary Validators
// =============================================================================

/// Validate a hex binary value
pub fn hex_binary_validator(value: &str) -> CheckResult {
    if HEX_BINARY_REGEX.is_match(value) {
        Ok(())
    } else {
        Err("not a valid hexadecimal encoding".to_string())
    }
}

/// Validate a base64 binary value
pub fn base64_binary_validator(value: &str) -> CheckResult {
    let cleaned = value.replace(' ', "");
    if cleaned.is_empty() {
        return Ok(());
    }

    base64::engine::general_purpose::STANDARD
        .decode(&cleaned)
        .map(|_| ())
        .map_err(|_| "not a valid base64 encoding".to_string())
}

// =============================================================================
// Date/Time Validators
// =============================================================================

fn strip_timezone(value: &str) -> &str {
    match TIMEZONE_REGEX.find(value) {
        Some(tz) => &value[..tz.start()],
        None => value,
    }
}

fn split_year(value: &str) -> (&str, &str) {
    // Years may have more than four digits and a leading minus
    let body = value.strip_prefix('-').unwrap_or(value);
    let offset = value.len() - body.len();
    match body.find('-') {
        Some(pos) => (&value[..offset + pos], &body[pos..]),
        None => (value, ""),
    }
}

/// Validate an xs:date value
pub fn date_validator(value: &str) -> CheckResult {
    let local = strip_timezone(value);
    let (year, rest) = split_year(local);
    if year.trim_start_matches('-').len() < 4 {
        return Err("xs:date needs a four digit year".to_string());
    }
    // chrono only knows proleptic years it can represent; normalise to 2000
    // with the same leap-year status for the month/day check
    let leap = year
        .parse::<i64>()
        .map(|y| (y % 4 == 0 && y % 100 != 0) || y % 400 == 0)
        .map_err(|_| "invalid year in xs:date".to_string())?;
    let candidate = format!("{}{}", if leap { "2000" } else { "2001" }, rest);
    NaiveDate::parse_from_str(&candidate, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| "value is not a valid xs:date (YYYY-MM-DD)".to_string())
}

/// Validate an xs:time value
pub fn time_validator(value: &str) -> CheckResult {
    let local = strip_timezone(value);
    if local == "24:00:00" {
        return Ok(());
    }
    NaiveTime::parse_from_str(local, "%H:%M:%S%.f")
        .map(|_| ())
        .map_err(|_| "value is not a valid xs:time (hh:mm:ss)".to_string())
}

/// Validate an xs:dateTime value
pub fn datetime_validator(value: &str) -> CheckResult {
    let local = strip_timezone(value);
    let (date, time) = local
        .split_once('T')
        .ok_or_else(|| "value is not a valid xs:dateTime (YYYY-MM-DDThh:mm:ss)".to_string())?;
    date_validator(date)?;
    if time == "24:00:00" {
        return Ok(());
    }
    NaiveDateTime::parse_from_str(&format!("2000-01-01T{}", time), "%Y-%m-%dT%H:%M:%S%.f")
        .map(|_| ())
        .map_err(|_| "value is not a valid xs:dateTime (YYYY-MM-DDThh:mm:ss)".to_string())
}

/// Validate an xs:duration value
pub fn duration_validator(value: &str) -> CheckResult {
    if DURATION_REGEX.is_match(value) && !value.ends_with('P') && !value.ends_with('T') {
        Ok(())
    } else {
        Err("value is not a valid xs:duration".to_string())
    }
}

/// Validate the Gregorian partial date types by their type name
pub fn gregorian_validator(type_name: &str, value: &str) -> CheckResult {
    let local = strip_timezone(value);
    let regex: &regex::Regex = match type_name {
        "gYear" => &GYEAR_REGEX,
        "gYearMonth" => &GYEAR_MONTH_REGEX,
        "gMonth" => &GMONTH_REGEX,
        "gDay" => &GDAY_REGEX,
        "gMonthDay" => &GMONTH_DAY_REGEX,
        _ => return Err(format!("unknown Gregorian type '{}'", type_name)),
    };
    if regex.is_match(local) {
        Ok(())
    } else {
        Err(format!("value is not a valid xs:{}", type_name))
    }
}

// =============================================================================
// Name and URI Validators
// =============================================================================

/// Validate an xs:language value
pub fn language_validator(value: &str) -> CheckResult {
    if LANGUAGE_REGEX.is_match(value) {
        Ok(())
    } else {
        Err("value is not a valid xs:language".to_string())
    }
}

/// Validate an xs:NMTOKEN value
pub fn nmtoken_validator(value: &str) -> CheckResult {
    if NMTOKEN_REGEX.is_match(value) {
        Ok(())
    } else {
        Err("value is not a valid xs:NMTOKEN".to_string())
    }
}

/// Validate an xs:anyURI value.
///
/// Almost any string is a legal URI reference; only characters that can
/// never appear, even escaped, are refused.
pub fn any_uri_validator(value: &str) -> CheckResult {
    if value.chars().any(|c| matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '\\' | '^' | '`')) {
        return Err("value is not a valid xs:anyURI".to_string());
    }
    for (i, c) in value.char_indices() {
        if c == '%' {
            let escape = value.get(i + 1..i + 3).unwrap_or("");
            if escape.len() != 2 || !escape.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err("invalid percent-escape in xs:anyURI".to_string());
            }
        }
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_ranges() {
        assert!(integer_validator("0", Some(-128), Some(127)).is_ok());
        assert!(integer_validator("-128", Some(-128), Some(127)).is_ok());
        assert!(integer_validator("128", Some(-128), Some(127)).is_err());
        assert!(integer_validator("+42", None, None).is_ok());
        assert!(integer_validator("4.2", None, None).is_err());
        assert!(integer_validator("0", Some(1), None).is_err());
        assert!(integer_validator("18446744073709551615", Some(0), Some(u64::MAX as i128)).is_ok());
        assert!(integer_validator("123456789012345678901234567890123456789012", None, None).is_ok());
    }

    #[test]
    fn test_decimal_validator() {
        assert!(decimal_validator("123").is_ok());
        assert!(decimal_validator("123.456").is_ok());
        assert!(decimal_validator("-.5").is_ok());
        assert!(decimal_validator("abc").is_err());
        assert!(decimal_validator("1e5").is_err());
    }

    #[test]
    fn test_float_validator() {
        assert!(float_validator("1e5").is_ok());
        assert!(float_validator("-INF").is_ok());
        assert!(float_validator("NaN").is_ok());
        assert!(float_validator("nan").is_err());
    }

    #[test]
    fn test_boolean_validator() {
        assert!(boolean_validator("true").is_ok());
        assert!(boolean_validator("0").is_ok());
        assert!(boolean_validator("yes").is_err());
    }

    #[test]
    fn test_hex_binary_validator() {
        assert!(hex_binary_validator("").is_ok());
        assert!(hex_binary_validator("0a1B2c").is_ok());
        assert!(hex_binary_validator("0").is_err());
        assert!(hex_binary_validator("GH").is_err());
    }

    #[test]
    fn test_base64_binary_validator() {
        assert!(base64_binary_validator("SGVsbG8=").is_ok());
        assert!(base64_binary_validator("SGVs bG8=").is_ok());
        assert!(base64_binary_validator("!!!").is_err());
    }

    #[test]
    fn test_date_validators() {
        assert!(date_validator("2024-02-29").is_ok());
        assert!(date_validator("2023-02-29").is_err());
        assert!(date_validator("2024-01-15Z").is_ok());
        assert!(date_validator("2024-01-15+02:00").is_ok());
        assert!(date_validator("15/01/2024").is_err());
        assert!(time_validator("13:45:00").is_ok());
        assert!(time_validator("13:45:00.25Z").is_ok());
        assert!(time_validator("25:00:00").is_err());
        assert!(datetime_validator("2024-01-15T13:45:00").is_ok());
        assert!(datetime_validator("2024-01-15 13:45:00").is_err());
    }

    #[test]
    fn test_duration_and_gregorian() {
        assert!(duration_validator("P1Y2M3DT4H").is_ok());
        assert!(duration_validator("P").is_err());
        assert!(duration_validator("PT").is_err());
        assert!(gregorian_validator("gYear", "2024").is_ok());
        assert!(gregorian_validator("gYear", "24").is_err());
        assert!(gregorian_validator("gMonthDay", "--12-25").is_ok());
    }

    #[test]
    fn test_name_validators() {
        assert!(language_validator("en-GB").is_ok());
        assert!(language_validator("english language").is_err());
        assert!(nmtoken_validator("a:b-c.1").is_ok());
        assert!(nmtoken_validator("a b").is_err());
        assert!(any_uri_validator("http://example.com/a%20b").is_ok());
        assert!(any_uri_validator("http://example.com/<x>").is_err());
        assert!(any_uri_validator("bad%zz").is_err());
    }
}
