//! # Format Assertions
//!
//! `format` is checked through a [`FormatChecker`], which receives the string,
//! the format name and the dialect of the schema node that declared it, and
//! answers with a diagnostic or `None`.
//!
//! [`BasicFormatChecker`] implements the formats below. A format is only
//! asserted under the dialects that define it; under any other dialect, and
//! for format names it does not know, the value passes.
//!
//! | Format | Dialects | Checked with |
//! |--------|----------|--------------|
//! | `date-time` | all | `chrono` RFC 3339 |
//! | `date`, `time` | draft-03, draft-07 and later | `chrono` |
//! | `email` | all | structural check |
//! | `hostname` | draft-04 and later | RFC 1123 labels |
//! | `host-name` | draft-03 | RFC 1123 labels |
//! | `ipv4` | draft-04 and later | `std::net` |
//! | `ip-address` | draft-03 | `std::net` |
//! | `ipv6` | all | `std::net` |
//! | `uri` | all | `url` |
//! | `uri-reference`, `json-pointer` | draft-06 and later | `url`, `jsv_core` |
//! | `regex` | all | the configured [`PatternMatcher`] |
//! | `uuid` | 2019-09 and later | `uuid` |

use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate};
use jsv_core::JsonPointer;
use url::Url;
use uuid::Uuid;

use crate::dialect::Dialect;
use crate::pattern::{PatternMatcher, RegexMatcher};

/// Checks strings against named formats.
pub trait FormatChecker: Send + Sync {
    /// Returns a diagnostic if `value` is not a valid `format` under `dialect`.
    fn check(&self, value: &str, format: &str, dialect: Dialect) -> Option<String>;
}

/// A checker that accepts everything; turns `format` into an annotation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFormatChecker;

impl FormatChecker for NoFormatChecker {
    fn check(&self, _value: &str, _format: &str, _dialect: Dialect) -> Option<String> {
        None
    }
}

/// The built-in format checker.
#[derive(Clone)]
pub struct BasicFormatChecker {
    patterns: Arc<dyn PatternMatcher>,
}

impl Default for BasicFormatChecker {
    fn default() -> Self {
        Self::new(Arc::new(RegexMatcher::new()))
    }
}

impl std::fmt::Debug for BasicFormatChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicFormatChecker").finish_non_exhaustive()
    }
}

impl BasicFormatChecker {
    /// Create a checker that validates the `regex` format with `patterns`.
    pub fn new(patterns: Arc<dyn PatternMatcher>) -> Self {
        Self { patterns }
    }
}

impl FormatChecker for BasicFormatChecker {
    fn check(&self, value: &str, format: &str, dialect: Dialect) -> Option<String> {
        use Dialect::*;

        let defined = match format {
            "date-time" | "email" | "ipv6" | "uri" | "regex" => true,
            "date" | "time" => dialect == Draft3 || dialect >= Draft7,
            "hostname" | "ipv4" => dialect >= Draft4,
            "host-name" | "ip-address" => dialect == Draft3,
            "uri-reference" | "json-pointer" => dialect >= Draft6,
            "uuid" => dialect >= Draft2019_09,
            _ => false,
        };
        if !defined {
            return None;
        }

        let result = match format {
            "date-time" => check_date_time(value),
            "date" => check_date(value),
            "time" => check_time(value),
            "email" => check_email(value),
            "hostname" | "host-name" => check_hostname(value),
            "ipv4" | "ip-address" => value
                .parse::<Ipv4Addr>()
                .map(|_| ())
                .map_err(|e| e.to_string()),
            "ipv6" => value
                .parse::<Ipv6Addr>()
                .map(|_| ())
                .map_err(|e| e.to_string()),
            "uri" => check_uri(value),
            "uri-reference" => check_uri_reference(value),
            "json-pointer" => JsonPointer::parse(value)
                .map(|_| ())
                .map_err(|e| e.to_string()),
            "regex" => self
                .patterns
                .compile(value)
                .map(|_| ())
                .map_err(|e| e.reason),
            "uuid" => check_uuid(value),
            _ => Ok(()),
        };
        result.err().map(|reason| format!("not a valid {format}: {reason}"))
    }
}

fn check_date_time(value: &str) -> Result<(), String> {
    DateTime::parse_from_rfc3339(value)
        .map(|_| ())
        .map_err(|e| e.to_string())
}

fn check_date(value: &str) -> Result<(), String> {
    let shape = value.len() == 10
        && value.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shape {
        return Err("expected YYYY-MM-DD".to_string());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|e| e.to_string())
}

fn check_time(value: &str) -> Result<(), String> {
    // RFC 3339 full-time: parse it as the time part of a fixed date.
    DateTime::parse_from_rfc3339(&format!("1970-01-01T{value}"))
        .map(|_| ())
        .map_err(|e| e.to_string())
}

fn check_hostname(value: &str) -> Result<(), String> {
    if value.is_empty() || value.len() > 253 {
        return Err("length must be 1 to 253".to_string());
    }
    for label in value.split('.') {
        if label.is_empty() || label.len() > 63 {
            return Err(format!("label {label:?} must be 1 to 63 characters"));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(format!("label {label:?} starts or ends with '-'"));
        }
        if !label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
            return Err(format!("label {label:?} has invalid characters"));
        }
    }
    Ok(())
}

fn check_email(value: &str) -> Result<(), String> {
    let Some((local, domain)) = value.rsplit_once('@') else {
        return Err("missing '@'".to_string());
    };
    if local.is_empty() || local.len() > 64 {
        return Err("local part must be 1 to 64 characters".to_string());
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return Err("misplaced '.' in local part".to_string());
    }
    if local.contains(|c: char| c.is_whitespace() || c == '@') {
        return Err("invalid character in local part".to_string());
    }
    if let Some(literal) = domain.strip_prefix('[').and_then(|d| d.strip_suffix(']')) {
        let ok = literal.parse::<Ipv4Addr>().is_ok()
            || literal
                .strip_prefix("IPv6:")
                .is_some_and(|v6| v6.parse::<Ipv6Addr>().is_ok());
        return if ok {
            Ok(())
        } else {
            Err("invalid address literal".to_string())
        };
    }
    check_hostname(domain)
}

fn has_illegal_uri_chars(value: &str) -> bool {
    value.chars().any(|c| {
        c.is_whitespace()
            || c.is_control()
            || matches!(c, '\\' | '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`')
    })
}

fn check_uri(value: &str) -> Result<(), String> {
    if has_illegal_uri_chars(value) {
        return Err("contains characters that must be percent-encoded".to_string());
    }
    Url::parse(value).map(|_| ()).map_err(|e| e.to_string())
}

fn check_uri_reference(value: &str) -> Result<(), String> {
    if has_illegal_uri_chars(value) {
        return Err("contains characters that must be percent-encoded".to_string());
    }
    match Url::parse(value) {
        Ok(_) => Ok(()),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse("http://base.invalid/")
            .and_then(|base| base.join(value))
            .map(|_| ())
            .map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    }
}

fn check_uuid(value: &str) -> Result<(), String> {
    if value.len() != 36 {
        return Err("expected the hyphenated 8-4-4-4-12 form".to_string());
    }
    Uuid::try_parse(value).map(|_| ()).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(value: &str, format: &str, dialect: Dialect) -> Option<String> {
        BasicFormatChecker::default().check(value, format, dialect)
    }

    #[test]
    fn test_date_time() {
        assert_eq!(check("2024-02-29T12:30:00Z", "date-time", Dialect::Draft7), None);
        assert_eq!(check("2024-02-29T12:30:00.5+05:30", "date-time", Dialect::Draft4), None);
        assert!(check("2023-02-29T12:30:00Z", "date-time", Dialect::Draft7).is_some());
        assert!(check("2024-02-29 12:30", "date-time", Dialect::Draft7).is_some());
    }

    #[test]
    fn test_date_and_time() {
        assert_eq!(check("2024-01-31", "date", Dialect::Draft2020_12), None);
        assert!(check("2024-1-31", "date", Dialect::Draft2020_12).is_some());
        assert!(check("2024-02-30", "date", Dialect::Draft2020_12).is_some());
        assert_eq!(check("08:30:06Z", "time", Dialect::Draft7), None);
        assert!(check("25:00:00Z", "time", Dialect::Draft7).is_some());
    }

    #[test]
    fn test_date_not_defined_in_draft4() {
        assert_eq!(check("garbage", "date", Dialect::Draft4), None);
        assert!(check("garbage", "date", Dialect::Draft3).is_some());
    }

    #[test]
    fn test_hostname_spellings_follow_dialect() {
        assert!(check("-bad-", "hostname", Dialect::Draft7).is_some());
        assert_eq!(check("-bad-", "hostname", Dialect::Draft3), None);
        assert!(check("-bad-", "host-name", Dialect::Draft3).is_some());
        assert_eq!(check("example.com", "hostname", Dialect::Draft2019_09), None);
    }

    #[test]
    fn test_ip_addresses() {
        assert_eq!(check("192.168.0.1", "ipv4", Dialect::Draft7), None);
        assert!(check("256.0.0.1", "ipv4", Dialect::Draft7).is_some());
        assert!(check("1.2.3", "ip-address", Dialect::Draft3).is_some());
        assert_eq!(check("::1", "ipv6", Dialect::Draft7), None);
        assert!(check("12345::", "ipv6", Dialect::Draft7).is_some());
    }

    #[test]
    fn test_email() {
        assert_eq!(check("joe.bloggs@example.com", "email", Dialect::Draft7), None);
        assert_eq!(check("joe@[127.0.0.1]", "email", Dialect::Draft7), None);
        assert!(check("joe..bloggs@example.com", "email", Dialect::Draft7).is_some());
        assert!(check("no-at-sign", "email", Dialect::Draft7).is_some());
    }

    #[test]
    fn test_uris() {
        assert_eq!(check("https://example.com/a?b#c", "uri", Dialect::Draft7), None);
        assert!(check("//example.com/a", "uri", Dialect::Draft7).is_some());
        assert_eq!(check("//example.com/a", "uri-reference", Dialect::Draft7), None);
        assert_eq!(check("#/definitions/a", "uri-reference", Dialect::Draft7), None);
        assert!(check("\\\\WINDOWS\\share", "uri-reference", Dialect::Draft7).is_some());
    }

    #[test]
    fn test_json_pointer_and_regex() {
        assert_eq!(check("/a/~0b", "json-pointer", Dialect::Draft7), None);
        assert!(check("a/b", "json-pointer", Dialect::Draft7).is_some());
        assert_eq!(check("^[a-z]+$", "regex", Dialect::Draft7), None);
        assert!(check("([a-z]", "regex", Dialect::Draft7).is_some());
    }

    #[test]
    fn test_uuid() {
        let uuid = "2eb8aa08-aa98-11ea-b4aa-73b441d16380";
        assert_eq!(check(uuid, "uuid", Dialect::Draft2019_09), None);
        assert!(check("2eb8aa08aa9811eab4aa73b441d16380", "uuid", Dialect::Draft2019_09).is_some());
        assert_eq!(check("not-a-uuid", "uuid", Dialect::Draft7), None);
    }

    #[test]
    fn test_unknown_format_passes() {
        assert_eq!(check("anything", "color", Dialect::Draft3), None);
    }

    #[test]
    fn test_no_format_checker() {
        assert_eq!(NoFormatChecker.check("x", "date-time", Dialect::Draft7), None);
    }
}
