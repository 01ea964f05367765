//! # Error Types
//!
//! Errors raised by the value-level primitives. All errors use `thiserror`
//! for derive-based `Display` and `Error` implementations.

use thiserror::Error;

/// Error parsing a JSON Pointer (RFC 6901) or a URI fragment holding one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PointerError {
    /// A non-empty pointer must start with `/`.
    #[error("json pointer must be empty or start with '/': {0:?}")]
    MissingLeadingSlash(String),

    /// `~` must be followed by `0` or `1`.
    #[error("invalid '~' escape in json pointer: {0:?}")]
    InvalidEscape(String),

    /// A `%` in a URI fragment was not followed by two hex digits, or the
    /// decoded bytes were not UTF-8.
    #[error("invalid percent-encoding in uri fragment: {0:?}")]
    InvalidPercentEncoding(String),
}

/// Error converting number text into a [`crate::Decimal`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("not an exactly representable decimal number: {0:?}")]
pub struct ParseDecimalError(pub String);
