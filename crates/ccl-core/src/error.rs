//! # Error Contract — Stable Codes, Typed Results
//!
//! Every error enum in the workspace implements [`ErrorCode`], mapping each
//! variant to a stable machine-readable code. Callers dispatch on the code;
//! the `Display` string is the human-readable reason and carries no
//! stability guarantee.
//!
//! ## Design
//!
//! - Cryptographic and conservation failures are terminal for the
//!   submission that produced them — nothing in this workspace retries.
//! - Error payloads never contain secret material. Commitments and
//!   nullifiers appear only in their public wire encoding.

use thiserror::Error;

/// Maps an error variant to a stable machine-readable code.
///
/// Codes are SCREAMING_SNAKE_CASE, never renamed once released, and safe
/// to persist or ship across a process boundary. The `Display` text of the
/// same error is for humans and may change between versions.
pub trait ErrorCode {
    /// The stable code for this error variant.
    fn code(&self) -> &'static str;
}

/// Validation errors for the foundational types in this crate.
#[derive(Error, Debug)]
pub enum CoreError {
    /// An identifier failed validation at construction.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// A timestamp string failed validation at construction.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// A vintage year is outside the accepted range.
    #[error("invalid vintage year {year}: must be between {min} and {max}")]
    InvalidVintage {
        /// The rejected year.
        year: u16,
        /// Lowest accepted year.
        min: u16,
        /// Highest accepted year.
        max: u16,
    },
}

impl ErrorCode for CoreError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidIdentifier(_) => "INVALID_IDENTIFIER",
            Self::InvalidTimestamp(_) => "INVALID_TIMESTAMP",
            Self::InvalidVintage { .. } => "INVALID_VINTAGE",
        }
    }
}

/// Errors in wire encodings (hex identifiers, decimal field elements).
#[derive(Error, Debug)]
pub enum EncodingError {
    /// A hex-encoded value was malformed.
    #[error("malformed hex encoding: {0}")]
    MalformedHex(String),

    /// A decimal-string field element was malformed or out of range.
    #[error("malformed field element: {0}")]
    MalformedFieldElement(String),
}

impl ErrorCode for EncodingError {
    fn code(&self) -> &'static str {
        match self {
            Self::MalformedHex(_) => "MALFORMED_HEX",
            Self::MalformedFieldElement(_) => "MALFORMED_FIELD_ELEMENT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_codes_are_stable() {
        assert_eq!(
            CoreError::InvalidIdentifier("x".into()).code(),
            "INVALID_IDENTIFIER"
        );
        assert_eq!(
            CoreError::InvalidVintage {
                year: 1800,
                min: 1990,
                max: 2100
            }
            .code(),
            "INVALID_VINTAGE"
        );
    }

    #[test]
    fn test_display_carries_reason() {
        let err = CoreError::InvalidIdentifier("empty account id".into());
        assert!(err.to_string().contains("empty account id"));
    }
}
