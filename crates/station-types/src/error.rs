//! Error types for data parsing in station-types.

use thiserror::Error;

/// Errors that can occur when parsing sensor identifiers and unit names.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The string is not a valid 48-bit MAC address.
    #[error("Invalid MAC address: {0}")]
    InvalidMac(String),

    /// The string is not a valid local Bluetooth identifier.
    #[error("Invalid LUID: {0}")]
    InvalidLuid(String),

    /// Unknown unit name.
    #[error("Unknown {kind} unit: {value}")]
    UnknownUnit {
        /// Which measurement the unit belongs to.
        kind: &'static str,
        /// The rejected input.
        value: String,
    },
}

impl ParseError {
    /// Create an unknown unit error.
    pub fn unknown_unit(kind: &'static str, value: impl Into<String>) -> Self {
        Self::UnknownUnit {
            kind,
            value: value.into(),
        }
    }
}

/// Result type alias using station-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
