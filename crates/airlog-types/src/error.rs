//! Error types for data parsing in airlog-types.

use thiserror::Error;

/// Errors that can occur when parsing raw sensor payloads.
///
/// This error type is platform-agnostic and does not include
/// BLE-specific errors (those belong in airlog-core).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The payload was shorter than the wire format requires.
    #[error("Invalid data: requires {expected} bytes, got {actual}")]
    InsufficientBytes { expected: usize, actual: usize },

    /// The payload had the right length but a field could not be interpreted.
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type alias using airlog-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
