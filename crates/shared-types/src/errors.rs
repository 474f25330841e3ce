//! # Error Types
//!
//! Errors raised while decoding shared types.

use thiserror::Error;

/// Failure to parse a textual identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Input was not valid hexadecimal.
    #[error("Invalid {kind} hex: {message}")]
    InvalidHex { kind: &'static str, message: String },

    /// Decoded byte length does not match the identifier width.
    #[error("Invalid {kind} length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },
}
