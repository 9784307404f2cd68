//! Error types for session commands and snapshot decoding.
//!
//! None of these are fatal. Validation errors reject a single command and
//! snapshot errors make the store start from a fresh session.

use thiserror::Error;

/// A command input that the store refuses to apply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} is {len} characters long, the limit is {max}")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("unknown card category: {0}")]
    UnknownCategory(String),
}

/// An identifier that does not name a retro step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown retro step: {0:?}")]
pub struct ParseStepError(pub String);

/// Why a stored snapshot could not be turned back into a session.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("invalid snapshot: {0}")]
    Invalid(String),
}
