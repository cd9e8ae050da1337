//! Error types for the Autobook engine.

use crate::RecordId;
use thiserror::Error;

/// All possible errors from the Autobook engine.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    // Validation errors
    #[error("missing required field: {0}")]
    MissingRequiredField(&'static str),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid share for executor '{executor}': {value}")]
    InvalidShare { executor: String, value: String },

    #[error("executor listed more than once: {0}")]
    DuplicateExecutor(String),

    #[error("shares do not match executors: expected {expected:?}, got {got:?}")]
    SharesMismatch {
        expected: Vec<String>,
        got: Vec<String>,
    },

    #[error("username already taken: {0}")]
    DuplicateUsername(String),

    // Collection errors
    #[error("record not found: {0}")]
    RecordNotFound(RecordId),

    #[error("at least one user must remain")]
    LastUser,

    // Remote payload errors
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

impl Error {
    /// Whether the error was caused by bad user input rather than bad data.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::MissingRequiredField(_)
                | Error::InvalidAmount(_)
                | Error::InvalidShare { .. }
                | Error::DuplicateExecutor(_)
                | Error::SharesMismatch { .. }
                | Error::DuplicateUsername(_)
        )
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
