//! Unified error types for the attribution engine.
//!
//! The engine consumes events that already passed upstream field-level
//! validation. A malformed required field at this stage is a contract
//! violation from the validator and fails the whole run; partial or
//! inconsistent derived tables are never produced.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the attribution engine.
#[derive(Debug, Error)]
pub enum Error {
    /// Input row violating the accepted-event contract.
    #[error("contract violation at input line {line}: {message}")]
    Contract { line: usize, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a contract-violation error for an input line (1-based).
    pub fn contract(line: usize, msg: impl Into<String>) -> Self {
        Self::Contract {
            line,
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
