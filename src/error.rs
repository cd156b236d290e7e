//! Error types for memoization operations
//!
//! Errors raised by the memo engine itself. Failures of the wrapped function
//! never pass through this type: they are returned to the caller unchanged.

use thiserror::Error;

/// Main error type for memo operations
#[derive(Error, Debug)]
pub enum MemoError {
    /// A context-bound operation ran outside any memoized call
    #[error("{operation} must be used inside a memoized function")]
    ContextMissing { operation: &'static str },

    /// The call arguments could not be serialized into a cache key
    #[error("Key derivation error: {0}")]
    KeyDerivation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic error with context
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for memo operations
pub type Result<T> = std::result::Result<T, MemoError>;

impl From<serde_json::Error> for MemoError {
    fn from(err: serde_json::Error) -> Self {
        MemoError::KeyDerivation(err.to_string())
    }
}

impl From<String> for MemoError {
    fn from(s: String) -> Self {
        MemoError::Other(s)
    }
}

impl From<&str> for MemoError {
    fn from(s: &str) -> Self {
        MemoError::Other(s.to_string())
    }
}
