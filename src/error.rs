//! Error types for the harness.

use thiserror::Error;

/// Result type for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Errors that can occur in the harness.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Malformed batch, observation, action or log row.
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// Invalid configuration (zero dimension, zero frame skip, etc.)
    #[error("Invalid configuration for '{field}': {message}")]
    InvalidConfig {
        field: &'static str,
        message: String,
    },

    /// I/O error (log file operations)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Chart drawing error
    #[error("Plot error: {0}")]
    Plot(String),

    /// Write attempted on a closed logger
    #[error("Logger is closed")]
    Closed,
}

impl HarnessError {
    pub(crate) fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_config(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            message: message.into(),
        }
    }

    /// Whether this error reports malformed caller input.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }
}
