//! Error types for Scrub Guard

use thiserror::Error;

/// Result type alias for Guard operations
pub type Result<T> = std::result::Result<T, GuardError>;

/// Guard error types
#[derive(Debug, Error)]
pub enum GuardError {
    /// The redaction configuration failed validation
    #[error("Invalid redaction config: {0}")]
    InvalidConfig(String),

    /// A rule could not be compiled into a matcher
    #[error("Rule compilation error: {0}")]
    Pattern(#[from] regex::Error),

    /// The configuration document could not be parsed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GuardError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
