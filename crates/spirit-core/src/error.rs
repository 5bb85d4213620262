//! Centralized error types for the spirit card creator.

use thiserror::Error;

/// Main error type for quiz and generation operations.
#[derive(Error, Debug)]
pub enum SpiritError {
    /// The provider could not be reached or answered with a non-success status.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The provider answered, but the payload could not be read at all.
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    /// The payload parsed, but does not describe a valid card.
    #[error("Schema validation failed: {0}")]
    SchemaValidation(String),

    #[error("Invalid state transition: cannot apply '{event}' in step '{from}'")]
    InvalidStateTransition { from: String, event: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Wrong passcode")]
    WrongPasscode,

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for spirit card operations.
pub type SpiritResult<T> = Result<T, SpiritError>;

impl SpiritError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a schema validation error.
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::SchemaValidation(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<reqwest::Error> for SpiritError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
