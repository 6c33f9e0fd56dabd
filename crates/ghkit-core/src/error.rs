//! Error types for ghkit-core

use thiserror::Error;

/// Errors raised while reading action inputs and the runner environment.
#[derive(Error, Debug)]
pub enum InputError {
    /// A required `INPUT_*` value is missing or blank
    #[error("Missing required input: {0}")]
    MissingInput(String),

    /// A required environment variable is missing or blank
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),

    /// A value is present but not in the expected shape
    #[error("{name} is not in the expected format: {reason}")]
    Malformed { name: String, reason: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for ghkit-core operations
pub type Result<T> = std::result::Result<T, InputError>;
