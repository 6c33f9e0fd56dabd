//! Error types for ghkit-deploy

use thiserror::Error;

/// Errors that can occur while assembling deployment metadata
#[derive(Error, Debug)]
pub enum DeployError {
    /// No usable URL in the deploy CLI output
    #[error("Could not parse deploymentUrl")]
    DeploymentUrlNotFound,

    /// Event payload lacks a field the step cannot do without
    #[error("Missing {0} in event payload")]
    MissingPayloadField(String),

    /// A required search-index setting was blank
    #[error("{0} is empty")]
    EmptySetting(&'static str),

    /// Collection name outside articles, services and case-studies
    #[error("Unknown content collection: {0}")]
    UnknownCollection(String),

    /// Invalid runner environment or action inputs
    #[error(transparent)]
    Input(#[from] ghkit_core::InputError),

    /// Event payload could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Event payload is not valid JSON
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for ghkit-deploy operations
pub type Result<T> = std::result::Result<T, DeployError>;
