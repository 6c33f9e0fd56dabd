//! Error types for ghkit-act

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while preparing or running local replays
#[derive(Error, Debug)]
pub enum HarnessError {
    /// Workflow file does not exist
    #[error("Workflow not found: {}", .0.display())]
    WorkflowNotFound(PathBuf),

    /// Required per-environment variables file is missing
    #[error("Missing variables file for environment '{environment}': {}", .path.display())]
    MissingVariablesFile { environment: String, path: PathBuf },

    /// Invocation has nothing to execute
    #[error("Invocation has an empty command")]
    EmptyCommand,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for ghkit-act operations
pub type Result<T> = std::result::Result<T, HarnessError>;
