//! Error types for the workflow module.

use thiserror::Error;

/// Result type alias for workflow operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Errors that can occur while building plans or loading tables.
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Invalid complexity level {0} (expected 1-5)")]
    InvalidComplexity(u8),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid template '{template}': {message}")]
    InvalidTemplate { template: String, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
