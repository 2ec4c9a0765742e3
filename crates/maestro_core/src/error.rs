//! Error types for orchestration.

use thiserror::Error;

/// Result type alias for orchestration operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while configuring or running an orchestration.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Agent error: {0}")]
    Agent(#[from] maestro_agents::AgentError),

    #[error("Workflow error: {0}")]
    Workflow(#[from] maestro_workflow::WorkflowError),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}
