//! Error types for the agents module.

use thiserror::Error;

/// Result type alias for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;

/// Errors that can occur while registering, selecting or running agents.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Agent not found: {0}")]
    NotFound(String),

    #[error("Agent already registered: {0}")]
    AlreadyRegistered(String),

    #[error("No candidate agent found for task type '{task_type}'")]
    NoCandidate { task_type: String },

    #[error("Agent execution failed: {agent} - {message}")]
    ExecutionFailed { agent: String, message: String },

    #[error("Agent {agent} timed out after {timeout_ms}ms")]
    Timeout { agent: String, timeout_ms: u64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl AgentError {
    /// Create an execution failed error.
    pub fn execution_failed(agent: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            agent: agent.into(),
            message: message.into(),
        }
    }

    /// Create a no-candidate error.
    pub fn no_candidate(task_type: impl Into<String>) -> Self {
        Self::NoCandidate {
            task_type: task_type.into(),
        }
    }
}
