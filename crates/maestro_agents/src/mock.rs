//! Scripted executor for testing.
//!
//! Captures every execution and fails for agents that were scripted to
//! fail, so delegation behaviour can be verified without the simulator's
//! fabricated results or delays.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::json;

use crate::catalog::AgentDescriptor;
use crate::error::{AgentError, AgentResult};
use crate::executor::AgentExecutor;
use crate::task::{ExecutionContext, Task};

/// Captured call information for verification.
#[derive(Debug, Clone)]
pub struct CapturedExecution {
    pub agent: String,
    pub task_id: String,
    pub task_type: String,
    pub retry_count: u32,
    pub exclude_agents: Vec<String>,
    pub phase: Option<String>,
}

/// Executor returning scripted outcomes.
#[derive(Clone, Default)]
pub struct ScriptedExecutor {
    failing_agents: Arc<RwLock<HashSet<String>>>,
    fail_all: Arc<RwLock<Option<String>>>,
    captured: Arc<RwLock<Vec<CapturedExecution>>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every execution on the given agent fail.
    pub fn fail_agent(self, agent: impl Into<String>) -> Self {
        self.failing_agents.write().insert(agent.into());
        self
    }

    /// Make every execution fail with the message.
    pub fn fail_all(self, message: impl Into<String>) -> Self {
        *self.fail_all.write() = Some(message.into());
        self
    }

    /// All captured executions.
    pub fn calls(&self) -> Vec<CapturedExecution> {
        self.captured.read().clone()
    }

    pub fn call_count(&self) -> usize {
        self.captured.read().len()
    }

    /// Agent names in call order.
    pub fn agents_called(&self) -> Vec<String> {
        self.captured.read().iter().map(|c| c.agent.clone()).collect()
    }

    pub fn clear_calls(&self) {
        self.captured.write().clear();
    }
}

#[async_trait]
impl AgentExecutor for ScriptedExecutor {
    async fn execute(
        &self,
        agent: &AgentDescriptor,
        task: &Task,
        context: &ExecutionContext,
    ) -> AgentResult<serde_json::Value> {
        self.captured.write().push(CapturedExecution {
            agent: agent.name.clone(),
            task_id: task.id.clone(),
            task_type: task.task_type.clone(),
            retry_count: task.retry_count,
            exclude_agents: task.exclude_agents.clone(),
            phase: context.phase.clone(),
        });

        if let Some(message) = self.fail_all.read().clone() {
            return Err(AgentError::execution_failed(&agent.name, message));
        }
        if self.failing_agents.read().contains(&agent.name) {
            return Err(AgentError::execution_failed(&agent.name, "scripted failure"));
        }

        Ok(json!({ "agent": agent.name, "task": task.id, "status": "completed" }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_failures_and_capture() {
        let executor = ScriptedExecutor::new().fail_agent("research");
        let research = AgentDescriptor::new("research");
        let editor = AgentDescriptor::new("content-editor");
        let task = Task::new("editing", "Polish").with_id("t-1");
        let ctx = ExecutionContext::new().with_phase("revision");

        assert!(executor.execute(&research, &task, &ctx).await.is_err());
        let ok = executor.execute(&editor, &task, &ctx).await.unwrap();
        assert_eq!(ok["agent"], "content-editor");

        assert_eq!(executor.agents_called(), vec!["research", "content-editor"]);
        assert_eq!(executor.calls()[0].phase.as_deref(), Some("revision"));
    }

    #[tokio::test]
    async fn test_fail_all() {
        let executor = ScriptedExecutor::new().fail_all("offline");
        let agent = AgentDescriptor::new("architect");
        let task = Task::new("content-architecture", "Outline");

        let err = executor
            .execute(&agent, &task, &ExecutionContext::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("offline"));
    }
}
