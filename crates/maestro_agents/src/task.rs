//! Task and execution context types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unit of work handed to the delegator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier
    pub id: String,
    /// Task type, looked up in the capability map
    pub task_type: String,
    /// Human-readable task name
    pub name: String,
    /// Optional subject domain (e.g. `clinical-psychology`)
    #[serde(default)]
    pub domain: Option<String>,
    /// Optional complexity score (1-5)
    #[serde(default)]
    pub complexity: Option<u8>,
    /// Opaque payload forwarded to the agent
    #[serde(default)]
    pub payload: serde_json::Value,
    /// Number of retries performed so far
    #[serde(default)]
    pub retry_count: u32,
    /// Agents that must not receive this task
    #[serde(default)]
    pub exclude_agents: Vec<String>,
}

impl Task {
    /// Create a new task with a generated id.
    pub fn new(task_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: format!("task-{}", Uuid::new_v4()),
            task_type: task_type.into(),
            name: name.into(),
            domain: None,
            complexity: None,
            payload: serde_json::Value::Null,
            retry_count: 0,
            exclude_agents: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_complexity(mut self, complexity: u8) -> Self {
        self.complexity = Some(complexity);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Exclude an agent up front.
    pub fn excluding(mut self, agent: impl Into<String>) -> Self {
        self.exclude(agent);
        self
    }

    /// Add an agent to the exclusion list if not already present.
    pub fn exclude(&mut self, agent: impl Into<String>) {
        let agent = agent.into();
        if !self.exclude_agents.contains(&agent) {
            self.exclude_agents.push(agent);
        }
    }

    pub fn is_excluded(&self, agent: &str) -> bool {
        self.exclude_agents.iter().any(|a| a == agent)
    }

    /// Tags used for specialization matching: the task type plus the domain.
    pub fn match_tags(&self) -> Vec<&str> {
        let mut tags = vec![self.task_type.as_str()];
        if let Some(domain) = &self.domain {
            tags.push(domain.as_str());
        }
        tags
    }
}

/// Context passed alongside a task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionContext {
    /// Workflow the task belongs to
    pub workflow_id: Option<String>,
    /// Phase the task belongs to
    pub phase: Option<String>,
    /// Shared values from earlier work
    #[serde(default)]
    pub shared: HashMap<String, serde_json::Value>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_workflow(workflow_id: impl Into<String>) -> Self {
        Self {
            workflow_id: Some(workflow_id.into()),
            ..Self::default()
        }
    }

    pub fn with_phase(mut self, phase: impl Into<String>) -> Self {
        self.phase = Some(phase.into());
        self
    }

    /// Set shared data.
    pub fn set_shared<T: Serialize>(&mut self, key: impl Into<String>, value: &T) {
        if let Ok(json) = serde_json::to_value(value) {
            self.shared.insert(key.into(), json);
        }
    }

    /// Get shared data.
    pub fn get_shared<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        self.shared
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exclude_is_deduplicated() {
        let mut task = Task::new("research", "Gather evidence");
        task.exclude("research");
        task.exclude("research");

        assert_eq!(task.exclude_agents, vec!["research".to_string()]);
        assert!(task.is_excluded("research"));
        assert!(!task.is_excluded("architect"));
    }

    #[test]
    fn test_match_tags() {
        let task = Task::new("research", "Gather evidence").with_domain("clinical-psychology");
        assert_eq!(task.match_tags(), vec!["research", "clinical-psychology"]);

        let plain = Task::new("editing", "Polish");
        assert_eq!(plain.match_tags(), vec!["editing"]);
    }

    #[test]
    fn test_context_shared_values() {
        let mut ctx = ExecutionContext::for_workflow("wf-1").with_phase("research");
        ctx.set_shared("sources", &vec!["a", "b"]);

        let sources: Vec<String> = ctx.get_shared("sources").unwrap();
        assert_eq!(sources, vec!["a", "b"]);
        assert_eq!(ctx.phase.as_deref(), Some("research"));
    }
}
