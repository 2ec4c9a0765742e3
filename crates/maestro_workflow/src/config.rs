//! Planner configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{WorkflowError, WorkflowResult};

/// Tunables for plan construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Duration of each inserted quality checkpoint
    pub checkpoint_minutes: u32,
    /// Agents staffed on quality checkpoints
    pub checkpoint_agents: Vec<String>,
    /// Attach ranked documents to knowledge-consuming phases
    pub enable_rag: bool,
    /// Documents below this relevance are ignored
    pub rag_min_score: f64,
    /// Maximum documents attached to a single phase
    pub max_integration_points: usize,
    /// Agents that consume ranked documents
    pub knowledge_agents: Vec<String>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            checkpoint_minutes: 15,
            checkpoint_agents: vec!["quality-guardian".to_string()],
            enable_rag: true,
            rag_min_score: 0.5,
            max_integration_points: 3,
            knowledge_agents: vec![
                "research".to_string(),
                "scientific-validator".to_string(),
                "nlp-generator".to_string(),
            ],
        }
    }
}

impl PlannerConfig {
    pub fn checkpoint_minutes(mut self, minutes: u32) -> Self {
        self.checkpoint_minutes = minutes;
        self
    }

    pub fn rag(mut self, enabled: bool) -> Self {
        self.enable_rag = enabled;
        self
    }

    pub fn rag_min_score(mut self, score: f64) -> Self {
        self.rag_min_score = score;
        self
    }

    pub fn max_integration_points(mut self, max: usize) -> Self {
        self.max_integration_points = max;
        self
    }

    pub fn validate(&self) -> WorkflowResult<()> {
        if !(0.0..=1.0).contains(&self.rag_min_score) {
            return Err(WorkflowError::InvalidConfiguration(format!(
                "rag_min_score must be within 0.0-1.0, got {}",
                self.rag_min_score
            )));
        }
        if self.checkpoint_agents.is_empty() {
            return Err(WorkflowError::InvalidConfiguration(
                "checkpoint_agents must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn from_file(path: &Path) -> WorkflowResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> WorkflowResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PlannerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.checkpoint_minutes, 15);
    }

    #[test]
    fn test_out_of_range_score_rejected() {
        assert!(PlannerConfig::from_yaml("rag_min_score: 1.5\n").is_err());
    }

    #[test]
    fn test_partial_yaml() {
        let config = PlannerConfig::from_yaml("enable_rag: false\n").unwrap();
        assert!(!config.enable_rag);
        assert_eq!(config.max_integration_points, 3);
    }
}
