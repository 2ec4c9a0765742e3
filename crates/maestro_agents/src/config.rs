//! Delegator configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AgentError, AgentResult};
use crate::strategy::SelectionStrategy;

/// Delegator configuration with retry and timing limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelegatorConfig {
    /// Agent selection strategy
    pub strategy: SelectionStrategy,
    /// Retries after the first failed attempt
    pub retry_limit: u32,
    /// Fixed delay between attempts in milliseconds
    pub retry_delay_ms: u64,
    /// Per-attempt execution timeout in milliseconds (0 = no timeout)
    pub task_timeout_ms: u64,
    /// Upper bound on the simulated response delay in milliseconds
    pub simulation_delay_cap_ms: u64,
}

impl Default for DelegatorConfig {
    fn default() -> Self {
        Self {
            strategy: SelectionStrategy::Weighted,
            retry_limit: 3,
            retry_delay_ms: 1000,
            task_timeout_ms: 30_000,
            simulation_delay_cap_ms: 2000,
        }
    }
}

impl DelegatorConfig {
    pub fn strategy(mut self, strategy: SelectionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn retry_limit(mut self, limit: u32) -> Self {
        self.retry_limit = limit;
        self
    }

    pub fn retry_delay(mut self, ms: u64) -> Self {
        self.retry_delay_ms = ms;
        self
    }

    pub fn task_timeout(mut self, ms: u64) -> Self {
        self.task_timeout_ms = ms;
        self
    }

    pub fn simulation_delay_cap(mut self, ms: u64) -> Self {
        self.simulation_delay_cap_ms = ms;
        self
    }

    /// Configuration for tests: no waiting anywhere.
    pub fn immediate() -> Self {
        Self::default().retry_delay(0).simulation_delay_cap(0)
    }

    pub fn retry_delay_duration(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn task_timeout_duration(&self) -> Option<Duration> {
        (self.task_timeout_ms > 0).then(|| Duration::from_millis(self.task_timeout_ms))
    }

    /// Check the configuration for inconsistent values.
    pub fn validate(&self) -> AgentResult<()> {
        if self.task_timeout_ms > 0 && self.simulation_delay_cap_ms > self.task_timeout_ms {
            return Err(AgentError::InvalidConfiguration(format!(
                "simulation_delay_cap_ms ({}) exceeds task_timeout_ms ({})",
                self.simulation_delay_cap_ms, self.task_timeout_ms
            )));
        }
        Ok(())
    }

    /// Load a configuration from a YAML file.
    pub fn from_file(path: &Path) -> AgentResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> AgentResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }
}
