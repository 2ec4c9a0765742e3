//! Mutable per-agent runtime bookkeeping.

use serde::{Deserialize, Serialize};

/// Availability of an agent.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    #[default]
    Available,
    Busy,
}

/// Runtime state of a registered agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRuntimeState {
    pub status: AgentStatus,
    /// Tasks currently assigned
    pub current_tasks: u32,
    /// Tasks completed successfully
    pub completed: u64,
    /// Tasks that failed
    pub failed: u64,
    /// Running average of observed response times (ms)
    pub avg_response_ms: f64,
    /// completed / (completed + failed), 1.0 before any task finished
    pub success_rate: f64,
    /// Sequence number of the most recent assignment
    pub last_assigned: Option<u64>,
}

impl AgentRuntimeState {
    /// Fresh state seeded with the descriptor's response estimate.
    pub fn new(estimated_response_ms: u64) -> Self {
        Self {
            status: AgentStatus::Available,
            current_tasks: 0,
            completed: 0,
            failed: 0,
            avg_response_ms: estimated_response_ms as f64,
            success_rate: 1.0,
            last_assigned: None,
        }
    }

    /// Share of the concurrency cap in use (0.0 - 1.0).
    pub fn load_ratio(&self, max_concurrent: u32) -> f64 {
        if max_concurrent == 0 {
            return 1.0;
        }
        (self.current_tasks as f64 / max_concurrent as f64).min(1.0)
    }

    pub fn at_capacity(&self, max_concurrent: u32) -> bool {
        self.current_tasks >= max_concurrent
    }

    /// Record a new assignment.
    pub fn begin_task(&mut self, sequence: u64, max_concurrent: u32) {
        self.current_tasks += 1;
        self.last_assigned = Some(sequence);
        self.refresh_status(max_concurrent);
    }

    /// Record the end of an assignment and fold it into the metrics.
    pub fn finish_task(&mut self, success: bool, elapsed_ms: u64, max_concurrent: u32) {
        self.current_tasks = self.current_tasks.saturating_sub(1);

        if success {
            self.completed += 1;
            let n = self.completed as f64;
            self.avg_response_ms = (self.avg_response_ms * (n - 1.0) + elapsed_ms as f64) / n;
        } else {
            self.failed += 1;
        }

        let finished = self.completed + self.failed;
        self.success_rate = self.completed as f64 / finished as f64;
        self.refresh_status(max_concurrent);
    }

    fn refresh_status(&mut self, max_concurrent: u32) {
        self.status = if self.at_capacity(max_concurrent) {
            AgentStatus::Busy
        } else {
            AgentStatus::Available
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_at_cap() {
        let mut state = AgentRuntimeState::new(1000);
        state.begin_task(1, 2);
        assert_eq!(state.status, AgentStatus::Available);

        state.begin_task(2, 2);
        assert_eq!(state.status, AgentStatus::Busy);
        assert!(state.at_capacity(2));

        state.finish_task(true, 500, 2);
        assert_eq!(state.status, AgentStatus::Available);
        assert_eq!(state.last_assigned, Some(2));
    }

    #[test]
    fn test_metrics_update() {
        let mut state = AgentRuntimeState::new(1000);

        state.begin_task(1, 1);
        state.finish_task(true, 200, 1);
        assert_eq!(state.completed, 1);
        assert_eq!(state.avg_response_ms, 200.0);
        assert_eq!(state.success_rate, 1.0);

        state.begin_task(2, 1);
        state.finish_task(true, 400, 1);
        assert_eq!(state.avg_response_ms, 300.0);

        state.begin_task(3, 1);
        state.finish_task(false, 50, 1);
        assert_eq!(state.failed, 1);
        assert!((state.success_rate - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(state.current_tasks, 0);
    }

    #[test]
    fn test_default_status_is_available() {
        assert_eq!(AgentStatus::default(), AgentStatus::Available);
    }

    #[test]
    fn test_load_ratio() {
        let mut state = AgentRuntimeState::new(1000);
        assert_eq!(state.load_ratio(4), 0.0);
        state.begin_task(1, 4);
        assert_eq!(state.load_ratio(4), 0.25);
        assert_eq!(state.load_ratio(0), 1.0);
    }
}
