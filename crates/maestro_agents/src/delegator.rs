//! Task delegator: candidate filtering, selection, execution and retries.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::catalog::{AgentCatalog, AgentDescriptor, CapabilityMap};
use crate::config::DelegatorConfig;
use crate::error::{AgentError, AgentResult};
use crate::executor::{AgentExecutor, SimulatedExecutor};
use crate::state::AgentRuntimeState;
use crate::strategy::{self, Candidate, SelectionStrategy};
use crate::task::{ExecutionContext, Task};

/// Bookkeeping for metadata attached to every delegation outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegationMetadata {
    pub task_type: String,
    pub strategy: SelectionStrategy,
    /// Attempts made, including the first one
    pub attempts: u32,
    pub retry_count: u32,
    pub excluded_agents: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

/// Terminal result of [`AgentDelegator::delegate_task`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegationOutcome {
    pub success: bool,
    pub task_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_used: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub metadata: DelegationMetadata,
}

/// A task currently assigned to an agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveTask {
    /// Assignment sequence number
    pub sequence: u64,
    pub task_id: String,
    pub agent: String,
    pub started_at: DateTime<Utc>,
}

/// Status line for one agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentStatusReport {
    pub name: String,
    pub capabilities: Vec<String>,
    pub max_concurrent_tasks: u32,
    #[serde(flatten)]
    pub state: AgentRuntimeState,
}

/// Snapshot of the delegator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegatorStatus {
    pub strategy: SelectionStrategy,
    pub active_tasks: Vec<ActiveTask>,
    pub total_completed: u64,
    pub total_failed: u64,
    pub agents: Vec<AgentStatusReport>,
}

struct AttemptFailure {
    agent: Option<String>,
    error: AgentError,
}

/// An agent slot held for one attempt.
///
/// Dropping it releases the slot and clears the active-task entry. Unless
/// [`Assignment::succeeded`] was called first, the attempt counts as failed,
/// which covers callers that abandon `delegate_task` mid-execution.
struct Assignment<'a> {
    delegator: &'a AgentDelegator,
    agent: AgentDescriptor,
    sequence: u64,
    clock: Instant,
    success: bool,
}

impl Assignment<'_> {
    fn succeeded(&mut self) {
        self.success = true;
    }
}

impl Drop for Assignment<'_> {
    fn drop(&mut self) {
        let elapsed_ms = self.clock.elapsed().as_millis() as u64;
        self.delegator.active_tasks.write().remove(&self.sequence);
        self.delegator.release(&self.agent, self.success, elapsed_ms);
    }
}

/// Assigns tasks to registered agents and tracks their synthetic metrics.
pub struct AgentDelegator {
    config: DelegatorConfig,
    capability_map: CapabilityMap,
    agents: RwLock<BTreeMap<String, AgentDescriptor>>,
    states: RwLock<HashMap<String, AgentRuntimeState>>,
    active_tasks: RwLock<HashMap<u64, ActiveTask>>,
    executor: Arc<dyn AgentExecutor>,
    sequence: AtomicU64,
}

impl AgentDelegator {
    /// Delegator with the standard roster and the simulated executor.
    pub fn new(config: DelegatorConfig) -> Self {
        let executor = SimulatedExecutor::new(Duration::from_millis(config.simulation_delay_cap_ms));
        Self::with_executor(config, Arc::new(executor))
    }

    /// Delegator with the standard roster and a custom executor.
    pub fn with_executor(config: DelegatorConfig, executor: Arc<dyn AgentExecutor>) -> Self {
        let delegator = Self::empty(config, executor);
        for agent in AgentCatalog::standard() {
            let name = agent.name.clone();
            delegator.insert_agent(name, agent);
        }
        delegator
    }

    /// Delegator with no agents registered.
    pub fn empty(config: DelegatorConfig, executor: Arc<dyn AgentExecutor>) -> Self {
        Self {
            config,
            capability_map: CapabilityMap::standard(),
            agents: RwLock::new(BTreeMap::new()),
            states: RwLock::new(HashMap::new()),
            active_tasks: RwLock::new(HashMap::new()),
            executor,
            sequence: AtomicU64::new(0),
        }
    }

    /// Replace the task-type capability map.
    pub fn with_capability_map(mut self, map: CapabilityMap) -> Self {
        self.capability_map = map;
        self
    }

    pub fn config(&self) -> &DelegatorConfig {
        &self.config
    }

    pub fn capability_map(&self) -> &CapabilityMap {
        &self.capability_map
    }

    /// Register an agent. Names must be unique.
    pub fn register_agent(&self, agent: AgentDescriptor) -> AgentResult<()> {
        let mut agents = self.agents.write();
        match agents.entry(agent.name.clone()) {
            Entry::Occupied(entry) => Err(AgentError::AlreadyRegistered(entry.key().clone())),
            Entry::Vacant(entry) => {
                debug!("Registering agent: {}", agent.name);
                self.states.write().insert(
                    agent.name.clone(),
                    AgentRuntimeState::new(agent.avg_response_ms),
                );
                entry.insert(agent);
                Ok(())
            }
        }
    }

    fn insert_agent(&self, name: String, agent: AgentDescriptor) {
        let mut agents = self.agents.write();
        self.states
            .write()
            .insert(name.clone(), AgentRuntimeState::new(agent.avg_response_ms));
        agents.insert(name, agent);
    }

    /// Registered agents in name order.
    pub fn agents(&self) -> Vec<AgentDescriptor> {
        self.agents.read().values().cloned().collect()
    }

    pub fn agent_state(&self, name: &str) -> Option<AgentRuntimeState> {
        self.states.read().get(name).cloned()
    }

    /// Names of agents that could take the task right now.
    pub fn find_candidates(&self, task: &Task) -> Vec<String> {
        let agents = self.agents.read();
        let states = self.states.read();
        self.candidates(&agents, &states, task)
            .iter()
            .map(|c| c.descriptor.name.clone())
            .collect()
    }

    fn candidates<'a>(
        &self,
        agents: &'a BTreeMap<String, AgentDescriptor>,
        states: &'a HashMap<String, AgentRuntimeState>,
        task: &Task,
    ) -> Vec<Candidate<'a>> {
        agents
            .values()
            .filter(|agent| !task.is_excluded(&agent.name))
            .filter(|agent| self.capability_map.is_capable(agent, &task.task_type))
            .filter_map(|agent| {
                let state = states.get(&agent.name)?;
                (!state.at_capacity(agent.max_concurrent_tasks)).then(|| Candidate::new(agent, state))
            })
            .collect()
    }

    /// Pick an agent for the task and mark it as assigned.
    fn assign(&self, task: &Task) -> AgentResult<Assignment<'_>> {
        let (agent, sequence) = {
            let agents = self.agents.read();
            let mut states = self.states.write();

            let chosen = {
                let candidates = self.candidates(&agents, &states, task);
                strategy::select(self.config.strategy, &candidates, task)
                    .map(|c| c.descriptor.clone())
            };
            let agent = chosen.ok_or_else(|| AgentError::no_candidate(&task.task_type))?;

            let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(state) = states.get_mut(&agent.name) {
                state.begin_task(sequence, agent.max_concurrent_tasks);
            }
            (agent, sequence)
        };

        self.active_tasks.write().insert(
            sequence,
            ActiveTask {
                sequence,
                task_id: task.id.clone(),
                agent: agent.name.clone(),
                started_at: Utc::now(),
            },
        );

        Ok(Assignment {
            delegator: self,
            agent,
            sequence,
            clock: Instant::now(),
            success: false,
        })
    }

    fn release(&self, agent: &AgentDescriptor, success: bool, elapsed_ms: u64) {
        if let Some(state) = self.states.write().get_mut(&agent.name) {
            state.finish_task(success, elapsed_ms, agent.max_concurrent_tasks);
        }
    }

    async fn attempt(
        &self,
        task: &Task,
        context: &ExecutionContext,
    ) -> Result<(String, serde_json::Value), AttemptFailure> {
        let mut assignment = self
            .assign(task)
            .map_err(|error| AttemptFailure { agent: None, error })?;
        let agent = assignment.agent.clone();

        info!(
            "Assigned task {} ({}) to {} [attempt {}]",
            task.id,
            task.task_type,
            agent.name,
            task.retry_count + 1
        );

        let outcome = match self.config.task_timeout_duration() {
            Some(limit) => {
                match tokio::time::timeout(limit, self.executor.execute(&agent, task, context)).await {
                    Ok(result) => result,
                    Err(_) => Err(AgentError::Timeout {
                        agent: agent.name.clone(),
                        timeout_ms: self.config.task_timeout_ms,
                    }),
                }
            }
            None => self.executor.execute(&agent, task, context).await,
        };

        if outcome.is_ok() {
            assignment.succeeded();
        }
        drop(assignment);

        match outcome {
            Ok(result) => Ok((agent.name, result)),
            Err(error) => Err(AttemptFailure {
                agent: Some(agent.name),
                error,
            }),
        }
    }

    /// Delegate a task to the best available agent.
    ///
    /// Failed attempts are retried up to `retry_limit` times, each time
    /// excluding the agent that failed. This never returns an error: the
    /// final failure is reported in the outcome.
    pub async fn delegate_task(&self, mut task: Task, context: &ExecutionContext) -> DelegationOutcome {
        let started_at = Utc::now();
        let clock = Instant::now();
        let mut attempts = 0u32;

        loop {
            attempts += 1;

            let failure = match self.attempt(&task, context).await {
                Ok((agent, result)) => {
                    info!("Task {} completed by {}", task.id, agent);
                    let metadata = self.metadata(&task, attempts, started_at, clock);
                    return DelegationOutcome {
                        success: true,
                        task_id: task.id,
                        agent_used: Some(agent),
                        result: Some(result),
                        error: None,
                        metadata,
                    };
                }
                Err(failure) => failure,
            };

            if task.retry_count < self.config.retry_limit {
                task.retry_count += 1;
                if let Some(agent) = failure.agent {
                    task.exclude(agent);
                }
                warn!(
                    "Task {} attempt {} failed: {} (retry {}/{})",
                    task.id, attempts, failure.error, task.retry_count, self.config.retry_limit
                );
                let delay = self.config.retry_delay_duration();
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                continue;
            }

            error!(
                "Task {} failed after {} attempts: {}",
                task.id, attempts, failure.error
            );
            let metadata = self.metadata(&task, attempts, started_at, clock);
            return DelegationOutcome {
                success: false,
                task_id: task.id,
                agent_used: None,
                result: None,
                error: Some(failure.error.to_string()),
                metadata,
            };
        }
    }

    fn metadata(
        &self,
        task: &Task,
        attempts: u32,
        started_at: DateTime<Utc>,
        clock: Instant,
    ) -> DelegationMetadata {
        DelegationMetadata {
            task_type: task.task_type.clone(),
            strategy: self.config.strategy,
            attempts,
            retry_count: task.retry_count,
            excluded_agents: task.exclude_agents.clone(),
            started_at,
            duration_ms: clock.elapsed().as_millis() as u64,
        }
    }

    /// Snapshot of agents, active tasks and totals.
    pub fn get_status(&self) -> DelegatorStatus {
        let agents = self.agents.read();
        let states = self.states.read();

        let reports: Vec<AgentStatusReport> = agents
            .values()
            .filter_map(|agent| {
                let state = states.get(&agent.name)?.clone();
                Some(AgentStatusReport {
                    name: agent.name.clone(),
                    capabilities: agent.capabilities.clone(),
                    max_concurrent_tasks: agent.max_concurrent_tasks,
                    state,
                })
            })
            .collect();

        let mut active_tasks: Vec<ActiveTask> = self.active_tasks.read().values().cloned().collect();
        active_tasks.sort_by_key(|t| t.sequence);

        DelegatorStatus {
            strategy: self.config.strategy,
            active_tasks,
            total_completed: reports.iter().map(|r| r.state.completed).sum(),
            total_failed: reports.iter().map(|r| r.state.failed).sum(),
            agents: reports,
        }
    }
}

impl std::fmt::Debug for AgentDelegator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentDelegator")
            .field("config", &self.config)
            .field("agents", &self.agents.read().keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::MockAgentExecutor;
    use crate::state::AgentStatus;
    use serde_json::json;

    fn delegator_with(mock: MockAgentExecutor, config: DelegatorConfig) -> AgentDelegator {
        AgentDelegator::with_executor(config, Arc::new(mock))
    }

    #[tokio::test]
    async fn test_exhausted_retries_return_structured_failure() {
        let mut mock = MockAgentExecutor::new();
        mock.expect_execute()
            .times(3)
            .returning(|agent, _, _| Err(AgentError::execution_failed(&agent.name, "boom")));

        let delegator = delegator_with(mock, DelegatorConfig::immediate().retry_limit(2));
        let task = Task::new("quality-review", "Review draft");

        let outcome = delegator.delegate_task(task, &ExecutionContext::new()).await;

        assert!(!outcome.success);
        assert_eq!(outcome.metadata.attempts, 3);
        assert_eq!(outcome.metadata.retry_count, 2);
        assert!(outcome.agent_used.is_none());
        assert!(outcome.error.unwrap().contains("boom"));
    }

    #[tokio::test]
    async fn test_failed_agent_is_excluded_on_retry() {
        let mut mock = MockAgentExecutor::new();
        mock.expect_execute().times(2).returning(|agent, task, _| {
            if task.retry_count == 0 {
                Err(AgentError::execution_failed(&agent.name, "first try fails"))
            } else {
                assert!(!task.is_excluded(&agent.name));
                Ok(json!({ "agent": agent.name }))
            }
        });

        let delegator = delegator_with(mock, DelegatorConfig::immediate());
        let task = Task::new("research", "Find sources");

        let outcome = delegator.delegate_task(task, &ExecutionContext::new()).await;

        assert!(outcome.success);
        assert_eq!(outcome.metadata.retry_count, 1);
        assert_eq!(outcome.metadata.excluded_agents.len(), 1);
        assert_ne!(
            outcome.agent_used.as_deref(),
            Some(outcome.metadata.excluded_agents[0].as_str())
        );
    }

    #[tokio::test]
    async fn test_success_updates_metrics() {
        let mut mock = MockAgentExecutor::new();
        mock.expect_execute()
            .times(1)
            .returning(|_, _, _| Ok(json!({ "ok": true })));

        let delegator = delegator_with(mock, DelegatorConfig::immediate());
        let task = Task::new("editing", "Polish").with_id("t-42");

        let outcome = delegator.delegate_task(task, &ExecutionContext::new()).await;
        assert!(outcome.success);
        assert_eq!(outcome.task_id, "t-42");
        assert_eq!(outcome.agent_used.as_deref(), Some("content-editor"));

        let state = delegator.agent_state("content-editor").unwrap();
        assert_eq!(state.completed, 1);
        assert_eq!(state.current_tasks, 0);
        assert_eq!(state.last_assigned, Some(1));

        let status = delegator.get_status();
        assert_eq!(status.total_completed, 1);
        assert!(status.active_tasks.is_empty());
    }

    #[tokio::test]
    async fn test_no_candidate_is_retried_then_reported() {
        let mock = MockAgentExecutor::new();
        let delegator = AgentDelegator::empty(DelegatorConfig::immediate(), Arc::new(mock));
        let task = Task::new("research", "Nobody home");

        let outcome = delegator.delegate_task(task, &ExecutionContext::new()).await;

        assert!(!outcome.success);
        assert_eq!(outcome.metadata.attempts, 4);
        assert!(outcome.metadata.excluded_agents.is_empty());
        assert!(outcome.error.unwrap().contains("No candidate"));
    }

    struct SlowExecutor;

    #[async_trait::async_trait]
    impl AgentExecutor for SlowExecutor {
        async fn execute(
            &self,
            _agent: &AgentDescriptor,
            _task: &Task,
            _context: &ExecutionContext,
        ) -> AgentResult<serde_json::Value> {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(json!({}))
        }
    }

    #[tokio::test]
    async fn test_task_timeout_fails_attempt() {
        let config = DelegatorConfig::immediate()
            .retry_limit(0)
            .task_timeout(10);
        let delegator = AgentDelegator::with_executor(config, Arc::new(SlowExecutor));

        let outcome = delegator
            .delegate_task(Task::new("editing", "Slow"), &ExecutionContext::new())
            .await;

        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("timed out"));
        assert_eq!(delegator.agent_state("content-editor").unwrap().failed, 1);
    }

    fn solo(max_concurrent: u32) -> AgentDelegator {
        let delegator = AgentDelegator::empty(DelegatorConfig::immediate(), Arc::new(SlowExecutor));
        delegator
            .register_agent(
                AgentDescriptor::new("solo")
                    .capabilities(&["research"])
                    .max_concurrent(max_concurrent),
            )
            .unwrap();
        delegator
    }

    #[tokio::test]
    async fn test_abandoned_delegation_releases_agent() {
        let delegator = solo(1);

        let abandoned = tokio::time::timeout(
            Duration::from_millis(20),
            delegator.delegate_task(Task::new("research", "Abandoned"), &ExecutionContext::new()),
        )
        .await;
        assert!(abandoned.is_err());

        let state = delegator.agent_state("solo").unwrap();
        assert_eq!(state.current_tasks, 0);
        assert_eq!(state.status, AgentStatus::Available);
        assert_eq!(state.failed, 1);
        assert!(delegator.get_status().active_tasks.is_empty());

        let outcome = delegator
            .delegate_task(Task::new("research", "Next"), &ExecutionContext::new())
            .await;
        assert!(outcome.success);
        assert_eq!(outcome.agent_used.as_deref(), Some("solo"));
    }

    #[tokio::test]
    async fn test_concurrent_tasks_with_same_id_tracked_separately() {
        let delegator = solo(2);
        let context = ExecutionContext::new();

        let observe = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            delegator.get_status().active_tasks
        };
        let (first, second, active) = tokio::join!(
            delegator.delegate_task(Task::new("research", "One").with_id("wf-research"), &context),
            delegator.delegate_task(Task::new("research", "Two").with_id("wf-research"), &context),
            observe,
        );

        assert!(first.success && second.success);
        assert_eq!(active.len(), 2);
        assert_ne!(active[0].sequence, active[1].sequence);
        assert!(active.iter().all(|t| t.task_id == "wf-research"));
        assert!(delegator.get_status().active_tasks.is_empty());
        assert_eq!(delegator.agent_state("solo").unwrap().current_tasks, 0);
    }

    #[test]
    fn test_concurrent_registration_accepts_one() {
        let delegator = Arc::new(AgentDelegator::empty(
            DelegatorConfig::immediate(),
            Arc::new(SlowExecutor),
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let delegator = Arc::clone(&delegator);
                std::thread::spawn(move || {
                    delegator.register_agent(AgentDescriptor::new("twin").capabilities(&["research"]))
                })
            })
            .collect();
        let accepted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|r| r.is_ok())
            .count();

        assert_eq!(accepted, 1);
        assert_eq!(delegator.agents().len(), 1);
    }

    #[test]
    fn test_register_duplicate_rejected() {
        let delegator = AgentDelegator::new(DelegatorConfig::immediate());
        let result = delegator.register_agent(AgentDescriptor::new("research"));
        assert!(matches!(result, Err(AgentError::AlreadyRegistered(_))));

        delegator
            .register_agent(AgentDescriptor::new("translator").capabilities(&["language"]))
            .unwrap();
        assert!(delegator.agent_state("translator").is_some());
    }
}
