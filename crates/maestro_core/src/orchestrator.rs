//! Plan-and-dispatch orchestration.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use maestro_agents::{AgentDelegator, DelegationOutcome, DelegatorStatus, ExecutionContext, Task};
use maestro_workflow::{AnalysisResult, Phase, WorkflowPlan, WorkflowPlanner};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::MaestroConfig;
use crate::error::{CoreError, CoreResult};

/// How a phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    Completed,
    Failed,
    /// Not dispatched because an earlier critical phase failed
    Skipped,
}

/// Overall orchestration result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestrationState {
    /// Every phase completed
    Completed,
    /// Only non-critical phases failed
    CompletedWithWarnings,
    /// A critical phase failed
    Failed,
}

/// Result of dispatching one phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseOutcome {
    pub phase: String,
    pub task_type: String,
    pub critical: bool,
    pub status: PhaseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_used: Option<String>,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
}

impl PhaseOutcome {
    fn from_delegation(phase: &Phase, outcome: DelegationOutcome) -> Self {
        Self {
            phase: phase.name.clone(),
            task_type: phase.task_type.clone(),
            critical: phase.critical,
            status: if outcome.success {
                PhaseStatus::Completed
            } else {
                PhaseStatus::Failed
            },
            task_id: Some(outcome.task_id),
            agent_used: outcome.agent_used,
            attempts: outcome.metadata.attempts,
            error: outcome.error,
            result: outcome.result,
        }
    }

    fn skipped(phase: &Phase) -> Self {
        Self {
            phase: phase.name.clone(),
            task_type: phase.task_type.clone(),
            critical: phase.critical,
            status: PhaseStatus::Skipped,
            task_id: None,
            agent_used: None,
            attempts: 0,
            error: None,
            result: None,
        }
    }
}

/// Plan plus per-phase dispatch results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationReport {
    pub workflow_id: String,
    pub state: OrchestrationState,
    pub plan: WorkflowPlan,
    pub phases: Vec<PhaseOutcome>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl OrchestrationReport {
    /// First failed critical phase, if any.
    pub fn failed_phase(&self) -> Option<&PhaseOutcome> {
        self.phases
            .iter()
            .find(|p| p.critical && p.status == PhaseStatus::Failed)
    }

    pub fn count(&self, status: PhaseStatus) -> usize {
        self.phases.iter().filter(|p| p.status == status).count()
    }

    pub fn is_success(&self) -> bool {
        self.state != OrchestrationState::Failed
    }

    /// Write the report as pretty JSON.
    pub fn save(&self, path: &Path) -> CoreResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| CoreError::Serialization(e.to_string()))?;
        std::fs::write(path, json)?;
        debug!("Saved orchestration report to {:?}", path);
        Ok(())
    }

    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| CoreError::Serialization(e.to_string()))
    }
}

/// Builds plans with a [`WorkflowPlanner`] and dispatches their phases
/// through an [`AgentDelegator`].
pub struct ContentOrchestrator {
    planner: WorkflowPlanner,
    delegator: Arc<AgentDelegator>,
}

impl ContentOrchestrator {
    pub fn new(planner: WorkflowPlanner, delegator: Arc<AgentDelegator>) -> Self {
        Self { planner, delegator }
    }

    /// Build planner and simulated delegator from configuration, loading
    /// any table files it names.
    pub fn from_config(config: &MaestroConfig) -> CoreResult<Self> {
        config.validate()?;

        let planner = WorkflowPlanner::new(config.planner.clone())
            .with_templates(config.load_templates()?)
            .with_rules(config.load_rules()?);
        let delegator = AgentDelegator::new(config.delegator.clone())
            .with_capability_map(config.load_capabilities()?);

        Ok(Self::new(planner, Arc::new(delegator)))
    }

    pub fn planner(&self) -> &WorkflowPlanner {
        &self.planner
    }

    pub fn delegator(&self) -> &Arc<AgentDelegator> {
        &self.delegator
    }

    /// Plan without dispatching.
    pub fn plan(&self, analysis: &AnalysisResult, workflow_id: &str) -> CoreResult<WorkflowPlan> {
        Ok(self.planner.create_workflow_plan(analysis, workflow_id)?)
    }

    /// Plan a request and dispatch every phase.
    ///
    /// Only planning errors are returned; dispatch failures are recorded in
    /// the report.
    pub async fn orchestrate(
        &self,
        analysis: &AnalysisResult,
        workflow_id: &str,
    ) -> CoreResult<OrchestrationReport> {
        let plan = self.plan(analysis, workflow_id)?;
        Ok(self.execute_plan(plan, analysis).await)
    }

    /// Build a refinement plan from feedback and dispatch it.
    pub async fn refine(&self, feedback: &str, workflow_id: &str) -> OrchestrationReport {
        let plan = self.planner.create_refinement_plan(feedback, workflow_id);
        let request = AnalysisResult::new(plan.content_type.clone());
        self.execute_plan(plan, &request).await
    }

    /// Delegator snapshot.
    pub fn status(&self) -> DelegatorStatus {
        self.delegator.get_status()
    }

    /// Dispatch a plan phase by phase.
    ///
    /// A phase and the parallel phases directly after it form one group and
    /// are awaited together. Once a critical phase fails, the remaining
    /// phases are skipped.
    pub async fn execute_plan(
        &self,
        plan: WorkflowPlan,
        analysis: &AnalysisResult,
    ) -> OrchestrationReport {
        let started_at = Utc::now();
        let clock = Instant::now();
        let groups = phase_groups(&plan.phases);

        info!(
            "Orchestrating {} ({} phases in {} groups)",
            plan.workflow_id,
            plan.phases.len(),
            groups.len()
        );

        let mut outcomes: Vec<PhaseOutcome> = Vec::with_capacity(plan.phases.len());
        let mut completed_phases: Vec<String> = Vec::new();
        let mut halted = false;

        for group in groups {
            let phases = &plan.phases[group];
            if halted {
                outcomes.extend(phases.iter().map(PhaseOutcome::skipped));
                continue;
            }

            let dispatches = phases.iter().map(|phase| {
                let task = phase_task(&plan, phase, analysis);
                let mut context =
                    ExecutionContext::for_workflow(&plan.workflow_id).with_phase(&phase.name);
                context.set_shared("content_type", &plan.content_type);
                context.set_shared("completed_phases", &completed_phases);
                async move {
                    let outcome = self.delegator.delegate_task(task, &context).await;
                    PhaseOutcome::from_delegation(phase, outcome)
                }
            });
            let results = join_all(dispatches).await;

            for outcome in results {
                match outcome.status {
                    PhaseStatus::Completed => {
                        debug!(
                            "Phase {} completed by {:?}",
                            outcome.phase, outcome.agent_used
                        );
                        completed_phases.push(outcome.phase.clone());
                    }
                    PhaseStatus::Failed if outcome.critical => {
                        error!(
                            "Critical phase {} failed: {}",
                            outcome.phase,
                            outcome.error.as_deref().unwrap_or("unknown error")
                        );
                        halted = true;
                    }
                    PhaseStatus::Failed => {
                        warn!(
                            "Phase {} failed: {}",
                            outcome.phase,
                            outcome.error.as_deref().unwrap_or("unknown error")
                        );
                    }
                    PhaseStatus::Skipped => {}
                }
                outcomes.push(outcome);
            }
        }

        let state = if halted {
            OrchestrationState::Failed
        } else if outcomes.iter().any(|o| o.status == PhaseStatus::Failed) {
            OrchestrationState::CompletedWithWarnings
        } else {
            OrchestrationState::Completed
        };
        let duration = clock.elapsed();
        log_summary(&plan.workflow_id, state, duration);

        OrchestrationReport {
            workflow_id: plan.workflow_id.clone(),
            state,
            plan,
            phases: outcomes,
            started_at,
            completed_at: Utc::now(),
            duration_ms: duration.as_millis() as u64,
        }
    }
}

impl std::fmt::Debug for ContentOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentOrchestrator")
            .field("planner", &self.planner)
            .field("delegator", &self.delegator)
            .finish()
    }
}

fn log_summary(workflow_id: &str, state: OrchestrationState, duration: Duration) {
    match state {
        OrchestrationState::Failed => error!("Workflow {} failed after {:?}", workflow_id, duration),
        _ => info!("Workflow {} finished ({:?}) in {:?}", workflow_id, state, duration),
    }
}

/// Index ranges of phases dispatched together.
fn phase_groups(phases: &[Phase]) -> Vec<std::ops::Range<usize>> {
    let mut groups = Vec::new();
    let mut start = 0;
    for index in 1..=phases.len() {
        if index == phases.len() || !phases[index].parallel {
            groups.push(start..index);
            start = index;
        }
    }
    groups
}

fn phase_task(plan: &WorkflowPlan, phase: &Phase, analysis: &AnalysisResult) -> Task {
    let mut task = Task::new(&phase.task_type, &phase.name)
        .with_id(format!("{}-{}", plan.workflow_id, phase.name))
        .with_complexity(analysis.complexity)
        .with_payload(serde_json::json!({
            "workflow_id": plan.workflow_id,
            "content_type": plan.content_type,
            "phase": phase.name,
            "planned_agents": phase.agents,
            "integration_points": phase.integration_points,
        }));
    if let Some(domain) = &analysis.domain {
        task = task.with_domain(domain);
    }
    task
}
