//! Integration tests for plan-and-dispatch orchestration

use std::io::Write;
use std::sync::Arc;

use maestro_agents::{AgentDelegator, AgentDescriptor, DelegatorConfig, ScriptedExecutor};
use maestro_core::{
    ContentOrchestrator, MaestroConfig, OrchestrationReport, OrchestrationState, PhaseStatus,
};
use maestro_workflow::{
    AnalysisResult, ContentTemplate, FeedbackCategory, PhaseTemplate, PlannerConfig,
    TemplateCatalog, WorkflowPlanner,
};
use tempfile::{NamedTempFile, TempDir};

fn orchestrator(executor: &ScriptedExecutor) -> ContentOrchestrator {
    let delegator =
        AgentDelegator::with_executor(DelegatorConfig::immediate(), Arc::new(executor.clone()));
    ContentOrchestrator::new(WorkflowPlanner::default(), Arc::new(delegator))
}

#[tokio::test]
async fn test_every_phase_dispatched_in_order() {
    let executor = ScriptedExecutor::new();
    let orchestrator = orchestrator(&executor);

    let report = orchestrator
        .orchestrate(&AnalysisResult::new("general"), "wf-general")
        .await
        .unwrap();

    assert_eq!(report.state, OrchestrationState::Completed);
    assert_eq!(report.phases.len(), report.plan.phases.len());
    assert_eq!(report.count(PhaseStatus::Completed), report.phases.len());

    let dispatched: Vec<String> = executor
        .calls()
        .into_iter()
        .filter_map(|c| c.phase)
        .collect();
    assert_eq!(dispatched, report.plan.phase_names());

    let first = &report.phases[0];
    assert_eq!(first.task_id.as_deref(), Some("wf-general-research"));
    assert_eq!(first.attempts, 1);
}

#[tokio::test]
async fn test_parallel_phases_share_a_group() {
    let executor = ScriptedExecutor::new();
    let orchestrator = orchestrator(&executor);

    let report = orchestrator
        .orchestrate(&AnalysisResult::new("educational-module"), "wf-edu")
        .await
        .unwrap();

    assert!(report.plan.phase("interactive-elements").unwrap().parallel);
    assert_eq!(report.state, OrchestrationState::Completed);
    assert_eq!(executor.call_count(), report.plan.phases.len());
}

#[tokio::test]
async fn test_critical_failure_skips_remaining_phases() {
    let executor = ScriptedExecutor::new().fail_all("service unavailable");
    let orchestrator = orchestrator(&executor);

    let report = orchestrator
        .orchestrate(&AnalysisResult::new("general"), "wf-down")
        .await
        .unwrap();

    assert_eq!(report.state, OrchestrationState::Failed);
    assert!(!report.is_success());

    let failed = report.failed_phase().unwrap();
    assert_eq!(failed.phase, "research");
    assert_eq!(failed.attempts, 4);
    assert!(failed.error.is_some());

    assert_eq!(report.count(PhaseStatus::Failed), 1);
    assert_eq!(report.count(PhaseStatus::Skipped), report.phases.len() - 1);
    assert!(executor.calls().iter().all(|c| c.phase.as_deref() == Some("research")));
}

#[tokio::test]
async fn test_non_critical_failure_is_a_warning() {
    let executor = ScriptedExecutor::new().fail_agent("writer");
    let delegator =
        AgentDelegator::empty(DelegatorConfig::immediate(), Arc::new(executor.clone()));
    for agent in [
        AgentDescriptor::new("researcher").capabilities(&["research"]),
        AgentDescriptor::new("writer").capabilities(&["content-generation"]),
        AgentDescriptor::new("reviewer").capabilities(&["quality-review"]),
    ] {
        delegator.register_agent(agent).unwrap();
    }

    let mut templates = TemplateCatalog::new();
    templates.insert(
        ContentTemplate::new("general", "Draft is optional")
            .phase(PhaseTemplate::new("research", "research", &["research"], 30).critical(true))
            .phase(PhaseTemplate::new("drafting", "content-generation", &["nlp-generator"], 30))
            .phase(
                PhaseTemplate::new("review", "quality-review", &["quality-guardian"], 30)
                    .critical(true),
            ),
    );
    let planner = WorkflowPlanner::new(PlannerConfig::default()).with_templates(templates);
    let orchestrator = ContentOrchestrator::new(planner, Arc::new(delegator));

    let report = orchestrator
        .orchestrate(&AnalysisResult::new("general"), "wf-draft")
        .await
        .unwrap();

    assert_eq!(report.state, OrchestrationState::CompletedWithWarnings);
    assert!(report.failed_phase().is_none());
    let drafting = report.phases.iter().find(|p| p.phase == "drafting").unwrap();
    assert_eq!(drafting.status, PhaseStatus::Failed);
    assert_eq!(report.count(PhaseStatus::Skipped), 0);

    let review = report.phases.iter().find(|p| p.phase == "review").unwrap();
    assert_eq!(review.agent_used.as_deref(), Some("reviewer"));
}

#[tokio::test]
async fn test_planning_errors_are_returned() {
    let executor = ScriptedExecutor::new();
    let orchestrator = orchestrator(&executor);

    let result = orchestrator
        .orchestrate(&AnalysisResult::new("general").complexity(0), "wf-bad")
        .await;
    assert!(result.is_err());
    assert_eq!(executor.call_count(), 0);
}

#[tokio::test]
async fn test_refine_dispatches_refinement_plan() {
    let executor = ScriptedExecutor::new();
    let orchestrator = orchestrator(&executor);

    let report = orchestrator
        .refine("Too many typos in the summary", "wf-refine")
        .await;

    assert_eq!(
        report.plan.feedback_category,
        Some(FeedbackCategory::ContentQuality)
    );
    assert_eq!(report.state, OrchestrationState::Completed);
    assert_eq!(report.phases.len(), 3);
}

#[tokio::test]
async fn test_status_reflects_dispatches() {
    let executor = ScriptedExecutor::new();
    let orchestrator = orchestrator(&executor);

    let report = orchestrator
        .orchestrate(&AnalysisResult::new("research-summary"), "wf-status")
        .await
        .unwrap();

    let status = orchestrator.status();
    assert_eq!(status.total_completed as usize, report.phases.len());
    assert_eq!(status.total_failed, 0);
    assert!(status.active_tasks.is_empty());
}

#[tokio::test]
async fn test_from_config_with_template_file_and_report_persistence() {
    let mut templates = NamedTempFile::new().unwrap();
    writeln!(
        templates,
        r#"
- content_type: general
  phases:
    - name: outline
      task_type: content-architecture
      agents: [architect]
      duration_minutes: 15
    - name: write
      task_type: content-generation
      agents: [nlp-generator]
      duration_minutes: 30
"#
    )
    .unwrap();

    let yaml = format!(
        "delegator:\n  retry_delay_ms: 0\n  simulation_delay_cap_ms: 0\ntemplates: {}\n",
        templates.path().display()
    );
    let config = MaestroConfig::from_yaml(&yaml).unwrap();
    let orchestrator = ContentOrchestrator::from_config(&config).unwrap();

    let report = orchestrator
        .orchestrate(&AnalysisResult::new("anything").complexity(1), "wf-config")
        .await
        .unwrap();
    assert_eq!(report.plan.phase_names(), vec!["outline", "write"]);
    assert_eq!(report.state, OrchestrationState::Completed);

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("reports").join("wf-config.json");
    report.save(&path).unwrap();
    let loaded = OrchestrationReport::load(&path).unwrap();
    assert_eq!(loaded.workflow_id, "wf-config");
    assert_eq!(loaded.phases.len(), 2);
}
