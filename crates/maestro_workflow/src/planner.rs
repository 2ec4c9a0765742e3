//! Workflow planner.
//!
//! Builds a plan by applying, in this order: base template, complexity
//! table, domain rule, request-flag phases, agent de-duplication, RAG
//! integration points, timing, and quality checkpoints. The same request
//! always produces the same plan.

use std::cmp::Ordering;

use tracing::{debug, info, warn};

use crate::config::PlannerConfig;
use crate::error::{WorkflowError, WorkflowResult};
use crate::plan::{summarize, IntegrationPoint, Phase, PhaseKind, WorkflowPlan};
use crate::refinement::{refinement_template, FeedbackCategory, FeedbackClassifier};
use crate::request::{AnalysisResult, RankedDocument};
use crate::rules::RuleBook;
use crate::templates::{PhaseTemplate, TemplateCatalog, FALLBACK_CONTENT_TYPE};

/// Name prefix of inserted checkpoint phases.
pub const CHECKPOINT_PREFIX: &str = "quality-checkpoint";

/// Produces declarative plans for content requests.
#[derive(Debug, Clone)]
pub struct WorkflowPlanner {
    config: PlannerConfig,
    templates: TemplateCatalog,
    rules: RuleBook,
    classifier: FeedbackClassifier,
}

impl Default for WorkflowPlanner {
    fn default() -> Self {
        Self::new(PlannerConfig::default())
    }
}

impl WorkflowPlanner {
    /// Planner with the built-in templates and rules.
    pub fn new(config: PlannerConfig) -> Self {
        Self {
            config,
            templates: TemplateCatalog::standard(),
            rules: RuleBook::standard(),
            classifier: FeedbackClassifier::new(),
        }
    }

    pub fn with_templates(mut self, templates: TemplateCatalog) -> Self {
        self.templates = templates;
        self
    }

    pub fn with_rules(mut self, rules: RuleBook) -> Self {
        self.rules = rules;
        self
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn templates(&self) -> &TemplateCatalog {
        &self.templates
    }

    pub fn rules(&self) -> &RuleBook {
        &self.rules
    }

    /// Content types with a dedicated template.
    pub fn content_types(&self) -> Vec<&str> {
        self.templates.content_types()
    }

    pub fn classify_feedback(&self, feedback: &str) -> FeedbackCategory {
        self.classifier.classify(feedback)
    }

    /// Build the plan for an analysed content request.
    pub fn create_workflow_plan(
        &self,
        analysis: &AnalysisResult,
        workflow_id: &str,
    ) -> WorkflowResult<WorkflowPlan> {
        analysis.validate()?;

        // 1. Base template
        let template = self
            .templates
            .resolve(&analysis.content_type)
            .ok_or_else(|| WorkflowError::InvalidTemplate {
                template: analysis.content_type.clone(),
                message: format!("no template and no '{}' fallback", FALLBACK_CONTENT_TYPE),
            })?;
        if template.content_type != analysis.content_type {
            warn!(
                "Unknown content type '{}', using '{}' template",
                analysis.content_type, template.content_type
            );
        }
        let mut phases: Vec<Phase> = template
            .phases
            .iter()
            .map(|p| Phase::from_template(p, PhaseKind::Template))
            .collect();

        // 2. Complexity
        self.apply_complexity(&mut phases, analysis.complexity);

        // 3. Domain
        if let Some(domain) = &analysis.domain {
            self.apply_domain(&mut phases, domain);
        }

        // 4. Request flags
        self.apply_dynamic_phases(&mut phases, analysis);

        // 5. Agent allocation
        optimize_agent_allocation(&mut phases);

        // 6. RAG integration points
        if self.config.enable_rag && !analysis.rag_documents.is_empty() {
            self.attach_integration_points(&mut phases, &analysis.rag_documents);
        }

        // 7. Timing
        compute_timing(&mut phases);

        // 8. Checkpoints
        self.insert_checkpoints(&mut phases);
        compute_timing(&mut phases);

        let metadata = summarize(
            &template.content_type,
            &phases,
            Some(analysis.complexity),
            analysis.domain.clone(),
        );
        info!(
            "Created plan {} for {}: {} phases, {} agents, ~{} min",
            workflow_id,
            analysis.content_type,
            metadata.phase_count,
            metadata.agent_count,
            metadata.estimated_duration_minutes
        );

        Ok(WorkflowPlan {
            workflow_id: workflow_id.to_string(),
            content_type: analysis.content_type.clone(),
            phases,
            feedback_category: None,
            metadata,
        })
    }

    /// Build a revision plan from free-text feedback.
    pub fn create_refinement_plan(&self, feedback: &str, workflow_id: &str) -> WorkflowPlan {
        let category = self.classify_feedback(feedback);
        let template = refinement_template();

        let mut phases: Vec<Phase> = template
            .phases
            .iter()
            .map(|p| Phase::from_template(p, PhaseKind::Refinement))
            .collect();

        if let Some(revision) = phases.get_mut(1) {
            for reviewer in category.reviewers() {
                revision.add_agent(reviewer);
            }
        }

        optimize_agent_allocation(&mut phases);
        compute_timing(&mut phases);

        let metadata = summarize(&template.content_type, &phases, None, None);
        info!(
            "Created refinement plan {} ({}): {} phases",
            workflow_id, category, metadata.phase_count
        );

        WorkflowPlan {
            workflow_id: workflow_id.to_string(),
            content_type: template.content_type,
            phases,
            feedback_category: Some(category),
            metadata,
        }
    }

    fn apply_complexity(&self, phases: &mut Vec<Phase>, level: u8) {
        let Some(rule) = self.rules.complexity_rule(level) else {
            debug!("No complexity rule for level {}", level);
            return;
        };

        for phase in phases.iter_mut() {
            phase.duration_minutes = scale(phase.duration_minutes, rule.duration_multiplier);
        }
        append_phases(phases, &rule.additional_phases, PhaseKind::Complexity);
        debug!(
            "Applied complexity {} (x{}), {} phases",
            level,
            rule.duration_multiplier,
            phases.len()
        );
    }

    fn apply_domain(&self, phases: &mut Vec<Phase>, domain: &str) {
        let Some(rule) = self.rules.domain_rule(domain) else {
            debug!("No domain rule for '{}'", domain);
            return;
        };

        let targets: Vec<usize> = {
            let critical: Vec<usize> = phases
                .iter()
                .enumerate()
                .filter(|(_, p)| p.critical)
                .map(|(i, _)| i)
                .collect();
            if critical.is_empty() {
                phases.len().checked_sub(1).into_iter().collect()
            } else {
                critical
            }
        };
        for index in targets {
            for agent in &rule.required_agents {
                phases[index].add_agent(agent);
            }
        }

        append_phases(phases, &rule.additional_phases, PhaseKind::Domain);
        debug!("Applied domain rule '{}', {} phases", domain, phases.len());
    }

    fn apply_dynamic_phases(&self, phases: &mut Vec<Phase>, analysis: &AnalysisResult) {
        let dynamic = &self.rules.dynamic;
        let mut extra: Vec<PhaseTemplate> = Vec::new();

        if analysis.requires_audience_adaptation {
            extra.push(dynamic.audience_adaptation.clone());
        }
        if analysis.cultural_sensitivity {
            extra.push(dynamic.cultural_sensitivity.clone());
        }
        if analysis.accessibility_required {
            extra.push(dynamic.accessibility.clone());
        }

        append_phases(phases, &extra, PhaseKind::Dynamic);
    }

    fn attach_integration_points(&self, phases: &mut [Phase], documents: &[RankedDocument]) {
        let mut ranked: Vec<&RankedDocument> = documents
            .iter()
            .filter(|d| d.score >= self.config.rag_min_score)
            .collect();
        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        ranked.truncate(self.config.max_integration_points);

        if ranked.is_empty() {
            debug!("No ranked documents above {}", self.config.rag_min_score);
            return;
        }

        let points: Vec<IntegrationPoint> = ranked
            .into_iter()
            .map(|d| IntegrationPoint {
                document_id: d.id.clone(),
                title: d.title.clone(),
                relevance: d.score,
                source: d.source.clone(),
            })
            .collect();

        for phase in phases.iter_mut() {
            let consumes = phase
                .agents
                .iter()
                .any(|a| self.config.knowledge_agents.contains(a));
            if consumes {
                phase.integration_points = points.clone();
            }
        }
    }

    fn insert_checkpoints(&self, phases: &mut Vec<Phase>) {
        let total = phases.len();
        if total < 3 {
            return;
        }

        // Never split a phase from the parallel phases that follow it
        let mut positions: Vec<usize> = [total / 3, 2 * total / 3]
            .into_iter()
            .map(|mut position| {
                while position < total && phases[position].parallel {
                    position += 1;
                }
                position
            })
            .filter(|&position| position < total)
            .collect();
        positions.dedup();

        let mut result = Vec::with_capacity(total + positions.len());
        let mut inserted = 0;
        for (index, phase) in phases.drain(..).enumerate() {
            result.push(phase);
            if positions.contains(&(index + 1)) {
                inserted += 1;
                result.push(self.checkpoint(inserted));
            }
        }
        *phases = result;
    }

    fn checkpoint(&self, number: usize) -> Phase {
        let agents: Vec<&str> = self.config.checkpoint_agents.iter().map(|a| a.as_str()).collect();
        let template = PhaseTemplate::new(
            format!("{}-{}", CHECKPOINT_PREFIX, number),
            "quality-review",
            &agents,
            self.config.checkpoint_minutes,
        )
        .critical(true);
        let mut phase = Phase::from_template(&template, PhaseKind::Checkpoint);
        optimize_phase(&mut phase);
        phase
    }
}

/// Append phases whose names are not already present.
fn append_phases(phases: &mut Vec<Phase>, extra: &[PhaseTemplate], kind: PhaseKind) {
    for template in extra {
        if phases.iter().any(|p| p.name == template.name) {
            debug!("Phase '{}' already present, skipping", template.name);
            continue;
        }
        phases.push(Phase::from_template(template, kind));
    }
}

fn scale(minutes: u32, multiplier: f64) -> u32 {
    if !multiplier.is_finite() {
        return minutes;
    }
    // `as` saturates at the u32 bounds
    (minutes as f64 * multiplier).round().max(0.0) as u32
}

/// De-duplicate agent lists and demote single-agent parallel phases.
pub fn optimize_agent_allocation(phases: &mut [Phase]) {
    for phase in phases.iter_mut() {
        optimize_phase(phase);
    }
}

fn optimize_phase(phase: &mut Phase) {
    let mut seen: Vec<String> = Vec::with_capacity(phase.agents.len());
    for agent in phase.agents.drain(..) {
        if !seen.contains(&agent) {
            seen.push(agent);
        }
    }
    phase.agents = seen;

    if phase.parallel && phase.agents.len() < 2 {
        debug!("Phase '{}' has one agent, running it sequentially", phase.name);
        phase.parallel = false;
    }
}

/// Assign start/end offsets.
///
/// A sequential phase starts once every earlier phase has ended; a parallel
/// phase starts together with the phase before it. Offsets saturate at
/// `u32::MAX`.
pub fn compute_timing(phases: &mut [Phase]) {
    let mut horizon = 0u32;
    let mut previous_start = 0u32;

    for (index, phase) in phases.iter_mut().enumerate() {
        let start = if phase.parallel && index > 0 {
            previous_start
        } else {
            horizon
        };
        phase.start_minute = start;
        phase.end_minute = start.saturating_add(phase.duration_minutes);

        previous_start = start;
        horizon = horizon.max(phase.end_minute);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phase(name: &str, agents: &[&str], parallel: bool, minutes: u32) -> Phase {
        let template = PhaseTemplate::new(name, "research", agents, minutes).parallel(parallel);
        Phase::from_template(&template, PhaseKind::Template)
    }

    #[test]
    fn test_timing_sequential_and_parallel() {
        let mut phases = vec![
            phase("a", &["x"], false, 60),
            phase("b", &["x", "y"], true, 30),
            phase("c", &["z"], false, 10),
        ];
        compute_timing(&mut phases);

        assert_eq!((phases[0].start_minute, phases[0].end_minute), (0, 60));
        assert_eq!((phases[1].start_minute, phases[1].end_minute), (0, 30));
        // Waits for the longer of the two overlapping phases
        assert_eq!((phases[2].start_minute, phases[2].end_minute), (60, 70));
    }

    #[test]
    fn test_first_phase_never_overlaps() {
        let mut phases = vec![phase("a", &["x", "y"], true, 20)];
        compute_timing(&mut phases);
        assert_eq!(phases[0].start_minute, 0);
    }

    #[test]
    fn test_optimize_dedups_and_demotes() {
        let mut phases = vec![
            phase("a", &["x", "x", "y", "x"], true, 10),
            phase("b", &["x", "x"], true, 10),
        ];
        optimize_agent_allocation(&mut phases);

        assert_eq!(phases[0].agents, vec!["x", "y"]);
        assert!(phases[0].parallel);
        assert_eq!(phases[1].agents, vec!["x"]);
        assert!(!phases[1].parallel);
    }

    #[test]
    fn test_checkpoints_at_thirds() {
        let planner = WorkflowPlanner::default();
        let mut phases: Vec<Phase> = (0..6)
            .map(|i| phase(&format!("p{}", i), &["x"], false, 10))
            .collect();
        planner.insert_checkpoints(&mut phases);

        let names: Vec<&str> = phases.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "p0",
                "p1",
                "quality-checkpoint-1",
                "p2",
                "p3",
                "quality-checkpoint-2",
                "p4",
                "p5"
            ]
        );
    }

    #[test]
    fn test_checkpoint_skips_past_parallel_run() {
        let planner = WorkflowPlanner::default();
        let mut phases = vec![
            phase("p0", &["x"], false, 10),
            phase("p1", &["x"], false, 10),
            phase("p2", &["x", "y"], true, 10),
            phase("p3", &["x", "y"], true, 10),
            phase("p4", &["x"], false, 10),
            phase("p5", &["x"], false, 10),
        ];
        planner.insert_checkpoints(&mut phases);

        let names: Vec<&str> = phases.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["p0", "p1", "p2", "p3", "quality-checkpoint-1", "p4", "p5"]
        );
    }

    #[test]
    fn test_checkpoint_dropped_when_parallel_run_reaches_end() {
        let planner = WorkflowPlanner::default();
        let mut phases = vec![
            phase("p0", &["x"], false, 10),
            phase("p1", &["x", "y"], true, 10),
            phase("p2", &["x", "y"], true, 10),
        ];
        planner.insert_checkpoints(&mut phases);
        assert!(phases.iter().all(|p| p.kind != PhaseKind::Checkpoint));
    }

    #[test]
    fn test_timing_saturates() {
        let mut phases = vec![
            phase("a", &["x"], false, u32::MAX),
            phase("b", &["x"], false, u32::MAX),
        ];
        compute_timing(&mut phases);
        assert_eq!(phases[0].end_minute, u32::MAX);
        assert_eq!(phases[1].start_minute, u32::MAX);
        assert_eq!(phases[1].end_minute, u32::MAX);
    }

    #[test]
    fn test_no_checkpoints_for_short_plans() {
        let planner = WorkflowPlanner::default();
        let mut phases = vec![phase("a", &["x"], false, 10), phase("b", &["y"], false, 10)];
        planner.insert_checkpoints(&mut phases);
        assert_eq!(phases.len(), 2);
    }

    #[test]
    fn test_scale_rounds() {
        assert_eq!(scale(45, 1.3), 59);
        assert_eq!(scale(60, 0.6), 36);
        assert_eq!(scale(60, 1.0e10), u32::MAX);
        assert_eq!(scale(60, f64::NAN), 60);
    }
}
