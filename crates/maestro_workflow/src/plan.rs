//! Plan types produced by the planner.
//!
//! A plan is purely descriptive: phases carry timing windows but no
//! runtime state, and nothing in this crate executes them.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::refinement::FeedbackCategory;
use crate::templates::PhaseTemplate;

/// Where a phase came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    /// Base content-type template
    Template,
    /// Added by the complexity table
    Complexity,
    /// Added by a domain rule
    Domain,
    /// Added by a request flag (audience, culture, accessibility)
    Dynamic,
    /// Synthetic quality checkpoint
    Checkpoint,
    /// Refinement template
    Refinement,
}

/// A reference from a phase to an externally ranked document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationPoint {
    pub document_id: String,
    pub title: String,
    pub relevance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// One phase of a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    pub name: String,
    pub kind: PhaseKind,
    /// Task type used when the phase is dispatched
    pub task_type: String,
    pub agents: Vec<String>,
    /// Overlaps with the previous phase instead of following it
    pub parallel: bool,
    pub critical: bool,
    pub duration_minutes: u32,
    /// Offset from plan start (minutes)
    pub start_minute: u32,
    /// Offset from plan start (minutes)
    pub end_minute: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub integration_points: Vec<IntegrationPoint>,
}

impl Phase {
    pub fn from_template(template: &PhaseTemplate, kind: PhaseKind) -> Self {
        Self {
            name: template.name.clone(),
            kind,
            task_type: template.task_type.clone(),
            agents: template.agents.clone(),
            parallel: template.parallel,
            critical: template.critical,
            duration_minutes: template.duration_minutes,
            start_minute: 0,
            end_minute: 0,
            integration_points: Vec::new(),
        }
    }

    /// Append an agent unless it is already staffed.
    pub fn add_agent(&mut self, agent: &str) {
        if !self.has_agent(agent) {
            self.agents.push(agent.to_string());
        }
    }

    pub fn has_agent(&self, agent: &str) -> bool {
        self.agents.iter().any(|a| a == agent)
    }
}

/// Summary numbers for a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanMetadata {
    /// Template actually used (after fallback)
    pub template: String,
    /// Distinct agents across all phases
    pub agent_count: usize,
    pub phase_count: usize,
    pub critical_phase_count: usize,
    pub estimated_duration_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Number of phases each agent is staffed on
    pub agent_load: BTreeMap<String, usize>,
}

/// A frozen multi-phase plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowPlan {
    pub workflow_id: String,
    pub content_type: String,
    pub phases: Vec<Phase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_category: Option<FeedbackCategory>,
    pub metadata: PlanMetadata,
}

impl WorkflowPlan {
    pub fn phase(&self, name: &str) -> Option<&Phase> {
        self.phases.iter().find(|p| p.name == name)
    }

    pub fn phase_names(&self) -> Vec<&str> {
        self.phases.iter().map(|p| p.name.as_str()).collect()
    }

    /// Distinct agents in name order.
    pub fn agents(&self) -> BTreeSet<&str> {
        self.phases
            .iter()
            .flat_map(|p| p.agents.iter().map(|a| a.as_str()))
            .collect()
    }

    pub fn critical_phases(&self) -> impl Iterator<Item = &Phase> {
        self.phases.iter().filter(|p| p.critical)
    }
}

/// Build the metadata block for a finished phase list.
pub(crate) fn summarize(
    template: &str,
    phases: &[Phase],
    complexity: Option<u8>,
    domain: Option<String>,
) -> PlanMetadata {
    let mut agent_load: BTreeMap<String, usize> = BTreeMap::new();
    for phase in phases {
        for agent in &phase.agents {
            *agent_load.entry(agent.clone()).or_insert(0) += 1;
        }
    }

    PlanMetadata {
        template: template.to_string(),
        agent_count: agent_load.len(),
        phase_count: phases.len(),
        critical_phase_count: phases.iter().filter(|p| p.critical).count(),
        estimated_duration_minutes: phases.iter().map(|p| p.end_minute).max().unwrap_or(0),
        complexity,
        domain,
        agent_load,
    }
}
