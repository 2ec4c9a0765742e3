//! # maestro_workflow
//!
//! Declarative workflow planning for content-creation requests.
//!
//! [`WorkflowPlanner`] turns an [`AnalysisResult`] into a [`WorkflowPlan`]:
//! an ordered list of phases with staffed agents, criticality, parallelism
//! and timing offsets. Plans are built from a content-type template and
//! then adjusted by complexity, domain and request-flag rules. Nothing here
//! executes a plan.
//!
//! # Example
//!
//! ```rust
//! use maestro_workflow::{AnalysisResult, PlannerConfig, WorkflowPlanner};
//!
//! let planner = WorkflowPlanner::new(PlannerConfig::default());
//! let request = AnalysisResult::new("assessment-tool")
//!     .complexity(3)
//!     .domain("clinical-psychology");
//!
//! let plan = planner.create_workflow_plan(&request, "wf-1").unwrap();
//! assert!(plan.phase("ethics-review").is_some());
//! ```

pub mod config;
pub mod error;
pub mod plan;
pub mod planner;
pub mod refinement;
pub mod request;
pub mod rules;
pub mod templates;

pub use config::PlannerConfig;
pub use error::{WorkflowError, WorkflowResult};
pub use plan::{IntegrationPoint, Phase, PhaseKind, PlanMetadata, WorkflowPlan};
pub use planner::{compute_timing, optimize_agent_allocation, WorkflowPlanner, CHECKPOINT_PREFIX};
pub use refinement::{classify_feedback, FeedbackCategory, FeedbackClassifier};
pub use request::{AnalysisResult, RankedDocument, MAX_COMPLEXITY, MIN_COMPLEXITY};
pub use rules::{ComplexityRule, DomainRule, DynamicPhaseRules, RuleBook, MAX_DURATION_MULTIPLIER};
pub use templates::{ContentTemplate, PhaseTemplate, TemplateCatalog, FALLBACK_CONTENT_TYPE};
