//! # maestro_core
//!
//! Ties the workflow planner to the agent delegator.
//!
//! [`ContentOrchestrator`] plans a content request, then dispatches one task
//! per phase through the delegator. Runs of parallel phases are awaited
//! together; a failed critical phase stops dispatch and the remaining
//! phases are reported as skipped.
//!
//! # Example
//!
//! ```rust,no_run
//! use maestro_core::{ContentOrchestrator, MaestroConfig};
//! use maestro_workflow::AnalysisResult;
//!
//! # async fn run() -> maestro_core::CoreResult<()> {
//! let orchestrator = ContentOrchestrator::from_config(&MaestroConfig::default())?;
//! let request = AnalysisResult::new("research-summary").complexity(2);
//! let report = orchestrator.orchestrate(&request, "wf-42").await?;
//! println!("{:?}: {} phases", report.state, report.phases.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod orchestrator;

pub use config::MaestroConfig;
pub use error::{CoreError, CoreResult};
pub use orchestrator::{
    ContentOrchestrator, OrchestrationReport, OrchestrationState, PhaseOutcome, PhaseStatus,
};
