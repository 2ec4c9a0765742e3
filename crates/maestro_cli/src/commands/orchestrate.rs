//! Orchestrate command - Plan a request and dispatch every phase.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use maestro_core::ContentOrchestrator;

use super::{DispatchFailed, GlobalOptions, RequestArgs};

#[derive(Args, Debug)]
pub struct OrchestrateArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Also write the report as JSON to this path
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub async fn execute(args: OrchestrateArgs, options: &GlobalOptions) -> Result<()> {
    let config = options.load_config()?;
    let analysis = args.request.analysis()?;
    let workflow_id = args.request.workflow_id();

    let orchestrator = ContentOrchestrator::from_config(&config)?;
    let report = orchestrator
        .orchestrate(&analysis, &workflow_id)
        .await
        .context("Failed to orchestrate workflow")?;

    if let Some(path) = &args.output {
        report
            .save(path)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
    }
    options.print(&report)?;

    if let Some(phase) = report.failed_phase() {
        return Err(DispatchFailed(format!(
            "critical phase '{}' in {}",
            phase.phase, report.workflow_id
        ))
        .into());
    }
    Ok(())
}
