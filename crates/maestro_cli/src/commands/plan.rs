//! Plan command - Build a workflow plan without dispatching it.

use anyhow::{Context, Result};
use clap::Args;
use maestro_workflow::WorkflowPlanner;
use tracing::info;

use super::{GlobalOptions, RequestArgs};

#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub request: RequestArgs,
}

pub async fn execute(args: PlanArgs, options: &GlobalOptions) -> Result<()> {
    let config = options.load_config()?;
    let analysis = args.request.analysis()?;
    let workflow_id = args.request.workflow_id();

    let planner = WorkflowPlanner::new(config.planner.clone())
        .with_templates(config.load_templates()?)
        .with_rules(config.load_rules()?);

    let plan = planner
        .create_workflow_plan(&analysis, &workflow_id)
        .context("Failed to create workflow plan")?;
    info!(
        "Planned {} phases (~{} min)",
        plan.metadata.phase_count, plan.metadata.estimated_duration_minutes
    );

    options.print(&plan)
}
