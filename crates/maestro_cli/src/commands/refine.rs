//! Refine command - Build a refinement plan from feedback.

use anyhow::Result;
use clap::Args;
use maestro_workflow::WorkflowPlanner;

use super::{generate_workflow_id, GlobalOptions};

#[derive(Args, Debug)]
pub struct RefineArgs {
    /// Free-text feedback on existing content
    #[arg(required = true)]
    pub feedback: Vec<String>,

    /// Workflow identifier (generated when omitted)
    #[arg(short, long)]
    pub workflow_id: Option<String>,
}

pub async fn execute(args: RefineArgs, options: &GlobalOptions) -> Result<()> {
    let config = options.load_config()?;
    let feedback = args.feedback.join(" ");
    let workflow_id = args.workflow_id.unwrap_or_else(generate_workflow_id);

    let planner = WorkflowPlanner::new(config.planner);
    let plan = planner.create_refinement_plan(&feedback, &workflow_id);

    options.print(&plan)
}
