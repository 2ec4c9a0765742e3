//! Agents command - Show the roster and capability routing.

use anyhow::Result;
use clap::Args;
use maestro_agents::{AgentDelegator, Task};
use serde::Serialize;

use super::GlobalOptions;

#[derive(Args, Debug)]
pub struct AgentsArgs {
    /// Only show agents able to take this task type
    #[arg(short = 't', long)]
    pub task_type: Option<String>,
}

#[derive(Serialize)]
struct Routing<'a> {
    task_type: &'a str,
    required_capabilities: Vec<String>,
    candidates: Vec<String>,
}

pub async fn execute(args: AgentsArgs, options: &GlobalOptions) -> Result<()> {
    let config = options.load_config()?;
    let delegator = AgentDelegator::new(config.delegator.clone())
        .with_capability_map(config.load_capabilities()?);

    match &args.task_type {
        Some(task_type) => {
            let task = Task::new(task_type.as_str(), task_type.as_str());
            let routing = Routing {
                task_type,
                required_capabilities: delegator.capability_map().required_for(task_type).to_vec(),
                candidates: delegator.find_candidates(&task),
            };
            options.print(&routing)
        }
        None => options.print(&delegator.get_status()),
    }
}
