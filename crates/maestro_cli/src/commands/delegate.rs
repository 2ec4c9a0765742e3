//! Delegate command - Run a single task through the delegator.

use anyhow::Result;
use clap::Args;
use maestro_agents::{AgentDelegator, ExecutionContext, SelectionStrategy, Task};
use tracing::info;

use super::{DispatchFailed, GlobalOptions};

#[derive(Args, Debug)]
pub struct DelegateArgs {
    /// Task type, e.g. research or quality-review
    #[arg(short = 't', long)]
    pub task_type: String,

    /// Human-readable task name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Subject domain used for specialization matching
    #[arg(short, long)]
    pub domain: Option<String>,

    /// Complexity level (1-5)
    #[arg(long)]
    pub complexity: Option<u8>,

    /// Selection strategy (overrides the configuration)
    #[arg(short, long)]
    pub strategy: Option<SelectionStrategy>,

    /// Agents that must not receive the task, repeatable
    #[arg(long = "exclude")]
    pub exclude: Vec<String>,
}

pub async fn execute(args: DelegateArgs, options: &GlobalOptions) -> Result<()> {
    let mut config = options.load_config()?;
    if let Some(strategy) = args.strategy {
        config.delegator.strategy = strategy;
    }

    let delegator = AgentDelegator::new(config.delegator.clone())
        .with_capability_map(config.load_capabilities()?);

    let name = args.name.unwrap_or_else(|| args.task_type.clone());
    let mut task = Task::new(args.task_type, name);
    if let Some(domain) = args.domain {
        task = task.with_domain(domain);
    }
    if let Some(complexity) = args.complexity {
        task = task.with_complexity(complexity);
    }
    for agent in args.exclude {
        task.exclude(agent);
    }

    info!("Delegating {} ({}) with {}", task.id, task.task_type, delegator.config().strategy);
    let outcome = delegator.delegate_task(task, &ExecutionContext::new()).await;
    options.print(&outcome)?;

    if !outcome.success {
        return Err(DispatchFailed(outcome.task_id).into());
    }
    Ok(())
}
