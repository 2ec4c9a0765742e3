//! # maestro_agents
//!
//! Mock specialist agents and the task delegator for Maestro.
//!
//! The delegator keeps an in-memory registry of agents, filters them for a
//! task (exclusions, capacity, capabilities), picks one with a configurable
//! [`SelectionStrategy`], runs the task through an [`AgentExecutor`] and
//! folds the outcome into per-agent metrics. Failed attempts are retried
//! with the failing agent excluded.
//!
//! No real agent is ever called: [`SimulatedExecutor`] fabricates results.
//!
//! ## Selection strategies
//!
//! | Strategy | Picks |
//! |----------|-------|
//! | `round_robin` | Least recently assigned agent |
//! | `least_loaded` | Lowest share of its concurrency cap in use |
//! | `performance` | Best success rate, then fastest |
//! | `specialization` | Best match on task type and domain |
//! | `weighted` | 50% performance, 30% specialization, 20% spare capacity |
//!
//! # Example
//!
//! ```rust,no_run
//! use maestro_agents::{AgentDelegator, DelegatorConfig, ExecutionContext, Task};
//!
//! # async fn run() {
//! let delegator = AgentDelegator::new(DelegatorConfig::default());
//! let task = Task::new("research", "Collect evidence").with_domain("education");
//! let outcome = delegator.delegate_task(task, &ExecutionContext::new()).await;
//! println!("{:?}", outcome.agent_used);
//! # }
//! ```

pub mod catalog;
pub mod config;
pub mod delegator;
pub mod error;
pub mod executor;
pub mod mock;
pub mod state;
pub mod strategy;
pub mod task;

pub use catalog::{AgentCatalog, AgentDescriptor, CapabilityMap};
pub use config::DelegatorConfig;
pub use delegator::{
    ActiveTask, AgentDelegator, AgentStatusReport, DelegationMetadata, DelegationOutcome,
    DelegatorStatus,
};
pub use error::{AgentError, AgentResult};
pub use executor::{AgentExecutor, SimulatedExecutor};
pub use mock::{CapturedExecution, ScriptedExecutor};
pub use state::{AgentRuntimeState, AgentStatus};
pub use strategy::{Candidate, SelectionStrategy};
pub use task::{ExecutionContext, Task};
