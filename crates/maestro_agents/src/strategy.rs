//! Agent selection strategies.
//!
//! Every strategy works on a candidate list that has already been filtered
//! for exclusions, capacity and capabilities. Candidates are expected in
//! name order; ties always resolve to the earliest candidate so the same
//! state always yields the same choice.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::AgentDescriptor;
use crate::state::AgentRuntimeState;
use crate::task::Task;

/// Weight of historical performance in the weighted score.
pub const PERFORMANCE_WEIGHT: f64 = 0.5;
/// Weight of specialization match in the weighted score.
pub const SPECIALIZATION_WEIGHT: f64 = 0.3;
/// Weight of spare capacity in the weighted score.
pub const LOAD_WEIGHT: f64 = 0.2;

/// How the delegator picks among capable agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Least recently assigned agent first
    RoundRobin,
    /// Lowest share of concurrency cap in use
    LeastLoaded,
    /// Highest success rate, then fastest average response
    Performance,
    /// Best match between task tags and agent specializations
    Specialization,
    /// performance * 0.5 + specialization * 0.3 + (1 - load) * 0.2
    #[default]
    Weighted,
}

impl SelectionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionStrategy::RoundRobin => "round_robin",
            SelectionStrategy::LeastLoaded => "least_loaded",
            SelectionStrategy::Performance => "performance",
            SelectionStrategy::Specialization => "specialization",
            SelectionStrategy::Weighted => "weighted",
        }
    }

    pub fn all() -> Vec<Self> {
        vec![
            SelectionStrategy::RoundRobin,
            SelectionStrategy::LeastLoaded,
            SelectionStrategy::Performance,
            SelectionStrategy::Specialization,
            SelectionStrategy::Weighted,
        ]
    }
}

impl std::fmt::Display for SelectionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SelectionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "round_robin" => Ok(Self::RoundRobin),
            "least_loaded" => Ok(Self::LeastLoaded),
            "performance" => Ok(Self::Performance),
            "specialization" => Ok(Self::Specialization),
            "weighted" => Ok(Self::Weighted),
            other => Err(format!("Unknown selection strategy: {}", other)),
        }
    }
}

/// A capable agent together with its current runtime state.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub descriptor: &'a AgentDescriptor,
    pub state: &'a AgentRuntimeState,
}

impl<'a> Candidate<'a> {
    pub fn new(descriptor: &'a AgentDescriptor, state: &'a AgentRuntimeState) -> Self {
        Self { descriptor, state }
    }

    pub fn name(&self) -> &'a str {
        &self.descriptor.name
    }

    pub fn load_ratio(&self) -> f64 {
        self.state.load_ratio(self.descriptor.max_concurrent_tasks)
    }
}

/// Historical performance score (0.0 - 1.0).
pub fn performance_score(state: &AgentRuntimeState) -> f64 {
    state.success_rate
}

/// Share of the task's tags found among the agent's specializations.
pub fn specialization_score(agent: &AgentDescriptor, task: &Task) -> f64 {
    let tags = task.match_tags();
    if tags.is_empty() {
        return 0.0;
    }
    let matched = tags.iter().filter(|t| agent.is_specialized_in(t)).count();
    matched as f64 / tags.len() as f64
}

/// Composite score used by [`SelectionStrategy::Weighted`].
pub fn weighted_score(candidate: &Candidate<'_>, task: &Task) -> f64 {
    PERFORMANCE_WEIGHT * performance_score(candidate.state)
        + SPECIALIZATION_WEIGHT * specialization_score(candidate.descriptor, task)
        + LOAD_WEIGHT * (1.0 - candidate.load_ratio())
}

/// Pick one candidate according to the strategy.
pub fn select<'a>(
    strategy: SelectionStrategy,
    candidates: &[Candidate<'a>],
    task: &Task,
) -> Option<Candidate<'a>> {
    let chosen = match strategy {
        SelectionStrategy::RoundRobin => candidates
            .iter()
            .min_by_key(|c| c.state.last_assigned)
            .copied(),
        SelectionStrategy::LeastLoaded => first_best(candidates, |a, b| {
            b.load_ratio()
                .partial_cmp(&a.load_ratio())
                .unwrap_or(Ordering::Equal)
        }),
        SelectionStrategy::Performance => first_best(candidates, |a, b| {
            performance_score(a.state)
                .partial_cmp(&performance_score(b.state))
                .unwrap_or(Ordering::Equal)
                .then_with(|| {
                    b.state
                        .avg_response_ms
                        .partial_cmp(&a.state.avg_response_ms)
                        .unwrap_or(Ordering::Equal)
                })
        }),
        SelectionStrategy::Specialization => first_best(candidates, |a, b| {
            specialization_score(a.descriptor, task)
                .partial_cmp(&specialization_score(b.descriptor, task))
                .unwrap_or(Ordering::Equal)
        }),
        SelectionStrategy::Weighted => first_best(candidates, |a, b| {
            weighted_score(a, task)
                .partial_cmp(&weighted_score(b, task))
                .unwrap_or(Ordering::Equal)
        }),
    };

    if let Some(c) = &chosen {
        debug!(
            "Strategy {} chose {} among {} candidates",
            strategy,
            c.name(),
            candidates.len()
        );
    }
    chosen
}

/// Greatest candidate under `cmp`, keeping the earliest on ties.
fn first_best<'a, F>(candidates: &[Candidate<'a>], cmp: F) -> Option<Candidate<'a>>
where
    F: Fn(&Candidate<'a>, &Candidate<'a>) -> Ordering,
{
    let mut best: Option<Candidate<'a>> = None;
    for candidate in candidates {
        best = match best {
            Some(current) if cmp(candidate, &current) != Ordering::Greater => Some(current),
            _ => Some(*candidate),
        };
    }
    best
}
