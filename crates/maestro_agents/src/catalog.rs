//! Agent descriptors, the standard roster and the task-type capability map.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AgentError, AgentResult};

/// Static description of a specialist agent.
///
/// Descriptors are immutable once registered with a delegator; all
/// mutable bookkeeping lives in [`crate::state::AgentRuntimeState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDescriptor {
    /// Unique agent name (e.g. `research`, `quality-guardian`)
    pub name: String,
    /// Capability tags matched against the task-type capability map
    pub capabilities: Vec<String>,
    /// Specialization tags matched against task type and domain
    #[serde(default)]
    pub specializations: Vec<String>,
    /// Maximum number of tasks the agent may run at once
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_tasks: u32,
    /// Estimated average response time in milliseconds
    #[serde(default = "default_response_ms")]
    pub avg_response_ms: u64,
}

fn default_max_concurrent() -> u32 {
    1
}

fn default_response_ms() -> u64 {
    3000
}

impl AgentDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capabilities: Vec::new(),
            specializations: Vec::new(),
            max_concurrent_tasks: default_max_concurrent(),
            avg_response_ms: default_response_ms(),
        }
    }

    pub fn capabilities(mut self, caps: &[&str]) -> Self {
        self.capabilities = caps.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn specializations(mut self, specs: &[&str]) -> Self {
        self.specializations = specs.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn max_concurrent(mut self, max: u32) -> Self {
        self.max_concurrent_tasks = max;
        self
    }

    pub fn response_ms(mut self, ms: u64) -> Self {
        self.avg_response_ms = ms;
        self
    }

    /// Check whether the agent carries a capability tag.
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }

    /// Check whether the agent carries a specialization tag.
    pub fn is_specialized_in(&self, tag: &str) -> bool {
        self.specializations.iter().any(|s| s == tag)
    }
}

/// The standard roster of mock specialist agents.
pub struct AgentCatalog;

impl AgentCatalog {
    /// Build the default roster used when no custom agents are supplied.
    pub fn standard() -> Vec<AgentDescriptor> {
        vec![
            AgentDescriptor::new("research")
                .capabilities(&["research", "evidence-gathering", "analysis"])
                .specializations(&[
                    "research",
                    "literature-review",
                    "clinical-psychology",
                    "education",
                    "healthcare",
                ])
                .max_concurrent(3)
                .response_ms(4000),
            AgentDescriptor::new("architect")
                .capabilities(&["design", "structure", "planning"])
                .specializations(&[
                    "content-architecture",
                    "curriculum-design",
                    "assessment-design",
                ])
                .max_concurrent(2)
                .response_ms(3000),
            AgentDescriptor::new("nlp-generator")
                .capabilities(&["content-generation", "writing", "language"])
                .specializations(&["content-generation", "narrative", "education"])
                .max_concurrent(4)
                .response_ms(5000),
            AgentDescriptor::new("quality-guardian")
                .capabilities(&["quality-review", "validation", "analysis"])
                .specializations(&["quality-review", "consistency", "compliance"])
                .max_concurrent(3)
                .response_ms(2500),
            AgentDescriptor::new("scientific-validator")
                .capabilities(&["validation", "research", "fact-checking"])
                .specializations(&[
                    "scientific-validation",
                    "fact-checking",
                    "clinical-psychology",
                    "healthcare",
                    "psychometrics",
                ])
                .max_concurrent(2)
                .response_ms(3500),
            AgentDescriptor::new("gamification-architect")
                .capabilities(&["design", "engagement", "game-mechanics"])
                .specializations(&["gamification", "interactive-game", "motivation"])
                .max_concurrent(2)
                .response_ms(3000),
            AgentDescriptor::new("compliance-agent")
                .capabilities(&["compliance", "validation", "review"])
                .specializations(&[
                    "compliance-review",
                    "ethics",
                    "privacy",
                    "clinical-psychology",
                    "healthcare",
                ])
                .max_concurrent(2)
                .response_ms(2000),
            AgentDescriptor::new("ux-designer")
                .capabilities(&["design", "user-experience", "interaction"])
                .specializations(&["ux-review", "interactive-game", "accessibility"])
                .max_concurrent(2)
                .response_ms(3000),
            AgentDescriptor::new("accessibility-auditor")
                .capabilities(&["accessibility", "review", "validation"])
                .specializations(&["accessibility-review", "wcag"])
                .max_concurrent(2)
                .response_ms(2000),
            AgentDescriptor::new("audience-adapter")
                .capabilities(&["adaptation", "content-generation", "language"])
                .specializations(&["audience-adaptation", "localization", "education"])
                .max_concurrent(2)
                .response_ms(2500),
            AgentDescriptor::new("cultural-adapter")
                .capabilities(&["adaptation", "cultural-sensitivity", "review"])
                .specializations(&["cultural-review", "localization"])
                .max_concurrent(2)
                .response_ms(2500),
            AgentDescriptor::new("content-editor")
                .capabilities(&["editing", "writing", "quality-review"])
                .specializations(&["editing", "content-quality", "narrative"])
                .max_concurrent(3)
                .response_ms(2000),
            AgentDescriptor::new("psychometrician")
                .capabilities(&["assessment", "analysis", "validation"])
                .specializations(&[
                    "assessment-design",
                    "assessment-tool",
                    "psychometrics",
                    "clinical-psychology",
                ])
                .max_concurrent(1)
                .response_ms(4000),
        ]
    }
}

/// Maps task types to the capabilities an agent must offer to take them.
///
/// An agent qualifies for a task when it has at least one of the required
/// capabilities. Task types missing from the map accept any agent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilityMap {
    requirements: HashMap<String, Vec<String>>,
}

impl CapabilityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in task-type table.
    pub fn standard() -> Self {
        let table: &[(&str, &[&str])] = &[
            ("research", &["research", "evidence-gathering"]),
            ("content-architecture", &["design", "structure"]),
            ("content-generation", &["content-generation", "writing"]),
            ("quality-review", &["quality-review"]),
            ("validation", &["validation"]),
            ("scientific-validation", &["fact-checking"]),
            ("compliance-review", &["compliance"]),
            ("gamification", &["game-mechanics", "engagement"]),
            ("ux-review", &["user-experience"]),
            ("accessibility-review", &["accessibility"]),
            ("audience-adaptation", &["adaptation"]),
            ("cultural-review", &["cultural-sensitivity"]),
            ("editing", &["editing"]),
            ("assessment-design", &["assessment"]),
        ];

        let mut map = Self::new();
        for (task_type, caps) in table {
            map.insert(*task_type, caps.iter().map(|c| c.to_string()).collect());
        }
        map
    }

    /// Set the required capabilities for a task type.
    pub fn insert(&mut self, task_type: impl Into<String>, capabilities: Vec<String>) {
        self.requirements.insert(task_type.into(), capabilities);
    }

    /// Capabilities required for a task type (empty when unmapped).
    pub fn required_for(&self, task_type: &str) -> &[String] {
        self.requirements
            .get(task_type)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Check whether an agent may take a task of the given type.
    pub fn is_capable(&self, agent: &AgentDescriptor, task_type: &str) -> bool {
        let required = self.required_for(task_type);
        required.is_empty() || required.iter().any(|cap| agent.has_capability(cap))
    }

    /// All mapped task types, sorted.
    pub fn task_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.requirements.keys().map(|s| s.as_str()).collect();
        types.sort_unstable();
        types
    }

    /// Load a capability map from a YAML file.
    pub fn from_file(path: &Path) -> AgentResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a capability map from a YAML string.
    pub fn from_yaml(yaml: &str) -> AgentResult<Self> {
        serde_yaml::from_str(yaml).map_err(AgentError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_roster_names_unique() {
        let roster = AgentCatalog::standard();
        let mut names: Vec<_> = roster.iter().map(|a| a.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), roster.len());
    }

    #[test]
    fn test_every_mapped_task_type_has_an_agent() {
        let roster = AgentCatalog::standard();
        let map = CapabilityMap::standard();

        for task_type in map.task_types() {
            assert!(
                roster.iter().any(|a| map.is_capable(a, task_type)),
                "No agent can take {}",
                task_type
            );
        }
    }

    #[test]
    fn test_capability_predicate() {
        let map = CapabilityMap::standard();
        let research = AgentDescriptor::new("research").capabilities(&["research"]);
        let editor = AgentDescriptor::new("editor").capabilities(&["editing"]);

        assert!(map.is_capable(&research, "research"));
        assert!(!map.is_capable(&editor, "research"));
        // Unmapped task types accept anyone
        assert!(map.is_capable(&editor, "something-new"));
    }

    #[test]
    fn test_capability_map_from_yaml() {
        let yaml = "translation:\n  - language\n  - localization\n";
        let map = CapabilityMap::from_yaml(yaml).unwrap();

        assert_eq!(map.required_for("translation"), &["language", "localization"]);
        assert!(map.required_for("research").is_empty());
    }
}
