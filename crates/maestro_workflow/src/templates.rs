//! Content-type templates.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{WorkflowError, WorkflowResult};

/// Content type used when a request names an unknown type.
pub const FALLBACK_CONTENT_TYPE: &str = "general";

/// Declarative phase definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseTemplate {
    pub name: String,
    pub task_type: String,
    pub agents: Vec<String>,
    #[serde(default)]
    pub parallel: bool,
    #[serde(default)]
    pub critical: bool,
    pub duration_minutes: u32,
}

impl PhaseTemplate {
    pub fn new(
        name: impl Into<String>,
        task_type: impl Into<String>,
        agents: &[&str],
        duration_minutes: u32,
    ) -> Self {
        Self {
            name: name.into(),
            task_type: task_type.into(),
            agents: agents.iter().map(|a| a.to_string()).collect(),
            parallel: false,
            critical: false,
            duration_minutes,
        }
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn critical(mut self, critical: bool) -> Self {
        self.critical = critical;
        self
    }
}

/// Base phase list for a content type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentTemplate {
    pub content_type: String,
    #[serde(default)]
    pub description: String,
    pub phases: Vec<PhaseTemplate>,
}

impl ContentTemplate {
    pub fn new(content_type: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            description: description.into(),
            phases: Vec::new(),
        }
    }

    pub fn phase(mut self, phase: PhaseTemplate) -> Self {
        self.phases.push(phase);
        self
    }

    /// Check that the template has phases with unique names and agents.
    pub fn validate(&self) -> WorkflowResult<()> {
        let invalid = |message: String| WorkflowError::InvalidTemplate {
            template: self.content_type.clone(),
            message,
        };

        if self.phases.is_empty() {
            return Err(invalid("template has no phases".to_string()));
        }
        let mut seen = HashSet::new();
        for phase in &self.phases {
            if !seen.insert(phase.name.as_str()) {
                return Err(invalid(format!("duplicate phase '{}'", phase.name)));
            }
            if phase.agents.is_empty() {
                return Err(invalid(format!("phase '{}' has no agents", phase.name)));
            }
        }
        Ok(())
    }
}

/// Registry of content templates keyed by content type.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    templates: BTreeMap<String, ContentTemplate>,
}

impl TemplateCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in templates.
    pub fn standard() -> Self {
        let mut catalog = Self::new();

        catalog.insert(
            ContentTemplate::new(FALLBACK_CONTENT_TYPE, "Generic research, write, review pipeline")
                .phase(PhaseTemplate::new("research", "research", &["research"], 60).critical(true))
                .phase(
                    PhaseTemplate::new("content-generation", "content-generation", &["nlp-generator"], 90)
                        .critical(true),
                )
                .phase(
                    PhaseTemplate::new(
                        "quality-review",
                        "quality-review",
                        &["quality-guardian", "content-editor"],
                        45,
                    )
                    .critical(true),
                ),
        );

        catalog.insert(
            ContentTemplate::new("educational-module", "Structured learning module")
                .phase(PhaseTemplate::new("research", "research", &["research"], 60).critical(true))
                .phase(PhaseTemplate::new(
                    "content-architecture",
                    "content-architecture",
                    &["architect"],
                    45,
                ))
                .phase(
                    PhaseTemplate::new("content-generation", "content-generation", &["nlp-generator"], 120)
                        .critical(true),
                )
                .phase(
                    PhaseTemplate::new(
                        "interactive-elements",
                        "ux-review",
                        &["ux-designer", "gamification-architect"],
                        60,
                    )
                    .parallel(true),
                )
                .phase(
                    PhaseTemplate::new("quality-review", "quality-review", &["quality-guardian"], 45)
                        .critical(true),
                ),
        );

        catalog.insert(
            ContentTemplate::new("assessment-tool", "Validated assessment instrument")
                .phase(PhaseTemplate::new("research", "research", &["research"], 60).critical(true))
                .phase(
                    PhaseTemplate::new(
                        "assessment-design",
                        "assessment-design",
                        &["architect", "psychometrician"],
                        90,
                    )
                    .critical(true),
                )
                .phase(PhaseTemplate::new(
                    "item-generation",
                    "content-generation",
                    &["nlp-generator"],
                    90,
                ))
                .phase(
                    PhaseTemplate::new(
                        "scientific-validation",
                        "scientific-validation",
                        &["scientific-validator"],
                        60,
                    )
                    .critical(true),
                )
                .phase(
                    PhaseTemplate::new("quality-review", "quality-review", &["quality-guardian"], 45)
                        .critical(true),
                ),
        );

        catalog.insert(
            ContentTemplate::new("interactive-game", "Gamified learning experience")
                .phase(PhaseTemplate::new("research", "research", &["research"], 45))
                .phase(
                    PhaseTemplate::new(
                        "game-design",
                        "gamification",
                        &["gamification-architect", "architect"],
                        90,
                    )
                    .critical(true),
                )
                .phase(PhaseTemplate::new(
                    "content-generation",
                    "content-generation",
                    &["nlp-generator"],
                    90,
                ))
                .phase(PhaseTemplate::new("ux-design", "ux-review", &["ux-designer"], 60).parallel(true))
                .phase(
                    PhaseTemplate::new("quality-review", "quality-review", &["quality-guardian"], 45)
                        .critical(true),
                ),
        );

        catalog.insert(
            ContentTemplate::new("research-summary", "Evidence summary with fact checking")
                .phase(
                    PhaseTemplate::new("research", "research", &["research", "scientific-validator"], 90)
                        .critical(true),
                )
                .phase(
                    PhaseTemplate::new("synthesis", "content-generation", &["nlp-generator"], 60)
                        .critical(true),
                )
                .phase(
                    PhaseTemplate::new(
                        "fact-check",
                        "scientific-validation",
                        &["scientific-validator"],
                        45,
                    )
                    .critical(true),
                )
                .phase(PhaseTemplate::new("editing", "editing", &["content-editor"], 30)),
        );

        catalog
    }

    /// Add or replace a template.
    pub fn insert(&mut self, template: ContentTemplate) {
        self.templates.insert(template.content_type.clone(), template);
    }

    pub fn get(&self, content_type: &str) -> Option<&ContentTemplate> {
        self.templates.get(content_type)
    }

    /// Template for a content type, falling back to the generic one.
    ///
    /// Returns `None` only when neither exists.
    pub fn resolve(&self, content_type: &str) -> Option<&ContentTemplate> {
        self.get(content_type)
            .or_else(|| self.get(FALLBACK_CONTENT_TYPE))
    }

    pub fn content_types(&self) -> Vec<&str> {
        self.templates.keys().map(|k| k.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Load templates from a YAML file holding a list of templates.
    pub fn from_file(path: &Path) -> WorkflowResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse templates from YAML. Each template is validated.
    pub fn from_yaml(yaml: &str) -> WorkflowResult<Self> {
        let templates: Vec<ContentTemplate> = serde_yaml::from_str(yaml)?;
        let mut catalog = Self::new();
        for template in templates {
            template.validate()?;
            catalog.insert(template);
        }
        Ok(catalog)
    }
}
