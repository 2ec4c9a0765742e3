//! Complexity, domain and request-flag rule tables.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{WorkflowError, WorkflowResult};
use crate::request::{MAX_COMPLEXITY, MIN_COMPLEXITY};
use crate::templates::PhaseTemplate;

/// Largest duration multiplier a complexity rule may carry.
pub const MAX_DURATION_MULTIPLIER: f64 = 10.0;

/// Duration scaling and extra phases for one complexity level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexityRule {
    pub level: u8,
    pub duration_multiplier: f64,
    #[serde(default)]
    pub additional_phases: Vec<PhaseTemplate>,
}

/// Agents and phases a subject domain requires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainRule {
    pub domain: String,
    #[serde(default)]
    pub required_agents: Vec<String>,
    #[serde(default)]
    pub additional_phases: Vec<PhaseTemplate>,
}

/// Phases appended when a request sets the matching flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicPhaseRules {
    pub audience_adaptation: PhaseTemplate,
    pub cultural_sensitivity: PhaseTemplate,
    pub accessibility: PhaseTemplate,
}

impl Default for DynamicPhaseRules {
    fn default() -> Self {
        Self {
            audience_adaptation: PhaseTemplate::new(
                "audience-adaptation",
                "audience-adaptation",
                &["audience-adapter"],
                30,
            ),
            cultural_sensitivity: PhaseTemplate::new(
                "cultural-sensitivity-review",
                "cultural-review",
                &["cultural-adapter"],
                30,
            ),
            accessibility: PhaseTemplate::new(
                "accessibility-review",
                "accessibility-review",
                &["accessibility-auditor", "ux-designer"],
                30,
            ),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RuleBookFile {
    #[serde(default)]
    complexity: Vec<ComplexityRule>,
    #[serde(default)]
    domains: Vec<DomainRule>,
    #[serde(default)]
    dynamic: Option<DynamicPhaseRules>,
}

/// All modification rules applied on top of a base template.
#[derive(Debug, Clone, Default)]
pub struct RuleBook {
    complexity: BTreeMap<u8, ComplexityRule>,
    domains: BTreeMap<String, DomainRule>,
    pub dynamic: DynamicPhaseRules,
}

impl RuleBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in rule tables.
    pub fn standard() -> Self {
        let expert_review = PhaseTemplate::new(
            "expert-review",
            "validation",
            &["scientific-validator", "quality-guardian"],
            45,
        )
        .critical(true);
        let peer_validation = PhaseTemplate::new(
            "peer-validation",
            "validation",
            &["quality-guardian", "compliance-agent"],
            45,
        )
        .parallel(true);
        let pilot_testing = PhaseTemplate::new(
            "pilot-testing",
            "ux-review",
            &["ux-designer", "quality-guardian"],
            60,
        )
        .critical(true);

        let mut book = Self::new();
        book.add_complexity(ComplexityRule {
            level: 1,
            duration_multiplier: 0.6,
            additional_phases: Vec::new(),
        });
        book.add_complexity(ComplexityRule {
            level: 2,
            duration_multiplier: 0.8,
            additional_phases: Vec::new(),
        });
        book.add_complexity(ComplexityRule {
            level: 3,
            duration_multiplier: 1.0,
            additional_phases: vec![expert_review.clone()],
        });
        book.add_complexity(ComplexityRule {
            level: 4,
            duration_multiplier: 1.3,
            additional_phases: vec![expert_review.clone(), peer_validation.clone()],
        });
        book.add_complexity(ComplexityRule {
            level: 5,
            duration_multiplier: 1.6,
            additional_phases: vec![expert_review, peer_validation, pilot_testing],
        });

        let ethics_review = PhaseTemplate::new(
            "ethics-review",
            "compliance-review",
            &["compliance-agent"],
            45,
        )
        .critical(true);

        book.add_domain(DomainRule {
            domain: "clinical-psychology".to_string(),
            required_agents: vec![
                "scientific-validator".to_string(),
                "compliance-agent".to_string(),
            ],
            additional_phases: vec![
                ethics_review.clone(),
                PhaseTemplate::new(
                    "clinical-validation",
                    "scientific-validation",
                    &["scientific-validator", "psychometrician"],
                    60,
                )
                .critical(true),
            ],
        });
        book.add_domain(DomainRule {
            domain: "healthcare".to_string(),
            required_agents: vec![
                "scientific-validator".to_string(),
                "compliance-agent".to_string(),
            ],
            additional_phases: vec![
                PhaseTemplate::new(
                    "medical-review",
                    "scientific-validation",
                    &["scientific-validator"],
                    60,
                )
                .critical(true),
                ethics_review,
            ],
        });
        book.add_domain(DomainRule {
            domain: "education".to_string(),
            required_agents: vec!["audience-adapter".to_string()],
            additional_phases: vec![PhaseTemplate::new(
                "curriculum-alignment",
                "content-architecture",
                &["architect"],
                30,
            )],
        });
        book.add_domain(DomainRule {
            domain: "gamification".to_string(),
            required_agents: vec!["gamification-architect".to_string()],
            additional_phases: vec![PhaseTemplate::new(
                "engagement-tuning",
                "gamification",
                &["gamification-architect", "ux-designer"],
                45,
            )
            .parallel(true)],
        });

        book
    }

    pub fn add_complexity(&mut self, rule: ComplexityRule) {
        self.complexity.insert(rule.level, rule);
    }

    pub fn add_domain(&mut self, rule: DomainRule) {
        self.domains.insert(rule.domain.clone(), rule);
    }

    pub fn complexity_rule(&self, level: u8) -> Option<&ComplexityRule> {
        self.complexity.get(&level)
    }

    pub fn domain_rule(&self, domain: &str) -> Option<&DomainRule> {
        self.domains.get(domain)
    }

    pub fn domains(&self) -> Vec<&str> {
        self.domains.keys().map(|d| d.as_str()).collect()
    }

    /// Load rules from a YAML file.
    pub fn from_file(path: &Path) -> WorkflowResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse rules from YAML with `complexity`, `domains` and optional
    /// `dynamic` sections.
    pub fn from_yaml(yaml: &str) -> WorkflowResult<Self> {
        let file: RuleBookFile = serde_yaml::from_str(yaml)?;

        let mut book = Self::new();
        for rule in file.complexity {
            if !(MIN_COMPLEXITY..=MAX_COMPLEXITY).contains(&rule.level) {
                return Err(WorkflowError::InvalidComplexity(rule.level));
            }
            let multiplier = rule.duration_multiplier;
            if !multiplier.is_finite() || multiplier <= 0.0 || multiplier > MAX_DURATION_MULTIPLIER {
                return Err(WorkflowError::InvalidConfiguration(format!(
                    "complexity level {} multiplier {} is outside (0, {}]",
                    rule.level, multiplier, MAX_DURATION_MULTIPLIER
                )));
            }
            book.add_complexity(rule);
        }
        for rule in file.domains {
            book.add_domain(rule);
        }
        if let Some(dynamic) = file.dynamic {
            book.dynamic = dynamic;
        }
        Ok(book)
    }
}
