//! Top-level configuration file.

use std::path::{Path, PathBuf};

use maestro_agents::{CapabilityMap, DelegatorConfig};
use maestro_workflow::{PlannerConfig, RuleBook, TemplateCatalog};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CoreResult;

/// Configuration for a [`crate::ContentOrchestrator`].
///
/// ```yaml
/// delegator:
///   strategy: least_loaded
///   retry_limit: 2
/// planner:
///   checkpoint_minutes: 10
/// templates: templates.yaml
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaestroConfig {
    pub delegator: DelegatorConfig,
    pub planner: PlannerConfig,
    /// Optional YAML file replacing the built-in content templates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub templates: Option<PathBuf>,
    /// Optional YAML file replacing the built-in complexity/domain rules
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<PathBuf>,
    /// Optional YAML file replacing the task-type capability map
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<PathBuf>,
}

impl MaestroConfig {
    pub fn with_delegator(mut self, delegator: DelegatorConfig) -> Self {
        self.delegator = delegator;
        self
    }

    pub fn with_planner(mut self, planner: PlannerConfig) -> Self {
        self.planner = planner;
        self
    }

    pub fn validate(&self) -> CoreResult<()> {
        self.delegator.validate()?;
        self.planner.validate()?;
        Ok(())
    }

    /// Load from a YAML file. Relative table paths are resolved against the
    /// file's directory.
    pub fn from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&content)?;

        if let Some(base) = path.parent() {
            for table in [&mut config.templates, &mut config.rules, &mut config.capabilities] {
                if let Some(p) = table.as_mut() {
                    if p.is_relative() {
                        *p = base.join(&*p);
                    }
                }
            }
        }
        debug!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub fn from_yaml(yaml: &str) -> CoreResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Content templates: the configured file or the built-in set.
    pub fn load_templates(&self) -> CoreResult<TemplateCatalog> {
        match &self.templates {
            Some(path) => Ok(TemplateCatalog::from_file(path)?),
            None => Ok(TemplateCatalog::standard()),
        }
    }

    pub fn load_rules(&self) -> CoreResult<RuleBook> {
        match &self.rules {
            Some(path) => Ok(RuleBook::from_file(path)?),
            None => Ok(RuleBook::standard()),
        }
    }

    pub fn load_capabilities(&self) -> CoreResult<CapabilityMap> {
        match &self.capabilities {
            Some(path) => Ok(CapabilityMap::from_file(path)?),
            None => Ok(CapabilityMap::standard()),
        }
    }
}
