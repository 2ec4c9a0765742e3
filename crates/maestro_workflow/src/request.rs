//! Content request analysis consumed by the planner.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{WorkflowError, WorkflowResult};

/// Lowest supported complexity level.
pub const MIN_COMPLEXITY: u8 = 1;
/// Highest supported complexity level.
pub const MAX_COMPLEXITY: u8 = 5;

/// A document ranked by an external knowledge search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedDocument {
    pub id: String,
    pub title: String,
    /// Relevance score (0.0 - 1.0)
    pub score: f64,
    #[serde(default)]
    pub source: Option<String>,
}

impl RankedDocument {
    pub fn new(id: impl Into<String>, title: impl Into<String>, score: f64) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            score,
            source: None,
        }
    }
}

/// Result of analysing a content-creation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Content type used to pick the base template
    pub content_type: String,
    /// Complexity level (1-5)
    #[serde(default = "default_complexity")]
    pub complexity: u8,
    /// Subject domain used to pick domain rules
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub target_audience: Option<String>,
    #[serde(default)]
    pub requires_audience_adaptation: bool,
    #[serde(default)]
    pub cultural_sensitivity: bool,
    #[serde(default)]
    pub accessibility_required: bool,
    /// Documents supplied by an external knowledge search
    #[serde(default)]
    pub rag_documents: Vec<RankedDocument>,
}

fn default_complexity() -> u8 {
    2
}

impl AnalysisResult {
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            complexity: default_complexity(),
            domain: None,
            topic: None,
            target_audience: None,
            requires_audience_adaptation: false,
            cultural_sensitivity: false,
            accessibility_required: false,
            rag_documents: Vec::new(),
        }
    }

    pub fn complexity(mut self, level: u8) -> Self {
        self.complexity = level;
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.target_audience = Some(audience.into());
        self.requires_audience_adaptation = true;
        self
    }

    pub fn cultural_sensitivity(mut self) -> Self {
        self.cultural_sensitivity = true;
        self
    }

    pub fn accessibility(mut self) -> Self {
        self.accessibility_required = true;
        self
    }

    pub fn document(mut self, document: RankedDocument) -> Self {
        self.rag_documents.push(document);
        self
    }

    /// Check the request before planning.
    pub fn validate(&self) -> WorkflowResult<()> {
        if self.content_type.trim().is_empty() {
            return Err(WorkflowError::InvalidRequest(
                "content_type must not be empty".to_string(),
            ));
        }
        if !(MIN_COMPLEXITY..=MAX_COMPLEXITY).contains(&self.complexity) {
            return Err(WorkflowError::InvalidComplexity(self.complexity));
        }
        Ok(())
    }

    /// Load a request from a YAML or JSON file (by extension).
    pub fn from_file(path: &Path) -> WorkflowResult<Self> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(serde_json::from_str(&content)?),
            _ => Ok(serde_yaml::from_str(&content)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complexity_bounds() {
        assert!(AnalysisResult::new("general").complexity(1).validate().is_ok());
        assert!(AnalysisResult::new("general").complexity(5).validate().is_ok());
        assert!(matches!(
            AnalysisResult::new("general").complexity(0).validate(),
            Err(WorkflowError::InvalidComplexity(0))
        ));
        assert!(matches!(
            AnalysisResult::new("general").complexity(6).validate(),
            Err(WorkflowError::InvalidComplexity(6))
        ));
    }

    #[test]
    fn test_empty_content_type_rejected() {
        assert!(matches!(
            AnalysisResult::new("  ").validate(),
            Err(WorkflowError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_yaml_defaults() {
        let request: AnalysisResult = serde_yaml::from_str("content_type: assessment-tool\n").unwrap();
        assert_eq!(request.complexity, 2);
        assert!(request.domain.is_none());
        assert!(!request.accessibility_required);
        assert!(request.rag_documents.is_empty());
    }
}
