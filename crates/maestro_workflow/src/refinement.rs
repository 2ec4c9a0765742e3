//! Feedback classification for refinement plans.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::templates::{ContentTemplate, PhaseTemplate};

/// What a piece of feedback is mostly about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeedbackCategory {
    ContentQuality,
    ScientificAccuracy,
    UserExperience,
    Comprehensive,
}

impl FeedbackCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackCategory::ContentQuality => "content-quality",
            FeedbackCategory::ScientificAccuracy => "scientific-accuracy",
            FeedbackCategory::UserExperience => "user-experience",
            FeedbackCategory::Comprehensive => "comprehensive",
        }
    }

    /// Reviewers appended to the revision phase.
    pub fn reviewers(&self) -> &'static [&'static str] {
        match self {
            FeedbackCategory::ContentQuality => &["content-editor", "quality-guardian"],
            FeedbackCategory::ScientificAccuracy => &["scientific-validator", "research"],
            FeedbackCategory::UserExperience => &["ux-designer", "accessibility-auditor"],
            FeedbackCategory::Comprehensive => {
                &["quality-guardian", "scientific-validator", "ux-designer"]
            }
        }
    }
}

impl std::fmt::Display for FeedbackCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

const CONTENT_QUALITY_KEYWORDS: &[&str] = &[
    "clarity", "unclear", "clear", "grammar", "typo", "spelling", "tone", "readab", "wording",
    "confusing", "writing", "quality",
];

const SCIENTIFIC_KEYWORDS: &[&str] = &[
    "accura", "inaccura", "evidence", "citation", "cite", "source", "scientific", "research",
    "study", "studies", "fact", "incorrect", "outdated",
];

const USER_EXPERIENCE_KEYWORDS: &[&str] = &[
    "usability", "navigation", "navigate", "interface", "layout", "design", "engag", "interactive",
    "user", "experience", "accessib", "mobile",
];

/// Keyword classifier. Categories are tried in a fixed order and the first
/// one with a matching keyword wins.
#[derive(Debug, Clone)]
pub struct FeedbackClassifier {
    rules: Vec<(FeedbackCategory, Option<Regex>)>,
}

impl Default for FeedbackClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedbackClassifier {
    pub fn new() -> Self {
        let rules = [
            (FeedbackCategory::ContentQuality, CONTENT_QUALITY_KEYWORDS),
            (FeedbackCategory::ScientificAccuracy, SCIENTIFIC_KEYWORDS),
            (FeedbackCategory::UserExperience, USER_EXPERIENCE_KEYWORDS),
        ]
        .into_iter()
        .map(|(category, keywords)| {
            let pattern = format!(r"(?i)\b(?:{})", keywords.join("|"));
            (category, Regex::new(&pattern).ok())
        })
        .collect();

        Self { rules }
    }

    /// Classify free-text feedback.
    pub fn classify(&self, feedback: &str) -> FeedbackCategory {
        self.rules
            .iter()
            .find(|(_, re)| re.as_ref().map_or(false, |re| re.is_match(feedback)))
            .map(|(category, _)| *category)
            .unwrap_or(FeedbackCategory::Comprehensive)
    }
}

/// Classify feedback with the default keyword lists.
pub fn classify_feedback(feedback: &str) -> FeedbackCategory {
    FeedbackClassifier::new().classify(feedback)
}

/// Base template for refinement plans. The second phase receives the
/// category reviewers.
pub fn refinement_template() -> ContentTemplate {
    ContentTemplate::new("refinement", "Revise existing content from feedback")
        .phase(
            PhaseTemplate::new("feedback-analysis", "quality-review", &["quality-guardian"], 30)
                .critical(true),
        )
        .phase(
            PhaseTemplate::new(
                "targeted-revision",
                "content-generation",
                &["nlp-generator", "content-editor"],
                60,
            )
            .critical(true),
        )
        .phase(
            PhaseTemplate::new("revalidation", "quality-review", &["quality-guardian"], 30)
                .critical(true),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_categories() {
        assert_eq!(
            classify_feedback("The second section is confusing and has typos"),
            FeedbackCategory::ContentQuality
        );
        assert_eq!(
            classify_feedback("Several citations are outdated"),
            FeedbackCategory::ScientificAccuracy
        );
        assert_eq!(
            classify_feedback("Navigation between modules is hard on mobile"),
            FeedbackCategory::UserExperience
        );
        assert_eq!(
            classify_feedback("Please take another look overall"),
            FeedbackCategory::Comprehensive
        );
    }

    #[test]
    fn test_first_category_wins() {
        // Mentions both writing and evidence; content quality is checked first
        assert_eq!(
            classify_feedback("Writing is fine but the evidence is weak"),
            FeedbackCategory::ContentQuality
        );
    }

    #[test]
    fn test_keywords_match_word_starts_only() {
        // "nuclear" contains "clear" but not at a word boundary
        assert_eq!(
            classify_feedback("Add a nuclear example"),
            FeedbackCategory::Comprehensive
        );
        assert_eq!(
            classify_feedback("ACCURACY needs work"),
            FeedbackCategory::ScientificAccuracy
        );
    }

    #[test]
    fn test_refinement_template_shape() {
        let template = refinement_template();
        template.validate().unwrap();
        assert_eq!(template.phases[1].name, "targeted-revision");
    }
}
