//! CLI command definitions.
//!
//! Each subcommand maps to one planner, delegator or orchestrator
//! operation. Results are printed to stdout as JSON or YAML.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use maestro_core::MaestroConfig;
use maestro_workflow::{AnalysisResult, RankedDocument};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

pub mod agents;
pub mod delegate;
pub mod orchestrate;
pub mod plan;
pub mod refine;
pub mod templates;

/// Maestro - content workflow planner and mock agent delegator
#[derive(Parser)]
#[command(name = "maestro")]
#[command(version, about = "Maestro - content workflow planner and mock agent delegator")]
#[command(long_about = r#"
Maestro plans multi-phase content-creation workflows and dispatches their
phases to a roster of simulated specialist agents.

COMMANDS:
  plan          Build a workflow plan for a content request
  refine        Build a refinement plan from free-text feedback
  delegate      Delegate a single task to the best available agent
  orchestrate   Plan a request and dispatch every phase
  agents        List the agent roster and runtime state
  templates     List content templates

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments or request
  3 - Delegation or orchestration failure
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (YAML)
    #[arg(short, long, global = true, env = "MAESTRO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn global_options(&self) -> GlobalOptions {
        GlobalOptions {
            config: self.config.clone(),
            format: self.format,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a workflow plan for a content request
    Plan(plan::PlanArgs),

    /// Build a refinement plan from feedback
    Refine(refine::RefineArgs),

    /// Delegate a single task
    Delegate(delegate::DelegateArgs),

    /// Plan a request and dispatch every phase
    Orchestrate(orchestrate::OrchestrateArgs),

    /// List agents and their runtime state
    Agents(agents::AgentsArgs),

    /// List content templates
    Templates(templates::TemplatesArgs),
}

/// Options shared by every subcommand.
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    pub config: Option<PathBuf>,
    pub format: OutputFormat,
}

impl GlobalOptions {
    /// Configuration file contents, or defaults when none is given.
    pub fn load_config(&self) -> Result<MaestroConfig> {
        match &self.config {
            Some(path) => MaestroConfig::from_file(path)
                .with_context(|| format!("Failed to load configuration {}", path.display())),
            None => {
                debug!("No configuration file, using defaults");
                Ok(MaestroConfig::default())
            }
        }
    }

    pub fn print<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", render(value, self.format)?);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}

pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> Result<String> {
    let text = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    Ok(text)
}

/// A task or workflow ran but did not succeed.
#[derive(Debug, Error)]
#[error("Dispatch failed: {0}")]
pub struct DispatchFailed(pub String);

/// Arguments that are individually valid but do not fit together.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct UsageError(pub String);

/// Content request given either as a file or inline.
#[derive(Args, Debug)]
pub struct RequestArgs {
    /// Request file (YAML or JSON analysis result)
    #[arg(short, long, conflicts_with = "content_type")]
    pub request: Option<PathBuf>,

    /// Content type, e.g. assessment-tool
    #[arg(short = 't', long)]
    pub content_type: Option<String>,

    /// Complexity level (1-5)
    #[arg(long, default_value_t = 2)]
    pub complexity: u8,

    /// Subject domain, e.g. clinical-psychology
    #[arg(short, long)]
    pub domain: Option<String>,

    /// Topic of the content
    #[arg(long)]
    pub topic: Option<String>,

    /// Target audience (adds an audience adaptation phase)
    #[arg(long)]
    pub audience: Option<String>,

    /// Add a cultural sensitivity review
    #[arg(long)]
    pub cultural_sensitivity: bool,

    /// Add an accessibility review
    #[arg(long)]
    pub accessibility: bool,

    /// Ranked document as ID:SCORE[:TITLE], repeatable
    #[arg(long = "document", value_parser = parse_document)]
    pub documents: Vec<RankedDocument>,

    /// Workflow identifier (generated when omitted)
    #[arg(short, long)]
    pub workflow_id: Option<String>,
}

impl RequestArgs {
    pub fn analysis(&self) -> Result<AnalysisResult> {
        if let Some(path) = &self.request {
            return AnalysisResult::from_file(path)
                .with_context(|| format!("Failed to read request {}", path.display()));
        }

        let Some(content_type) = &self.content_type else {
            let message = "Either --request or --content-type is required".to_string();
            return Err(UsageError(message).into());
        };

        let mut analysis = AnalysisResult::new(content_type.as_str()).complexity(self.complexity);
        if let Some(domain) = &self.domain {
            analysis = analysis.domain(domain.as_str());
        }
        if let Some(topic) = &self.topic {
            analysis = analysis.topic(topic.as_str());
        }
        if let Some(audience) = &self.audience {
            analysis = analysis.audience(audience.as_str());
        }
        if self.cultural_sensitivity {
            analysis = analysis.cultural_sensitivity();
        }
        if self.accessibility {
            analysis = analysis.accessibility();
        }
        for document in &self.documents {
            analysis = analysis.document(document.clone());
        }
        Ok(analysis)
    }

    pub fn workflow_id(&self) -> String {
        self.workflow_id.clone().unwrap_or_else(generate_workflow_id)
    }
}

pub fn generate_workflow_id() -> String {
    format!("wf-{}", chrono::Utc::now().format("%Y%m%d-%H%M%S"))
}

fn parse_document(value: &str) -> std::result::Result<RankedDocument, String> {
    let mut parts = value.splitn(3, ':');
    let id = parts.next().filter(|s| !s.is_empty()).ok_or("missing document id")?;
    let score: f64 = parts
        .next()
        .ok_or("missing score, expected ID:SCORE[:TITLE]")?
        .parse()
        .map_err(|e| format!("invalid score: {}", e))?;
    let title = parts.next().unwrap_or(id);
    Ok(RankedDocument::new(id, title, score))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plan_command() {
        let cli = Cli::try_parse_from([
            "maestro",
            "--format",
            "yaml",
            "plan",
            "-t",
            "assessment-tool",
            "--complexity",
            "3",
            "--domain",
            "clinical-psychology",
            "--document",
            "d1:0.9:DSM overview",
        ])
        .unwrap();

        assert_eq!(cli.format, OutputFormat::Yaml);
        let Commands::Plan(args) = cli.command else {
            panic!("expected plan command");
        };
        let analysis = args.request.analysis().unwrap();
        assert_eq!(analysis.content_type, "assessment-tool");
        assert_eq!(analysis.complexity, 3);
        assert_eq!(analysis.rag_documents[0].title, "DSM overview");
    }

    #[test]
    fn test_request_requires_content_type_or_file() {
        let cli = Cli::try_parse_from(["maestro", "plan"]).unwrap();
        let Commands::Plan(args) = cli.command else {
            panic!("expected plan command");
        };
        assert!(args.request.analysis().is_err());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["maestro", "-v", "-q", "agents"]).is_err());
    }

    #[test]
    fn test_parse_document() {
        let doc = parse_document("guide:0.75").unwrap();
        assert_eq!(doc.id, "guide");
        assert_eq!(doc.title, "guide");
        assert_eq!(doc.score, 0.75);

        // Titles may contain colons
        let doc = parse_document("d2:0.5:Part 1: Basics").unwrap();
        assert_eq!(doc.title, "Part 1: Basics");

        assert!(parse_document("d3").is_err());
        assert!(parse_document("d3:high").is_err());
    }

    #[test]
    fn test_render_formats() {
        let value = serde_json::json!({ "phase": "research" });
        assert!(render(&value, OutputFormat::Json).unwrap().contains("\"phase\""));
        assert_eq!(render(&value, OutputFormat::Yaml).unwrap().trim(), "phase: research");
    }
}
