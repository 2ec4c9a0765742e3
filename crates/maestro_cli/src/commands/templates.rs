//! Templates command - List content templates.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use super::{GlobalOptions, UsageError};

#[derive(Args, Debug)]
pub struct TemplatesArgs {
    /// Show the full template for one content type
    #[arg(short = 't', long)]
    pub content_type: Option<String>,
}

#[derive(Serialize)]
struct TemplateSummary<'a> {
    content_type: &'a str,
    description: &'a str,
    phases: Vec<&'a str>,
}

pub async fn execute(args: TemplatesArgs, options: &GlobalOptions) -> Result<()> {
    let config = options.load_config()?;
    let catalog = config.load_templates()?;

    if let Some(content_type) = &args.content_type {
        let template = catalog
            .get(content_type)
            .ok_or_else(|| UsageError(format!("Unknown content type: {}", content_type)))?;
        return options.print(template);
    }

    let summaries: Vec<TemplateSummary> = catalog
        .content_types()
        .into_iter()
        .filter_map(|ct| catalog.get(ct))
        .map(|t| TemplateSummary {
            content_type: &t.content_type,
            description: &t.description,
            phases: t.phases.iter().map(|p| p.name.as_str()).collect(),
        })
        .collect();
    options.print(&summaries)
}
