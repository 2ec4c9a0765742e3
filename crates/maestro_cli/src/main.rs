//! Maestro CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments or request
//! - 3: Delegation or orchestration failure

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{Cli, Commands, DispatchFailed, UsageError};
use maestro_workflow::WorkflowError;

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const DELEGATION_FAILURE: u8 = 3;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet, cli.json_logs);

    let options = cli.global_options();
    let result = match cli.command {
        Commands::Plan(args) => commands::plan::execute(args, &options).await,
        Commands::Refine(args) => commands::refine::execute(args, &options).await,
        Commands::Delegate(args) => commands::delegate::execute(args, &options).await,
        Commands::Orchestrate(args) => commands::orchestrate::execute(args, &options).await,
        Commands::Agents(args) => commands::agents::execute(args, &options).await,
        Commands::Templates(args) => commands::templates::execute(args, &options).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

fn init_logging(verbose: bool, quiet: bool, json: bool) {
    let default_directives = if verbose {
        "maestro=debug,info"
    } else if quiet {
        "error"
    } else {
        "maestro=info,warn"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    // Logs go to stderr so plans and reports on stdout stay parseable
    let registry = tracing_subscriber::registry().with(filter);
    let log_result = if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
    };

    if log_result.is_err() {
        // Logging already initialized, continue
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    if e.downcast_ref::<DispatchFailed>().is_some() {
        return ExitCodes::DELEGATION_FAILURE;
    }

    if e.downcast_ref::<UsageError>().is_some() {
        return ExitCodes::INVALID_ARGS;
    }

    let invalid_request = e.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<WorkflowError>(),
            Some(WorkflowError::InvalidComplexity(_)) | Some(WorkflowError::InvalidRequest(_))
        ) || matches!(
            cause.downcast_ref::<maestro_core::CoreError>(),
            Some(maestro_core::CoreError::Workflow(
                WorkflowError::InvalidComplexity(_) | WorkflowError::InvalidRequest(_)
            ))
        )
    });

    if invalid_request {
        ExitCodes::INVALID_ARGS
    } else {
        ExitCodes::GENERAL_ERROR
    }
}
