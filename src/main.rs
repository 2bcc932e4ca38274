//! azenv CLI Entry Point
//!
//! Resolves one resource group and writes its `.env` snapshot. The summary goes
//! to stdout (human-readable, or a JSON envelope with `--json`); logs go to stderr.
//!
//! Exit codes: 0 on success, including partial resolution; 1 on a fatal error;
//! 2 on invalid arguments.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::Context;
use clap::{ArgAction, Parser};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use azenv::{
    resolve_settings, AzCli, AzenvError, ErrorEnvelope, ErrorInfo, Metadata, RunOutcome, SettingsFile,
    SuccessEnvelope,
};

const COMMAND: &str = "resolve";

/// azenv - write the resources of an Azure resource group to a .env file
#[derive(Parser)]
#[command(name = "azenv")]
#[command(about = "Resolve provisioned Azure resources into a .env snapshot")]
#[command(version)]
struct Cli {
    /// Resource group to resolve (prompted for when omitted)
    #[arg(short = 'g', long)]
    resource_group: Option<String>,

    /// Snapshot path (default: .env)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print a JSON envelope instead of the text summary
    #[arg(long)]
    json: bool,

    /// Settings file replacing the local and global config files
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let started = Instant::now();
    let result = match execute(&cli).await {
        Ok(outcome) => print_success(&cli, &outcome, started),
        Err(err) => Err(err),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            print_failure(&cli, &err);
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr; `RUST_LOG` overrides the verbosity flag
fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("azenv={level}")));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

async fn execute(cli: &Cli) -> anyhow::Result<RunOutcome> {
    let overrides = SettingsFile {
        output_path: cli.output.clone(),
        ..SettingsFile::default()
    };
    let settings = resolve_settings(cli.config.as_deref(), overrides)?;

    let group = match &cli.resource_group {
        Some(group) => group.clone(),
        None => prompt_group()?,
    };

    let client = AzCli::new(settings.az_path.clone());
    let outcome = azenv::run(&client, &group, &settings).await?;
    Ok(outcome)
}

/// Ask for the resource group on an interactive terminal
fn prompt_group() -> azenv::Result<String> {
    if !std::io::stdin().is_terminal() {
        return Err(AzenvError::invalid_input(
            "No resource group given; pass --resource-group when not running interactively",
        ));
    }

    let answer: String = dialoguer::Input::new()
        .with_prompt("Resource group name")
        .allow_empty(true)
        .interact_text()
        .map_err(|e| AzenvError::invalid_input(format!("Could not read resource group: {e}")))?;

    let answer = answer.trim();
    if answer.is_empty() {
        return Err(AzenvError::invalid_input("Resource group name cannot be empty"));
    }
    Ok(answer.to_string())
}

fn print_success(cli: &Cli, outcome: &RunOutcome, started: Instant) -> anyhow::Result<()> {
    if cli.json {
        let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let envelope = SuccessEnvelope::new(COMMAND, &outcome.report, Metadata::new(elapsed));
        let json = serde_json::to_string_pretty(&envelope).context("serializing the run report")?;
        println!("{json}");
    } else {
        println!("{}", outcome.report.render_summary());
    }
    Ok(())
}

fn print_failure(cli: &Cli, err: &anyhow::Error) {
    if !cli.json {
        eprintln!("error: {err:#}");
        if err.downcast_ref::<AzenvError>().is_some_and(AzenvError::is_input_error) {
            eprintln!("see `azenv --help` for usage");
        }
        return;
    }

    let envelope = match err.downcast_ref::<AzenvError>() {
        Some(azenv_err) => ErrorEnvelope::from_error(COMMAND, azenv_err),
        None => ErrorEnvelope::new(COMMAND, ErrorInfo::new("INTERNAL_ERROR", format!("{err:#}"))),
    };
    match serde_json::to_string_pretty(&envelope) {
        Ok(json) => println!("{json}"),
        Err(_) => eprintln!("error: {err:#}"),
    }
}
