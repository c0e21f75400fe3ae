//! worklog-report CLI - Tempo/Jira cost report generator
//!
//! Pulls worklogs for the given projects and date range, refreshes the rate
//! roster and writes the XLSX cost report.

mod args;
mod config;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use worklog_client::{JiraClient, TempoClient};
use worklog_core::WorklogPipeline;
use worklog_render::ExcelReport;
use worklog_roster::RosterStore;

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "worklog-report")]
#[command(author, version, about = "Tempo/Jira worklog cost report generator", long_about = None)]
struct Cli {
    /// YAML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Comma-separated project keys, e.g. PRJ,OPS
    #[arg(value_name = "PROJECTS")]
    projects: String,

    /// First reported day, YYYY-MM-DD
    #[arg(value_name = "DATE_FROM")]
    date_from: String,

    /// Last reported day, YYYY-MM-DD (inclusive)
    #[arg(value_name = "DATE_TO")]
    date_to: String,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins; otherwise the verbosity flag picks the level
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let config = AppConfig::load(&cli.config)?;
    let projects = args::parse_projects(&cli.projects)?;
    let range = args::parse_range(&cli.date_from, &cli.date_to)?;
    debug!(?config, "Configuration loaded");

    info!(
        projects = %projects.join(","),
        from = %range.from,
        to = %range.to,
        "Building worklog report"
    );

    let store = RosterStore::new(&config.files.project_config);
    let stored = store
        .load()
        .with_context(|| format!("Cannot load roster {}", store.path().display()))?;

    let tempo = TempoClient::new(config.tempo_config()).context("Cannot create Tempo client")?;
    let jira = JiraClient::new(config.jira_config()).context("Cannot create Jira client")?;

    let worklog = WorklogPipeline::new(&tempo, &jira).build(&projects, &range, &stored)?;

    store
        .sync(&stored, &worklog)
        .with_context(|| format!("Cannot save roster {}", store.path().display()))?;

    ExcelReport::new()
        .save(&worklog, &range, &config.files.report)
        .with_context(|| format!("Cannot write report {}", config.files.report.display()))?;

    info!(
        users = worklog.user_count(),
        report = %config.files.report.display(),
        "Done"
    );
    Ok(())
}
