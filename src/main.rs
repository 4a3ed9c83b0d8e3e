use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use apura::cli::{formatters, Cli};
use apura::normalizer::{self, RecoveryPolicy};
use apura::{config, engine, importers, reports};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    if cli.no_color {
        colored::control::set_override(false);
    }

    let config = config::resolve(cli.file, cli.actions, cli.year, cli.strict)?;

    let statement = importers::import_statement(&config.file_path)
        .with_context(|| format!("failed to import {}", config.file_path.display()))?;
    let action_rows = match &config.actions_path {
        Some(path) => importers::import_actions(path)
            .with_context(|| format!("failed to import {}", path.display()))?,
        None => Vec::new(),
    };

    let policy = if config.strict {
        RecoveryPolicy::Abort
    } else {
        RecoveryPolicy::SkipAndReport
    };
    let batch = normalizer::normalize(&statement.trade_rows, &action_rows, policy)?;

    let outcome = engine::process(batch.trades, batch.actions);

    let year = config.year.or(statement.year);
    let mut report = reports::summarize(&outcome, year, statement.institution);
    report.rejected_rows = batch.rejected.iter().map(|e| e.to_string()).collect();

    if cli.json {
        println!("{}", formatters::format_report_json(&report)?);
    } else {
        println!("Filename: {}", config.file_path.display());
        formatters::print_report(&report);
    }

    Ok(())
}
