//! Main entry point for the currency-rate-stats CLI

use anyhow::Context;
use clap::Parser;
use currency_rate_stats::cli::Cli;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber with optional JSON formatting.
///
/// Logs go to stderr; stdout carries only the report.
fn init_tracing() {
    // Check if JSON output is requested via environment variable
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("currency_rate_stats=info"));

    if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    // Dropping the run future on Ctrl+C cancels every in-flight request
    let result = tokio::select! {
        result = cli.execute() => result.context("Command failed"),
        _ = tokio::signal::ctrl_c() => {
            warn!("Ctrl+C received - cancelling run");
            Err(anyhow::anyhow!("interrupted"))
        }
    };

    if let Err(e) = result {
        error!("{:#}", e);
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
