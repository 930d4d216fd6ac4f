//! Rate statistics command

use crate::downloader::config::{
    FailurePolicy, RunConfig, ScheduleMode, DEFAULT_PERIOD_DAYS, MAX_RETRIES_LIMIT,
};
use crate::downloader::SnapshotExecutor;
use crate::fetcher::http::DEFAULT_BASE_URL;
use crate::fetcher::shared_resources::HTTP_REQUEST_TIMEOUT_SECS;
use crate::report::{render_human, render_json};
use crate::window::{format_date, parse_date};
use crate::CalendarDate;
use chrono::{Days, Local};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

use super::CliError;

/// Currency rate statistics CLI
#[derive(Parser, Debug)]
#[command(name = "currency-rate-stats")]
#[command(
    about = "Download daily central-bank exchange rates over a date window and report min/max/average per currency",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// First day BEFORE the window (YYYY-MM-DD or DD/MM/YYYY; default: today minus the period)
    #[arg(long, value_parser = parse_date)]
    pub start_date: Option<CalendarDate>,

    /// Number of days to fetch after the start date
    #[arg(long, default_value_t = DEFAULT_PERIOD_DAYS, allow_negative_numbers = true)]
    pub period: i64,

    /// Scheduling mode: sequential or concurrent
    #[arg(long, env = "CBR_MODE", default_value = "concurrent")]
    pub mode: ScheduleMode,

    /// Cap on simultaneous requests in concurrent mode (default: one per day)
    #[arg(long, env = "CBR_MAX_CONCURRENCY")]
    pub max_concurrency: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(
        long,
        env = "CBR_TIMEOUT_SECS",
        default_value_t = HTTP_REQUEST_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout_secs: u64,

    /// Retries after a network failure (default: 0, max: 10)
    #[arg(
        long,
        default_value_t = 0,
        value_parser = clap::value_parser!(u32).range(0..=MAX_RETRIES_LIMIT as i64)
    )]
    pub max_retries: u32,

    /// What to do when a day fails: abort or skip
    #[arg(long, default_value = "abort")]
    pub on_error: FailurePolicy,

    /// Snapshot endpoint
    #[arg(long, env = "CBR_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Output format (human or json)
    #[arg(long, default_value = "human")]
    pub output_format: OutputFormat,

    /// Show a progress bar on stderr
    #[arg(long, default_value_t = false)]
    pub progress: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Human-readable output
    Human,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "human" => Ok(OutputFormat::Human),
            _ => Err(format!("Invalid output format: {s}")),
        }
    }
}

impl Cli {
    /// Start date, defaulting to `today - period` so the window ends today
    pub fn resolve_start(&self, today: CalendarDate) -> CalendarDate {
        self.start_date.unwrap_or_else(|| {
            let back = u64::try_from(self.period).unwrap_or(0);
            today.checked_sub_days(Days::new(back)).unwrap_or(today)
        })
    }

    /// Run configuration described by the flags
    pub fn run_config(&self) -> RunConfig {
        RunConfig::default()
            .with_base_url(self.base_url.clone())
            .with_mode(self.mode)
            .with_max_concurrency(self.max_concurrency)
            .with_request_timeout(Duration::from_secs(self.timeout_secs))
            .with_max_retries(self.max_retries)
            .with_failure_policy(self.on_error)
    }

    /// Run the pipeline and return the rendered report
    ///
    /// Nothing is rendered unless the run succeeds.
    pub async fn render(&self) -> Result<String, CliError> {
        let start = self.resolve_start(Local::now().date_naive());

        let mut executor = SnapshotExecutor::from_config(self.run_config())?;
        let progress = self.progress.then(create_progress_bar);
        if let Some(progress) = &progress {
            executor = executor.with_progress(progress.clone());
        }

        info!(
            "Collecting {} days of rates after {}",
            self.period,
            format_date(start)
        );

        let result = executor.run(start, self.period).await;
        if let Some(progress) = &progress {
            progress.finish_and_clear();
        }
        let report = result?;

        for skipped in report.skipped() {
            warn!("Day left out of the report: {}", skipped);
        }

        match self.output_format {
            OutputFormat::Human => Ok(render_human(&report)),
            OutputFormat::Json => Ok(render_json(&report)? + "\n"),
        }
    }

    /// Execute the command, printing the report to stdout
    pub async fn execute(&self) -> Result<(), CliError> {
        let rendered = self.render().await?;
        print!("{rendered}");
        Ok(())
    }
}

/// Create progress bar with style
fn create_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} days ({percent}%) {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message("Fetching snapshots");
    pb
}
