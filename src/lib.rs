//! # Currency Rate Stats Library
//!
//! Downloads daily exchange-rate snapshots published as XML by a central-bank
//! endpoint (the Bank of Russia `XML_daily_eng.asp` feed by default) over a
//! rolling window of days, and reduces them into per-currency statistics:
//! minimum and maximum rate with the day they were observed, plus the average.
//!
//! ## Quick Start
//!
//! ```no_run
//! use currency_rate_stats::downloader::{RunConfig, SnapshotExecutor};
//! use chrono::NaiveDate;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let executor = SnapshotExecutor::from_config(RunConfig::default())?;
//! let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
//! let report = executor.run(start, 90).await?;
//!
//! for stats in report.stats() {
//!     println!("{}", currency_rate_stats::report::format_line(&stats));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`window`] - Date window generation and `DD/MM/YYYY` formatting
//! - [`fetcher`] - Snapshot retrieval over HTTP and positional XML parsing
//! - [`aggregator`] - Per-currency observation merge and derived statistics
//! - [`downloader`] - Sequential or concurrent fetch-and-aggregate orchestration
//! - [`report`] - Human and JSON rendering of the final report
//! - [`cli`] - Command-line surface

#![warn(missing_docs)]
#![warn(clippy::all)]

use chrono::NaiveDate;

/// Per-currency aggregation
pub mod aggregator;

/// CLI command implementation
pub mod cli;

/// Fetch orchestration
pub mod downloader;

/// Snapshot fetchers and parser
pub mod fetcher;

/// Report rendering
pub mod report;

/// Date window generation
pub mod window;

// Re-export commonly used types
pub use aggregator::{AggregateReport, CurrencyAggregate, CurrencyStats, Observation};
pub use window::DateWindow;

/// A single calendar day used to label snapshots and observations.
pub type CalendarDate = NaiveDate;

/// Raw response body for one day's snapshot, consumed once by the parser.
pub type RawSnapshot = bytes::Bytes;

/// One currency line parsed out of a daily snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyRecord {
    /// Currency key, unique within a snapshot and stable across days
    pub code: String,
    /// Label shown next to the key in reports
    pub display_name: String,
    /// Number of currency units the rate is quoted for, when the snapshot carries one
    pub nominal: Option<u32>,
    /// Exchange rate
    pub rate: f64,
    /// Day of the snapshot the record came from
    pub observed_date: CalendarDate,
}

impl CurrencyRecord {
    /// Validate record integrity
    pub fn validate(&self) -> Result<(), String> {
        if self.code.trim().is_empty() {
            return Err("Currency code cannot be empty".to_string());
        }

        if !self.rate.is_finite() || self.rate <= 0.0 {
            return Err(format!("Rate must be positive, got {}", self.rate));
        }

        Ok(())
    }
}
