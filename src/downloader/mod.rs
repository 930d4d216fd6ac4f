//! Fetch-and-aggregate orchestration
//!
//! This module drives a whole run: it expands the date window, fetches and
//! parses one snapshot per day, and folds every batch into a single
//! [`crate::aggregator::Aggregator`].
//!
//! # Overview
//!
//! 1. **Window**: [`crate::window::generate`] lists the days to query
//! 2. **Fetch + parse**: one task per day through a [`crate::fetcher::SnapshotFetcher`]
//! 3. **Merge**: results are merged on the driving task, in date order
//! 4. **Report**: the finished [`crate::aggregator::AggregateReport`] is returned
//!
//! # Scheduling
//!
//! [`ScheduleMode::Sequential`] fetches one day at a time.
//! [`ScheduleMode::Concurrent`] dispatches every day at once, optionally
//! capped by `max_concurrency`. Both produce identical reports.
//!
//! # Quick Start
//!
//! ```no_run
//! use currency_rate_stats::downloader::{RunConfig, ScheduleMode, SnapshotExecutor};
//! use chrono::NaiveDate;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RunConfig::default()
//!     .with_mode(ScheduleMode::Concurrent)
//!     .with_max_concurrency(Some(16));
//! let executor = SnapshotExecutor::from_config(config)?;
//! let report = executor
//!     .run(NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(), 30)
//!     .await?;
//! println!("{} currencies", report.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! Under the default [`FailurePolicy::Abort`] the first failing day ends the
//! run with [`RunError::Snapshot`]; in-flight requests are dropped. With
//! [`FailurePolicy::Skip`] failing days are logged and listed in the report.

pub mod config;
pub mod executor;

pub use config::{FailurePolicy, RunConfig, ScheduleMode};
pub use executor::SnapshotExecutor;

use crate::fetcher::FetcherError;
use crate::window::WindowError;
use crate::CalendarDate;

/// Run errors
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// Window could not be built; raised before any request is made
    #[error(transparent)]
    InvalidRange(#[from] WindowError),

    /// Fetching or parsing one day's snapshot failed
    #[error("snapshot for {date} failed: {source}")]
    Snapshot {
        /// Day that failed
        date: CalendarDate,
        /// Underlying fetch or parse failure
        #[source]
        source: FetcherError,
    },

    /// Fetcher could not be set up
    #[error("fetcher error: {0}")]
    Fetcher(#[from] FetcherError),
}

impl RunError {
    /// Day that caused the failure, if the error is tied to one
    pub fn date(&self) -> Option<CalendarDate> {
        match self {
            RunError::Snapshot { date, .. } => Some(*date),
            _ => None,
        }
    }

    /// Underlying fetcher error, if any
    pub fn fetcher_error(&self) -> Option<&FetcherError> {
        match self {
            RunError::Snapshot { source, .. } => Some(source),
            RunError::Fetcher(source) => Some(source),
            RunError::InvalidRange(_) => None,
        }
    }
}
