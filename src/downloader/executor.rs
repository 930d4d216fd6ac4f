//! Snapshot executor: window → fetch + parse per day → merge in date order

use crate::aggregator::{AggregateReport, Aggregator};
use crate::downloader::config::{FailurePolicy, RunConfig, ScheduleMode};
use crate::downloader::RunError;
use crate::fetcher::shared_resources::build_http_client;
use crate::fetcher::{CbrHttpClient, FetcherResult, SnapshotFetcher};
use crate::window::{self, format_date};
use crate::{CalendarDate, CurrencyRecord};
use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Executor orchestrates a complete run
pub struct SnapshotExecutor {
    fetcher: Arc<dyn SnapshotFetcher>,
    mode: ScheduleMode,
    max_concurrency: Option<usize>,
    failure_policy: FailurePolicy,
    progress: Option<ProgressBar>,
}

impl SnapshotExecutor {
    /// Create an executor over any snapshot source, with default options
    pub fn new(fetcher: Arc<dyn SnapshotFetcher>) -> Self {
        Self {
            fetcher,
            mode: ScheduleMode::default(),
            max_concurrency: None,
            failure_policy: FailurePolicy::default(),
            progress: None,
        }
    }

    /// Create an executor backed by the HTTP fetcher described by `config`
    ///
    /// One pooled HTTP client is built here and shared by every request of
    /// the run.
    pub fn from_config(config: RunConfig) -> Result<Self, RunError> {
        let client = build_http_client(config.request_timeout)?;
        let fetcher =
            CbrHttpClient::new(client, config.base_url).with_max_retries(config.max_retries);

        Ok(Self::new(Arc::new(fetcher))
            .with_mode(config.mode)
            .with_max_concurrency(config.max_concurrency)
            .with_failure_policy(config.failure_policy))
    }

    /// Set scheduling mode
    pub fn with_mode(mut self, mode: ScheduleMode) -> Self {
        self.mode = mode;
        self
    }

    /// Cap in-flight requests in concurrent mode; `None` means one per day
    pub fn with_max_concurrency(mut self, max_concurrency: Option<usize>) -> Self {
        self.max_concurrency = max_concurrency.filter(|n| *n > 0);
        self
    }

    /// Set behaviour on a failing day
    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    /// Report per-day progress on a progress bar
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Fetch every day after `start` for `period` days and aggregate the results
    ///
    /// # Errors
    /// - `RunError::InvalidRange` if `period` is negative (no request is made)
    /// - `RunError::Snapshot` for the first failing day under [`FailurePolicy::Abort`]
    pub async fn run(&self, start: CalendarDate, period: i64) -> Result<AggregateReport, RunError> {
        let dates = window::generate(start, period)?;
        let started = Instant::now();

        info!(
            start = %format_date(start),
            days = dates.len(),
            mode = %self.mode,
            policy = %self.failure_policy,
            base_url = self.fetcher.base_url(),
            "Starting snapshot run"
        );

        if let Some(progress) = &self.progress {
            progress.set_length(dates.len() as u64);
        }

        let mut aggregator = Aggregator::new();
        match self.mode {
            ScheduleMode::Sequential => self.run_sequential(&dates, &mut aggregator).await?,
            ScheduleMode::Concurrent => self.run_concurrent(&dates, &mut aggregator).await?,
        }

        let report = aggregator.finish();
        info!(
            currencies = report.len(),
            skipped = report.skipped().len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Snapshot run completed"
        );

        Ok(report)
    }

    async fn run_sequential(
        &self,
        dates: &[CalendarDate],
        aggregator: &mut Aggregator,
    ) -> Result<(), RunError> {
        for &date in dates {
            let outcome = self.fetcher.fetch_records(date).await;
            if let Some(records) = self.settle(aggregator, date, outcome)? {
                merge_batch(aggregator, date, records);
            }
        }
        Ok(())
    }

    /// Fetch and parse concurrently, merge on this task.
    ///
    /// Results are taken as they complete, so the first failure ends the run
    /// at once and drops every request still in flight. Successful batches
    /// are held until the stream is drained and then merged in date order.
    async fn run_concurrent(
        &self,
        dates: &[CalendarDate],
        aggregator: &mut Aggregator,
    ) -> Result<(), RunError> {
        let limit = self.concurrency_limit(dates.len());
        debug!(limit, "Dispatching snapshot requests");

        let mut results = stream::iter(dates.iter().copied())
            .map(|date| {
                let fetcher = Arc::clone(&self.fetcher);
                async move { (date, fetcher.fetch_records(date).await) }
            })
            .buffer_unordered(limit);

        let mut completed = BTreeMap::new();
        while let Some((date, outcome)) = results.next().await {
            if let Some(records) = self.settle(aggregator, date, outcome)? {
                completed.insert(date, records);
            }
        }

        for (date, records) in completed {
            merge_batch(aggregator, date, records);
        }

        Ok(())
    }

    fn concurrency_limit(&self, days: usize) -> usize {
        let unbounded = days.max(1);
        self.max_concurrency.map_or(unbounded, |cap| cap.min(unbounded))
    }

    /// Apply the failure policy to one day's outcome
    ///
    /// Returns the records to merge, `None` for a skipped day, or the error
    /// that ends the run.
    fn settle(
        &self,
        aggregator: &mut Aggregator,
        date: CalendarDate,
        outcome: FetcherResult<Vec<CurrencyRecord>>,
    ) -> Result<Option<Vec<CurrencyRecord>>, RunError> {
        if let Some(progress) = &self.progress {
            progress.inc(1);
        }

        match outcome {
            Ok(records) => Ok(Some(records)),
            Err(source) => match self.failure_policy {
                FailurePolicy::Abort => Err(RunError::Snapshot { date, source }),
                FailurePolicy::Skip => {
                    warn!("Skipping {}: {}", format_date(date), source);
                    aggregator.skip(date, source.to_string());
                    Ok(None)
                }
            },
        }
    }
}

/// Single merge point for both scheduling modes; callers go in date order
fn merge_batch(aggregator: &mut Aggregator, date: CalendarDate, records: Vec<CurrencyRecord>) {
    debug!(date = %format_date(date), records = records.len(), "Merging snapshot");
    aggregator.merge(records);
}
