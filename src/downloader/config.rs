//! Run configuration constants and options

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::fetcher::http::DEFAULT_BASE_URL;
use crate::fetcher::shared_resources::default_request_timeout;

/// Default window length in days
pub const DEFAULT_PERIOD_DAYS: i64 = 90;

/// Upper bound for the optional retry count
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// Initial backoff delay in milliseconds.
pub const INITIAL_BACKOFF_MS: u64 = 1000; // 1 second

/// Maximum backoff delay in milliseconds.
pub const MAX_BACKOFF_MS: u64 = 30000; // 30 seconds

/// Calculate exponential backoff delay: `initial * 2^retry_count`, capped
pub fn calculate_backoff(initial: Duration, retry_count: u32) -> Duration {
    let factor = 2u32.saturating_pow(retry_count);
    initial
        .saturating_mul(factor)
        .min(Duration::from_millis(MAX_BACKOFF_MS))
}

/// How per-day work is scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScheduleMode {
    /// One day at a time
    Sequential,
    /// All days dispatched together, optionally capped
    #[default]
    Concurrent,
}

impl fmt::Display for ScheduleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScheduleMode::Sequential => "sequential",
            ScheduleMode::Concurrent => "concurrent",
        };
        write!(f, "{s}")
    }
}

impl FromStr for ScheduleMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sequential" | "sync" => Ok(ScheduleMode::Sequential),
            "concurrent" | "async" => Ok(ScheduleMode::Concurrent),
            _ => Err(format!(
                "Invalid mode: {s}. Valid options: sequential, concurrent"
            )),
        }
    }
}

/// What to do when one day's snapshot fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Fail the whole run, no partial report
    #[default]
    Abort,
    /// Leave the day out, record it in the report, keep going
    Skip,
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailurePolicy::Abort => "abort",
            FailurePolicy::Skip => "skip",
        };
        write!(f, "{s}")
    }
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "abort" => Ok(FailurePolicy::Abort),
            "skip" => Ok(FailurePolicy::Skip),
            _ => Err(format!(
                "Invalid failure policy: {s}. Valid options: abort, skip"
            )),
        }
    }
}

/// Options for a run
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Snapshot endpoint
    pub base_url: String,
    /// Scheduling mode
    pub mode: ScheduleMode,
    /// Cap on in-flight requests in concurrent mode (`None` = one per day)
    pub max_concurrency: Option<usize>,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Retries after a network failure
    pub max_retries: u32,
    /// Behaviour on a failing day
    pub failure_policy: FailurePolicy,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            mode: ScheduleMode::default(),
            max_concurrency: None,
            request_timeout: default_request_timeout(),
            max_retries: 0,
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl RunConfig {
    /// Set the snapshot endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the scheduling mode
    pub fn with_mode(mut self, mode: ScheduleMode) -> Self {
        self.mode = mode;
        self
    }

    /// Cap concurrent requests; `None` or `Some(0)` leaves it unbounded
    pub fn with_max_concurrency(mut self, max_concurrency: Option<usize>) -> Self {
        self.max_concurrency = max_concurrency.filter(|n| *n > 0);
        self
    }

    /// Set the per-request timeout
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Set the retry count, clamped to [`MAX_RETRIES_LIMIT`]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.min(MAX_RETRIES_LIMIT);
        self
    }

    /// Set the failure policy
    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }
}
