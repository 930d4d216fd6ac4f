//! HTTP snapshot fetcher for the central-bank daily rates feed
//!
//! Issues `GET <base-url>?date_req=DD/MM/YYYY` and returns the body bytes.
//! Retries are off by default; when enabled they are bounded and only
//! applied to network failures.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

use crate::downloader::config::{calculate_backoff, INITIAL_BACKOFF_MS};
use crate::fetcher::{FetcherError, FetcherResult, SnapshotFetcher};
use crate::window::format_date;
use crate::{CalendarDate, RawSnapshot};

/// Default upstream endpoint
pub const DEFAULT_BASE_URL: &str = "http://www.cbr.ru/scripts/XML_daily_eng.asp";

/// Name of the query parameter carrying the requested day
pub const DATE_QUERY_PARAM: &str = "date_req";

/// HTTP client for daily rate snapshots
#[derive(Debug, Clone)]
pub struct CbrHttpClient {
    client: Client,
    base_url: String,
    max_retries: u32,
    initial_backoff: Duration,
}

impl CbrHttpClient {
    /// Create a new snapshot client
    ///
    /// # Arguments
    /// * `client` - Shared HTTP client (clones share one connection pool)
    /// * `base_url` - Endpoint URL without the date query
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            max_retries: 0,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        }
    }

    /// Set the number of retries after a network failure (0 disables retrying)
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the delay before the first retry; later retries double it
    pub fn with_initial_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    /// Configured retry count
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Full request URL for one day
    pub fn snapshot_url(&self, date: CalendarDate) -> String {
        let separator = if self.base_url.contains('?') { '&' } else { '?' };
        format!(
            "{}{}{}={}",
            self.base_url,
            separator,
            DATE_QUERY_PARAM,
            format_date(date)
        )
    }

    /// Execute one GET and read the whole body
    async fn request_once(&self, url: &str) -> Result<RawSnapshot, AttemptFailure> {
        let response = self.client.get(url).send().await.map_err(|e| AttemptFailure {
            error: FetcherError::Network(describe_transport_error(&e)),
            retryable: true,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AttemptFailure {
                error: FetcherError::Network(format!("HTTP status {status} from {url}")),
                retryable: status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS,
            });
        }

        response.bytes().await.map_err(|e| AttemptFailure {
            error: FetcherError::Network(format!("failed to read body from {url}: {e}")),
            retryable: true,
        })
    }

    /// Retry loop around [`Self::request_once`]
    ///
    /// Retries on:
    /// - transport errors (timeout, connection refused)
    /// - 5xx server errors and 429
    ///
    /// Does not retry on other 4xx responses.
    async fn request_with_retry(&self, url: &str) -> FetcherResult<RawSnapshot> {
        let mut attempt = 0;

        loop {
            match self.request_once(url).await {
                Ok(body) => {
                    debug!(url, attempt = attempt + 1, bytes = body.len(), "snapshot received");
                    return Ok(body);
                }
                Err(failure) if failure.retryable && attempt < self.max_retries => {
                    let backoff = calculate_backoff(self.initial_backoff, attempt);
                    warn!(
                        "Network error on attempt {}/{}: {}; retrying after {:?}",
                        attempt + 1,
                        self.max_retries + 1,
                        failure.error,
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(failure) => return Err(failure.error),
            }
        }
    }
}

/// Outcome of a single failed attempt
struct AttemptFailure {
    error: FetcherError,
    retryable: bool,
}

#[async_trait]
impl SnapshotFetcher for CbrHttpClient {
    async fn fetch(&self, date: CalendarDate) -> FetcherResult<RawSnapshot> {
        let url = self.snapshot_url(date);
        debug!("Making GET request to: {}", url);
        self.request_with_retry(&url).await
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn describe_transport_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("request timed out: {error}")
    } else if error.is_connect() {
        format!("connection failed: {error}")
    } else {
        error.to_string()
    }
}
