//! Shared HTTP client construction
//!
//! A single `reqwest::Client` owns the connection pool for a whole run. It is
//! cheap to clone and safe to use from every in-flight request at once, so
//! the executor builds one and hands it to the fetcher.

use reqwest::Client;
use std::time::Duration;

use crate::fetcher::{FetcherError, FetcherResult};

/// HTTP connect timeout (seconds) - time to establish TCP connection
pub const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Default HTTP request timeout (seconds) - overall time for the entire request
pub const HTTP_REQUEST_TIMEOUT_SECS: u64 = 30;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Build the pooled HTTP client used for every snapshot request
pub fn build_http_client(request_timeout: Duration) -> FetcherResult<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS).min(request_timeout))
        .timeout(request_timeout)
        .build()
        .map_err(|e| {
            FetcherError::Configuration(format!(
                "failed to build HTTP client: {e}. Check system TLS configuration."
            ))
        })
}

/// Default per-request timeout
pub fn default_request_timeout() -> Duration {
    Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS)
}
