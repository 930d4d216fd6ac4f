//! Snapshot fetcher implementations

use crate::{CalendarDate, CurrencyRecord, RawSnapshot};
use async_trait::async_trait;

pub mod http;
pub mod shared_resources;
pub mod snapshot_parser;

pub use http::CbrHttpClient;
pub use snapshot_parser::SnapshotParser;

/// Fetcher errors
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// Transport failure, timeout, or non-2xx status
    #[error("network error: {0}")]
    Network(String),

    /// Response body is not well-formed XML
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// Well-formed XML missing expected fields or carrying an unusable rate
    #[error("parse error: {0}")]
    Parse(String),

    /// HTTP client could not be constructed
    #[error("client configuration error: {0}")]
    Configuration(String),
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;

/// Source of daily snapshots
///
/// Implementations must be safe to call concurrently: the executor issues
/// one `fetch` per day of the window, possibly all at once.
#[async_trait]
pub trait SnapshotFetcher: Send + Sync {
    /// Retrieve the raw snapshot document for one day
    async fn fetch(&self, date: CalendarDate) -> FetcherResult<RawSnapshot>;

    /// Retrieve and parse the snapshot for one day
    async fn fetch_records(&self, date: CalendarDate) -> FetcherResult<Vec<CurrencyRecord>> {
        let payload = self.fetch(date).await?;
        SnapshotParser::parse(date, &payload)
    }

    /// Base URL snapshots are requested from
    fn base_url(&self) -> &str;
}
