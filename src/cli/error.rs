//! CLI error types and conversions

use crate::downloader::RunError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Run error
    #[error("run error: {0}")]
    RunError(#[from] RunError),

    /// Report could not be serialized
    #[error("output error: {0}")]
    OutputError(#[from] serde_json::Error),
}
