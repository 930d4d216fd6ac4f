//! CLI command implementation

pub mod error;
pub mod stats;

pub use error::CliError;
pub use stats::{Cli, OutputFormat};
