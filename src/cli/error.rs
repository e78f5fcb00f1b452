//! CLI error types and conversions

use crate::fetcher::FetcherError;
use crate::input::InputError;
use crate::output::OutputError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Input table error
    #[error("input error: {0}")]
    InputError(#[from] InputError),

    /// Fetcher construction error
    #[error("fetcher error: {0}")]
    FetcherError(#[from] FetcherError),

    /// Output error
    #[error("output error: {0}")]
    OutputError(#[from] OutputError),

    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
