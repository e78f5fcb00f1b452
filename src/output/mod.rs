//! CSV output writers and the append-only error sink
//!
//! Commit tables are written whole, one file per repository/platform/mode.
//! Error tables are append-only audit logs, one per platform per run
//! directory, created with a header on first write and never truncated.

use chrono::Utc;

use crate::backoff::RetryClass;
use crate::fetcher::FetcherError;
use crate::Platform;

pub mod csv;

pub use csv::{append_commits, write_commits, ErrorSink};

/// Output errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// Filesystem failure creating or writing a table
    #[error("IO error: {0}")]
    Io(String),

    /// CSV serialization failure
    #[error("CSV error: {0}")]
    Csv(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Classified failure category recorded in error rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Repository permanently unreachable at the given identifier
    NotFound,
    /// Rate limiting, including exhausted retry budgets
    RateLimit,
    /// Redirect that could not be resolved to a canonical location
    Redirect,
    /// Anything else
    Other,
}

impl ErrorKind {
    /// Label written to the error table
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::RateLimit => "rate_limit",
            ErrorKind::Redirect => "redirect",
            ErrorKind::Other => "other",
        }
    }

    /// Classify a fetcher error into a sink category
    pub fn classify(error: &FetcherError) -> Self {
        match error {
            FetcherError::NotFound => ErrorKind::NotFound,
            FetcherError::UnresolvedRedirect(_) => ErrorKind::Redirect,
            FetcherError::RetriesExhausted { .. } => ErrorKind::RateLimit,
            e if e.is_rate_limit() => ErrorKind::RateLimit,
            _ => ErrorKind::Other,
        }
    }
}

/// One append-only failure row
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    /// Human-readable repository name from the input row
    pub item_name: String,
    /// Platform the failure occurred on
    pub platform: Platform,
    /// Repository identifier as given in the input
    pub repository: String,
    /// Error message
    pub error: String,
    /// When the failure was recorded, RFC 3339
    pub timestamp: String,
    /// Classified failure category
    pub kind: ErrorKind,
    /// HTTP status when the error carried one
    pub status: Option<u16>,
    /// Whether a redirect had been resolved before the failure
    pub redirected: bool,
}

impl ErrorRecord {
    /// Build an error row from a terminal fetcher error
    pub fn from_fetch_error(
        item_name: &str,
        platform: Platform,
        repository: &str,
        error: &FetcherError,
        redirected: bool,
    ) -> Self {
        let status = match error {
            FetcherError::Http { status, .. } => Some(*status),
            FetcherError::NotFound => Some(404),
            FetcherError::RateLimited { .. } => Some(429),
            _ => None,
        };
        Self {
            item_name: item_name.to_string(),
            platform,
            repository: repository.to_string(),
            error: error.to_string(),
            timestamp: Utc::now().to_rfc3339(),
            kind: ErrorKind::classify(error),
            status,
            redirected,
        }
    }

    /// Build an error row for a failed table write
    pub fn from_output_error(
        item_name: &str,
        platform: Platform,
        repository: &str,
        error: &OutputError,
        redirected: bool,
    ) -> Self {
        Self {
            item_name: item_name.to_string(),
            platform,
            repository: repository.to_string(),
            error: error.to_string(),
            timestamp: Utc::now().to_rfc3339(),
            kind: ErrorKind::Other,
            status: None,
            redirected,
        }
    }
}
