//! Platform fetch adapters
//!
//! Each platform implements one capability trait ([`PlatformFetcher`]) instead
//! of a per-platform-per-mode module, so redirect handling, windowed queries,
//! and supplementary records share a single shape. The mode-specific fetch
//! logic lives in [`driver`] and is generic over the trait.

use crate::backoff::RetryClass;
use crate::buckets::TimeBucket;
use crate::{CommitRecord, Platform};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub mod bitbucket;
pub mod driver;
pub mod gist;
pub mod github;
pub mod gitlab;
pub mod http;

/// Fetcher errors, classified so the backoff executor and the error sink can
/// act on kind rather than message text.
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// HTTP 429 from the platform, with the Retry-After hint when present
    #[error("rate limit exceeded")]
    RateLimited {
        /// Seconds to wait before retrying, from the Retry-After header
        retry_after: Option<u64>,
    },

    /// HTTP 404: the repository is permanently unreachable at this identifier
    #[error("repository not found")]
    NotFound,

    /// A redirect probe returned 3xx but no usable canonical location
    #[error("unresolved redirect: {0}")]
    UnresolvedRedirect(String),

    /// Any other non-success HTTP status
    #[error("HTTP error {status}: {message}")]
    Http {
        /// Response status code
        status: u16,
        /// Response body or status text
        message: String,
    },

    /// Transport-level failure (timeout, connection refused, DNS)
    #[error("network error: {0}")]
    Network(String),

    /// Response body did not match the expected shape
    #[error("parse error: {0}")]
    Parse(String),

    /// The platform does not support this operation
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// The repository identifier is not in the form the platform expects
    #[error("invalid repository identifier: {0}")]
    InvalidIdentifier(String),

    /// The retry budget was exhausted on a rate-limited call
    #[error("retries exhausted after {attempts} attempts: {message}")]
    RetriesExhausted {
        /// Total attempts made, including the first
        attempts: u32,
        /// The last rate-limit error observed
        message: String,
    },
}

impl RetryClass for FetcherError {
    fn is_rate_limit(&self) -> bool {
        match self {
            FetcherError::RateLimited { .. } => true,
            FetcherError::Http { status: 429, .. } => true,
            // Legacy textual classification for errors the transport could not
            // type, kept from the observed upstream behavior.
            FetcherError::Http { message, .. } | FetcherError::Network(message) => {
                let lower = message.to_lowercase();
                lower.contains("rate limit")
                    || lower.contains("too many requests")
                    || lower.contains("429")
            }
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<u64> {
        match self {
            FetcherError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;

/// Inclusive UTC time window for a windowed commit query
pub type Window = (DateTime<Utc>, DateTime<Utc>);

/// Canonical repository location after redirect resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Identifier to use for all subsequent calls
    pub identifier: String,
    /// Whether a redirect was followed to obtain it
    pub redirected: bool,
}

impl Resolved {
    /// A location that needed no redirect
    pub fn direct(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            redirected: false,
        }
    }
}

/// One commit-like entry as returned by a platform, before it is tagged with
/// the repository name and bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitEntry {
    /// ISO-8601 timestamp as reported by the platform, or empty
    pub date: String,
    /// First line of the commit message or synthetic release/tag text
    pub message: String,
    /// Content hash or target commit reference
    pub sha: String,
    /// Author display name
    pub author: String,
}

impl CommitEntry {
    /// Attach the repository name and optional bucket tags
    pub fn into_record(self, item_name: &str, bucket: Option<&TimeBucket>) -> CommitRecord {
        CommitRecord {
            item_name: item_name.to_string(),
            date: self.date,
            message: self.message,
            sha: self.sha,
            author: self.author,
            year: bucket.map(TimeBucket::year_tag),
            month: bucket.and_then(TimeBucket::month_tag),
        }
    }
}

/// Keep only the first line of a multi-line commit message
pub(crate) fn first_line(message: &str) -> String {
    message.lines().next().unwrap_or_default().to_string()
}

/// Capability interface implemented by each platform adapter.
///
/// The bucketed and full fetch drivers in [`driver`] are written against this
/// trait; platforms that cannot support an operation return
/// [`FetcherError::Unsupported`].
#[async_trait]
pub trait PlatformFetcher: Send + Sync {
    /// Which platform this adapter talks to
    fn platform(&self) -> Platform;

    /// Whether windowed per-bucket queries are available
    fn supports_bucketed(&self) -> bool {
        false
    }

    /// Probe the canonical repository endpoint without following redirects,
    /// substituting the redirect target when the repository has moved.
    async fn resolve_canonical(&self, repo: &str) -> FetcherResult<Resolved>;

    /// Repository creation date, used as a safe lower bound for bucketing
    async fn creation_date(&self, _repo: &str) -> FetcherResult<DateTime<Utc>> {
        Err(FetcherError::Unsupported("creation date"))
    }

    /// Total commit count from a cheap metadata call, for mode selection
    async fn commit_count(&self, _repo: &str) -> FetcherResult<u64> {
        Err(FetcherError::Unsupported("commit count"))
    }

    /// List commits, optionally restricted to a time window and capped.
    ///
    /// Platform-native (reverse-chronological) order; windowed calls with
    /// `limit = Some(1)` request only the first page entry for that window.
    async fn list_commits(
        &self,
        repo: &str,
        window: Option<Window>,
        limit: Option<usize>,
    ) -> FetcherResult<Vec<CommitEntry>>;

    /// Release or tag records appended to full-history output
    async fn list_supplementary(&self, _repo: &str) -> FetcherResult<Vec<CommitEntry>> {
        Ok(Vec::new())
    }
}
