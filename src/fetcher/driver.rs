//! Mode-specific fetch drivers, generic over [`PlatformFetcher`]
//!
//! Full mode pulls the complete history plus supplementary release/tag
//! records. Bucketed modes partition the repository's lifetime into calendar
//! buckets and issue one `limit=1` windowed query per bucket, skipping buckets
//! already present in prior output. Every remote call goes through the backoff
//! executor; a single bucket's terminal failure never aborts the remaining
//! buckets.

use chrono::{DateTime, Datelike, Utc};
use std::collections::BTreeSet;
use tracing::{error, info, warn};

use super::{FetcherError, PlatformFetcher, Window};
use crate::backoff::{BackoffError, BackoffPolicy};
use crate::buckets::{monthly_buckets, yearly_buckets, TimeBucket};
use crate::{CommitRecord, FetchMode};

/// Successful fetch result for one repository on one platform
#[derive(Debug)]
pub struct FetchReport {
    /// Records ready to be written, in fetch order
    pub records: Vec<CommitRecord>,
    /// Whether redirect resolution rewrote the repository identifier
    pub redirected: bool,
}

/// Terminal fetch failure, carrying whether a redirect had been resolved
/// before the failure occurred
#[derive(Debug)]
pub struct FetchFailure {
    /// The error that ended the fetch
    pub error: FetcherError,
    /// Whether redirect resolution rewrote the repository identifier
    pub redirected: bool,
}

/// Collapse backoff wrapping into the fetcher error taxonomy, keeping the
/// retries-exhausted case distinct from the underlying rate-limit error.
fn flatten(err: BackoffError<FetcherError>) -> FetcherError {
    match err {
        BackoffError::Inner(e) => e,
        BackoffError::RetriesExhausted { attempts, source } => FetcherError::RetriesExhausted {
            attempts,
            message: source.to_string(),
        },
    }
}

/// Fetch the platform's full ordered history plus release/tag records.
///
/// Supplementary-record failures are logged and ignored; the commit history
/// already in hand is still returned.
pub async fn fetch_full(
    fetcher: &dyn PlatformFetcher,
    policy: &BackoffPolicy,
    item_name: &str,
    repo: &str,
    max_commits: Option<usize>,
) -> Result<FetchReport, FetchFailure> {
    let resolved = policy
        .execute(move || fetcher.resolve_canonical(repo))
        .await
        .map_err(|e| FetchFailure {
            error: flatten(e),
            redirected: false,
        })?;
    let redirected = resolved.redirected;
    let target = resolved.identifier.as_str();

    let commits = policy
        .execute(move || fetcher.list_commits(target, None, max_commits))
        .await
        .map_err(|e| FetchFailure {
            error: flatten(e),
            redirected,
        })?;

    let mut records: Vec<CommitRecord> = commits
        .into_iter()
        .map(|entry| entry.into_record(item_name, None))
        .collect();

    match policy
        .execute(move || fetcher.list_supplementary(target))
        .await
    {
        Ok(extra) => {
            records.extend(extra.into_iter().map(|e| e.into_record(item_name, None)));
        }
        Err(e) => {
            warn!(
                platform = %fetcher.platform(),
                repo = target,
                error = %flatten(e),
                "Failed to fetch supplementary records, keeping commits"
            );
        }
    }

    info!(
        platform = %fetcher.platform(),
        repo = target,
        records = records.len(),
        "Full fetch complete"
    );
    Ok(FetchReport { records, redirected })
}

/// Fetch at most one commit per calendar bucket over the repository lifetime.
///
/// `range` optionally narrows the covered span; its start is clamped to the
/// repository creation date and its end defaults to now. Buckets listed in
/// `done` were satisfied by a prior run and are not re-queried.
pub async fn fetch_bucketed(
    fetcher: &dyn PlatformFetcher,
    policy: &BackoffPolicy,
    item_name: &str,
    repo: &str,
    mode: FetchMode,
    range: Option<Window>,
    done: &BTreeSet<TimeBucket>,
) -> Result<FetchReport, FetchFailure> {
    if mode == FetchMode::Full {
        return Err(FetchFailure {
            error: FetcherError::Unsupported("full mode is not bucketed"),
            redirected: false,
        });
    }

    let resolved = policy
        .execute(move || fetcher.resolve_canonical(repo))
        .await
        .map_err(|e| FetchFailure {
            error: flatten(e),
            redirected: false,
        })?;
    let redirected = resolved.redirected;
    let target = resolved.identifier.as_str();

    let created = policy
        .execute(move || fetcher.creation_date(target))
        .await
        .map_err(|e| FetchFailure {
            error: flatten(e),
            redirected,
        })?;

    let (start, end) = span(created, range);
    let buckets = match mode {
        FetchMode::Yearly => yearly_buckets(start.year(), end.year()),
        FetchMode::Monthly => monthly_buckets(start, end),
        FetchMode::Full => unreachable!(),
    };

    info!(
        platform = %fetcher.platform(),
        repo = target,
        mode = %mode,
        buckets = buckets.len(),
        already_done = done.len(),
        "Starting bucketed fetch"
    );

    let mut records = Vec::new();
    for bucket in buckets {
        if done.contains(&bucket) {
            continue;
        }
        let Some(window) = bucket.window() else {
            continue;
        };

        match policy
            .execute(move || fetcher.list_commits(target, Some(window), Some(1)))
            .await
        {
            Ok(entries) => {
                if let Some(entry) = entries.into_iter().next() {
                    records.push(entry.into_record(item_name, Some(&bucket)));
                }
            }
            Err(e) => {
                // One bucket failing must not abort the rest of the range.
                error!(
                    platform = %fetcher.platform(),
                    repo = target,
                    year = bucket.year,
                    month = bucket.month,
                    error = %flatten(e),
                    "Bucket query failed, continuing with next bucket"
                );
            }
        }
    }

    info!(
        platform = %fetcher.platform(),
        repo = target,
        records = records.len(),
        "Bucketed fetch complete"
    );
    Ok(FetchReport { records, redirected })
}

/// Covered span: creation date (or later requested start) through now (or
/// requested end)
fn span(created: DateTime<Utc>, range: Option<Window>) -> Window {
    match range {
        Some((start, end)) => (start.max(created), end),
        None => (created, Utc::now()),
    }
}
