//! Scripted in-memory platform adapter for orchestration tests

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use commit_tracker::fetcher::{
    CommitEntry, FetcherError, FetcherResult, PlatformFetcher, Resolved, Window,
};
use commit_tracker::Platform;

/// Remote-call counters shared between the test and the adapter it scripted
#[derive(Debug, Default)]
pub struct CallLog {
    resolve: AtomicUsize,
    list: AtomicUsize,
    listed_repos: Mutex<Vec<String>>,
}

impl CallLog {
    pub fn resolve_calls(&self) -> usize {
        self.resolve.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.resolve_calls() + self.list_calls()
    }

    /// Identifiers passed to `list_commits`, in call order
    pub fn listed_repos(&self) -> Vec<String> {
        self.listed_repos.lock().unwrap().clone()
    }
}

enum Script {
    History(Vec<CommitEntry>),
    NotFound,
    RateLimited,
    Redirect {
        to: String,
        entries: Option<Vec<CommitEntry>>,
    },
}

/// A platform adapter that serves a fixed commit history (or a fixed error)
/// and counts the remote calls made against it.
pub struct MockPlatform {
    platform: Platform,
    script: Script,
    created: DateTime<Utc>,
    commit_count: Option<u64>,
    calls: Arc<CallLog>,
}

/// Commit entry with the given RFC 3339 date
pub fn entry(date: &str, message: &str, sha: &str) -> CommitEntry {
    CommitEntry {
        date: date.to_string(),
        message: message.to_string(),
        sha: sha.to_string(),
        author: "Alice".to_string(),
    }
}

fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

impl MockPlatform {
    /// Adapter serving the given history; creation date is the earliest entry
    pub fn with_history(platform: Platform, entries: Vec<CommitEntry>) -> Self {
        let created = entries
            .iter()
            .filter_map(|e| parse_date(&e.date))
            .min()
            .unwrap_or_else(|| Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        Self {
            platform,
            script: Script::History(entries),
            created,
            commit_count: None,
            calls: Arc::new(CallLog::default()),
        }
    }

    /// Adapter that answers every call with a 404
    pub fn not_found(platform: Platform) -> Self {
        Self {
            platform,
            script: Script::NotFound,
            created: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            commit_count: None,
            calls: Arc::new(CallLog::default()),
        }
    }

    /// Adapter that answers every call with a rate-limit error
    pub fn rate_limited(platform: Platform) -> Self {
        Self {
            platform,
            script: Script::RateLimited,
            created: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            commit_count: None,
            calls: Arc::new(CallLog::default()),
        }
    }

    /// Adapter whose repository moved to `to`; the new location serves the
    /// given history
    pub fn redirected(platform: Platform, to: &str, entries: Vec<CommitEntry>) -> Self {
        let created = entries
            .iter()
            .filter_map(|e| parse_date(&e.date))
            .min()
            .unwrap_or_else(|| Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        Self {
            platform,
            script: Script::Redirect {
                to: to.to_string(),
                entries: Some(entries),
            },
            created,
            commit_count: None,
            calls: Arc::new(CallLog::default()),
        }
    }

    /// Adapter whose repository moved to `to` but 404s on every fetch there
    pub fn redirected_then_not_found(platform: Platform, to: &str) -> Self {
        Self {
            platform,
            script: Script::Redirect {
                to: to.to_string(),
                entries: None,
            },
            created: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            commit_count: None,
            calls: Arc::new(CallLog::default()),
        }
    }

    /// Override the reported commit count, independent of the history length
    pub fn with_commit_count(mut self, count: u64) -> Self {
        self.commit_count = Some(count);
        self
    }

    /// Shared handle to this adapter's call counters
    pub fn call_log(&self) -> Arc<CallLog> {
        Arc::clone(&self.calls)
    }

    fn scripted_error(&self) -> Option<FetcherError> {
        match self.script {
            Script::History(_) | Script::Redirect { .. } => None,
            Script::NotFound => Some(FetcherError::NotFound),
            Script::RateLimited => Some(FetcherError::RateLimited { retry_after: None }),
        }
    }
}

#[async_trait]
impl PlatformFetcher for MockPlatform {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn supports_bucketed(&self) -> bool {
        true
    }

    async fn resolve_canonical(&self, repo: &str) -> FetcherResult<Resolved> {
        self.calls.resolve.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Redirect { to, .. } => Ok(Resolved {
                identifier: to.clone(),
                redirected: true,
            }),
            _ => match self.scripted_error() {
                Some(error) => Err(error),
                None => Ok(Resolved::direct(repo)),
            },
        }
    }

    async fn creation_date(&self, _repo: &str) -> FetcherResult<DateTime<Utc>> {
        match self.scripted_error() {
            Some(error) => Err(error),
            None => Ok(self.created),
        }
    }

    async fn commit_count(&self, _repo: &str) -> FetcherResult<u64> {
        if let Some(count) = self.commit_count {
            return Ok(count);
        }
        match &self.script {
            Script::History(entries)
            | Script::Redirect {
                entries: Some(entries),
                ..
            } => Ok(entries.len() as u64),
            Script::Redirect { entries: None, .. } => Err(FetcherError::NotFound),
            _ => Err(self.scripted_error().unwrap()),
        }
    }

    async fn list_commits(
        &self,
        repo: &str,
        window: Option<Window>,
        limit: Option<usize>,
    ) -> FetcherResult<Vec<CommitEntry>> {
        self.calls.list.fetch_add(1, Ordering::SeqCst);
        self.calls
            .listed_repos
            .lock()
            .unwrap()
            .push(repo.to_string());
        let entries = match &self.script {
            Script::History(entries)
            | Script::Redirect {
                entries: Some(entries),
                ..
            } => entries,
            Script::Redirect { entries: None, .. } => return Err(FetcherError::NotFound),
            _ => return Err(self.scripted_error().unwrap()),
        };

        let mut matched: Vec<CommitEntry> = entries
            .iter()
            .filter(|e| match window {
                Some((start, end)) => parse_date(&e.date)
                    .map(|d| d >= start && d <= end)
                    .unwrap_or(false),
                None => true,
            })
            .cloned()
            .collect();

        if let Some(limit) = limit {
            matched.truncate(limit);
        }
        Ok(matched)
    }
}
