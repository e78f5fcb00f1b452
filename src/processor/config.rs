//! Batch run configuration

use std::path::PathBuf;

use super::mode::RequestedMode;
use crate::backoff::BackoffPolicy;

/// Commit count above which auto mode samples yearly instead of fetching the
/// full history
pub const DEFAULT_COMMIT_THRESHOLD: u64 = 1000;

/// Options controlling one batch run
#[derive(Debug, Clone)]
pub struct ProcessorOptions {
    /// Directory all commit tables and error tables are written under
    pub output_dir: PathBuf,
    /// Mode requested for the whole run
    pub requested: RequestedMode,
    /// Auto-mode commit threshold
    pub commit_threshold: u64,
    /// Whether to inspect prior output and skip completed work
    pub resume: bool,
    /// Optional cap on commits per repository in full mode
    pub max_commits: Option<usize>,
    /// Retry policy applied to every remote call
    pub backoff: BackoffPolicy,
}

impl ProcessorOptions {
    /// Options with defaults: auto mode, resume on, no commit cap
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            requested: RequestedMode::Auto,
            commit_threshold: DEFAULT_COMMIT_THRESHOLD,
            resume: true,
            max_commits: None,
            backoff: BackoffPolicy::default(),
        }
    }

    /// Set the requested fetch mode
    pub fn with_mode(mut self, requested: RequestedMode) -> Self {
        self.requested = requested;
        self
    }

    /// Set the auto-mode commit threshold
    pub fn with_commit_threshold(mut self, threshold: u64) -> Self {
        self.commit_threshold = threshold;
        self
    }

    /// Enable or disable resume
    pub fn with_resume(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }

    /// Cap the number of commits fetched per repository in full mode
    pub fn with_max_commits(mut self, max_commits: Option<usize>) -> Self {
        self.max_commits = max_commits;
        self
    }

    /// Replace the retry policy
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }
}
