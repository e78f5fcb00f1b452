//! Batch executor
//!
//! Walks the input batch sequentially, repository by repository and platform
//! by platform, selecting a fetch mode, consulting prior output when resume
//! is on, and writing commit tables and error rows. A failed platform task
//! records an error row and moves on; nothing aborts the batch, write
//! failures included.

use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

use super::config::ProcessorOptions;
use super::mode::{select_mode, RequestedMode};
use crate::buckets::TimeBucket;
use crate::fetcher::driver::{fetch_bucketed, fetch_full, FetchFailure};
use crate::fetcher::PlatformFetcher;
use crate::output::{append_commits, write_commits, ErrorRecord, ErrorSink};
use crate::resume::{output_exists, processed_buckets};
use crate::{FetchMode, Platform, RepositoryDescriptor};

/// Configured platform adapters, one optional slot per platform.
///
/// A platform without credentials (or deliberately disabled) has an empty
/// slot and its identifiers are skipped with a warning.
#[derive(Default)]
pub struct PlatformSet {
    /// GitHub repository adapter
    pub github: Option<Box<dyn PlatformFetcher>>,
    /// GitHub Gist adapter
    pub gist: Option<Box<dyn PlatformFetcher>>,
    /// GitLab project adapter
    pub gitlab: Option<Box<dyn PlatformFetcher>>,
    /// Bitbucket repository adapter
    pub bitbucket: Option<Box<dyn PlatformFetcher>>,
}

impl PlatformSet {
    fn get(&self, platform: Platform) -> Option<&dyn PlatformFetcher> {
        match platform {
            Platform::GitHub => self.github.as_deref(),
            Platform::Gist => self.gist.as_deref(),
            Platform::GitLab => self.gitlab.as_deref(),
            Platform::Bitbucket => self.bitbucket.as_deref(),
        }
    }
}

/// Counts of per-platform tasks by outcome for one batch run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    /// Tasks that wrote at least one new output row
    pub written: usize,
    /// Tasks skipped by resume or that produced nothing new
    pub skipped: usize,
    /// Tasks that ended with an error row
    pub failed: usize,
}

/// Outcome of one repository/platform task
enum TaskOutcome {
    Written(usize),
    Skipped,
    Empty,
    Failed,
}

/// Batch orchestrator
pub struct Processor {
    platforms: PlatformSet,
    options: ProcessorOptions,
}

impl Processor {
    /// Processor over the given adapters and options
    pub fn new(platforms: PlatformSet, options: ProcessorOptions) -> Self {
        Self { platforms, options }
    }

    /// Process the whole batch in input order.
    ///
    /// Within a repository, platforms run in the fixed order GitHub, Gist,
    /// GitLab, Bitbucket. Failures of any kind are recorded and counted;
    /// the batch always runs to completion.
    pub async fn run(&self, repos: &[RepositoryDescriptor]) -> BatchSummary {
        let progress = ProgressBar::new(repos.len() as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        let mut summary = BatchSummary::default();
        for repo in repos {
            progress.set_message(repo.item_name.clone());

            for platform in [
                Platform::GitHub,
                Platform::Gist,
                Platform::GitLab,
                Platform::Bitbucket,
            ] {
                let Some(identifier) = repo.identifier_for(platform) else {
                    continue;
                };
                let Some(fetcher) = self.platforms.get(platform) else {
                    warn!(
                        item = %repo.item_name,
                        %platform,
                        "Platform not configured, skipping identifier"
                    );
                    continue;
                };

                match self.process_one(fetcher, repo, identifier).await {
                    TaskOutcome::Written(rows) => {
                        debug!(item = %repo.item_name, %platform, rows, "Task written");
                        summary.written += 1;
                    }
                    TaskOutcome::Skipped | TaskOutcome::Empty => summary.skipped += 1,
                    TaskOutcome::Failed => summary.failed += 1,
                }
            }

            progress.inc(1);
        }
        progress.finish_with_message("done");

        info!(
            written = summary.written,
            skipped = summary.skipped,
            failed = summary.failed,
            "Batch complete"
        );
        summary
    }

    async fn process_one(
        &self,
        fetcher: &dyn PlatformFetcher,
        repo: &RepositoryDescriptor,
        identifier: &str,
    ) -> TaskOutcome {
        let platform = fetcher.platform();
        let mode = self.mode_for(fetcher, identifier).await;
        let path = self.output_path(&repo.item_name, platform, mode);

        // Coarse resume: a completed non-monthly table is final.
        if self.options.resume && mode != FetchMode::Monthly && output_exists(&path) {
            info!(
                item = %repo.item_name,
                %platform,
                %mode,
                path = %path.display(),
                "Output exists, skipping"
            );
            return TaskOutcome::Skipped;
        }

        // Monthly resume is refined per bucket: already-covered months are
        // excluded from the query set and new rows are appended.
        let done: BTreeSet<TimeBucket> = if self.options.resume && mode == FetchMode::Monthly {
            processed_buckets(&path)
        } else {
            BTreeSet::new()
        };

        let result = match mode {
            FetchMode::Full => {
                fetch_full(
                    fetcher,
                    &self.options.backoff,
                    &repo.item_name,
                    identifier,
                    self.options.max_commits,
                )
                .await
            }
            FetchMode::Yearly | FetchMode::Monthly => {
                fetch_bucketed(
                    fetcher,
                    &self.options.backoff,
                    &repo.item_name,
                    identifier,
                    mode,
                    None,
                    &done,
                )
                .await
            }
        };

        let report = match result {
            Ok(report) => report,
            Err(FetchFailure { error, redirected }) => {
                warn!(
                    item = %repo.item_name,
                    %platform,
                    repo = identifier,
                    error = %error,
                    "Fetch failed"
                );
                let record = ErrorRecord::from_fetch_error(
                    &repo.item_name,
                    platform,
                    identifier,
                    &error,
                    redirected,
                );
                self.record_failure(platform, &record);
                return TaskOutcome::Failed;
            }
        };

        if report.records.is_empty() {
            if !done.is_empty() {
                info!(
                    item = %repo.item_name,
                    %platform,
                    "All months already covered, nothing new"
                );
                return TaskOutcome::Skipped;
            }
            warn!(item = %repo.item_name, %platform, "No commits found");
            return TaskOutcome::Empty;
        }

        let written = if mode == FetchMode::Monthly && !done.is_empty() {
            append_commits(&path, &report.records)
        } else {
            write_commits(&path, &report.records)
        };

        match written {
            Ok(rows) => TaskOutcome::Written(rows),
            Err(e) => {
                error!(
                    item = %repo.item_name,
                    %platform,
                    path = %path.display(),
                    error = %e,
                    "Failed to write commit table"
                );
                let record = ErrorRecord::from_output_error(
                    &repo.item_name,
                    platform,
                    identifier,
                    &e,
                    report.redirected,
                );
                self.record_failure(platform, &record);
                TaskOutcome::Failed
            }
        }
    }

    /// Append a failure row, logging if the sink itself is unwritable.
    ///
    /// A sink failure must not abort the batch either; the tracing log is the
    /// fallback audit trail.
    fn record_failure(&self, platform: Platform, record: &ErrorRecord) {
        if let Err(e) = self.error_sink(platform).append(record) {
            error!(%platform, error = %e, "Failed to append error row");
        }
    }

    /// Fetch mode for one platform task.
    ///
    /// Platforms without windowed queries are always fetched in full. GitHub
    /// honors the requested mode with auto selection; GitLab supports monthly
    /// sampling but has no yearly path, so anything else becomes a full fetch.
    async fn mode_for(&self, fetcher: &dyn PlatformFetcher, identifier: &str) -> FetchMode {
        if !fetcher.supports_bucketed() {
            return FetchMode::Full;
        }
        match fetcher.platform() {
            Platform::GitHub => {
                select_mode(
                    fetcher,
                    identifier,
                    self.options.requested,
                    self.options.commit_threshold,
                )
                .await
            }
            _ if self.options.requested == RequestedMode::Monthly => FetchMode::Monthly,
            _ => FetchMode::Full,
        }
    }

    /// Destination path for one repository/platform/mode table
    fn output_path(&self, item_name: &str, platform: Platform, mode: FetchMode) -> PathBuf {
        let dir = &self.options.output_dir;
        match (platform, mode) {
            (Platform::GitHub, FetchMode::Full) => dir.join(format!("{item_name}.csv")),
            (Platform::GitHub, FetchMode::Yearly) => dir.join(format!("{item_name}_yearly.csv")),
            (Platform::GitHub, FetchMode::Monthly) => dir
                .join("monthly")
                .join(format!("{item_name}_github_monthly.csv")),
            (Platform::Gist, _) => dir.join(format!("{item_name}_gist.csv")),
            (Platform::GitLab, FetchMode::Monthly) => dir
                .join("monthly")
                .join(format!("{item_name}_gitlab_monthly.csv")),
            (Platform::GitLab, _) => dir.join(format!("{item_name}_gitlab.csv")),
            (Platform::Bitbucket, _) => dir.join(format!("{item_name}_bitbucket.csv")),
        }
    }

    /// Append-only error table for one platform
    fn error_sink(&self, platform: Platform) -> ErrorSink {
        ErrorSink::new(
            self.options
                .output_dir
                .join("errors")
                .join(format!("{platform}_errors.csv")),
        )
    }
}
