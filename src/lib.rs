//! # Commit Tracker Library
//!
//! Retrieves commit-history metadata (date, author, message, SHA) from multiple
//! Git hosting platforms for a batch of repositories listed in a CSV table, and
//! persists the results as per-repository CSV output.
//!
//! ## Features
//!
//! - **Multi-Platform Support**: GitHub, GitLab, Bitbucket, and GitHub Gists
//! - **Fetch Modes**: full history, one commit per year, or one commit per month
//! - **Resume Capability**: prior output is inspected so already-fetched
//!   repositories and time buckets are skipped
//! - **Rate Limiting**: exponential backoff with jitter on rate-limit responses,
//!   honoring server-provided `Retry-After` hints
//! - **Redirect Resolution**: renamed/moved repositories are resolved before
//!   fetching and the canonical identifier is substituted
//!
//! ## Quick Start
//!
//! ```no_run
//! use commit_tracker::processor::{Processor, ProcessorOptions};
//! use commit_tracker::auth::Credentials;
//! use commit_tracker::input::read_repositories;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let repos = read_repositories("repositories.csv".as_ref())?;
//! let platforms = Credentials::from_env().platform_set()?;
//!
//! let options = ProcessorOptions::new("output");
//! let processor = Processor::new(platforms, options);
//! let summary = processor.run(&repos).await;
//! println!("{} written, {} skipped, {} failed",
//!     summary.written, summary.skipped, summary.failed);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`input`] - input table reading and GitHub URL normalization
//! - [`auth`] - credential loading and per-platform client construction
//! - [`fetcher`] - platform adapters behind one capability trait
//! - [`backoff`] - retry/backoff wrapper for rate-limited remote calls
//! - [`buckets`] - calendar time-bucket partitioning for sampled fetches
//! - [`resume`] - prior-output inspection for resumable runs
//! - [`processor`] - batch orchestration with mode selection
//! - [`output`] - CSV commit writers and the append-only error sink

#![warn(missing_docs)]
#![warn(clippy::all)]

use serde::{Deserialize, Serialize};
use std::fmt;

/// Retry/backoff wrapper for rate-limited remote calls
pub mod backoff;

/// Calendar time-bucket partitioning
pub mod buckets;

/// Credential loading and per-platform client construction
pub mod auth;

/// CLI command implementation
pub mod cli;

/// Platform fetch adapters
pub mod fetcher;

/// Input table reading
pub mod input;

/// CSV output writers and error sink
pub mod output;

/// Batch orchestration and mode selection
pub mod processor;

/// Prior-output inspection for resumable runs
pub mod resume;

/// Git hosting platform supported by the tracker.
///
/// Variant order here is the fixed processing order within a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// GitHub repository
    GitHub,
    /// GitHub Gist
    Gist,
    /// GitLab project
    GitLab,
    /// Bitbucket repository
    Bitbucket,
}

impl Platform {
    /// Lowercase platform name used in file names and error rows
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::GitHub => "github",
            Platform::Gist => "gist",
            Platform::GitLab => "gitlab",
            Platform::Bitbucket => "bitbucket",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fetch granularity for a repository, selected once per repository per run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Full ordered history, optionally capped
    Full,
    /// One commit per calendar year
    Yearly,
    /// One commit per calendar month
    Monthly,
}

impl fmt::Display for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchMode::Full => f.write_str("full"),
            FetchMode::Yearly => f.write_str("yearly"),
            FetchMode::Monthly => f.write_str("monthly"),
        }
    }
}

/// One row of the input batch: a human-readable name plus zero-or-one
/// repository identifier per platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryDescriptor {
    /// Human-readable repository name, used in output file names
    pub item_name: String,
    /// GitHub identifier in `owner/name` form
    pub github: Option<String>,
    /// Gist identifier (bare id or URL)
    pub gist: Option<String>,
    /// GitLab project path in `group/project` form
    pub gitlab: Option<String>,
    /// Bitbucket identifier in `workspace/slug` form
    pub bitbucket: Option<String>,
}

impl RepositoryDescriptor {
    /// Identifier for a given platform, if one was provided
    pub fn identifier_for(&self, platform: Platform) -> Option<&str> {
        match platform {
            Platform::GitHub => self.github.as_deref(),
            Platform::Gist => self.gist.as_deref(),
            Platform::GitLab => self.gitlab.as_deref(),
            Platform::Bitbucket => self.bitbucket.as_deref(),
        }
    }
}

/// One commit, release, tag, or gist revision produced by an adapter.
///
/// Never mutated after creation; `year`/`month` are populated only by the
/// bucketed fetch modes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Human-readable repository name from the input row
    pub item_name: String,
    /// ISO-8601 timestamp as reported by the platform, or empty
    pub date: String,
    /// First line of the commit message (or `RELEASE: `/`TAG: ` synthetic text)
    pub message: String,
    /// Content hash or target commit reference
    pub sha: String,
    /// Author display name, `Unknown` when the platform omits it
    pub author: String,
    /// Calendar year tag in bucketed modes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    /// Zero-padded calendar month tag in monthly mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,
}
