//! Run command implementation

use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};

use super::CliError;
use crate::auth::Credentials;
use crate::backoff::BackoffPolicy;
use crate::input::read_repositories;
use crate::processor::{
    Processor, ProcessorOptions, RequestedMode, DEFAULT_COMMIT_THRESHOLD,
};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    name = "commit-tracker",
    version,
    about = "Fetch commit histories from GitHub, GitLab, Bitbucket, and Gists into CSV tables"
)]
pub struct Cli {
    /// CSV file listing repositories, one row per item
    #[arg(default_value = "repositories.csv")]
    pub csv_file: PathBuf,

    /// Directory to write commit tables and error tables under
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,

    /// Sample one commit per calendar year
    #[arg(short, long, conflicts_with = "full")]
    pub yearly: bool,

    /// Sample one commit per calendar month
    #[arg(short, long, conflicts_with = "full")]
    pub monthly: bool,

    /// Force full history even for large repositories
    #[arg(short, long)]
    pub full: bool,

    /// Commit count above which auto mode samples yearly
    #[arg(short, long, default_value_t = DEFAULT_COMMIT_THRESHOLD)]
    pub threshold: u64,

    /// Refetch everything, ignoring prior output
    #[arg(long)]
    pub no_resume: bool,

    /// Cap on commits fetched per repository in full mode
    #[arg(long)]
    pub max_commits: Option<usize>,

    /// Retry budget for rate-limited calls
    #[arg(long)]
    pub max_retries: Option<u32>,
}

impl Cli {
    /// Fetch mode requested by the flags; monthly wins over yearly
    pub fn requested_mode(&self) -> RequestedMode {
        if self.monthly {
            RequestedMode::Monthly
        } else if self.yearly {
            RequestedMode::Yearly
        } else if self.full {
            RequestedMode::Full
        } else {
            RequestedMode::Auto
        }
    }

    /// Run the batch described by these arguments
    pub async fn execute(&self) -> Result<(), CliError> {
        let repos = read_repositories(&self.csv_file)?;
        if repos.is_empty() {
            warn!(path = %self.csv_file.display(), "No repositories in input table");
            return Ok(());
        }

        let platforms = Credentials::from_env().platform_set()?;

        let mut backoff = BackoffPolicy::default();
        if let Some(max_retries) = self.max_retries {
            backoff = backoff.with_max_retries(max_retries);
        }

        let options = ProcessorOptions::new(&self.output)
            .with_mode(self.requested_mode())
            .with_commit_threshold(self.threshold)
            .with_resume(!self.no_resume)
            .with_max_commits(self.max_commits)
            .with_backoff(backoff);

        let processor = Processor::new(platforms, options);
        let summary = processor.run(&repos).await;

        info!(
            written = summary.written,
            skipped = summary.skipped,
            failed = summary.failed,
            "Run finished"
        );
        Ok(())
    }
}
