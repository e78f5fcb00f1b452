//! Fetch-mode selection
//!
//! The operator can force a mode for the whole run; otherwise the mode is
//! chosen per repository from a cheap commit-count probe, falling back to a
//! full fetch when the probe is unavailable.

use tracing::{debug, warn};

use crate::fetcher::PlatformFetcher;
use crate::FetchMode;

/// Mode requested on the command line, before per-repository selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestedMode {
    /// Decide per repository from the commit count
    #[default]
    Auto,
    /// Force full history
    Full,
    /// Force one commit per year
    Yearly,
    /// Force one commit per month
    Monthly,
}

/// Pick the fetch mode for one repository.
///
/// Forced modes pass through. In auto mode the commit count decides: above
/// `threshold` the history is sampled yearly, otherwise fetched in full. A
/// failed probe logs a warning and falls back to a full fetch.
pub async fn select_mode(
    fetcher: &dyn PlatformFetcher,
    repo: &str,
    requested: RequestedMode,
    threshold: u64,
) -> FetchMode {
    match requested {
        RequestedMode::Full => FetchMode::Full,
        RequestedMode::Yearly => FetchMode::Yearly,
        RequestedMode::Monthly => FetchMode::Monthly,
        RequestedMode::Auto => match fetcher.commit_count(repo).await {
            Ok(count) if count > threshold => {
                debug!(repo, count, threshold, "Large history, sampling yearly");
                FetchMode::Yearly
            }
            Ok(count) => {
                debug!(repo, count, threshold, "Small history, fetching in full");
                FetchMode::Full
            }
            Err(e) => {
                warn!(repo, error = %e, "Commit count probe failed, fetching in full");
                FetchMode::Full
            }
        },
    }
}
