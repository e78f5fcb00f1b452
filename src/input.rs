//! Input table reading
//!
//! The batch is a CSV with an `item_name` column and one optional identifier
//! column per platform. Rows without an `item_name` are dropped with a
//! warning; GitHub identifiers written as full URLs are normalized to
//! `owner/name` form.

use csv::StringRecord;
use std::path::Path;
use tracing::{info, warn};

use crate::RepositoryDescriptor;

/// Input table errors
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// The file could not be opened or read
    #[error("failed to read input table: {0}")]
    Io(String),

    /// The table has no header row or is otherwise unreadable as CSV
    #[error("invalid input table: {0}")]
    Csv(String),
}

/// Read the ordered repository batch from a CSV file.
///
/// Column lookup is by header name; absent cells and absent columns both
/// yield `None` for that platform.
pub fn read_repositories(path: &Path) -> Result<Vec<RepositoryDescriptor>, InputError> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| InputError::Io(format!("{}: {e}", path.display())))?;

    let headers = reader
        .headers()
        .map_err(|e| InputError::Csv(e.to_string()))?
        .clone();
    let column = |name: &str| headers.iter().position(|h| h.trim() == name);

    let item_col = column("item_name");
    let github_col = column("github");
    let gist_col = column("gist");
    let gitlab_col = column("gitlab");
    let bitbucket_col = column("bitbucket");

    let mut repos = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warn!(row = index + 1, error = %e, "Dropping malformed input row");
                continue;
            }
        };

        let item_name = cell(&row, item_col).unwrap_or_default();
        if item_name.is_empty() {
            warn!(row = index + 1, "Repository missing item_name, skipping");
            continue;
        }

        repos.push(RepositoryDescriptor {
            item_name,
            github: cell(&row, github_col).map(|url| normalize_github_url(&url)),
            gist: cell(&row, gist_col),
            gitlab: cell(&row, gitlab_col),
            bitbucket: cell(&row, bitbucket_col),
        });
    }

    info!(
        count = repos.len(),
        path = %path.display(),
        "Read repository batch"
    );
    Ok(repos)
}

/// Non-empty trimmed cell value, if the column exists
fn cell(row: &StringRecord, col: Option<usize>) -> Option<String> {
    let value = row.get(col?)?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Normalize a GitHub identifier to `owner/name` form.
///
/// Full URLs lose the host prefix, query string, fragment, trailing slash,
/// and `.git` suffix; anything already in `owner/name` form passes through.
pub fn normalize_github_url(url: &str) -> String {
    let mut rest = match url.split_once("github.com/") {
        Some((_, tail)) => tail,
        None => url,
    };
    if let Some((head, _)) = rest.split_once('?') {
        rest = head;
    }
    if let Some((head, _)) = rest.split_once('#') {
        rest = head;
    }
    let rest = rest.trim_matches('/');
    rest.strip_suffix(".git")
        .map(|r| r.trim_matches('/'))
        .unwrap_or(rest)
        .to_string()
}
