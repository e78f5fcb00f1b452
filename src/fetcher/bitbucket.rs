//! Bitbucket repository adapter
//!
//! Full-history only; the 2.0 API paginates with a `next` URL rather than
//! page numbers. Tags are appended as synthetic `TAG: ` records; Bitbucket
//! does not expose tagger name or date on the refs endpoint, so those fields
//! stay empty.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use super::http::HttpClient;
use super::{first_line, CommitEntry, FetcherError, FetcherResult, PlatformFetcher, Resolved, Window};
use crate::Platform;

const API_BASE: &str = "https://api.bitbucket.org/2.0";
const PAGE_LEN: usize = 100;

#[derive(Debug, Deserialize)]
struct Page<T> {
    values: Vec<T>,
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Commit {
    hash: Option<String>,
    date: Option<String>,
    message: Option<String>,
    author: Option<Author>,
}

#[derive(Debug, Deserialize)]
struct Author {
    raw: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TagRef {
    name: Option<String>,
    target: Option<TagTarget>,
}

#[derive(Debug, Deserialize)]
struct TagTarget {
    hash: Option<String>,
}

/// Bitbucket commit and tag fetcher
pub struct BitbucketFetcher {
    http: HttpClient,
    api_base: String,
}

impl BitbucketFetcher {
    /// Create a fetcher against the Bitbucket Cloud API
    pub fn new(http: HttpClient) -> Self {
        Self {
            http,
            api_base: API_BASE.to_string(),
        }
    }

    fn repo_url(&self, workspace: &str, slug: &str) -> String {
        format!("{}/repositories/{}/{}", self.api_base, workspace, slug)
    }

    async fn fetch_tags(&self, workspace: &str, slug: &str) -> FetcherResult<Vec<CommitEntry>> {
        let mut url = format!("{}/refs/tags", self.repo_url(workspace, slug));
        let mut entries = Vec::new();

        loop {
            let params = [("pagelen", PAGE_LEN.to_string())];
            let page: Page<TagRef> = self.http.get_json(&url, &params).await?;

            for tag in page.values {
                entries.push(CommitEntry {
                    date: String::new(),
                    message: format!("TAG: {}", tag.name.as_deref().unwrap_or("Unknown")),
                    sha: tag
                        .target
                        .and_then(|t| t.hash)
                        .unwrap_or_default(),
                    author: "Unknown".to_string(),
                });
            }

            match page.next {
                Some(next) => url = next,
                None => break,
            }
        }

        info!(workspace, slug, tags = entries.len(), "Retrieved Bitbucket tags");
        Ok(entries)
    }
}

/// Split a `workspace/slug` identifier, rejecting anything else
fn split_identifier(repo: &str) -> FetcherResult<(&str, &str)> {
    match repo.split('/').collect::<Vec<_>>().as_slice() {
        [workspace, slug] if !workspace.is_empty() && !slug.is_empty() => Ok((workspace, slug)),
        _ => Err(FetcherError::InvalidIdentifier(repo.to_string())),
    }
}

#[async_trait]
impl PlatformFetcher for BitbucketFetcher {
    fn platform(&self) -> Platform {
        Platform::Bitbucket
    }

    async fn resolve_canonical(&self, repo: &str) -> FetcherResult<Resolved> {
        split_identifier(repo)?;
        Ok(Resolved::direct(repo))
    }

    async fn list_commits(
        &self,
        repo: &str,
        _window: Option<Window>,
        limit: Option<usize>,
    ) -> FetcherResult<Vec<CommitEntry>> {
        let (workspace, slug) = split_identifier(repo)?;
        let mut url = format!("{}/commits", self.repo_url(workspace, slug));
        let mut entries = Vec::new();

        loop {
            let pagelen = limit.map(|l| l.min(PAGE_LEN)).unwrap_or(PAGE_LEN);
            let params = [("pagelen", pagelen.to_string())];
            let page: Page<Commit> = self.http.get_json(&url, &params).await?;

            for commit in page.values {
                entries.push(CommitEntry {
                    date: commit.date.unwrap_or_default(),
                    message: first_line(commit.message.as_deref().unwrap_or_default()),
                    sha: commit.hash.unwrap_or_default(),
                    author: commit
                        .author
                        .and_then(|a| a.raw)
                        .unwrap_or_else(|| "Unknown".to_string()),
                });
                if limit.is_some_and(|l| entries.len() >= l) {
                    debug!(repo, count = entries.len(), "Commit cap reached");
                    return Ok(entries);
                }
            }

            match page.next {
                Some(next) => url = next,
                None => break,
            }
        }

        info!(repo, commits = entries.len(), "Retrieved Bitbucket commits");
        Ok(entries)
    }

    async fn list_supplementary(&self, repo: &str) -> FetcherResult<Vec<CommitEntry>> {
        let (workspace, slug) = split_identifier(repo)?;
        self.fetch_tags(workspace, slug).await
    }
}
