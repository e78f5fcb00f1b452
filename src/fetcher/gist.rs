//! GitHub Gist adapter
//!
//! The Gist API exposes no commit-level history, so a fetch yields at most one
//! synthetic record for the latest revision.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use super::http::HttpClient;
use super::{CommitEntry, FetcherResult, PlatformFetcher, Resolved, Window};
use crate::Platform;

const API_BASE: &str = "https://api.github.com";

#[derive(Debug, Deserialize)]
struct Gist {
    id: Option<String>,
    updated_at: Option<String>,
    owner: Option<GistOwner>,
}

#[derive(Debug, Deserialize)]
struct GistOwner {
    login: Option<String>,
}

/// Latest-revision fetcher for GitHub Gists
pub struct GistFetcher {
    http: HttpClient,
    api_base: String,
}

impl GistFetcher {
    /// Create a fetcher against the public GitHub API
    pub fn new(http: HttpClient) -> Self {
        Self {
            http,
            api_base: API_BASE.to_string(),
        }
    }
}

/// Reduce a gist URL to its bare id (the last path segment)
fn gist_id(identifier: &str) -> &str {
    identifier
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(identifier)
}

#[async_trait]
impl PlatformFetcher for GistFetcher {
    fn platform(&self) -> Platform {
        Platform::Gist
    }

    async fn resolve_canonical(&self, repo: &str) -> FetcherResult<Resolved> {
        Ok(Resolved::direct(gist_id(repo)))
    }

    async fn list_commits(
        &self,
        repo: &str,
        _window: Option<Window>,
        _limit: Option<usize>,
    ) -> FetcherResult<Vec<CommitEntry>> {
        let id = gist_id(repo);
        let url = format!("{}/gists/{}", self.api_base, id);
        let gist: Gist = self.http.get_json(&url, &[]).await?;

        info!(gist = id, "Retrieved latest gist revision");
        Ok(vec![CommitEntry {
            date: gist.updated_at.unwrap_or_default(),
            message: "Latest Gist revision".to_string(),
            sha: gist.id.unwrap_or_default(),
            author: gist
                .owner
                .and_then(|o| o.login)
                .unwrap_or_else(|| "Unknown".to_string()),
        }])
    }
}
