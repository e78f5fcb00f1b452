//! GitLab project adapter
//!
//! Commits and tags come from the v4 REST API with the project path
//! URL-encoded into the endpoint. Moved projects are detected by probing the
//! web URL without following redirects and rewriting the project path from
//! the `Location` header.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info};

use super::http::HttpClient;
use super::{first_line, CommitEntry, FetcherError, FetcherResult, PlatformFetcher, Resolved, Window};
use crate::Platform;

const API_BASE: &str = "https://gitlab.com/api/v4";
const WEB_BASE: &str = "https://gitlab.com";
const PER_PAGE: usize = 100;

#[derive(Debug, Deserialize)]
struct ProjectInfo {
    created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Commit {
    id: String,
    message: Option<String>,
    author_name: Option<String>,
    created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Tag {
    name: Option<String>,
    commit: Option<TagCommit>,
}

#[derive(Debug, Deserialize)]
struct TagCommit {
    id: Option<String>,
    created_at: Option<String>,
    author_name: Option<String>,
}

/// GitLab commit and tag fetcher
pub struct GitlabFetcher {
    http: HttpClient,
    api_base: String,
    web_base: String,
}

impl GitlabFetcher {
    /// Create a fetcher against gitlab.com
    pub fn new(http: HttpClient) -> Self {
        Self {
            http,
            api_base: API_BASE.to_string(),
            web_base: WEB_BASE.to_string(),
        }
    }

    fn project_url(&self, path: &str) -> String {
        format!("{}/projects/{}", self.api_base, urlencoding::encode(path))
    }

    async fn fetch_tags(&self, path: &str) -> FetcherResult<Vec<CommitEntry>> {
        let url = format!("{}/repository/tags", self.project_url(path));
        let mut entries = Vec::new();
        let mut page: usize = 1;

        loop {
            let params = [
                ("per_page", PER_PAGE.to_string()),
                ("page", page.to_string()),
            ];
            let tags: Vec<Tag> = self.http.get_json(&url, &params).await?;
            let batch_len = tags.len();

            for tag in tags {
                let commit = tag.commit;
                entries.push(CommitEntry {
                    date: commit
                        .as_ref()
                        .and_then(|c| c.created_at.clone())
                        .unwrap_or_default(),
                    message: format!("TAG: {}", tag.name.as_deref().unwrap_or("Unknown")),
                    sha: commit
                        .as_ref()
                        .and_then(|c| c.id.clone())
                        .unwrap_or_default(),
                    author: commit
                        .and_then(|c| c.author_name)
                        .unwrap_or_else(|| "Unknown".to_string()),
                });
            }

            if batch_len < PER_PAGE {
                break;
            }
            page += 1;
        }

        info!(path, tags = entries.len(), "Retrieved GitLab tags");
        Ok(entries)
    }
}

#[async_trait]
impl PlatformFetcher for GitlabFetcher {
    fn platform(&self) -> Platform {
        Platform::GitLab
    }

    fn supports_bucketed(&self) -> bool {
        true
    }

    async fn resolve_canonical(&self, path: &str) -> FetcherResult<Resolved> {
        let check_url = if path.starts_with("http") {
            path.to_string()
        } else {
            format!("{}/{}", self.web_base, path)
        };
        let probe = self.http.probe(&check_url).await?;

        if probe.is_redirect() {
            let location = probe.location.unwrap_or_default();
            match project_path_from_location(&location) {
                Some(new_path) => {
                    info!(path, new_path = %new_path, "GitLab project moved, following redirect");
                    return Ok(Resolved {
                        identifier: new_path,
                        redirected: true,
                    });
                }
                None => return Err(FetcherError::UnresolvedRedirect(location)),
            }
        }

        match probe.status {
            404 => Err(FetcherError::NotFound),
            429 => Err(FetcherError::RateLimited { retry_after: None }),
            _ => Ok(Resolved::direct(path)),
        }
    }

    async fn creation_date(&self, path: &str) -> FetcherResult<DateTime<Utc>> {
        let info: ProjectInfo = self.http.get_json(&self.project_url(path), &[]).await?;
        let created_at = info
            .created_at
            .ok_or_else(|| FetcherError::Parse("project has no created_at".to_string()))?;
        DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| FetcherError::Parse(format!("invalid created_at {created_at:?}: {e}")))
    }

    async fn list_commits(
        &self,
        path: &str,
        window: Option<Window>,
        limit: Option<usize>,
    ) -> FetcherResult<Vec<CommitEntry>> {
        let url = format!("{}/repository/commits", self.project_url(path));
        let mut entries = Vec::new();
        let mut page: usize = 1;

        loop {
            let per_page = limit.map(|l| l.min(PER_PAGE)).unwrap_or(PER_PAGE);
            let mut params = vec![
                ("per_page", per_page.to_string()),
                ("page", page.to_string()),
            ];
            if let Some((since, until)) = window {
                params.push(("since", since.to_rfc3339()));
                params.push(("until", until.to_rfc3339()));
            }

            let commits: Vec<Commit> = self.http.get_json(&url, &params).await?;
            let batch_len = commits.len();

            for commit in commits {
                entries.push(CommitEntry {
                    date: commit.created_at.unwrap_or_default(),
                    message: first_line(commit.message.as_deref().unwrap_or_default()),
                    sha: commit.id,
                    author: commit
                        .author_name
                        .unwrap_or_else(|| "Unknown".to_string()),
                });
                if limit.is_some_and(|l| entries.len() >= l) {
                    debug!(path, count = entries.len(), "Commit cap reached");
                    return Ok(entries);
                }
            }

            if batch_len < per_page {
                break;
            }
            page += 1;
        }

        info!(path, commits = entries.len(), "Retrieved GitLab commits");
        Ok(entries)
    }

    async fn list_supplementary(&self, path: &str) -> FetcherResult<Vec<CommitEntry>> {
        self.fetch_tags(path).await
    }
}

/// Extract a project path from a web redirect Location.
///
/// Strips the host prefix and any `/-/tree/...` style suffix.
fn project_path_from_location(location: &str) -> Option<String> {
    let (_, tail) = location.split_once("gitlab.com/")?;
    let path = match tail.split_once("/-/") {
        Some((head, _)) => head,
        None => tail,
    };
    let path = path
        .split(['?', '#'])
        .next()
        .unwrap_or(path)
        .trim_end_matches('/');
    if path.is_empty() {
        None
    } else {
        Some(path.to_string())
    }
}
