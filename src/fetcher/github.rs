//! GitHub repository adapter
//!
//! Full history comes from the paginated commits endpoint plus releases as
//! synthetic `RELEASE: ` records. Bucketed modes reuse [`list_commits`] with a
//! `since`/`until` window and `per_page=1`. Renamed repositories are resolved
//! by probing the canonical endpoint without following redirects.
//!
//! [`list_commits`]: PlatformFetcher::list_commits

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info};

use super::http::HttpClient;
use super::{first_line, CommitEntry, FetcherError, FetcherResult, PlatformFetcher, Resolved, Window};
use crate::Platform;

const API_BASE: &str = "https://api.github.com";
const PER_PAGE: usize = 100;

/// Query-time format GitHub accepts for `since`/`until`
pub(crate) const WINDOW_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Deserialize)]
struct RepoInfo {
    created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommitItem {
    sha: String,
    commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    message: Option<String>,
    author: Option<CommitSignature>,
}

#[derive(Debug, Deserialize)]
struct CommitSignature {
    name: Option<String>,
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Release {
    tag_name: Option<String>,
    name: Option<String>,
    published_at: Option<String>,
    target_commitish: Option<String>,
    author: Option<ReleaseAuthor>,
}

#[derive(Debug, Deserialize)]
struct ReleaseAuthor {
    login: Option<String>,
}

/// GitHub commit and release fetcher
pub struct GithubFetcher {
    http: HttpClient,
    base_url: String,
}

impl GithubFetcher {
    /// Create a fetcher against the public GitHub API
    pub fn new(http: HttpClient) -> Self {
        Self {
            http,
            base_url: API_BASE.to_string(),
        }
    }

    fn repo_url(&self, repo: &str) -> String {
        format!("{}/repos/{}", self.base_url, repo)
    }

    async fn fetch_releases(&self, repo: &str) -> FetcherResult<Vec<CommitEntry>> {
        let url = format!("{}/releases", self.repo_url(repo));
        let mut entries = Vec::new();
        let mut page: usize = 1;

        loop {
            let params = [
                ("per_page", PER_PAGE.to_string()),
                ("page", page.to_string()),
            ];
            let releases: Vec<Release> = self.http.get_json(&url, &params).await?;
            let batch_len = releases.len();

            for release in releases {
                let title = release
                    .name
                    .filter(|n| !n.is_empty())
                    .or(release.tag_name)
                    .unwrap_or_default();
                entries.push(CommitEntry {
                    date: release.published_at.unwrap_or_default(),
                    message: format!("RELEASE: {title}"),
                    sha: release.target_commitish.unwrap_or_default(),
                    author: release
                        .author
                        .and_then(|a| a.login)
                        .unwrap_or_else(|| "Unknown".to_string()),
                });
            }

            if batch_len < PER_PAGE {
                break;
            }
            page += 1;
        }

        info!(repo, releases = entries.len(), "Retrieved GitHub releases");
        Ok(entries)
    }
}

#[async_trait]
impl PlatformFetcher for GithubFetcher {
    fn platform(&self) -> Platform {
        Platform::GitHub
    }

    fn supports_bucketed(&self) -> bool {
        true
    }

    async fn resolve_canonical(&self, repo: &str) -> FetcherResult<Resolved> {
        let probe = self.http.probe(&self.repo_url(repo)).await?;

        if probe.is_redirect() {
            let location = probe.location.unwrap_or_default();
            match canonical_from_location(&location) {
                Some(new_name) => {
                    info!(repo, new_name = %new_name, "GitHub repository moved, following redirect");
                    return Ok(Resolved {
                        identifier: new_name,
                        redirected: true,
                    });
                }
                None => return Err(FetcherError::UnresolvedRedirect(location)),
            }
        }

        match probe.status {
            200 => Ok(Resolved::direct(repo)),
            404 => Err(FetcherError::NotFound),
            429 => Err(FetcherError::RateLimited { retry_after: None }),
            status => Err(FetcherError::Http {
                status,
                message: "unexpected status on repository probe".to_string(),
            }),
        }
    }

    async fn creation_date(&self, repo: &str) -> FetcherResult<DateTime<Utc>> {
        let info: RepoInfo = self.http.get_json(&self.repo_url(repo), &[]).await?;
        let created_at = info
            .created_at
            .ok_or_else(|| FetcherError::Parse("repository has no created_at".to_string()))?;
        DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| FetcherError::Parse(format!("invalid created_at {created_at:?}: {e}")))
    }

    async fn commit_count(&self, repo: &str) -> FetcherResult<u64> {
        // One commit per page makes the rel="last" page number the total count.
        let url = format!("{}/commits", self.repo_url(repo));
        let params = [("per_page", "1".to_string())];
        let response = self.http.get(&url, &params).await?;

        let link = response
            .headers()
            .get(reqwest::header::LINK)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if let Some(count) = link.as_deref().and_then(parse_last_page) {
            return Ok(count);
        }

        // No Link header: the whole history fits on one page.
        let commits: Vec<CommitItem> = response
            .json()
            .await
            .map_err(|e| FetcherError::Parse(format!("failed to deserialize commits: {e}")))?;
        Ok(commits.len() as u64)
    }

    async fn list_commits(
        &self,
        repo: &str,
        window: Option<Window>,
        limit: Option<usize>,
    ) -> FetcherResult<Vec<CommitEntry>> {
        let url = format!("{}/commits", self.repo_url(repo));
        let mut entries = Vec::new();
        let mut page: usize = 1;

        loop {
            let per_page = limit.map(|l| l.min(PER_PAGE)).unwrap_or(PER_PAGE);
            let mut params = vec![
                ("per_page", per_page.to_string()),
                ("page", page.to_string()),
            ];
            if let Some((since, until)) = window {
                params.push(("since", since.format(WINDOW_FORMAT).to_string()));
                params.push(("until", until.format(WINDOW_FORMAT).to_string()));
            }

            let commits: Vec<CommitItem> = self.http.get_json(&url, &params).await?;
            let batch_len = commits.len();

            for commit in commits {
                let signature = commit.commit.author;
                entries.push(CommitEntry {
                    date: signature
                        .as_ref()
                        .and_then(|a| a.date.clone())
                        .unwrap_or_default(),
                    message: first_line(commit.commit.message.as_deref().unwrap_or_default()),
                    sha: commit.sha,
                    author: signature
                        .and_then(|a| a.name)
                        .unwrap_or_else(|| "Unknown".to_string()),
                });
                if limit.is_some_and(|l| entries.len() >= l) {
                    debug!(repo, count = entries.len(), "Commit cap reached");
                    return Ok(entries);
                }
            }

            if batch_len < per_page {
                break;
            }
            page += 1;
        }

        info!(repo, commits = entries.len(), "Retrieved GitHub commits");
        Ok(entries)
    }

    async fn list_supplementary(&self, repo: &str) -> FetcherResult<Vec<CommitEntry>> {
        self.fetch_releases(repo).await
    }
}

/// Extract `owner/name` from a redirect Location that targets the repos API
fn canonical_from_location(location: &str) -> Option<String> {
    let (_, tail) = location.split_once("/repos/")?;
    let name = tail
        .split(['?', '#'])
        .next()
        .unwrap_or(tail)
        .trim_end_matches('/');
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Page number of the rel="last" link, i.e. the commit count at per_page=1
fn parse_last_page(link: &str) -> Option<u64> {
    for part in link.split(',') {
        let part = part.trim();
        if !part.contains("rel=\"last\"") {
            continue;
        }
        let url = part.strip_prefix('<')?.split('>').next()?;
        for pair in url.split_once('?')?.1.split('&') {
            if let Some(value) = pair.strip_prefix("page=") {
                return value.parse().ok();
            }
        }
    }
    None
}
