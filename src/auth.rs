//! Credential loading and per-platform client construction
//!
//! Credentials come from the environment, with a `.env` file loaded first
//! when present. A platform whose credentials are missing is disabled with a
//! warning rather than failing the run; its identifiers are skipped later.

use tracing::warn;

use crate::fetcher::bitbucket::BitbucketFetcher;
use crate::fetcher::gist::GistFetcher;
use crate::fetcher::github::GithubFetcher;
use crate::fetcher::gitlab::GitlabFetcher;
use crate::fetcher::http::{AuthScheme, HttpClient};
use crate::fetcher::FetcherError;
use crate::processor::PlatformSet;

/// Platform credentials read from the environment
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    /// GitHub personal access token, used for repositories and gists
    pub github_token: Option<String>,
    /// GitLab private token
    pub gitlab_token: Option<String>,
    /// Bitbucket account username
    pub bitbucket_username: Option<String>,
    /// Bitbucket app password
    pub bitbucket_password: Option<String>,
}

impl Credentials {
    /// Load credentials from the environment, reading `.env` first if present
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let credentials = Self {
            github_token: non_empty_var("GITHUB_TOKEN"),
            gitlab_token: non_empty_var("GITLAB_TOKEN"),
            bitbucket_username: non_empty_var("BITBUCKET_USERNAME"),
            bitbucket_password: non_empty_var("BITBUCKET_APP_PASSWORD"),
        };

        if credentials.github_token.is_none() {
            warn!("GitHub token not found in environment, GitHub and Gist fetching disabled");
        }
        if credentials.gitlab_token.is_none() {
            warn!("GitLab token not found in environment, GitLab fetching disabled");
        }
        if credentials.bitbucket_username.is_none() || credentials.bitbucket_password.is_none() {
            warn!("Bitbucket credentials not found in environment, Bitbucket fetching disabled");
        }

        credentials
    }

    /// Build the adapter set, one per platform with usable credentials
    pub fn platform_set(&self) -> Result<PlatformSet, FetcherError> {
        let mut platforms = PlatformSet::default();

        if let Some(token) = &self.github_token {
            let repos = HttpClient::new(AuthScheme::Bearer(token.clone()))?;
            let gists = HttpClient::new(AuthScheme::Bearer(token.clone()))?;
            platforms.github = Some(Box::new(GithubFetcher::new(repos)));
            platforms.gist = Some(Box::new(GistFetcher::new(gists)));
        }

        if let Some(token) = &self.gitlab_token {
            let client = HttpClient::new(AuthScheme::PrivateToken(token.clone()))?;
            platforms.gitlab = Some(Box::new(GitlabFetcher::new(client)));
        }

        if let (Some(username), Some(password)) =
            (&self.bitbucket_username, &self.bitbucket_password)
        {
            let client = HttpClient::new(AuthScheme::Basic {
                username: username.clone(),
                password: password.clone(),
            })?;
            platforms.bitbucket = Some(Box::new(BitbucketFetcher::new(client)));
        }

        Ok(platforms)
    }
}

/// Environment variable value, treating empty strings as unset
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
