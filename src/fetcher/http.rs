//! Shared HTTP client for platform API interactions
//!
//! One reqwest wrapper serves every adapter: auth header injection, JSON GET
//! with typed status classification, and a no-redirect probe used for
//! canonical-location resolution. Redirects are never followed automatically;
//! adapters that care about 3xx inspect the probe result themselves.

use reqwest::header::{HeaderMap, LOCATION, RETRY_AFTER};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use super::{FetcherError, FetcherResult};

const USER_AGENT: &str = concat!("commit-tracker/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How a client authenticates against its platform
#[derive(Debug, Clone)]
pub enum AuthScheme {
    /// `Authorization: Bearer <token>` (GitHub, Gists)
    Bearer(String),
    /// `PRIVATE-TOKEN: <token>` (GitLab)
    PrivateToken(String),
    /// HTTP basic auth (Bitbucket app passwords)
    Basic {
        /// Account username
        username: String,
        /// App password or token
        password: String,
    },
    /// Unauthenticated
    None,
}

/// Result of a no-redirect probe against a canonical endpoint
#[derive(Debug, Clone)]
pub struct Probe {
    /// Raw response status
    pub status: u16,
    /// `Location` header value, when present
    pub location: Option<String>,
}

impl Probe {
    /// Whether the status is a redirect the caller should resolve
    pub fn is_redirect(&self) -> bool {
        matches!(self.status, 301 | 302 | 307 | 308)
    }
}

/// HTTP client shared by all adapters of one platform
pub struct HttpClient {
    client: Client,
    auth: AuthScheme,
}

impl HttpClient {
    /// Build a client with redirects disabled and a bounded request timeout
    pub fn new(auth: AuthScheme) -> FetcherResult<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| FetcherError::Network(e.to_string()))?;

        Ok(Self { client, auth })
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            AuthScheme::Bearer(token) => request.bearer_auth(token),
            AuthScheme::PrivateToken(token) => request.header("PRIVATE-TOKEN", token.as_str()),
            AuthScheme::Basic { username, password } => {
                request.basic_auth(username, Some(password.as_str()))
            }
            AuthScheme::None => request,
        }
    }

    /// Execute a GET and classify non-success statuses into typed errors.
    ///
    /// 429 becomes [`FetcherError::RateLimited`] with the Retry-After hint,
    /// 404 becomes [`FetcherError::NotFound`]; everything else non-success is
    /// an [`FetcherError::Http`].
    pub async fn get(&self, url: &str, params: &[(&str, String)]) -> FetcherResult<Response> {
        debug!(url, params = params.len(), "GET");
        let response = self
            .apply_auth(self.client.get(url).query(params))
            .send()
            .await
            .map_err(|e| FetcherError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match status {
            StatusCode::TOO_MANY_REQUESTS => Err(FetcherError::RateLimited {
                retry_after: parse_retry_after(response.headers()),
            }),
            StatusCode::NOT_FOUND => Err(FetcherError::NotFound),
            _ => {
                let message = response.text().await.unwrap_or_default();
                Err(FetcherError::Http {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    /// GET with JSON deserialization
    pub async fn get_json<T>(&self, url: &str, params: &[(&str, String)]) -> FetcherResult<T>
    where
        T: DeserializeOwned,
    {
        let response = self.get(url, params).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| FetcherError::Parse(format!("failed to deserialize response: {e}")))
    }

    /// Probe an endpoint without following redirects, returning the raw status
    /// and `Location` header for the caller to interpret.
    pub async fn probe(&self, url: &str) -> FetcherResult<Probe> {
        debug!(url, "redirect probe");
        let response = self
            .apply_auth(self.client.get(url))
            .send()
            .await
            .map_err(|e| FetcherError::Network(e.to_string()))?;

        Ok(Probe {
            status: response.status().as_u16(),
            location: response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        })
    }
}

/// Non-negative integer seconds from the Retry-After header, if parseable
fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
}
