//! GitHub REST API client
//!
//! Every request carries the configured bearer token. Non-success statuses are
//! mapped to [`UpstreamError`] so the router can pass them through to clients
//! unchanged; transport failures stay distinct because they have no status.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use super::models::{LanguageBytes, ProfileSummary, RepoRef};

/// Base URL for the GitHub API
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// Repositories requested from a listing. Only the first page is read, so users
/// with more repositories than this are analyzed on a partial listing.
pub const REPOS_PAGE_SIZE: u32 = 100;

/// Default bound on establishing a TCP/TLS connection to the API
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";

/// A non-success response from the API
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("upstream responded {status}: {detail}")]
pub struct UpstreamError {
    /// HTTP status returned by the API
    pub status: u16,
    /// Human-readable description
    pub detail: String,
    /// Auxiliary fields, e.g. the remaining rate-limit budget
    pub extra: Map<String, Value>,
}

impl UpstreamError {
    /// Maps a non-success status (and its headers) to an error
    pub fn from_response(status: StatusCode, headers: &HeaderMap) -> Self {
        let mut extra = Map::new();
        let detail = match status {
            StatusCode::NOT_FOUND => "resource not found",
            StatusCode::TOO_MANY_REQUESTS => {
                let remaining = headers
                    .get(RATE_LIMIT_REMAINING)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("0");
                extra.insert("remaining".to_string(), Value::String(remaining.to_string()));
                "rate limit exceeded"
            }
            StatusCode::BAD_REQUEST => "invalid upstream request",
            _ => "upstream error",
        };

        Self {
            status: status.as_u16(),
            detail: detail.to_string(),
            extra,
        }
    }
}

/// Errors that can occur when calling the API
#[derive(Debug, Error)]
pub enum GitHubError {
    /// The API answered with a non-success status
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// No response was received
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// The client could not be constructed
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),
}

/// Authenticated client for the GitHub API
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    base_url: String,
}

impl GitHubClient {
    /// Creates a client for the public API
    pub fn new(token: &str) -> Result<Self, GitHubError> {
        Self::with_options(token, GITHUB_API_URL, DEFAULT_CONNECT_TIMEOUT)
    }

    /// Creates a client for a custom base URL (GitHub Enterprise, local fakes)
    pub fn with_options(
        token: &str,
        base_url: &str,
        connect_timeout: Duration,
    ) -> Result<Self, GitHubError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| GitHubError::InvalidConfig("token is not a valid header value".to_string()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github.v3+json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("profile-edge/", env!("CARGO_PKG_VERSION"))),
        );

        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| GitHubError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of a user's profile resource
    pub fn user_url(&self, username: &str) -> String {
        format!("{}/users/{}", self.base_url, encode_path_segment(username))
    }

    /// Fetches `url` and decodes the body as `T`
    pub async fn fetch_resource<T: DeserializeOwned>(&self, url: &str) -> Result<T, GitHubError> {
        self.send(self.client.get(url)).await
    }

    /// Fetches a user's profile exactly as the API returns it
    pub async fn fetch_user_profile(&self, username: &str) -> Result<Value, GitHubError> {
        self.fetch_resource(&self.user_url(username)).await
    }

    /// Fetches the profile fields the aggregator needs
    pub async fn fetch_user(&self, username: &str) -> Result<ProfileSummary, GitHubError> {
        self.fetch_resource(&self.user_url(username)).await
    }

    /// Fetches the first page of a repository listing
    pub async fn fetch_repos(&self, repos_url: &str) -> Result<Vec<RepoRef>, GitHubError> {
        let request = self
            .client
            .get(repos_url)
            .query(&[("per_page", REPOS_PAGE_SIZE)]);
        self.send(request).await
    }

    /// Fetches a repository's language breakdown
    pub async fn fetch_languages(&self, languages_url: &str) -> Result<LanguageBytes, GitHubError> {
        self.fetch_resource(languages_url).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, GitHubError> {
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let err = UpstreamError::from_response(status, response.headers());
            tracing::debug!(status = err.status, url = %response.url(), "upstream returned error status");
            return Err(err.into());
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Percent-encodes a value for use as a single URL path segment
fn encode_path_segment(s: &str) -> String {
    let mut encoded = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                encoded.push(byte as char)
            }
            other => encoded.push_str(&format!("%{other:02X}")),
        }
    }
    encoded
}
