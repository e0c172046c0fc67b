//! GitHub users API client
//!
//! Fetches a user's public events and profile from the GitHub REST API and
//! returns the decoded JSON untouched.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use tracing::{debug, info};

use super::fetcher::{FetchError, RemoteFetcher};
use crate::cache::CacheKey;

/// Base URL for the GitHub REST API
pub const GITHUB_API_URL: &str = "https://api.github.com";

const USER_AGENT_VALUE: &str = "github-activity-cli";
const ACCEPT_VALUE: &str = "application/vnd.github.v3+json";

/// The user resources this client knows how to fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// `GET /users/{user}/events`
    Events,
    /// `GET /users/{user}`
    Profile,
}

impl Endpoint {
    /// Cache namespace responses from this endpoint are stored under
    pub fn namespace(self) -> &'static str {
        match self {
            Endpoint::Events => "activity",
            Endpoint::Profile => "user-info",
        }
    }
}

/// Client for the GitHub REST API
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http_client: Client,
    /// Base URL for the API (allows override for testing)
    base_url: String,
}

impl Default for GitHubClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GitHubClient {
    /// Creates a new GitHubClient pointed at api.github.com
    pub fn new() -> Self {
        Self::with_base_url(GITHUB_API_URL)
    }

    /// Creates a new GitHubClient with a custom base URL
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Returns a fetcher bound to one endpoint, for use with the cache service
    pub fn fetcher(&self, endpoint: Endpoint) -> EndpointFetcher {
        EndpointFetcher {
            client: self.clone(),
            endpoint,
        }
    }

    /// Builds the request URL, escaping the user name as a single path segment
    fn url_for(&self, endpoint: Endpoint, username: &str) -> Result<Url, FetchError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| FetchError::InvalidUrl(self.base_url.clone()))?;
            segments.pop_if_empty().push("users").push(username);
            if endpoint == Endpoint::Events {
                segments.push("events");
            }
        }
        Ok(url)
    }

    /// Fetches one endpoint for a user
    ///
    /// # Returns
    /// * `Ok(Value)` - The decoded JSON body of a 200 response
    /// * `Err(FetchError::NotFound)` - On 404
    /// * `Err(FetchError::Upstream)` - On any other non-200 status
    /// * `Err(FetchError::Parse)` - If the body is not JSON
    pub async fn fetch_endpoint(
        &self,
        endpoint: Endpoint,
        username: &str,
    ) -> Result<Value, FetchError> {
        let url = self.url_for(endpoint, username)?;
        info!(%url, "fetching from GitHub");

        let response = self
            .http_client
            .get(url)
            .header(USER_AGENT, USER_AGENT_VALUE)
            .header(ACCEPT, ACCEPT_VALUE)
            .send()
            .await?;

        let status = response.status();
        debug!(status = status.as_u16(), "GitHub responded");
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound);
        }
        if status != StatusCode::OK {
            return Err(FetchError::Upstream {
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(FetchError::Parse)
    }
}

/// A `RemoteFetcher` for one GitHub endpoint; the cache key is the user name
#[derive(Debug, Clone)]
pub struct EndpointFetcher {
    client: GitHubClient,
    endpoint: Endpoint,
}

#[async_trait]
impl RemoteFetcher for EndpointFetcher {
    async fn fetch(&self, key: &CacheKey) -> Result<Value, FetchError> {
        self.client.fetch_endpoint(self.endpoint, key.as_str()).await
    }
}
