//! The remote fetch seam

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::cache::CacheKey;

/// Errors a remote fetch can end in
#[derive(Debug, Error)]
pub enum FetchError {
    /// The key does not exist upstream (HTTP 404)
    #[error("User not found")]
    NotFound,

    /// Upstream answered with a non-success status
    #[error("Failed to fetch activity (Status: {status})")]
    Upstream { status: u16 },

    /// The response body is not valid JSON
    #[error("Failed to parse response")]
    Parse(#[source] serde_json::Error),

    /// The request never got a response
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The configured API URL cannot be used to build a request
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
}

/// Performs the network round trip for a key
///
/// Implementations own transport concerns such as timeouts; callers only see
/// the decoded JSON or a `FetchError`.
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    async fn fetch(&self, key: &CacheKey) -> Result<Value, FetchError>;
}
