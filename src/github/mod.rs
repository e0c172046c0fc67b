//! GitHub REST API access
//!
//! Defines the `RemoteFetcher` seam the cache orchestration talks to, and a
//! `reqwest`-backed implementation for the GitHub users API.

pub mod client;
pub mod fetcher;

pub use client::{Endpoint, EndpointFetcher, GitHubClient, GITHUB_API_URL};
pub use fetcher::{FetchError, RemoteFetcher};
