//! GitHub Activity CLI Library
//!
//! Exposes the response cache, the GitHub client, the get-or-fetch service and
//! the text renderers for use by the binary and integration tests.

pub mod cache;
pub mod cli;
pub mod github;
pub mod logging;
pub mod render;
pub mod service;
