//! Command-line interface parsing for GitHub Activity CLI
//!
//! This module handles parsing of CLI arguments using clap, turning them into a
//! validated `RunConfig`, and the interactive username prompt used when no
//! username is given on the command line.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use chrono::Duration;
use clap::Parser;
use thiserror::Error;

use crate::cache::{CacheStore, DEFAULT_TTL_MINUTES};
use crate::github::GITHUB_API_URL;

/// Prompt shown when no username argument is given
pub const USERNAME_PROMPT: &str = "Enter GitHub username: ";

/// Error types for CLI argument handling
#[derive(Debug, Error)]
pub enum CliError {
    /// No cache directory was given and none could be derived from the home directory
    #[error("Could not determine a cache directory; pass --cache-dir")]
    NoCacheDir,

    /// The username given or typed at the prompt was empty
    #[error("A GitHub username is required")]
    EmptyUsername,

    /// Reading the prompt answer failed
    #[error("Failed to read username: {0}")]
    Prompt(#[from] io::Error),
}

/// GitHub Activity CLI - Show a user's recent public GitHub activity
#[derive(Parser, Debug)]
#[command(name = "github-activity")]
#[command(about = "Show a GitHub user's recent public activity")]
#[command(version)]
pub struct Cli {
    /// GitHub username; prompts for one when omitted
    pub username: Option<String>,

    /// Directory for cached API responses (defaults to the user cache directory)
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Minutes a cached response stays fresh
    #[arg(
        long,
        value_name = "MINUTES",
        default_value_t = DEFAULT_TTL_MINUTES,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub ttl_minutes: u32,

    /// Skip fetching the user's profile
    #[arg(long)]
    pub no_profile: bool,

    /// Base URL of the GitHub REST API
    #[arg(long, value_name = "URL", default_value = GITHUB_API_URL)]
    pub api_url: String,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,
}

/// Configuration derived from CLI arguments for a single run
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Username from the command line, if one was given
    pub username: Option<String>,
    /// Root directory of the response cache
    pub cache_dir: PathBuf,
    /// How long cached responses stay fresh
    pub ttl: Duration,
    /// Whether to fetch and show the user's profile
    pub show_profile: bool,
    /// Base URL of the GitHub REST API
    pub api_url: String,
    /// Whether debug logging is on
    pub debug: bool,
}

impl RunConfig {
    /// Creates a RunConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(RunConfig)` with the cache directory resolved
    /// * `Err(CliError::NoCacheDir)` if no cache directory can be determined
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let cache_dir = match &cli.cache_dir {
            Some(dir) => dir.clone(),
            None => CacheStore::default_dir().ok_or(CliError::NoCacheDir)?,
        };

        Ok(RunConfig {
            username: cli.username.clone(),
            cache_dir,
            ttl: Duration::minutes(i64::from(cli.ttl_minutes)),
            show_profile: !cli.no_profile,
            api_url: cli.api_url.clone(),
            debug: cli.debug,
        })
    }
}

/// Returns the username from the command line, or asks for one
///
/// The answer is trimmed; an empty answer is an error.
pub fn resolve_username<R: BufRead, W: Write>(
    from_args: Option<&str>,
    input: &mut R,
    output: &mut W,
) -> Result<String, CliError> {
    let username = match from_args {
        Some(name) => name.to_string(),
        None => {
            write!(output, "{}", USERNAME_PROMPT)?;
            output.flush()?;
            let mut line = String::new();
            input.read_line(&mut line)?;
            line
        }
    };

    let username = username.trim();
    if username.is_empty() {
        return Err(CliError::EmptyUsername);
    }
    Ok(username.to_string())
}
