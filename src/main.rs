//! GitHub Activity CLI - Show a user's recent public GitHub activity
//!
//! Fetches a user's public events (and profile) from the GitHub API, caching
//! responses on disk for a few minutes, and prints a short summary.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use crossterm::style::Stylize;
use chrono::Local;
use futures::future::join;
use tracing::debug;

use github_activity::cache::{CacheKey, CacheStore};
use github_activity::cli::{resolve_username, Cli, RunConfig};
use github_activity::github::{Endpoint, GitHubClient};
use github_activity::logging::init_logging;
use github_activity::render::{render_events, render_profile};
use github_activity::service::{ActivityService, Fetched};

/// Prints rendered lines, marking output that came from the cache
fn print_section(fetched: &Fetched, lines: Vec<String>) {
    if let Some(stored_at) = fetched.stored_at.filter(|_| fetched.from_cache()) {
        let marker = format!(
            "(loaded from cache, saved at {})",
            stored_at.with_timezone(&Local).format("%H:%M:%S")
        );
        println!("{}", marker.dark_grey());
    }
    for line in lines {
        println!("{}", line);
    }
}

async fn run(config: RunConfig) -> Result<(), Box<dyn std::error::Error>> {
    let username = resolve_username(
        config.username.as_deref(),
        &mut io::stdin().lock(),
        &mut io::stdout(),
    )?;
    let key = CacheKey::new(username.as_str())?;

    println!("Fetching activity for {}...", username);

    let cache = CacheStore::new(&config.cache_dir).with_ttl(config.ttl);
    let client = GitHubClient::with_base_url(config.api_url.as_str());

    let events_service = ActivityService::new(cache.scoped(Endpoint::Events.namespace()));
    let events_fetcher = client.fetcher(Endpoint::Events);
    debug!(dir = %events_service.store().dir().display(), "using activity cache");

    if config.show_profile {
        let profile_service = ActivityService::new(cache.scoped(Endpoint::Profile.namespace()));
        let profile_fetcher = client.fetcher(Endpoint::Profile);

        // Each lookup uses its own namespace, so they can run side by side.
        // Both run to completion so a fetched response is cached even when
        // the other lookup fails.
        let (profile, events) = join(
            profile_service.get_or_fetch(&key, &profile_fetcher),
            events_service.get_or_fetch(&key, &events_fetcher),
        )
        .await;
        let (profile, events) = (profile?, events?);

        print_section(&profile, render_profile(&profile.payload));
        println!();
        print_section(&events, render_events(&events.payload));
    } else {
        let events = events_service.get_or_fetch(&key, &events_fetcher).await?;
        print_section(&events, render_events(&events.payload));
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match RunConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{} {}", "Error:".red(), err);
            return ExitCode::FAILURE;
        }
    };

    init_logging(config.debug);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {}", "Error:".red(), err);
            ExitCode::FAILURE
        }
    }
}
