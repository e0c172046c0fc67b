//! Text rendering of GitHub activity and profile data
//!
//! Renders the JSON returned by the service as plain lines of text. Event
//! types without a rendering, and events that do not have the expected shape,
//! are skipped.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Repository reference attached to every event
#[derive(Debug, Deserialize)]
struct Repo {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct PushPayload {
    /// Number of commits in the push, when GitHub reports it
    size: Option<u64>,
    #[serde(default)]
    commits: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct IssuesPayload {
    action: String,
}

/// A public event, dispatched on its `type` field
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum Event {
    PushEvent {
        repo: Repo,
        #[serde(default)]
        payload: PushPayload,
    },
    IssuesEvent {
        repo: Repo,
        payload: IssuesPayload,
    },
    WatchEvent {
        repo: Repo,
    },
    ForkEvent {
        repo: Repo,
    },
    #[serde(other)]
    Other,
}

impl Event {
    /// One line describing the event, or `None` for types we do not render
    fn describe(&self) -> Option<String> {
        match self {
            Event::PushEvent { repo, payload } => {
                let count = payload
                    .size
                    .unwrap_or(payload.commits.len() as u64);
                Some(format!("Pushed {} commit(s) to {}", count, repo.name))
            }
            Event::IssuesEvent { repo, payload } => Some(format!(
                "{} an issue in {}",
                capitalize(&payload.action),
                repo.name
            )),
            Event::WatchEvent { repo } => Some(format!("Starred {}", repo.name)),
            Event::ForkEvent { repo } => Some(format!("Forked {}", repo.name)),
            Event::Other => None,
        }
    }
}

/// Renders a list of events, one line per recognised event
pub fn render_events(events: &Value) -> Vec<String> {
    let events = events.as_array().map(Vec::as_slice).unwrap_or_default();
    if events.is_empty() {
        return vec!["No recent public activity found.".to_string()];
    }

    events
        .iter()
        .filter_map(|raw| match Event::deserialize(raw) {
            Ok(event) => event.describe(),
            Err(err) => {
                debug!(error = %err, "skipping event with unexpected shape");
                None
            }
        })
        .collect()
}

/// Subset of the user profile we show
#[derive(Debug, Deserialize)]
struct Profile {
    login: String,
    name: Option<String>,
    public_repos: Option<u64>,
    followers: Option<u64>,
    following: Option<u64>,
}

/// Renders a short profile header; an unrecognised shape renders nothing
pub fn render_profile(profile: &Value) -> Vec<String> {
    let profile = match Profile::deserialize(profile) {
        Ok(profile) => profile,
        Err(err) => {
            debug!(error = %err, "skipping profile with unexpected shape");
            return Vec::new();
        }
    };

    let mut lines = Vec::new();
    match profile.name.as_deref().filter(|name| !name.is_empty()) {
        Some(name) => lines.push(format!("{} ({})", name, profile.login)),
        None => lines.push(profile.login.clone()),
    }
    if let Some(repos) = profile.public_repos {
        lines.push(format!("Public repos: {}", repos));
    }
    if let (Some(followers), Some(following)) = (profile.followers, profile.following) {
        lines.push(format!("Followers: {} | Following: {}", followers, following));
    }
    lines
}

/// Upper-cases the first character
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
