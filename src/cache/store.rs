//! Cache store for persisting API responses to disk
//!
//! Provides a `CacheStore` that keeps one JSON file per key, each carrying the
//! payload and the time it was written. Entries are judged fresh or stale at
//! read time against a fixed TTL.

use chrono::{DateTime, Duration, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use super::clock::{Clock, SystemClock};

/// Default time-to-live for cache entries in minutes
pub const DEFAULT_TTL_MINUTES: u32 = 10;

/// Errors that can occur while reading or writing the cache
#[derive(Debug, Error)]
pub enum CacheError {
    /// A cache key must not be empty
    #[error("Cache key must not be empty")]
    EmptyKey,

    /// The cache file exists but could not be read
    #[error("Failed to read cache file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The cache directory could not be created
    #[error("Failed to create cache directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The entry could not be serialized
    #[error("Failed to serialize cache entry: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The cache file could not be written
    #[error("Failed to write cache file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Identifies one cache entry within a store
///
/// Keys are case-sensitive and never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Creates a key, rejecting the empty string
    pub fn new(key: impl Into<String>) -> Result<Self, CacheError> {
        let key = key.into();
        if key.is_empty() {
            return Err(CacheError::EmptyKey);
        }
        Ok(Self(key))
    }

    /// Returns the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name the entry is stored under
    ///
    /// Bytes outside `[A-Za-z0-9_-]` are percent-encoded, so distinct keys
    /// always map to distinct files and no key can escape the cache directory.
    fn file_name(&self) -> String {
        let mut name = String::with_capacity(self.0.len() + 5);
        for byte in self.0.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
                name.push(byte as char);
            } else {
                name.push_str(&format!("%{:02X}", byte));
            }
        }
        name.push_str(".json");
        name
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The persisted unit: one payload, the key it belongs to, and when it was written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Key the entry was written under
    pub key: CacheKey,
    /// When the entry was written
    pub stored_at: DateTime<Utc>,
    /// The cached response, exactly as it was written
    pub payload: Value,
}

/// Reads and writes cache entries in a single directory
///
/// Each key is stored as `<dir>/<encoded key>.json`. There is no index file;
/// the presence of the file and the timestamp inside it are the only metadata.
#[derive(Debug, Clone)]
pub struct CacheStore {
    /// Directory where cache files are stored
    cache_dir: PathBuf,
    /// How long an entry stays valid after it is written
    ttl: Duration,
    /// Source of "now" for stamping and age checks
    clock: Arc<dyn Clock>,
}

impl CacheStore {
    /// Creates a store rooted at `cache_dir` using the system clock and the default TTL
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self::with_clock(cache_dir, Arc::new(SystemClock))
    }

    /// Creates a store rooted at `cache_dir` with a custom clock
    pub fn with_clock(cache_dir: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            ttl: Duration::minutes(i64::from(DEFAULT_TTL_MINUTES)),
            clock,
        }
    }

    /// Replaces the TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Returns the XDG-compliant cache directory for this application
    ///
    /// Uses `~/.cache/github-activity/` on Linux, or the platform equivalent.
    /// Returns `None` if no home directory can be determined.
    pub fn default_dir() -> Option<PathBuf> {
        let project_dirs = ProjectDirs::from("", "", "github-activity")?;
        Some(project_dirs.cache_dir().to_path_buf())
    }

    /// Returns a store for a sub-namespace, sharing this store's TTL and clock
    ///
    /// Namespaces live in separate subdirectories, so the same key in two
    /// namespaces never collides.
    pub fn scoped(&self, namespace: &str) -> Self {
        Self {
            cache_dir: self.cache_dir.join(namespace),
            ttl: self.ttl,
            clock: Arc::clone(&self.clock),
        }
    }

    /// Directory this store reads from and writes to
    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the path of the cache file for the given key
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir.join(key.file_name())
    }

    /// Ensures the cache directory exists
    fn ensure_dir(&self) -> Result<(), CacheError> {
        fs::create_dir_all(&self.cache_dir).map_err(|source| CacheError::CreateDir {
            path: self.cache_dir.clone(),
            source,
        })
    }

    /// Reads a valid entry from the cache
    ///
    /// # Returns
    /// * `Ok(Some(entry))` if an entry exists, parses, and is younger than the TTL
    /// * `Ok(None)` if the entry is missing, corrupt, or stale
    /// * `Err(CacheError::Read)` if the file exists but cannot be read
    pub fn read(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        let path = self.path_for(key);
        let content = match fs::read(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(key = %key, "cache miss");
                return Ok(None);
            }
            Err(source) => return Err(CacheError::Read { path, source }),
        };

        let entry: CacheEntry = match serde_json::from_slice(&content) {
            Ok(entry) => entry,
            Err(err) => {
                debug!(key = %key, error = %err, "ignoring unreadable cache entry");
                return Ok(None);
            }
        };

        if entry.key != *key {
            debug!(key = %key, stored_key = %entry.key, "ignoring cache entry stored for another key");
            return Ok(None);
        }

        let age = self.clock.now().signed_duration_since(entry.stored_at);
        if age >= self.ttl {
            debug!(key = %key, age_secs = age.num_seconds(), "cache entry is stale");
            return Ok(None);
        }

        Ok(Some(entry))
    }

    /// Writes a payload to the cache, replacing any previous entry for the key
    ///
    /// Creates the cache directory on first use and stamps the entry with the
    /// current time.
    pub fn write(&self, key: &CacheKey, payload: &Value) -> Result<CacheEntry, CacheError> {
        self.ensure_dir()?;

        let entry = CacheEntry {
            key: key.clone(),
            stored_at: self.clock.now(),
            payload: payload.clone(),
        };

        let json = serde_json::to_string_pretty(&entry)?;
        let path = self.path_for(key);
        fs::write(&path, json).map_err(|source| CacheError::Write { path, source })?;

        debug!(key = %key, "cache entry written");
        Ok(entry)
    }
}
