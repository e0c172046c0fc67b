//! Get-or-fetch orchestration over the response cache
//!
//! `ActivityService` hides the hit/miss decision from callers: a fresh cache
//! entry is returned as-is, anything else goes to the remote fetcher and the
//! result is written back on a best-effort basis.

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::cache::{CacheError, CacheKey, CacheStore};
use crate::github::{FetchError, RemoteFetcher};

/// Errors that abort a get-or-fetch call
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The cache could not be read, so its state is unknown
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The remote fetch failed
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Where a returned payload came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// A fresh cache entry; no network call was made
    Cache,
    /// A live fetch
    Remote,
}

/// A payload returned by `get_or_fetch`, tagged with its origin
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched {
    pub payload: Value,
    pub source: Source,
    /// When the cache entry was written, for cache hits
    pub stored_at: Option<DateTime<Utc>>,
}

impl Fetched {
    /// Whether the payload was loaded from the cache
    pub fn from_cache(&self) -> bool {
        self.source == Source::Cache
    }
}

/// Serves payloads from the cache, falling back to a remote fetch
#[derive(Debug, Clone)]
pub struct ActivityService {
    store: CacheStore,
}

impl ActivityService {
    pub fn new(store: CacheStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Returns the payload for `key`, from the cache if a fresh entry exists
    ///
    /// # Behavior
    /// - Fresh entry: returned with `Source::Cache`, the fetcher is not called
    /// - Missing, corrupt or stale entry: the fetcher is called once; on
    ///   success the result is written to the cache and returned with
    ///   `Source::Remote`. A failed write is logged and does not fail the call.
    /// - Fetch failure: returned unchanged, nothing is written, and no stale
    ///   entry is used in its place
    /// - Cache read fault: returned as `ServiceError::Cache` before any fetch
    pub async fn get_or_fetch<F>(&self, key: &CacheKey, fetcher: &F) -> Result<Fetched, ServiceError>
    where
        F: RemoteFetcher + ?Sized,
    {
        if let Some(entry) = self.store.read(key)? {
            info!(key = %key, stored_at = %entry.stored_at, "loaded from cache");
            return Ok(Fetched {
                payload: entry.payload,
                source: Source::Cache,
                stored_at: Some(entry.stored_at),
            });
        }

        let payload = fetcher.fetch(key).await?;

        if let Err(err) = self.store.write(key, &payload) {
            warn!(key = %key, error = %err, "failed to cache fetched data");
        }

        Ok(Fetched {
            payload,
            source: Source::Remote,
            stored_at: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{Clock, ManualClock};
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use serde_json::json;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Fetcher returning a canned outcome and counting its calls
    struct StubFetcher {
        outcome: fn() -> Result<Value, FetchError>,
        calls: AtomicUsize,
    }

    impl StubFetcher {
        fn new(outcome: fn() -> Result<Value, FetchError>) -> Self {
            Self {
                outcome,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RemoteFetcher for StubFetcher {
        async fn fetch(&self, _key: &CacheKey) -> Result<Value, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.outcome)()
        }
    }

    /// Fetcher that replaces the cache directory with a file before answering,
    /// so the follow-up write fails
    struct SabotagingFetcher {
        cache_dir: PathBuf,
    }

    #[async_trait]
    impl RemoteFetcher for SabotagingFetcher {
        async fn fetch(&self, _key: &CacheKey) -> Result<Value, FetchError> {
            std::fs::write(&self.cache_dir, "in the way").expect("Should block cache dir");
            Ok(json!({"fresh": true}))
        }
    }

    fn create_service() -> (ActivityService, Arc<ManualClock>, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let start = Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let store = CacheStore::with_clock(temp_dir.path().join("activity"), clock.clone());
        (ActivityService::new(store), clock, temp_dir)
    }

    fn key(name: &str) -> CacheKey {
        CacheKey::new(name).expect("valid key")
    }

    /// Clock that counts how often it is asked for the time
    ///
    /// A miss reads nothing, so every `now()` during a missed lookup is a write.
    #[derive(Debug)]
    struct CountingClock {
        inner: ManualClock,
        calls: AtomicUsize,
    }

    impl CountingClock {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Clock for CountingClock {
        fn now(&self) -> DateTime<Utc> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.now()
        }
    }

    #[tokio::test]
    async fn test_miss_fetches_once_and_writes_once() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let start = Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap();
        let clock = Arc::new(CountingClock {
            inner: ManualClock::new(start),
            calls: AtomicUsize::new(0),
        });
        let service = ActivityService::new(CacheStore::with_clock(temp_dir.path(), clock.clone()));
        let fetcher = StubFetcher::new(|| Ok(json!([{"type": "ForkEvent"}])));

        let result = service.get_or_fetch(&key("alice"), &fetcher).await.unwrap();

        assert_eq!(fetcher.calls(), 1);
        assert_eq!(clock.calls(), 1, "Entry should be written exactly once");
        assert_eq!(result.source, Source::Remote);
        assert!(!result.from_cache());
        assert_eq!(result.payload, json!([{"type": "ForkEvent"}]));

        clock.inner.advance(Duration::minutes(3));
        let entry = service.store().read(&key("alice")).unwrap().unwrap();
        assert_eq!(entry.payload, result.payload);
        assert_eq!(entry.stored_at, start, "No later write should replace the entry");
    }

    #[tokio::test]
    async fn test_hit_skips_fetch() {
        let (service, clock, _temp_dir) = create_service();
        service.store().write(&key("alice"), &json!({"cached": 1})).unwrap();
        clock.advance(Duration::minutes(2));
        let fetcher = StubFetcher::new(|| Ok(json!({"fresh": 1})));

        let result = service.get_or_fetch(&key("alice"), &fetcher).await.unwrap();

        assert_eq!(fetcher.calls(), 0, "Fetcher should not be called on a hit");
        assert!(result.from_cache());
        assert_eq!(result.payload, json!({"cached": 1}));
        assert_eq!(result.stored_at, Some(clock.now() - Duration::minutes(2)));
    }

    #[tokio::test]
    async fn test_stale_entry_is_refetched_and_replaced() {
        let (service, clock, _temp_dir) = create_service();
        service.store().write(&key("alice"), &json!({"old": true})).unwrap();
        clock.advance(Duration::minutes(10));
        let fetcher = StubFetcher::new(|| Ok(json!({"new": true})));

        let result = service.get_or_fetch(&key("alice"), &fetcher).await.unwrap();

        assert_eq!(fetcher.calls(), 1);
        assert_eq!(result.payload, json!({"new": true}));
        let entry = service.store().read(&key("alice")).unwrap().unwrap();
        assert_eq!(entry.payload, json!({"new": true}));
    }

    #[tokio::test]
    async fn test_fetch_failure_propagates_without_write() {
        let (service, _clock, _temp_dir) = create_service();
        let fetcher = StubFetcher::new(|| Err(FetchError::Upstream { status: 500 }));

        let result = service.get_or_fetch(&key("bob"), &fetcher).await;

        assert!(matches!(
            result,
            Err(ServiceError::Fetch(FetchError::Upstream { status: 500 }))
        ));
        assert!(!service.store().path_for(&key("bob")).exists());
    }

    #[tokio::test]
    async fn test_fetch_failure_does_not_fall_back_to_stale_entry() {
        let (service, clock, _temp_dir) = create_service();
        service.store().write(&key("alice"), &json!({"old": true})).unwrap();
        clock.advance(Duration::hours(1));
        let fetcher = StubFetcher::new(|| Err(FetchError::NotFound));

        let result = service.get_or_fetch(&key("alice"), &fetcher).await;

        assert!(matches!(result, Err(ServiceError::Fetch(FetchError::NotFound))));
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_write_failure_still_returns_fetched_data() {
        let (service, _clock, _temp_dir) = create_service();
        let fetcher = SabotagingFetcher {
            cache_dir: service.store().dir().to_path_buf(),
        };

        let result = service.get_or_fetch(&key("alice"), &fetcher).await.unwrap();

        assert_eq!(result.payload, json!({"fresh": true}));
        assert_eq!(result.source, Source::Remote);
    }

    #[tokio::test]
    async fn test_read_fault_aborts_before_fetch() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let not_a_dir = temp_dir.path().join("file");
        std::fs::write(&not_a_dir, "x").unwrap();
        let service = ActivityService::new(CacheStore::new(&not_a_dir));
        let fetcher = StubFetcher::new(|| Ok(json!([])));

        let result = service.get_or_fetch(&key("alice"), &fetcher).await;

        assert!(matches!(result, Err(ServiceError::Cache(CacheError::Read { .. }))));
        assert_eq!(fetcher.calls(), 0);
    }

    #[test]
    fn test_service_error_messages_are_passed_through() {
        let err = ServiceError::from(FetchError::NotFound);
        assert_eq!(err.to_string(), "User not found");
    }
}
