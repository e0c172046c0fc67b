//! Cache module for storing API responses to disk
//!
//! This module provides a time-boxed file cache. Each key maps to one JSON file
//! holding the payload and the time it was stored. An entry older than the
//! configured TTL reads back as absent; it stays on disk until the next write
//! for the same key replaces it.

mod clock;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use store::{CacheEntry, CacheError, CacheKey, CacheStore, DEFAULT_TTL_MINUTES};
