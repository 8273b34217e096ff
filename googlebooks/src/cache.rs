//! A bounded key/value store with time-based expiry.
//!
//! When full, the oldest *inserted* entry is evicted first, regardless of how recently it was
//! read. Expired entries are removed lazily, when they are next looked up.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use time::OffsetDateTime;

/// The default maximum number of entries.
pub const DEFAULT_MAX_SIZE: usize = 100;
/// The default time-to-live of an entry.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Cache configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of entries kept at once. Values below 1 are treated as 1.
    pub max_size: usize,
    /// Time after which an entry is considered stale.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            max_size: DEFAULT_MAX_SIZE,
            ttl: DEFAULT_TTL,
        }
    }
}

struct Entry<V> {
    data: V,
    /// Expiry time in milliseconds since the Unix epoch.
    expiry: i64,
}

/// A bounded cache with FIFO eviction and lazy expiry.
pub struct Cache<V> {
    entries: HashMap<String, Entry<V>>,
    /// Keys in insertion order, oldest first.
    order: VecDeque<String>,
    max_size: usize,
    ttl: Duration,
}

impl<V: Clone> Cache<V> {
    /// Creates an empty cache.
    #[must_use]
    pub fn new(config: CacheConfig) -> Cache<V> {
        let max_size = config.max_size.max(1);

        Cache {
            entries: HashMap::with_capacity(max_size),
            order: VecDeque::with_capacity(max_size),
            max_size,
            ttl: config.ttl,
        }
    }

    /// Returns a copy of the value stored under `key`, unless it is missing or expired.
    pub fn get(&mut self, key: &str) -> Option<V> {
        self.get_at(key, now_millis())
    }

    /// Like [`Cache::get`], with an explicit current time in milliseconds since the Unix epoch.
    pub fn get_at(&mut self, key: &str, now: i64) -> Option<V> {
        let expiry = self.entries.get(key)?.expiry;

        if now > expiry {
            self.remove(key);

            return None;
        }

        self.entries.get(key).map(|entry| entry.data.clone())
    }

    /// Stores `value` under `key`, evicting the oldest entry if the cache is full.
    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        self.insert_at(key, value, now_millis());
    }

    /// Like [`Cache::insert`], with an explicit current time in milliseconds since the Unix
    /// epoch.
    ///
    /// Replacing an existing key moves it to the back of the eviction order.
    pub fn insert_at(&mut self, key: impl Into<String>, value: V, now: i64) {
        let key = key.into();

        self.remove(&key);

        if self.entries.len() >= self.max_size
            && let Some(oldest) = self.order.pop_front()
        {
            self.entries.remove(&oldest);
        }

        let ttl = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);
        let entry = Entry {
            data: value,
            expiry: now.saturating_add(ttl),
        };

        self.order.push_back(key.clone());
        self.entries.insert(key, entry);
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// Returns the number of stored entries, including expired ones not yet looked up.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the maximum number of entries.
    #[must_use]
    pub const fn max_size(&self) -> usize {
        self.max_size
    }

    /// Returns the time-to-live of new entries.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    fn remove(&mut self, key: &str) {
        if self.entries.remove(key).is_some() {
            self.order.retain(|k| k != key);
        }
    }
}

/// Returns the current time in milliseconds since the Unix epoch.
pub(crate) fn now_millis() -> i64 {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;

    i64::try_from(millis).unwrap_or(i64::MAX)
}
