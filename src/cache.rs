//! Key-value store whose entries expire after a time-to-live.
//!
//! Expired entries are never returned. They are removed lazily, the first
//! time a read observes them, or in bulk through [`ExpiringCache::purge_expired`].

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;
use tracing::trace;

use crate::error::CacheError;

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Longer TTLs are clamped to this; such entries never expire in practice.
pub const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    created_at: Instant,
    expires_at: Instant,
}

impl<T> CacheEntry<T> {
    fn new(value: T, ttl: Duration) -> Result<Self, CacheError> {
        let created_at = Instant::now();
        let expires_at = created_at
            .checked_add(ttl.min(MAX_TTL))
            .ok_or_else(|| CacheError::InvalidArgument(format!("ttl {ttl:?} is out of range")))?;

        Ok(Self {
            value,
            created_at,
            expires_at,
        })
    }

    fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-memory cache mapping string keys to values of type `T`.
///
/// The cache is owned by whoever constructs it. Callers that need to share
/// one instance wrap it themselves (the server uses `Arc<Mutex<_>>`).
#[derive(Debug)]
pub struct ExpiringCache<T> {
    entries: HashMap<String, CacheEntry<T>>,
    default_ttl: Duration,
}

impl<T> Default for ExpiringCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ExpiringCache<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            default_ttl: DEFAULT_TTL,
        }
    }

    pub fn with_default_ttl(default_ttl: Duration) -> Result<Self, CacheError> {
        validate_ttl(default_ttl)?;

        Ok(Self {
            entries: HashMap::new(),
            default_ttl,
        })
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Inserts `value` under `key`, replacing any previous entry.
    ///
    /// `ttl` falls back to the cache's default TTL and is clamped to
    /// [`MAX_TTL`]. A zero TTL or an empty key is rejected and the cache is
    /// left untouched.
    pub fn set(
        &mut self,
        key: impl Into<String>,
        value: T,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let key = key.into();
        if key.is_empty() {
            return Err(CacheError::InvalidArgument(
                "key must not be empty".to_string(),
            ));
        }

        let ttl = match ttl {
            Some(ttl) => validate_ttl(ttl)?,
            None => self.default_ttl,
        };

        let entry = CacheEntry::new(value, ttl)?;
        self.entries.insert(key, entry);
        Ok(())
    }

    /// Same as [`set`](Self::set) with a signed millisecond TTL.
    pub fn set_millis(
        &mut self,
        key: impl Into<String>,
        value: T,
        ttl_ms: i64,
    ) -> Result<(), CacheError> {
        if ttl_ms <= 0 {
            return Err(CacheError::InvalidArgument(format!(
                "ttl must be positive, got {ttl_ms}ms"
            )));
        }

        self.set(key, value, Some(Duration::from_millis(ttl_ms as u64)))
    }

    pub fn get(&mut self, key: &str) -> Option<&T> {
        self.live_entry(key).map(|entry| &entry.value)
    }

    pub fn has(&mut self, key: &str) -> bool {
        self.live_entry(key).is_some()
    }

    /// Remaining lifetime of the entry under `key`, if it is still live.
    pub fn time_to_live(&mut self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        self.live_entry(key)
            .map(|entry| entry.expires_at.saturating_duration_since(now))
    }

    /// Removes `key` whether or not it has expired.
    pub fn delete(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of stored entries, including expired ones no read has touched yet.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();

        self.entries.retain(|_, entry| !entry.is_expired_at(now));

        before - self.entries.len()
    }

    fn live_entry(&mut self, key: &str) -> Option<&CacheEntry<T>> {
        let entry = self.entries.get(key)?;

        if entry.is_expired_at(Instant::now()) {
            trace!(key, age = ?entry.created_at.elapsed(), "evicting expired entry");
            self.entries.remove(key);
            return None;
        }

        self.entries.get(key)
    }
}

fn validate_ttl(ttl: Duration) -> Result<Duration, CacheError> {
    if ttl.is_zero() {
        return Err(CacheError::InvalidArgument(
            "ttl must be greater than zero".to_string(),
        ));
    }

    Ok(ttl)
}
