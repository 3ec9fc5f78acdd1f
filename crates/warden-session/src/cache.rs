//! Fixed-capacity recency cache of validated sessions.

use std::num::NonZeroUsize;

use lru::LruCache;
use tracing::trace;

/// Entry stored in the cache.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Owner of the session.
    pub username: String,

    /// Session token.
    pub token: String,
}

impl CacheEntry {
    /// Create a new cache entry.
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
        }
    }
}

/// Bounded cache of `(username, token)` pairs ordered by insertion.
///
/// Backed by an [`LruCache`] that is only ever reordered by [`add`](Self::add):
/// reads go through `peek`, so eviction follows insertion order rather than
/// access order.
#[derive(Debug)]
pub struct RecencyCache {
    lru: LruCache<String, CacheEntry>,
}

impl RecencyCache {
    /// Create a cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            lru: LruCache::new(cap),
        }
    }

    /// Insert or refresh a session at the most-recent position.
    ///
    /// An existing entry for `username` is replaced, so a user never
    /// occupies two slots.
    pub fn add(&mut self, username: &str, token: &str) {
        let entry = CacheEntry::new(username, token);
        if let Some((evicted, _)) = self.lru.push(username.to_string(), entry)
            && evicted != username
        {
            trace!(username = %evicted, "Evicting oldest cached session");
        }
    }

    /// Drop the entry for `username`, if any.
    pub fn remove(&mut self, username: &str) -> bool {
        self.lru.pop(username).is_some()
    }

    /// Find the cached entry for `username` without reordering.
    pub fn lookup(&self, username: &str) -> Option<&CacheEntry> {
        self.lru.peek(username)
    }

    /// Whether `username` is cached with exactly this token.
    pub fn check_valid(&self, username: &str, token: &str) -> bool {
        self.lookup(username).is_some_and(|e| e.token == token)
    }

    /// Cached usernames, oldest first.
    pub fn usernames(&self) -> Vec<String> {
        self.lru.iter().rev().map(|(name, _)| name.clone()).collect()
    }

    /// Current number of cached sessions.
    pub fn len(&self) -> usize {
        self.lru.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.lru.is_empty()
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.lru.cap().get()
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.lru.clear();
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.lru.len(),
            capacity: self.capacity(),
        }
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Current number of cached sessions.
    pub size: usize,

    /// Maximum capacity.
    pub capacity: usize,
}
