use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, SystemTime};

use super::{CacheStore, CachedResponse};
use crate::transport::RequestKey;

/// Default number of responses kept by a [`MemoryCache`].
pub const DEFAULT_CAPACITY: usize = 256;

/// In-process response cache.
///
/// Holds at most `capacity` responses; storing into a full cache evicts the
/// oldest entry. With a `max_age`, entries older than that are treated as
/// absent and dropped on lookup.
#[derive(Debug)]
pub struct MemoryCache {
    entries: RwLock<HashMap<RequestKey, CachedResponse>>,
    capacity: usize,
    max_age: Option<Duration>,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl MemoryCache {
    /// Creates a cache holding up to `capacity` responses (at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
            max_age: None,
        }
    }

    /// Expires entries older than `max_age`.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Removes the entry for `key` only if it is still the one stored at
    /// `stored_at`; a response stored since then is kept.
    fn remove_if_stored_at(&self, key: &RequestKey, stored_at: SystemTime) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        match entries.get(key) {
            Some(current) if current.stored_at == stored_at => {
                entries.remove(key);
                true
            }
            _ => false,
        }
    }

    fn is_expired(&self, entry: &CachedResponse) -> bool {
        let Some(max_age) = self.max_age else {
            return false;
        };
        SystemTime::now()
            .duration_since(entry.stored_at)
            .map(|age| age > max_age)
            .unwrap_or(false)
    }
}

impl CacheStore for MemoryCache {
    fn lookup(&self, key: &RequestKey) -> Option<CachedResponse> {
        let entry = {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            entries.get(key).cloned()
        }?;

        if self.is_expired(&entry) {
            tracing::debug!(key = %key, "Cache entry expired");
            self.remove_if_stored_at(key, entry.stored_at);
            return None;
        }

        tracing::debug!(key = %key, status = entry.metadata.status(), "Cache hit");
        Some(entry)
    }

    fn store(&self, key: RequestKey, response: CachedResponse) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());

        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.stored_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                tracing::debug!(key = %oldest, "Evicting oldest cache entry");
                entries.remove(&oldest);
            }
        }

        tracing::debug!(key = %key, bytes = response.body.len(), "Stored response");
        entries.insert(key, response);
    }

    fn remove(&self, key: &RequestKey) -> Option<CachedResponse> {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key)
    }

    fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}
