use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Entry stored in the DashMap. `expires_at == None` means the entry never
/// ages out.
#[derive(Clone)]
pub(crate) struct CacheEntry {
    value: String,
    pub(crate) expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(deadline) if now >= deadline)
    }
}

/// In-memory TTL cache keyed by string, holding JSON-serialized values.
///
/// Expired entries are checked on read and evicted lazily; a sweep can be
/// forced with `evict_expired()`. The entry count is bounded by
/// `max_entries`: when full, expired entries are swept first and then an
/// arbitrary entry is dropped. Callers get no LRU/LFU guarantee — only that
/// an entry is absent after its TTL and may be gone earlier under pressure.
///
/// Concurrent `get`/`set` from fan-out tasks is safe; a contended key is
/// last-writer-wins.
#[derive(Clone)]
pub struct TtlCache {
    entries: Arc<DashMap<String, CacheEntry>>,
    max_entries: usize,
}

impl TtlCache {
    pub fn new(max_entries: usize, initial_capacity: usize) -> Self {
        Self {
            entries: Arc::new(DashMap::with_capacity(initial_capacity.min(max_entries))),
            max_entries: max_entries.max(1),
        }
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired(Instant::now()) {
                return serde_json::from_str(&entry.value).ok();
            }
            // expired — drop the ref before removing
            drop(entry);
            self.entries.remove(key);
        }
        None
    }

    /// Insert without a TTL. Returns the previous raw entry, if any.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> anyhow::Result<Option<String>> {
        self.insert(key, value, None)
    }

    /// Insert with a fixed wall-clock TTL starting now.
    pub fn set_with_expiration<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> anyhow::Result<Option<String>> {
        self.insert(key, value, Some(Instant::now() + ttl))
    }

    fn insert<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        expires_at: Option<Instant>,
    ) -> anyhow::Result<Option<String>> {
        let json = serde_json::to_string(value)?;
        if !self.entries.contains_key(key) && self.entries.len() >= self.max_entries {
            self.make_room();
        }
        let previous = self
            .entries
            .insert(key.to_string(), CacheEntry { value: json, expires_at })
            .map(|entry| entry.value);
        Ok(previous)
    }

    /// Remove an entry, returning the removed raw entry if one was present.
    pub fn invalidate(&self, key: &str) -> Option<String> {
        self.entries.remove(key).map(|(_, entry)| entry.value)
    }

    /// Remove all expired entries, returning how many were dropped.
    pub fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before - self.entries.len()
    }

    /// Current number of entries (for metrics / debugging).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn make_room(&self) {
        if self.evict_expired() > 0 {
            return;
        }
        // Still full: drop an arbitrary live entry.
        let victim = self.entries.iter().next().map(|e| e.key().clone());
        if let Some(key) = victim {
            self.entries.remove(&key);
        }
    }
}
