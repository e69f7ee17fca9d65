//! In-process LRU cache with per-entry expiry.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};
use std::time::{Duration, Instant};

struct Entry<V> {
    value: V,
    expires_at: Instant,
    last_used: u64,
}

/// A bounded, TTL-aware LRU cache.
///
/// Uses `std::sync` primitives (a `RwLock` guarding the map, a small
/// `Mutex`-protected monotonic clock for LRU ordering) rather than a
/// third-party concurrent-map crate, matching the teacher's general
/// preference for the standard library.
pub struct L1Cache<V> {
    capacity: usize,
    default_ttl: Duration,
    entries: RwLock<HashMap<String, Entry<V>>>,
    clock: Mutex<u64>,
}

impl<V: Clone> L1Cache<V> {
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        Self {
            capacity,
            default_ttl,
            entries: RwLock::new(HashMap::new()),
            clock: Mutex::new(0),
        }
    }

    fn tick(&self) -> u64 {
        let mut c = self.clock.lock().unwrap();
        *c += 1;
        *c
    }

    /// Returns the cached value, or `None` on miss / expiry. Expired
    /// entries are evicted lazily on read.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let tick = self.tick();
        {
            let entries = self.entries.read().unwrap();
            if let Some(entry) = entries.get(key) {
                if entry.expires_at > now {
                    // fall through to upgrade the lock for the LRU touch
                } else {
                    drop(entries);
                    self.entries.write().unwrap().remove(key);
                    return None;
                }
            } else {
                return None;
            }
        }
        let mut entries = self.entries.write().unwrap();
        if let Some(entry) = entries.get_mut(key) {
            if entry.expires_at > now {
                entry.last_used = tick;
                return Some(entry.value.clone());
            }
            entries.remove(key);
        }
        None
    }

    /// `ttl = None` uses the cache's configured default.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        let key = key.into();
        let ttl = ttl.unwrap_or(self.default_ttl);
        let tick = self.tick();
        let mut entries = self.entries.write().unwrap();
        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            evict_lru(&mut entries);
        }
        entries.insert(key, Entry { value, expires_at: Instant::now() + ttl, last_used: tick });
    }

    pub fn delete(&self, key: &str) {
        self.entries.write().unwrap().remove(key);
    }

    pub fn clear(&self) {
        self.entries.write().unwrap().clear();
    }

    /// Remove every entry whose TTL has elapsed. Intended to be driven by
    /// a periodic background task.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().unwrap();
        let before = entries.len();
        entries.retain(|_, e| e.expires_at > now);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn evict_lru<V>(entries: &mut HashMap<String, Entry<V>>) {
    if let Some(key) = entries
        .iter()
        .min_by_key(|(_, e)| e.last_used)
        .map(|(k, _)| k.clone())
    {
        entries.remove(&key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_returns_value() {
        let cache = L1Cache::new(10, Duration::from_secs(60));
        cache.set("a", 1, None);
        assert_eq!(cache.get("a"), Some(1));
    }

    #[test]
    fn expired_entry_is_a_miss() {
        let cache = L1Cache::new(10, Duration::from_secs(60));
        cache.set("a", 1, Some(Duration::from_millis(0)));
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn delete_removes_entry() {
        let cache = L1Cache::new(10, Duration::from_secs(60));
        cache.set("a", 1, None);
        cache.delete("a");
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn eviction_drops_least_recently_used_when_full() {
        let cache = L1Cache::new(2, Duration::from_secs(60));
        cache.set("a", 1, None);
        cache.set("b", 2, None);
        // touch "a" so "b" becomes the LRU victim
        assert_eq!(cache.get("a"), Some(1));
        cache.set("c", 3, None);
        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("c"), Some(3));
    }

    #[test]
    fn sweep_expired_evicts_stale_entries_proactively() {
        let cache = L1Cache::new(10, Duration::from_secs(60));
        cache.set("a", 1, Some(Duration::from_millis(0)));
        cache.set("b", 2, None);
        std::thread::sleep(Duration::from_millis(5));
        let removed = cache.sweep_expired();
        assert_eq!(removed, 1);
        assert_eq!(cache.len(), 1);
    }
}
