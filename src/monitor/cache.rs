//! In-process TTL cache and per-key locking.
//!
//! The previous-status cache and the alert cooldowns both need "value with an
//! expiry" semantics; the monitor needs at-most-one in-flight check per
//! bridge. Both live here.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// A value store where every entry carries its own expiry.
pub struct TtlCache<K, V> {
    entries: Mutex<HashMap<K, (V, Instant)>>,
}

impl<K: Eq + Hash + Clone, V: Clone> TtlCache<K, V> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch a live entry. Expired entries are dropped on access.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().expect("ttl cache poisoned");
        match entries.get(key) {
            Some((_, expires)) if *expires <= Instant::now() => {
                entries.remove(key);
                None
            }
            Some((value, _)) => Some(value.clone()),
            None => None,
        }
    }

    pub fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    pub fn set(&self, key: K, value: V, ttl: Duration) {
        let mut entries = self.entries.lock().expect("ttl cache poisoned");
        entries.insert(key, (value, Instant::now() + ttl));
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Default for TtlCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-key async mutexes, created lazily. Guards the read-decide-write
/// sequence on the status cache so two checks of the same bridge cannot
/// interleave.
pub struct KeyedLocks<K> {
    locks: Mutex<HashMap<K, Arc<tokio::sync::Mutex<()>>>>,
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub async fn lock(&self, key: K) -> tokio::sync::OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().expect("keyed locks poisoned");
            locks.entry(key).or_default().clone()
        };
        lock.lock_owned().await
    }
}

impl<K: Eq + Hash + Clone> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_expire() {
        let cache: TtlCache<i64, &str> = TtlCache::new();
        cache.set(1, "UP", Duration::from_secs(60));
        assert_eq!(cache.get(&1), Some("UP"));

        cache.set(2, "DOWN", Duration::ZERO);
        assert_eq!(cache.get(&2), None);
        assert!(!cache.contains(&2));
    }

    #[test]
    fn test_set_overwrites() {
        let cache: TtlCache<i64, &str> = TtlCache::new();
        cache.set(1, "UP", Duration::from_secs(60));
        cache.set(1, "SLOW", Duration::from_secs(60));
        assert_eq!(cache.get(&1), Some("SLOW"));
    }

    #[tokio::test]
    async fn test_keyed_lock_serializes_same_key() {
        let locks: Arc<KeyedLocks<i64>> = Arc::new(KeyedLocks::new());

        let guard = locks.lock(7).await;
        // a second lock on the same key must wait
        let locks2 = locks.clone();
        let pending = tokio::spawn(async move {
            let _g = locks2.lock(7).await;
        });
        tokio::task::yield_now().await;
        assert!(!pending.is_finished());

        // a different key is independent
        let _other = locks.lock(8).await;

        drop(guard);
        pending.await.unwrap();
    }
}
