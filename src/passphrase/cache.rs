//! In-memory cache for verified passphrases.
//!
//! Sessions read the cache before prompting and write it once per
//! successful verification. Entries expire after a TTL and are zeroized
//! when dropped.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

use crate::types::{CacheKey, Passphrase};

/// Shared passphrase cache.
///
/// Writes are atomic per key and the last write wins.
pub trait PassphraseCache: Send + Sync {
    /// Passphrase verified earlier for `key`, if still live.
    fn get(&self, key: CacheKey) -> Option<Passphrase>;

    /// Record a verified passphrase for `key`, replacing any earlier one.
    fn put(&self, key: CacheKey, passphrase: Passphrase);
}

/// Configuration for the passphrase cache.
#[derive(Debug, Clone)]
pub struct PassphraseCacheConfig {
    /// How long a verified passphrase stays usable
    pub default_ttl: Duration,

    /// Upper bound on cached passphrases
    pub max_entries: usize,

    /// Interval for [`spawn_cleanup_task`]
    pub cleanup_interval: Duration,
}

impl Default for PassphraseCacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(180),
            max_entries: 1_000,
            cleanup_interval: Duration::from_secs(60),
        }
    }
}

struct Entry {
    passphrase: Passphrase,
    expires_at: Instant,
    last_used: Instant,
}

impl Entry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// TTL cache bounded by entry count, evicting the least recently used.
pub struct InMemoryPassphraseCache {
    entries: DashMap<CacheKey, Entry>,
    config: PassphraseCacheConfig,
}

impl InMemoryPassphraseCache {
    pub fn new(config: PassphraseCacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(PassphraseCacheConfig::default())
    }

    /// Drop expired entries and return how many went.
    pub fn cleanup(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Evict the least recently used entry other than `keep`.
    ///
    /// Returns false when there was nothing to evict.
    fn evict_lru_except(&self, keep: CacheKey) -> bool {
        let oldest = self
            .entries
            .iter()
            .map(|e| (*e.key(), e.last_used))
            .filter(|(key, _)| *key != keep)
            .min_by_key(|(_, last_used)| *last_used)
            .map(|(key, _)| key);

        match oldest {
            Some(key) => {
                self.entries.remove(&key);
                debug!(key = %key, "Evicted least recently used passphrase");
                true
            }
            None => false,
        }
    }
}

impl PassphraseCache for InMemoryPassphraseCache {
    fn get(&self, key: CacheKey) -> Option<Passphrase> {
        if let Some(mut entry) = self.entries.get_mut(&key) {
            if !entry.is_expired() {
                entry.last_used = Instant::now();
                return Some(entry.passphrase.clone());
            }
        }

        // Only the expired entry goes; a concurrent put survives
        self.entries.remove_if(&key, |_, entry| entry.is_expired());
        None
    }

    fn put(&self, key: CacheKey, passphrase: Passphrase) {
        let now = Instant::now();
        self.entries.insert(
            key,
            Entry {
                passphrase,
                expires_at: now + self.config.default_ttl,
                last_used: now,
            },
        );

        while self.entries.len() > self.config.max_entries {
            if !self.evict_lru_except(key) {
                break;
            }
        }
    }
}

impl Default for InMemoryPassphraseCache {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Periodically drop expired passphrases.
pub fn spawn_cleanup_task(
    cache: Arc<InMemoryPassphraseCache>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let removed = cache.cleanup();
            if removed > 0 {
                debug!(entries_removed = removed, "Cleaned up expired passphrases");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KeyId;

    fn key(id: u64) -> CacheKey {
        CacheKey::Key(KeyId::new(id))
    }

    fn short_lived() -> InMemoryPassphraseCache {
        InMemoryPassphraseCache::new(PassphraseCacheConfig {
            default_ttl: Duration::from_millis(10),
            ..Default::default()
        })
    }

    #[test]
    fn test_put_and_get() {
        let cache = InMemoryPassphraseCache::with_defaults();

        cache.put(key(1), Passphrase::from("hunter2"));

        assert_eq!(cache.get(key(1)), Some(Passphrase::from("hunter2")));
        assert!(cache.get(key(404)).is_none());
    }

    #[test]
    fn test_last_write_wins() {
        let cache = InMemoryPassphraseCache::with_defaults();

        cache.put(key(1), Passphrase::from("first"));
        cache.put(key(1), Passphrase::from("second"));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(key(1)), Some(Passphrase::from("second")));
    }

    #[test]
    fn test_symmetric_slot_is_separate() {
        let cache = InMemoryPassphraseCache::with_defaults();

        cache.put(CacheKey::Symmetric, Passphrase::from("sym"));
        cache.put(key(0), Passphrase::from("asym"));

        assert_eq!(cache.get(CacheKey::Symmetric), Some(Passphrase::from("sym")));
        assert_eq!(cache.get(key(0)), Some(Passphrase::from("asym")));
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let cache = short_lived();

        cache.put(key(1), Passphrase::from("pw"));
        assert!(cache.get(key(1)).is_some());

        std::thread::sleep(Duration::from_millis(20));

        assert!(cache.get(key(1)).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_expired_read_keeps_fresh_write() {
        let cache = short_lived();
        cache.put(key(1), Passphrase::from("old"));
        std::thread::sleep(Duration::from_millis(20));

        // A fresh write lands between the expiry check and removal
        cache.put(key(1), Passphrase::from("hunter2"));
        cache.entries.remove_if(&key(1), |_, entry| entry.is_expired());

        assert_eq!(cache.get(key(1)), Some(Passphrase::from("hunter2")));
    }

    #[test]
    fn test_cleanup_removes_expired() {
        let cache = short_lived();

        cache.put(key(1), Passphrase::from("a"));
        cache.put(key(2), Passphrase::from("b"));
        std::thread::sleep(Duration::from_millis(20));

        assert_eq!(cache.cleanup(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_lru_eviction() {
        let cache = InMemoryPassphraseCache::new(PassphraseCacheConfig {
            max_entries: 3,
            ..Default::default()
        });

        for i in 0..3 {
            cache.put(key(i), Passphrase::from(format!("pw-{i}")));
            std::thread::sleep(Duration::from_millis(5));
        }

        // Read key 0 so key 1 becomes the oldest
        cache.get(key(0));
        cache.put(key(3), Passphrase::from("pw-3"));

        assert_eq!(cache.len(), 3);
        assert!(cache.get(key(0)).is_some());
        assert!(cache.get(key(1)).is_none());
        assert!(cache.get(key(3)).is_some());
    }

    #[test]
    fn test_overwrite_at_capacity_does_not_evict() {
        let cache = InMemoryPassphraseCache::new(PassphraseCacheConfig {
            max_entries: 2,
            ..Default::default()
        });

        cache.put(key(1), Passphrase::from("a"));
        cache.put(key(2), Passphrase::from("b"));
        cache.put(key(2), Passphrase::from("c"));

        assert_eq!(cache.len(), 2);
        assert!(cache.get(key(1)).is_some());
    }

    #[test]
    fn test_concurrent_puts_respect_capacity() {
        let cache = Arc::new(InMemoryPassphraseCache::new(PassphraseCacheConfig {
            max_entries: 4,
            ..Default::default()
        }));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        cache.put(key(t * 100 + i), Passphrase::from("pw"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert!(cache.len() <= 4);
    }

    #[tokio::test]
    async fn test_cleanup_task_evicts() {
        let cache = Arc::new(InMemoryPassphraseCache::new(PassphraseCacheConfig {
            default_ttl: Duration::from_millis(5),
            ..Default::default()
        }));
        cache.put(key(1), Passphrase::from("pw"));

        let handle = spawn_cleanup_task(Arc::clone(&cache), Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.abort();

        assert!(cache.is_empty());
    }
}
