//! Process-local cache store backed by a sharded map

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::SystemTime;

use catalog_cache_core::{CacheEntry, CacheOptions, CacheStats, CacheStore, Result};

/// Sizing for [`MemoryStore`]
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// Entry limit; `0` disables the limit
    pub max_entries: usize,
}

impl MemoryConfig {
    pub fn bounded(max_entries: usize) -> Self {
        Self { max_entries }
    }

    pub fn unbounded() -> Self {
        Self { max_entries: 0 }
    }

    /// Entries to drop before one more fits next to `len` existing ones
    fn overflow(&self, len: usize) -> usize {
        match self.max_entries {
            0 => 0,
            max => (len + 1).saturating_sub(max),
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self::bounded(10_000)
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: u64,
    misses: u64,
    writes: u64,
    removals: u64,
    expired: u64,
    evicted: u64,
}

/// Cache store living in this process.
///
/// Expired entries are dropped when read and in bulk by
/// [`purge_expired`](MemoryStore::purge_expired). Clones share one map.
#[derive(Clone)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, CacheEntry<String>>>,
    counters: Arc<Mutex<Counters>>,
    config: MemoryConfig,
}

impl MemoryStore {
    pub fn new(config: MemoryConfig) -> Self {
        let initial = match config.max_entries {
            0 => 0,
            n => n.min(1024),
        };
        Self {
            entries: Arc::new(DashMap::with_capacity(initial)),
            counters: Arc::default(),
            config,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(MemoryConfig::default())
    }

    /// Free a slot for `incoming` when the map is full.
    ///
    /// Expired entries go first, then the least recently read ones. Entries
    /// that are read often, such as a list version token, are the last to go.
    fn make_room(&self, incoming: &str) {
        if self.entries.contains_key(incoming) || self.config.overflow(self.entries.len()) == 0 {
            return;
        }
        if self.purge_expired() > 0 && self.config.overflow(self.entries.len()) == 0 {
            return;
        }

        let mut by_last_read: Vec<(SystemTime, String)> = self
            .entries
            .iter()
            .map(|e| (e.value().last_accessed, e.key().clone()))
            .collect();

        // Concurrent removals may have freed the slot since the check above
        let excess = self.config.overflow(by_last_read.len());
        if excess == 0 {
            return;
        }
        by_last_read.sort_unstable();

        let evicted = by_last_read
            .iter()
            .take(excess)
            .filter(|(_, key)| self.entries.remove(key.as_str()).is_some())
            .count();
        self.counters.lock().evicted += evicted as u64;
    }

    /// Drop every expired entry; returns how many went
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        let purged = before.saturating_sub(self.entries.len());
        self.counters.lock().expired += purged as u64;
        purged
    }

    /// Payload and key bytes currently held
    pub fn approx_bytes(&self) -> usize {
        self.entries
            .iter()
            .map(|e| e.key().len() + e.value().size)
            .sum()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        let Some(mut entry) = self.entries.get_mut(key) else {
            self.counters.lock().misses += 1;
            return Ok(None);
        };

        if entry.is_expired() {
            drop(entry);
            self.entries.remove_if(key, |_, e| e.is_expired());
            let mut counters = self.counters.lock();
            counters.expired += 1;
            counters.misses += 1;
            return Ok(None);
        }

        entry.touch();
        let payload = entry.value.clone();
        drop(entry);

        self.counters.lock().hits += 1;
        Ok(Some(payload))
    }

    async fn set_string(&self, key: &str, value: String, options: &CacheOptions) -> Result<()> {
        self.make_room(key);

        let size = value.len();
        self.entries
            .insert(key.to_owned(), CacheEntry::with_options(value, size, options));
        self.counters.lock().writes += 1;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        let found = self.entries.remove(key).is_some();
        if found {
            self.counters.lock().removals += 1;
        }
        Ok(found)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self
            .entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired()))
    }

    async fn clear(&self) -> Result<()> {
        self.entries.clear();
        Ok(())
    }

    async fn stats(&self) -> Result<CacheStats> {
        let c = self.counters.lock();
        Ok(CacheStats {
            hits: c.hits,
            misses: c.misses,
            writes: c.writes,
            removals: c.removals,
            expired: c.expired,
            evicted: c.evicted,
            entries: self.entries.len(),
            approx_bytes: Some(self.approx_bytes()),
        })
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_cache_core::CacheOpts;
    use std::time::Duration;

    #[tokio::test]
    async fn test_written_payload_reads_back() {
        let store = MemoryStore::new(MemoryConfig::default());
        let options = CacheOpts::new().sliding_mins(10).absolute_mins(60).build();

        store
            .set_string("product:1", "{\"name\":\"Widget\"}".to_string(), &options)
            .await
            .unwrap();

        let result = store.get_string("product:1").await.unwrap();
        assert_eq!(result.as_deref(), Some("{\"name\":\"Widget\"}"));
    }

    #[tokio::test]
    async fn test_remove() {
        let store = MemoryStore::new(MemoryConfig::default());
        let options = CacheOptions::default();

        store.set_string("key1", "v".to_string(), &options).await.unwrap();
        assert!(store.exists("key1").await.unwrap());

        assert!(store.remove("key1").await.unwrap());
        assert!(!store.exists("key1").await.unwrap());
        assert!(!store.remove("key1").await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_key_is_a_miss() {
        let store = MemoryStore::new(MemoryConfig::default());
        assert!(store.get_string("nonexistent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sliding_entry_expires_when_idle() {
        let store = MemoryStore::new(MemoryConfig::default());
        let options = CacheOpts::new().sliding(Duration::from_millis(40)).build();

        store.set_string("key", "v".to_string(), &options).await.unwrap();
        tokio::time::sleep(Duration::from_millis(80)).await;

        assert!(store.get_string("key").await.unwrap().is_none());
        assert_eq!(store.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reads_extend_sliding_window() {
        let store = MemoryStore::new(MemoryConfig::default());
        let options = CacheOpts::new().sliding(Duration::from_millis(150)).build();

        store.set_string("key", "v".to_string(), &options).await.unwrap();
        for _ in 0..4 {
            tokio::time::sleep(Duration::from_millis(60)).await;
            assert!(store.get_string("key").await.unwrap().is_some());
        }
    }

    #[tokio::test]
    async fn test_absolute_expiration_wins_over_reads() {
        let store = MemoryStore::new(MemoryConfig::default());
        let options = CacheOpts::new()
            .sliding(Duration::from_secs(60))
            .absolute(Duration::from_millis(50))
            .build();

        store.set_string("key", "v".to_string(), &options).await.unwrap();
        assert!(store.get_string("key").await.unwrap().is_some());
        tokio::time::sleep(Duration::from_millis(90)).await;
        assert!(store.get_string("key").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let store = MemoryStore::new(MemoryConfig::default());
        let short = CacheOpts::new().absolute(Duration::from_millis(20)).build();
        let long = CacheOpts::new().absolute_mins(60).build();

        store.set_string("a", "1".to_string(), &short).await.unwrap();
        store.set_string("b", "2".to_string(), &long).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_counters() {
        let store = MemoryStore::new(MemoryConfig::default());
        let options = CacheOptions::default();

        store.set_string("key1", "v".to_string(), &options).await.unwrap();
        store.get_string("key1").await.unwrap();
        store.get_string("nonexistent").await.unwrap();
        store.remove("key1").await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!((stats.hits, stats.misses), (1, 1));
        assert_eq!((stats.writes, stats.removals), (1, 1));
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.approx_bytes, Some(0));
    }

    #[tokio::test]
    async fn test_full_store_makes_room_for_new_key() {
        let store = MemoryStore::new(MemoryConfig::bounded(2));
        let options = CacheOptions::default();

        store.set_string("key1", "1".to_string(), &options).await.unwrap();
        store.set_string("key2", "2".to_string(), &options).await.unwrap();
        store.set_string("key3", "3".to_string(), &options).await.unwrap();

        assert_eq!(store.len().await.unwrap(), 2);
        assert!(store.get_string("key3").await.unwrap().is_some());
        assert_eq!(store.stats().await.unwrap().evicted, 1);
    }

    #[tokio::test]
    async fn test_least_recently_read_entry_is_evicted() {
        let store = MemoryStore::new(MemoryConfig::bounded(2));
        let options = CacheOptions::default();

        store.set_string("token", "v1".to_string(), &options).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        store.set_string("page", "[]".to_string(), &options).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        store.get_string("token").await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        store.set_string("other", "1".to_string(), &options).await.unwrap();

        assert!(store.exists("token").await.unwrap());
        assert!(!store.exists("page").await.unwrap());
        assert!(store.exists("other").await.unwrap());
    }

    #[tokio::test]
    async fn test_newest_write_survives_eviction() {
        let store = MemoryStore::new(MemoryConfig::bounded(2));
        let options = CacheOptions::default();

        for round in 0..32 {
            store.set_string("old", "1".to_string(), &options).await.unwrap();
            tokio::time::sleep(Duration::from_millis(2)).await;
            store.set_string("token", "2".to_string(), &options).await.unwrap();
            tokio::time::sleep(Duration::from_millis(2)).await;
            store
                .set_string(&format!("fresh:{round}"), "3".to_string(), &options)
                .await
                .unwrap();

            assert!(store.exists("token").await.unwrap(), "round {round}");
            store.clear().await.unwrap();
        }
    }

    #[test]
    fn test_overflow_saturates_below_the_limit() {
        let config = MemoryConfig::bounded(5);
        assert_eq!(config.overflow(5), 1);
        assert_eq!(config.overflow(4), 0);
        // Removals racing a full-store check can leave fewer entries
        assert_eq!(config.overflow(3), 0);
        assert_eq!(config.overflow(0), 0);
        assert_eq!(MemoryConfig::unbounded().overflow(usize::MAX - 1), 0);
    }

    #[tokio::test]
    async fn test_overwrite_at_capacity_does_not_evict() {
        let store = MemoryStore::new(MemoryConfig::bounded(2));
        let options = CacheOptions::default();

        store.set_string("key1", "1".to_string(), &options).await.unwrap();
        store.set_string("key2", "2".to_string(), &options).await.unwrap();
        store.set_string("key2", "3".to_string(), &options).await.unwrap();

        assert_eq!(store.len().await.unwrap(), 2);
        assert_eq!(store.stats().await.unwrap().evicted, 0);
    }

    #[tokio::test]
    async fn test_clones_share_data() {
        let store = MemoryStore::with_defaults();
        let other = store.clone();

        store
            .set_string("key", "v".to_string(), &CacheOptions::default())
            .await
            .unwrap();
        assert!(other.exists("key").await.unwrap());

        other.clear().await.unwrap();
        assert!(store.is_empty().await.unwrap());
    }
}
