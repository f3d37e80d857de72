use async_trait::async_trait;
use bb8::{Pool, PooledConnection};
use bb8_redis::RedisConnectionManager;
use parking_lot::Mutex;
use redis::{AsyncCommands, RedisError};
use std::sync::Arc;
use std::time::Duration;

use catalog_cache_core::{CacheEntry, CacheError, CacheOptions, CacheStats, CacheStore, Result};

use super::config::RedisConfig;

/// Redis cache store
///
/// Each value is stored as a JSON envelope carrying its expiration policy.
/// Redis only knows absolute key TTLs, so the key TTL is set to the tighter
/// of the two policies on write and re-armed on every read; that is what
/// makes the sliding window slide.
#[derive(Clone)]
pub struct RedisStore {
    pool: Pool<RedisConnectionManager>,
    config: RedisConfig,
    counters: Arc<Mutex<CacheStats>>,
}

type Conn<'a> = PooledConnection<'a, RedisConnectionManager>;

fn unreachable_server(e: impl ToString) -> CacheError {
    CacheError::Connection(e.to_string())
}

fn command_failed(e: RedisError) -> CacheError {
    CacheError::Backend(e.to_string())
}

impl RedisStore {
    /// Connect a pool; fails if the first connection cannot be opened in time
    pub async fn new(config: RedisConfig) -> Result<Self> {
        let manager =
            RedisConnectionManager::new(config.url.as_str()).map_err(unreachable_server)?;
        let pool = Pool::builder()
            .max_size(config.pool_size)
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .await
            .map_err(unreachable_server)?;

        Ok(Self {
            pool,
            config,
            counters: Arc::default(),
        })
    }

    /// The key as stored on the server, under the optional deployment prefix
    fn server_key(&self, key: &str) -> String {
        self.config
            .key_prefix
            .as_deref()
            .map_or_else(|| key.to_owned(), |prefix| format!("{prefix}:{key}"))
    }

    async fn conn(&self) -> Result<Conn<'_>> {
        self.pool.get().await.map_err(unreachable_server)
    }

    /// Every server key this store owns
    async fn owned_keys(&self) -> Result<Vec<String>> {
        let mut conn = self.conn().await?;
        let pattern = self.server_key("*");

        let mut cursor = 0u64;
        let mut found = Vec::new();
        loop {
            let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .cursor_arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(1000)
                .query_async(&mut *conn)
                .await
                .map_err(command_failed)?;

            found.extend(keys);
            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }
        Ok(found)
    }
}

fn as_millis(ttl: Duration) -> u64 {
    (ttl.as_millis() as u64).max(1)
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn().await?;
        let server_key = self.server_key(key);

        let envelope: Option<String> = conn.get(&server_key).await.map_err(command_failed)?;
        let Some(envelope) = envelope else {
            self.counters.lock().misses += 1;
            return Ok(None);
        };

        let mut entry: CacheEntry<String> = serde_json::from_str(&envelope)
            .map_err(|e| CacheError::Deserialization(e.to_string()))?;

        // The key TTL may still be running while the absolute window has closed
        if entry.is_absolutely_expired() {
            let _: usize = conn.del(&server_key).await.map_err(command_failed)?;
            let mut counters = self.counters.lock();
            counters.expired += 1;
            counters.misses += 1;
            return Ok(None);
        }

        entry.touch();
        if let Some(ttl) = entry.ttl_remaining() {
            redis::cmd("PEXPIRE")
                .arg(&server_key)
                .arg(as_millis(ttl))
                .query_async::<()>(&mut *conn)
                .await
                .map_err(command_failed)?;
        }

        self.counters.lock().hits += 1;
        Ok(Some(entry.value))
    }

    async fn set_string(&self, key: &str, value: String, options: &CacheOptions) -> Result<()> {
        let size = value.len();
        let envelope = serde_json::to_string(&CacheEntry::with_options(value, size, options))
            .map_err(|e| CacheError::Serialization(e.to_string()))?;

        let mut set = redis::cmd("SET");
        set.arg(self.server_key(key)).arg(envelope);
        if let Some(ttl) = options.initial_ttl() {
            set.arg("PX").arg(as_millis(ttl));
        }

        let mut conn = self.conn().await?;
        set.query_async::<()>(&mut *conn)
            .await
            .map_err(command_failed)?;

        self.counters.lock().writes += 1;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn().await?;
        let removed: usize = conn
            .del(self.server_key(key))
            .await
            .map_err(command_failed)?;

        let found = removed > 0;
        if found {
            self.counters.lock().removals += 1;
        }
        Ok(found)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn().await?;
        conn.exists(self.server_key(key))
            .await
            .map_err(command_failed)
    }

    async fn clear(&self) -> Result<()> {
        let owned = self.owned_keys().await?;
        if owned.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn().await?;
        for batch in owned.chunks(1000) {
            let _: usize = conn.unlink(batch).await.map_err(command_failed)?;
        }
        Ok(())
    }

    async fn stats(&self) -> Result<CacheStats> {
        let entries = self.len().await?;
        Ok(CacheStats {
            entries,
            ..self.counters.lock().clone()
        })
    }

    async fn len(&self) -> Result<usize> {
        if self.config.key_prefix.is_some() {
            // O(N) scan; only meant for diagnostics
            return Ok(self.owned_keys().await?.len());
        }

        let mut conn = self.conn().await?;
        redis::cmd("DBSIZE")
            .query_async(&mut *conn)
            .await
            .map_err(command_failed)
    }
}
