//! Cache store trait

use async_trait::async_trait;
use crate::{CacheError, CacheOptions, CacheStats};

/// Key/value store consulted by the cache-aside layer.
///
/// Values are the serialized payload text. Implementations own entry storage
/// and expiry; a read through [`get_string`](CacheStore::get_string) extends
/// the sliding window of the entry it returns.
#[async_trait]
pub trait CacheStore: Send + Sync + 'static {
    /// Get a value from the store
    ///
    /// Returns `None` if the key doesn't exist or has expired.
    async fn get_string(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Set a value with the given expiration policy, replacing any previous entry
    async fn set_string(
        &self,
        key: &str,
        value: String,
        options: &CacheOptions,
    ) -> Result<(), CacheError>;

    /// Remove a key from the store
    ///
    /// Returns `true` if the key existed and was removed.
    async fn remove(&self, key: &str) -> Result<bool, CacheError>;

    /// Check if a live entry exists for the key, without touching it
    async fn exists(&self, key: &str) -> Result<bool, CacheError>;

    /// Clear all entries from the store
    async fn clear(&self) -> Result<(), CacheError>;

    /// Get store statistics
    async fn stats(&self) -> Result<CacheStats, CacheError>;

    /// Get the number of entries in the store
    async fn len(&self) -> Result<usize, CacheError>;

    /// Check if the store is empty
    async fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.len().await? == 0)
    }
}
