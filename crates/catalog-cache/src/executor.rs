//! Cache-aside read path and write-side invalidation.
//!
//! A read tries the cache first; on a miss it takes the stampede guard for
//! the key, runs the loader and writes the result back before releasing the
//! guard. The cache is never re-checked after the guard is granted, so two
//! callers that miss together each run the loader once, one after the other.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use catalog_cache_core::{
    CacheKey, CacheMetrics, CacheOptions, CacheStep, CacheStore, Invalidation, JsonSerializer,
    LookupOutcome, NoopMetrics, Serializer,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::best_effort::BestEffortCache;
use crate::config::CacheSettings;
use crate::error::{CatalogError, CatalogResult, StoreError};
use crate::guard::StampedeGuard;
use crate::keys::KeyScheme;
use crate::query::ListRequest;

/// Cache-aside executor.
///
/// Holds the cache only when caching is enabled; with caching off every read
/// runs its loader directly and invalidation does nothing. Cheap to clone.
pub struct CacheAside<B, S = JsonSerializer, M = NoopMetrics> {
    cache: Option<BestEffortCache<B, M>>,
    guard: StampedeGuard,
    serializer: Arc<S>,
    metrics: Arc<M>,
    keys: KeyScheme,
    entry_options: CacheOptions,
}

impl<B: CacheStore> CacheAside<B> {
    pub fn new(store: B, guard: StampedeGuard, settings: &CacheSettings) -> Self {
        Self::with_serializer_and_metrics(store, guard, JsonSerializer, NoopMetrics, settings)
    }
}

impl<B, S, M> CacheAside<B, S, M>
where
    B: CacheStore,
    S: Serializer,
    M: CacheMetrics,
{
    pub fn with_serializer_and_metrics(
        store: B,
        guard: StampedeGuard,
        serializer: S,
        metrics: M,
        settings: &CacheSettings,
    ) -> Self {
        let metrics = Arc::new(metrics);
        let cache = settings.enable_caching.then(|| {
            BestEffortCache::with_metrics(Arc::new(store), settings.cache_timeout(), metrics.clone())
        });

        Self {
            cache,
            guard,
            serializer: Arc::new(serializer),
            metrics,
            keys: KeyScheme::from_settings(settings),
            entry_options: settings.entry_options(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.cache.is_some()
    }

    pub fn keys(&self) -> &KeyScheme {
        &self.keys
    }

    pub fn guard(&self) -> &StampedeGuard {
        &self.guard
    }

    /// Underlying cache store, if caching is enabled
    pub fn store(&self) -> Option<&B> {
        self.cache.as_ref().map(BestEffortCache::store)
    }

    pub fn entity_key(&self, id: impl Display) -> String {
        self.keys.entity_key(id)
    }

    /// Versioned key for one page of the product list
    pub async fn list_key(&self, request: &ListRequest) -> String {
        self.keys.list_key(self.cache.as_ref(), request).await
    }

    /// Return the cached value for `key`, or run `loader` and cache its result.
    ///
    /// Cache failures of any kind count as a miss. Loader errors are returned
    /// unchanged and never cached. The loader runs on its own task: if the
    /// caller stops waiting, the load still finishes and releases the guard.
    pub async fn get_or_load<T, F, Fut>(&self, key: impl CacheKey, loader: F) -> CatalogResult<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = CatalogResult<T>> + Send + 'static,
    {
        let Some(cache) = self.cache.clone() else {
            return loader().await;
        };
        let key = key.cache_key();

        if let Some(value) = self.try_get(&cache, &key).await {
            return Ok(value);
        }

        let handle = self.guard.acquire(&key).await;
        let this = self.clone();
        let recompute = tokio::spawn(async move {
            let start = Instant::now();
            let result = loader().await;
            this.metrics
                .record_duration(CacheStep::Load, start.elapsed());

            let payload = match &result {
                Ok(value) => this.encode(&key, value),
                Err(CatalogError::NotFound(_)) => {
                    debug!(key = %key, "not found; nothing cached");
                    None
                }
                Err(e) => {
                    error!(key = %key, error = %e, "loader failed");
                    None
                }
            };
            if let Some(text) = payload {
                if cache.set_string(&key, text, &this.entry_options).await {
                    debug!(key = %key, "cached");
                }
            }

            drop(handle);
            result
        });

        match recompute.await {
            Ok(result) => result,
            Err(e) => Err(CatalogError::Unexpected(StoreError::Operation(format!(
                "loader task failed: {e}"
            )))),
        }
    }

    /// Evict the cached copy of one product
    pub async fn invalidate_entity(&self, id: impl Display) {
        let Some(cache) = &self.cache else {
            return;
        };

        let key = self.keys.entity_key(id);
        let start = Instant::now();
        if cache.remove(&key).await {
            self.metrics.record_invalidation(Invalidation::Entity);
            debug!(key = %key, "entity evicted");
        }
        self.metrics
            .record_duration(CacheStep::Invalidate, start.elapsed());
    }

    /// Make every cached product list unreachable by replacing the list version
    pub async fn invalidate_list_collection(&self) {
        let Some(cache) = &self.cache else {
            return;
        };

        let start = Instant::now();
        if self.keys.bump_version(cache).await.is_some() {
            self.metrics.record_invalidation(Invalidation::ListCollection);
        }
        self.metrics
            .record_duration(CacheStep::Invalidate, start.elapsed());
    }

    async fn try_get<T: DeserializeOwned>(
        &self,
        cache: &BestEffortCache<B, M>,
        key: &str,
    ) -> Option<T> {
        let Some(text) = cache.get_string(key).await else {
            self.metrics.record_lookup(key, LookupOutcome::Miss);
            debug!(key = %key, "cache miss");
            return None;
        };

        let start = Instant::now();
        let decoded = self.serializer.deserialize::<T>(&text);
        self.metrics
            .record_duration(CacheStep::Decode, start.elapsed());

        match decoded {
            Ok(value) => {
                self.metrics.record_lookup(key, LookupOutcome::Hit);
                debug!(key = %key, "cache hit");
                Some(value)
            }
            Err(e) => {
                self.metrics.record_lookup(key, LookupOutcome::Unreadable);
                debug!(key = %key, error = %e, "unreadable cached payload treated as miss");
                None
            }
        }
    }

    fn encode<T: Serialize>(&self, key: &str, value: &T) -> Option<String> {
        let start = Instant::now();
        match self.serializer.serialize(value) {
            Ok(text) => {
                self.metrics
                    .record_duration(CacheStep::Encode, start.elapsed());
                Some(text)
            }
            Err(e) => {
                self.metrics.record_failure(CacheStep::Encode);
                debug!(key = %key, error = %e, "payload not cached");
                None
            }
        }
    }
}

impl<B, S, M> Clone for CacheAside<B, S, M> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            guard: self.guard.clone(),
            serializer: self.serializer.clone(),
            metrics: self.metrics.clone(),
            keys: self.keys.clone(),
            entry_options: self.entry_options.clone(),
        }
    }
}
