//! Fail-soft view of a cache store.
//!
//! Every call is bounded by the configured timeout. A timeout or a store
//! error is logged and counted and then reported as "did not complete"; it
//! never becomes an error for the caller.

use std::sync::Arc;
use std::time::{Duration, Instant};

use catalog_cache_core::{
    CacheError, CacheMetrics, CacheOptions, CacheStep, CacheStore, NoopMetrics,
};
use tokio::time::timeout;
use tracing::{debug, warn};

pub struct BestEffortCache<B, M = NoopMetrics> {
    store: Arc<B>,
    timeout: Duration,
    metrics: Arc<M>,
}

impl<B: CacheStore> BestEffortCache<B, NoopMetrics> {
    pub fn new(store: B, timeout: Duration) -> Self {
        Self::with_metrics(Arc::new(store), timeout, Arc::new(NoopMetrics))
    }
}

impl<B, M> BestEffortCache<B, M>
where
    B: CacheStore,
    M: CacheMetrics,
{
    pub fn with_metrics(store: Arc<B>, timeout: Duration, metrics: Arc<M>) -> Self {
        Self {
            store,
            timeout,
            metrics,
        }
    }

    /// The wrapped store
    pub fn store(&self) -> &B {
        &self.store
    }

    /// Per-call deadline
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Read a payload. `None` covers absence, timeout and store failure alike.
    pub async fn get_string(&self, key: &str) -> Option<String> {
        let start = Instant::now();
        let outcome = timeout(self.timeout, self.store.get_string(key)).await;
        self.metrics
            .record_duration(CacheStep::Read, start.elapsed());

        match outcome {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => {
                self.report(CacheStep::Read, key, &e);
                None
            }
            Err(_) => {
                self.report(CacheStep::Read, key, &CacheError::Timeout);
                None
            }
        }
    }

    /// Write a payload. Returns whether the write completed.
    pub async fn set_string(&self, key: &str, value: String, options: &CacheOptions) -> bool {
        let start = Instant::now();
        let outcome = timeout(self.timeout, self.store.set_string(key, value, options)).await;
        self.metrics
            .record_duration(CacheStep::Write, start.elapsed());

        match outcome {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                self.report(CacheStep::Write, key, &e);
                false
            }
            Err(_) => {
                self.report(CacheStep::Write, key, &CacheError::Timeout);
                false
            }
        }
    }

    /// Remove a key. Returns whether the call completed, not whether the key existed.
    pub async fn remove(&self, key: &str) -> bool {
        let start = Instant::now();
        let outcome = timeout(self.timeout, self.store.remove(key)).await;
        self.metrics
            .record_duration(CacheStep::Evict, start.elapsed());

        match outcome {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                self.report(CacheStep::Evict, key, &e);
                false
            }
            Err(_) => {
                self.report(CacheStep::Evict, key, &CacheError::Timeout);
                false
            }
        }
    }

    fn report(&self, step: CacheStep, key: &str, error: &CacheError) {
        self.metrics.record_failure(step);
        let step = step.label();
        match error {
            CacheError::Timeout => debug!(key = %key, step, "cache call timed out"),
            e if e.is_unavailable() => warn!(key = %key, step, error = %e, "cache unavailable"),
            e => debug!(key = %key, step, error = %e, "cache call failed"),
        }
    }
}

impl<B, M> Clone for BestEffortCache<B, M> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            timeout: self.timeout,
            metrics: self.metrics.clone(),
        }
    }
}
