//! Cache-aside events as `tracing` records

use crate::{CacheMetrics, CacheStep, Invalidation, LookupOutcome};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Logs each event under the `catalog_cache` target.
///
/// Lookups and invalidations are DEBUG, failures WARN, durations TRACE.
#[derive(Debug, Clone, Default)]
pub struct TracingMetrics {
    service: Option<String>,
}

impl TracingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag every record with `service`
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service = Some(name.into());
        self
    }

    fn service(&self) -> &str {
        self.service.as_deref().unwrap_or("-")
    }
}

impl CacheMetrics for TracingMetrics {
    fn record_lookup(&self, key: &str, outcome: LookupOutcome) {
        debug!(
            target: "catalog_cache",
            service = self.service(),
            key,
            outcome = outcome.label(),
            "lookup"
        );
    }

    fn record_failure(&self, step: CacheStep) {
        warn!(
            target: "catalog_cache",
            service = self.service(),
            step = step.label(),
            "cache step failed; continuing without cache"
        );
    }

    fn record_duration(&self, step: CacheStep, elapsed: Duration) {
        trace!(
            target: "catalog_cache",
            service = self.service(),
            step = step.label(),
            micros = elapsed.as_micros() as u64,
            "step finished"
        );
    }

    fn record_invalidation(&self, kind: Invalidation) {
        debug!(
            target: "catalog_cache",
            service = self.service(),
            kind = kind.label(),
            "invalidated"
        );
    }
}
