//! Observability hooks for the cache-aside path

use std::time::Duration;

/// A timed step on the cache-aside path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheStep {
    /// Store read
    Read,
    /// Store write
    Write,
    /// Store removal
    Evict,
    Decode,
    Encode,
    /// Loader run on a miss
    Load,
    Invalidate,
}

impl CacheStep {
    pub fn label(self) -> &'static str {
        match self {
            CacheStep::Read => "read",
            CacheStep::Write => "write",
            CacheStep::Evict => "evict",
            CacheStep::Decode => "decode",
            CacheStep::Encode => "encode",
            CacheStep::Load => "load",
            CacheStep::Invalidate => "invalidate",
        }
    }
}

/// What a cache lookup produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupOutcome {
    Hit,
    Miss,
    /// A payload was found but could not be decoded; handled as a miss
    Unreadable,
}

impl LookupOutcome {
    pub fn label(self) -> &'static str {
        match self {
            LookupOutcome::Hit => "hit",
            LookupOutcome::Miss => "miss",
            LookupOutcome::Unreadable => "unreadable",
        }
    }

    /// Whether the caller had to fall through to the loader
    pub fn is_miss(self) -> bool {
        !matches!(self, LookupOutcome::Hit)
    }
}

/// Which cached data a write made stale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Invalidation {
    /// One product entry was removed
    Entity,
    /// The list version was replaced
    ListCollection,
}

impl Invalidation {
    pub fn label(self) -> &'static str {
        match self {
            Invalidation::Entity => "entity",
            Invalidation::ListCollection => "list_collection",
        }
    }
}

/// Sink for cache-aside events.
///
/// Every method is called inline on the request path, so implementations
/// should not block.
pub trait CacheMetrics: Send + Sync + 'static {
    fn record_lookup(&self, key: &str, outcome: LookupOutcome);

    /// A step that did not complete: a timeout, a lost connection, or a payload
    /// that would not encode
    fn record_failure(&self, step: CacheStep);

    fn record_duration(&self, step: CacheStep, elapsed: Duration);

    fn record_invalidation(&self, kind: Invalidation);
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl CacheMetrics for NoopMetrics {
    #[inline]
    fn record_lookup(&self, _key: &str, _outcome: LookupOutcome) {}

    #[inline]
    fn record_failure(&self, _step: CacheStep) {}

    #[inline]
    fn record_duration(&self, _step: CacheStep, _elapsed: Duration) {}

    #[inline]
    fn record_invalidation(&self, _kind: Invalidation) {}
}

/// Publishes events through the `metrics` facade.
///
/// With prefix `catalog_cache` it emits `catalog_cache_lookups_total{outcome}`,
/// `catalog_cache_step_failures_total{step}`, `catalog_cache_step_seconds{step}`
/// and `catalog_cache_invalidations_total{kind}`.
#[cfg(feature = "metrics")]
#[derive(Debug, Clone)]
pub struct MetricsCrateAdapter {
    lookups: String,
    failures: String,
    durations: String,
    invalidations: String,
}

#[cfg(feature = "metrics")]
impl MetricsCrateAdapter {
    pub fn new(prefix: impl AsRef<str>) -> Self {
        let prefix = prefix.as_ref();
        Self {
            lookups: format!("{prefix}_lookups_total"),
            failures: format!("{prefix}_step_failures_total"),
            durations: format!("{prefix}_step_seconds"),
            invalidations: format!("{prefix}_invalidations_total"),
        }
    }
}

#[cfg(feature = "metrics")]
impl CacheMetrics for MetricsCrateAdapter {
    fn record_lookup(&self, _key: &str, outcome: LookupOutcome) {
        metrics::counter!(self.lookups.clone(), "outcome" => outcome.label()).increment(1);
    }

    fn record_failure(&self, step: CacheStep) {
        metrics::counter!(self.failures.clone(), "step" => step.label()).increment(1);
    }

    fn record_duration(&self, step: CacheStep, elapsed: Duration) {
        metrics::histogram!(self.durations.clone(), "step" => step.label())
            .record(elapsed.as_secs_f64());
    }

    fn record_invalidation(&self, kind: Invalidation) {
        metrics::counter!(self.invalidations.clone(), "kind" => kind.label()).increment(1);
    }
}
