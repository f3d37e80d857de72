//! Core traits for cache operations

mod key;
mod metrics;
mod serializer;
mod store;

#[cfg(feature = "tracing")]
mod tracing;

pub use key::{CacheKey, CompositeKey};
pub use metrics::{CacheMetrics, CacheStep, Invalidation, LookupOutcome, NoopMetrics};
pub use serializer::{JsonSerializer, Serializer};
pub use store::CacheStore;

#[cfg(feature = "metrics")]
pub use metrics::MetricsCrateAdapter;

#[cfg(feature = "tracing")]
pub use self::tracing::TracingMetrics;
