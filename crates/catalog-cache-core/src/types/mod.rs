//! Core types for cache operations

mod entry;
mod options;
mod stats;

pub use entry::CacheEntry;
pub use options::{CacheOptions, CacheOpts};
pub use stats::CacheStats;
