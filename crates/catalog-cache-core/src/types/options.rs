//! Cache options and builder

use std::time::Duration;

/// Expiration policy for a cache entry
///
/// An entry expires once it has gone unread for `sliding_expiration`, or once
/// `absolute_expiration` has passed since it was written, whichever is first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheOptions {
    /// Idle window, extended on every read
    pub sliding_expiration: Option<Duration>,
    /// Hard lifetime measured from the write
    pub absolute_expiration: Option<Duration>,
}

impl CacheOptions {
    /// The longest the entry can live without being read again
    pub fn initial_ttl(&self) -> Option<Duration> {
        match (self.sliding_expiration, self.absolute_expiration) {
            (Some(s), Some(a)) => Some(s.min(a)),
            (Some(s), None) => Some(s),
            (None, a) => a,
        }
    }
}

/// Builder for CacheOptions with fluent API
#[derive(Debug, Clone, Default)]
pub struct CacheOpts(CacheOptions);

impl CacheOpts {
    /// Create new options builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set sliding expiration
    pub fn sliding(mut self, duration: Duration) -> Self {
        self.0.sliding_expiration = Some(duration);
        self
    }

    /// Set sliding expiration in minutes
    pub fn sliding_mins(self, minutes: u64) -> Self {
        self.sliding(Duration::from_secs(minutes * 60))
    }

    /// Set absolute expiration, relative to the write
    pub fn absolute(mut self, duration: Duration) -> Self {
        self.0.absolute_expiration = Some(duration);
        self
    }

    /// Set absolute expiration in minutes
    pub fn absolute_mins(self, minutes: u64) -> Self {
        self.absolute(Duration::from_secs(minutes * 60))
    }

    /// Build the options
    pub fn build(self) -> CacheOptions {
        self.0
    }
}

impl From<CacheOpts> for CacheOptions {
    fn from(opts: CacheOpts) -> Self {
        opts.0
    }
}

impl From<Duration> for CacheOptions {
    fn from(ttl: Duration) -> Self {
        CacheOptions {
            absolute_expiration: Some(ttl),
            ..Default::default()
        }
    }
}
