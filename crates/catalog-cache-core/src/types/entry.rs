//! Cache entry type

use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};

use super::options::CacheOptions;

/// A cached payload with its expiration metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// The cached value
    pub value: T,
    /// When the entry was written
    pub created_at: SystemTime,
    /// When the entry was last read (or written)
    pub last_accessed: SystemTime,
    /// Number of times read
    pub access_count: u64,
    /// Idle window, extended on every read
    pub sliding_expiration: Option<Duration>,
    /// Hard lifetime measured from `created_at`
    pub absolute_expiration: Option<Duration>,
    /// Size in bytes
    pub size: usize,
}

impl<T> CacheEntry<T> {
    /// Create a new entry that never expires
    pub fn new(value: T, size: usize) -> Self {
        let now = SystemTime::now();
        Self {
            value,
            created_at: now,
            last_accessed: now,
            access_count: 0,
            sliding_expiration: None,
            absolute_expiration: None,
            size,
        }
    }

    /// Create an entry carrying the given expiration policy
    pub fn with_options(value: T, size: usize, options: &CacheOptions) -> Self {
        let mut entry = Self::new(value, size);
        entry.sliding_expiration = options.sliding_expiration;
        entry.absolute_expiration = options.absolute_expiration;
        entry
    }

    /// Whether the hard lifetime has passed
    pub fn is_absolutely_expired(&self) -> bool {
        match self.absolute_expiration {
            Some(abs) => self.age() > abs,
            None => false,
        }
    }

    /// Check if entry has expired by either policy
    pub fn is_expired(&self) -> bool {
        if self.is_absolutely_expired() {
            return true;
        }
        match self.sliding_expiration {
            Some(sliding) => self.last_accessed.elapsed().unwrap_or_default() > sliding,
            None => false,
        }
    }

    /// Record a read, extending the sliding window
    pub fn touch(&mut self) {
        self.last_accessed = SystemTime::now();
        self.access_count += 1;
    }

    /// Time left before the hard lifetime runs out
    pub fn absolute_remaining(&self) -> Option<Duration> {
        self.absolute_expiration
            .map(|abs| abs.saturating_sub(self.age()))
    }

    /// Time left if the entry is not read again, measured from now
    ///
    /// Stores with only a per-key TTL re-arm it with this value on every read.
    pub fn ttl_remaining(&self) -> Option<Duration> {
        let sliding = self
            .sliding_expiration
            .map(|s| s.saturating_sub(self.last_accessed.elapsed().unwrap_or_default()));
        match (sliding, self.absolute_remaining()) {
            (Some(s), Some(a)) => Some(s.min(a)),
            (Some(s), None) => Some(s),
            (None, a) => a,
        }
    }

    /// Get age of the entry
    pub fn age(&self) -> Duration {
        self.created_at.elapsed().unwrap_or_default()
    }
}
