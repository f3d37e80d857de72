//! Counters reported by cache stores

/// Point-in-time counters for one cache store.
///
/// Counters are cumulative since the store handle was created; `entries` and
/// `approx_bytes` are sampled when the snapshot is taken.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    /// Removals that found a live key
    pub removals: u64,
    /// Entries dropped because a sliding or absolute window elapsed
    pub expired: u64,
    /// Entries dropped to stay under a capacity limit
    pub evicted: u64,
    pub entries: usize,
    /// Payload plus key bytes, when the store can tell
    pub approx_bytes: Option<usize>,
}

impl CacheStats {
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    /// Share of lookups that hit; `None` before the first lookup
    pub fn hit_ratio(&self) -> Option<f64> {
        match self.lookups() {
            0 => None,
            n => Some(self.hits as f64 / n as f64),
        }
    }

    /// Entries that left without an explicit removal
    pub fn dropped(&self) -> u64 {
        self.expired + self.evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_ratio_without_lookups() {
        let stats = CacheStats::default();
        assert_eq!(stats.lookups(), 0);
        assert!(stats.hit_ratio().is_none());
    }

    #[test]
    fn test_ratio_and_dropped() {
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            expired: 2,
            evicted: 1,
            ..Default::default()
        };
        assert_eq!(stats.hit_ratio(), Some(0.75));
        assert_eq!(stats.dropped(), 3);
    }
}
