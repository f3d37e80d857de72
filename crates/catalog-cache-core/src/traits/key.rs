//! Cache key rendering

use std::fmt::Display;

/// Anything that renders to a cache key.
///
/// Equal inputs must always render equal key strings.
pub trait CacheKey: Send + Sync {
    fn cache_key(&self) -> String;
}

impl CacheKey for String {
    fn cache_key(&self) -> String {
        self.clone()
    }
}

impl CacheKey for &str {
    fn cache_key(&self) -> String {
        (*self).to_owned()
    }
}

impl CacheKey for &String {
    fn cache_key(&self) -> String {
        (*self).clone()
    }
}

/// A prefix followed by segments, all joined with `:`.
///
/// The prefix is joined like any other segment, so a prefix that already ends
/// in `:` (`products:list:`) yields an empty field after it. Segments are never
/// escaped and empty ones are kept.
#[derive(Debug, Clone, Default)]
pub struct CompositeKey {
    prefix: String,
    segments: Vec<String>,
}

impl CompositeKey {
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            segments: Vec::new(),
        }
    }

    pub fn part(mut self, segment: impl Display) -> Self {
        self.segments.push(segment.to_string());
        self
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }
}

impl CacheKey for CompositeKey {
    fn cache_key(&self) -> String {
        let mut key = self.prefix.clone();
        for segment in &self.segments {
            key.push(':');
            key.push_str(segment);
        }
        key
    }
}
