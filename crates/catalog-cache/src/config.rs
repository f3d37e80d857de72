//! Cache settings consumed by the cache-aside layer

use std::time::Duration;

use catalog_cache_core::{CacheOptions, CacheOpts};
use serde::Deserialize;

/// Options for the catalog cache layer.
///
/// Read once at startup; there is no runtime reconfiguration. Field names
/// deserialize from camelCase and any missing field takes its default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheSettings {
    /// Master switch; when off every read goes straight to its loader
    pub enable_caching: bool,
    /// Deadline for each individual cache call
    pub cache_timeout_ms: u64,
    /// Idle window for cached payloads
    pub sliding_expiration_minutes: u64,
    /// Hard lifetime for cached payloads
    pub absolute_expiration_minutes: u64,
    /// Reserved; not read by the executor
    pub stale_data_max_minutes: u64,
    /// Prefix for single-product keys, concatenated directly with the id
    pub product_cache_key_prefix: String,
    /// First segment of every product list key
    pub product_list_cache_key_prefix: String,
    /// Key holding the cached category list
    pub category_list_cache_key: String,
    /// Key holding the product list version token
    pub product_list_version_key: String,
    /// Idle window for the version token
    pub version_sliding_expiration_minutes: u64,
    /// Hard lifetime for the version token
    pub version_absolute_expiration_minutes: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enable_caching: true,
            cache_timeout_ms: 2000,
            sliding_expiration_minutes: 10,
            absolute_expiration_minutes: 60,
            stale_data_max_minutes: 5,
            product_cache_key_prefix: "product:".to_string(),
            product_list_cache_key_prefix: "products:list:".to_string(),
            category_list_cache_key: "categories:all".to_string(),
            product_list_version_key: "products:list:version".to_string(),
            version_sliding_expiration_minutes: 60,
            version_absolute_expiration_minutes: 24 * 60,
        }
    }
}

impl CacheSettings {
    /// Parse settings from a JSON object, e.g. the `CacheSettings` section of an app config
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Settings with caching switched off
    pub fn disabled() -> Self {
        Self {
            enable_caching: false,
            ..Default::default()
        }
    }

    /// Set the per-call cache timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.cache_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Per-call cache timeout
    pub fn cache_timeout(&self) -> Duration {
        Duration::from_millis(self.cache_timeout_ms)
    }

    /// Expiration policy for cached payloads
    pub fn entry_options(&self) -> CacheOptions {
        CacheOpts::new()
            .sliding_mins(self.sliding_expiration_minutes)
            .absolute_mins(self.absolute_expiration_minutes)
            .build()
    }

    /// Expiration policy for the list version token.
    ///
    /// Outlives [`entry_options`](Self::entry_options) so list entries built
    /// against an old token expire on their own before the token does.
    pub fn version_token_options(&self) -> CacheOptions {
        CacheOpts::new()
            .sliding_mins(self.version_sliding_expiration_minutes)
            .absolute_mins(self.version_absolute_expiration_minutes)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = CacheSettings::default();
        assert!(settings.enable_caching);
        assert_eq!(settings.cache_timeout(), Duration::from_secs(2));
        assert_eq!(settings.product_cache_key_prefix, "product:");
        assert_eq!(settings.product_list_version_key, "products:list:version");
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings = CacheSettings::from_json(
            r#"{"enableCaching":false,"cacheTimeoutMs":250,"productCacheKeyPrefix":"p:"}"#,
        )
        .unwrap();

        assert!(!settings.enable_caching);
        assert_eq!(settings.cache_timeout(), Duration::from_millis(250));
        assert_eq!(settings.product_cache_key_prefix, "p:");
        assert_eq!(settings.sliding_expiration_minutes, 10);
        assert_eq!(settings.category_list_cache_key, "categories:all");
    }

    #[test]
    fn test_entry_options() {
        let options = CacheSettings::default().entry_options();
        assert_eq!(options.sliding_expiration, Some(Duration::from_secs(600)));
        assert_eq!(options.absolute_expiration, Some(Duration::from_secs(3600)));
    }

    #[test]
    fn test_version_token_outlives_entries() {
        let settings = CacheSettings::default();
        let entry = settings.entry_options();
        let version = settings.version_token_options();

        assert_eq!(version.sliding_expiration, Some(Duration::from_secs(3600)));
        assert_eq!(version.absolute_expiration, Some(Duration::from_secs(86_400)));
        assert!(version.absolute_expiration > entry.absolute_expiration);
    }
}
