//! Cache key construction for single products and versioned product lists.
//!
//! List keys embed a version token read from the cache. Replacing the token
//! makes every list key built against the old one unreachable without
//! touching the entries themselves; they age out through their own TTL.

use std::fmt::Display;

use catalog_cache_core::{CacheKey, CacheMetrics, CacheOptions, CacheStore, CompositeKey};
use tracing::debug;

use crate::best_effort::BestEffortCache;
use crate::config::CacheSettings;
use crate::query::ListRequest;

/// Version assumed when no token is stored or the cache cannot be read
pub const DEFAULT_VERSION: &str = "0";

/// Page size written into a list key when the request leaves it unset.
///
/// Differs from [`DEFAULT_FETCH_PAGE_SIZE`](crate::query::DEFAULT_FETCH_PAGE_SIZE):
/// a request without a page size is fetched 20 at a time but keyed as if it
/// asked for 10.
pub const DEFAULT_KEY_PAGE_SIZE: u32 = 10;

const NULL_PART: &str = "null";

/// Builds every key the catalog reads or writes
#[derive(Debug, Clone)]
pub struct KeyScheme {
    entity_prefix: String,
    list_prefix: String,
    category_key: String,
    version_key: String,
    version_options: CacheOptions,
}

impl KeyScheme {
    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self {
            entity_prefix: settings.product_cache_key_prefix.clone(),
            list_prefix: settings.product_list_cache_key_prefix.clone(),
            category_key: settings.category_list_cache_key.clone(),
            version_key: settings.product_list_version_key.clone(),
            version_options: settings.version_token_options(),
        }
    }

    /// Key for one product, e.g. `product:<id>`
    pub fn entity_key(&self, id: impl Display) -> String {
        build_entity_key(&self.entity_prefix, id)
    }

    pub fn category_key(&self) -> &str {
        &self.category_key
    }

    pub fn version_key(&self) -> &str {
        &self.version_key
    }

    /// Current list version, or [`DEFAULT_VERSION`] when absent, unreadable or
    /// caching is off
    pub async fn read_version<B, M>(&self, cache: Option<&BestEffortCache<B, M>>) -> String
    where
        B: CacheStore,
        M: CacheMetrics,
    {
        let Some(cache) = cache else {
            return DEFAULT_VERSION.to_string();
        };

        match cache.get_string(&self.version_key).await {
            Some(version) if !version.is_empty() => version,
            _ => DEFAULT_VERSION.to_string(),
        }
    }

    /// Key for one page of a product list under the current version
    pub async fn list_key<B, M>(
        &self,
        cache: Option<&BestEffortCache<B, M>>,
        request: &ListRequest,
    ) -> String
    where
        B: CacheStore,
        M: CacheMetrics,
    {
        let version = self.read_version(cache).await;
        build_list_key(&self.list_prefix, &version, request)
    }

    /// Replace the list version token.
    ///
    /// Returns the new token if the write completed. A failed write leaves the
    /// old lists reachable until they expire.
    pub async fn bump_version<B, M>(&self, cache: &BestEffortCache<B, M>) -> Option<String>
    where
        B: CacheStore,
        M: CacheMetrics,
    {
        let token = new_version_token();
        if cache
            .set_string(&self.version_key, token.clone(), &self.version_options)
            .await
        {
            debug!(key = %self.version_key, version = %token, "list version bumped");
            Some(token)
        } else {
            None
        }
    }
}

pub fn build_entity_key(prefix: &str, id: impl Display) -> String {
    format!("{prefix}{id}")
}

/// `prefix:version:filter:sortColumn:sortOrder:page:pageSize`.
///
/// The prefix is joined with `:` like the other fields, so the default
/// `products:list:` prefix yields `products:list::<version>:...`.
///
/// Filter and sort column are trimmed and lower-cased, or `null` when blank.
/// Sort order is lower-cased and defaults to `desc`.
pub fn build_list_key(prefix: &str, version: &str, request: &ListRequest) -> String {
    CompositeKey::with_prefix(prefix)
        .part(version)
        .part(normalize_or_null(request.filter.as_deref()))
        .part(normalize_or_null(request.sort_column.as_deref()))
        .part(
            request
                .sort_order
                .as_deref()
                .map(str::trim)
                .filter(|order| !order.is_empty())
                .map(str::to_lowercase)
                .unwrap_or_else(|| "desc".to_string()),
        )
        .part(request.page)
        .part(request.page_size.unwrap_or(DEFAULT_KEY_PAGE_SIZE))
        .cache_key()
}

fn normalize_or_null(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_lowercase(),
        _ => NULL_PART.to_string(),
    }
}

/// Fresh unpredictable token: 128 random bits as 32 hex digits
pub fn new_version_token() -> String {
    format!("{:032x}", rand::random::<u128>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::DEFAULT_FETCH_PAGE_SIZE;
    use catalog_cache_storage::MemoryStore;
    use std::time::Duration;

    const PREFIX: &str = "products:list:";

    #[test]
    fn test_entity_key_is_plain_concatenation() {
        assert_eq!(build_entity_key("product:", 42), "product:42");
    }

    #[test]
    fn test_list_key_layout() {
        let request = ListRequest::new()
            .filter("Lamp")
            .sort_by("Price", "ASC")
            .page(2)
            .page_size(25);

        assert_eq!(
            build_list_key(PREFIX, "v1", &request),
            "products:list::v1:lamp:price:asc:2:25"
        );
    }

    #[test]
    fn test_prefix_without_trailing_colon_stays_delimited() {
        assert_eq!(
            build_list_key("plist", "v9", &ListRequest::new()),
            "plist:v9:null:null:desc:1:10"
        );
    }

    #[test]
    fn test_list_key_defaults() {
        assert_eq!(
            build_list_key(PREFIX, "0", &ListRequest::new()),
            "products:list::0:null:null:desc:1:10"
        );
    }

    #[test]
    fn test_filter_normalization_is_idempotent() {
        let padded = ListRequest::new().filter("  Widget  ");
        let plain = ListRequest::new().filter("widget");

        assert_eq!(
            build_list_key(PREFIX, "v1", &padded),
            build_list_key(PREFIX, "v1", &plain)
        );
    }

    #[test]
    fn test_blank_filter_keys_like_no_filter() {
        let blank = ListRequest::new().filter("   ");
        assert_eq!(
            build_list_key(PREFIX, "v1", &blank),
            build_list_key(PREFIX, "v1", &ListRequest::new())
        );
    }

    #[test]
    fn test_key_and_fetch_page_size_defaults_diverge() {
        let implicit = ListRequest::new();
        let explicit_ten = ListRequest::new().page_size(DEFAULT_KEY_PAGE_SIZE);

        // Same key, although the implicit request fetches 20 rows and the
        // explicit one fetches 10.
        assert_eq!(
            build_list_key(PREFIX, "v1", &implicit),
            build_list_key(PREFIX, "v1", &explicit_ten)
        );
        assert_ne!(DEFAULT_KEY_PAGE_SIZE, DEFAULT_FETCH_PAGE_SIZE);
    }

    #[test]
    fn test_version_tokens_are_fresh() {
        let a = new_version_token();
        let b = new_version_token();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_version_defaults_to_zero() {
        let scheme = KeyScheme::from_settings(&CacheSettings::default());
        let cache = BestEffortCache::new(MemoryStore::with_defaults(), Duration::from_secs(1));

        assert_eq!(scheme.read_version(Some(&cache)).await, DEFAULT_VERSION);
        assert_eq!(
            scheme
                .read_version::<MemoryStore, catalog_cache_core::NoopMetrics>(None)
                .await,
            DEFAULT_VERSION
        );
    }

    #[tokio::test]
    async fn test_bump_changes_list_key() {
        let scheme = KeyScheme::from_settings(&CacheSettings::default());
        let cache = BestEffortCache::new(MemoryStore::with_defaults(), Duration::from_secs(1));
        let request = ListRequest::new().filter("lamp");

        let before = scheme.list_key(Some(&cache), &request).await;
        let token = scheme.bump_version(&cache).await.unwrap();
        let after = scheme.list_key(Some(&cache), &request).await;

        assert_ne!(before, after);
        assert!(after.contains(&token));
        assert_eq!(scheme.read_version(Some(&cache)).await, token);
    }
}
