//! catalog-cache: Cache-aside layer for a paginated product catalog
//!
//! # Features
//!
//! - **Fail-soft cache**: every cache call is bounded by a timeout and any
//!   failure degrades to a miss
//! - **Stampede guard**: one recompute per key at a time within the process
//! - **Versioned list keys**: one write invalidates every cached list page
//! - **No negative caching**: a missing product is never cached
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use catalog_cache::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     let settings = CacheSettings::default();
//!     let cache = CacheAside::new(MemoryStore::with_defaults(), StampedeGuard::new(), &settings);
//!     let catalog = ProductCatalog::new(InMemoryEntityStore::new(), cache);
//!
//!     let lamp = catalog.create(ProductDraft::new("Desk Lamp", 24.0)).await?;
//!     let cached = catalog.get(lamp.id).await?;
//!     assert_eq!(cached.name, "Desk Lamp");
//!
//!     let page = catalog.list(&ListRequest::new().filter("lamp")).await?;
//!     println!("{} of {}", page.items.len(), page.total_count);
//!     Ok(())
//! }
//! ```

mod best_effort;
mod catalog;
mod config;
mod error;
mod executor;
mod guard;
mod keys;
mod model;
mod paged;
mod query;
mod store;

// Re-export core
pub use catalog_cache_core::*;

// Re-export storage
#[cfg(feature = "memory")]
pub use catalog_cache_storage::{MemoryConfig, MemoryStore};

#[cfg(feature = "redis")]
pub use catalog_cache_storage::{RedisConfig, RedisStore};

pub use best_effort::BestEffortCache;
pub use catalog::ProductCatalog;
pub use config::CacheSettings;
pub use error::{CatalogError, CatalogResult, StoreError};
pub use executor::CacheAside;
pub use guard::{GuardHandle, StampedeGuard};
pub use keys::{
    DEFAULT_KEY_PAGE_SIZE, DEFAULT_VERSION, KeyScheme, build_entity_key, build_list_key,
    new_version_token,
};
pub use model::{Category, Product, ProductDraft};
pub use paged::PagedResult;
pub use query::{
    Condition, DEFAULT_FETCH_PAGE_SIZE, FilterField, FilterOperator, ListRequest, MAX_PAGE_SIZE,
    Predicate, QuerySpec, SortDirection, SortField, SortSpec, build_filter, build_sort,
    compute_offset,
};
pub use store::{EntityStore, InMemoryEntityStore};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        CacheAside, CacheKey, CacheOptions, CacheSettings, CacheStore, CatalogError,
        CatalogResult, Category, EntityStore, InMemoryEntityStore, JsonSerializer, ListRequest,
        PagedResult, Product, ProductCatalog, ProductDraft, StampedeGuard,
    };

    #[cfg(feature = "memory")]
    pub use crate::{MemoryConfig, MemoryStore};

    #[cfg(feature = "redis")]
    pub use crate::{RedisConfig, RedisStore};
}
