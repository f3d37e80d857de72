//! Entity store seam used by catalog loaders and writes

mod memory;

pub use memory::InMemoryEntityStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{Category, Product};
use crate::query::{Predicate, SortSpec};

/// Durable source of truth for the catalog.
///
/// Adapters translate the store-agnostic [`Predicate`] and [`SortSpec`] into
/// their own query language and decide the collation `contains` uses. Writes
/// are staged and only become visible to reads after [`commit`](Self::commit).
#[async_trait]
pub trait EntityStore: Send + Sync + 'static {
    /// Fetch one product with its category joined
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Product>, StoreError>;

    async fn get_page(
        &self,
        filter: Option<&Predicate>,
        sort: &SortSpec,
        skip: u64,
        take: u32,
    ) -> Result<Vec<Product>, StoreError>;

    async fn count(&self, filter: Option<&Predicate>) -> Result<u64, StoreError>;

    async fn categories(&self) -> Result<Vec<Category>, StoreError>;

    async fn add(&self, product: Product) -> Result<(), StoreError>;

    async fn update(&self, product: Product) -> Result<(), StoreError>;

    async fn remove(&self, id: Uuid) -> Result<(), StoreError>;

    /// Apply staged writes. Returns the number of changes applied.
    async fn commit(&self) -> Result<usize, StoreError>;
}
