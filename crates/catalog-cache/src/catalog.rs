//! Product catalog service: cached reads, invalidating writes

use std::sync::Arc;

use catalog_cache_core::{CacheMetrics, CacheStore, JsonSerializer, NoopMetrics, Serializer};
use tracing::{debug, error};
use uuid::Uuid;

use crate::error::{CatalogError, CatalogResult, StoreError};
use crate::executor::CacheAside;
use crate::model::{Category, Product, ProductDraft};
use crate::paged::PagedResult;
use crate::query::{ListRequest, QuerySpec};
use crate::store::EntityStore;

pub struct ProductCatalog<E, B, S = JsonSerializer, M = NoopMetrics> {
    store: Arc<E>,
    cache: CacheAside<B, S, M>,
}

impl<E, B, S, M> ProductCatalog<E, B, S, M>
where
    E: EntityStore,
    B: CacheStore,
    S: Serializer,
    M: CacheMetrics,
{
    pub fn new(store: E, cache: CacheAside<B, S, M>) -> Self {
        Self::with_shared_store(Arc::new(store), cache)
    }

    pub fn with_shared_store(store: Arc<E>, cache: CacheAside<B, S, M>) -> Self {
        Self { store, cache }
    }

    pub fn store(&self) -> &E {
        &self.store
    }

    pub fn cache(&self) -> &CacheAside<B, S, M> {
        &self.cache
    }

    /// One product with its category
    pub async fn get(&self, id: Uuid) -> CatalogResult<Product> {
        require_id(id)?;

        let store = self.store.clone();
        self.cache
            .get_or_load(self.cache.entity_key(id), move || async move {
                store
                    .get_by_id(id)
                    .await?
                    .ok_or_else(|| not_found(id))
            })
            .await
    }

    /// One page of products matching the request
    pub async fn list(&self, request: &ListRequest) -> CatalogResult<PagedResult<Product>> {
        request.validate()?;

        let key = self.cache.list_key(request).await;
        let spec = QuerySpec::from_request(request);
        let store = self.store.clone();
        self.cache
            .get_or_load(key, move || async move {
                let filter = spec.filter.as_ref();
                let items = store
                    .get_page(filter, &spec.sort, spec.offset(), spec.page_size)
                    .await?;
                let total = store.count(filter).await?;
                Ok::<_, CatalogError>(PagedResult::new(
                    items,
                    total,
                    spec.page,
                    Some(spec.page_size),
                ))
            })
            .await
    }

    pub async fn categories(&self) -> CatalogResult<Vec<Category>> {
        let store = self.store.clone();
        self.cache
            .get_or_load(self.cache.keys().category_key(), move || async move {
                Ok::<_, CatalogError>(store.categories().await?)
            })
            .await
    }

    /// Add a product and return it as stored
    pub async fn create(&self, draft: ProductDraft) -> CatalogResult<Product> {
        draft.validate()?;

        let product = Product::from_draft(draft);
        let id = product.id;
        self.store.add(product).await?;
        self.commit().await?;

        self.cache.invalidate_list_collection().await;

        match self.store.get_by_id(id).await? {
            Some(created) => {
                debug!(product_id = %id, "product created");
                Ok(created)
            }
            None => {
                error!(product_id = %id, "created product not readable after commit");
                Err(CatalogError::Unexpected(StoreError::Operation(format!(
                    "product {id} missing after create"
                ))))
            }
        }
    }

    /// Replace the editable fields of an existing product
    pub async fn update(&self, id: Uuid, draft: ProductDraft) -> CatalogResult<()> {
        require_id(id)?;
        draft.validate()?;

        let mut product = self.store.get_by_id(id).await?.ok_or_else(|| not_found(id))?;
        product.apply(draft);
        self.store.update(product).await?;
        self.commit().await?;

        self.cache.invalidate_list_collection().await;
        self.cache.invalidate_entity(id).await;
        debug!(product_id = %id, "product updated");
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> CatalogResult<()> {
        require_id(id)?;

        if self.store.get_by_id(id).await?.is_none() {
            return Err(not_found(id));
        }
        self.store.remove(id).await?;
        self.commit().await?;

        self.cache.invalidate_list_collection().await;
        self.cache.invalidate_entity(id).await;
        debug!(product_id = %id, "product deleted");
        Ok(())
    }

    async fn commit(&self) -> CatalogResult<usize> {
        self.store.commit().await.map_err(|e| {
            error!(error = %e, "commit failed");
            CatalogError::from(e)
        })
    }
}

fn require_id(id: Uuid) -> CatalogResult<()> {
    if id.is_nil() {
        return Err(CatalogError::InvalidArgument(
            "product id cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn not_found(id: Uuid) -> CatalogError {
    CatalogError::NotFound(format!("product {id}"))
}

impl<E, B, S, M> Clone for ProductCatalog<E, B, S, M> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            cache: self.cache.clone(),
        }
    }
}
