use std::cmp::Ordering as CmpOrdering;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use uuid::Uuid;

use super::EntityStore;
use crate::error::StoreError;
use crate::model::{Category, Product};
use crate::query::{FilterField, FilterOperator, Predicate, SortDirection, SortField, SortSpec};

enum Change {
    Add(Product),
    Update(Product),
    Remove(Uuid),
}

impl Change {
    fn id(&self) -> Uuid {
        match self {
            Change::Add(p) | Change::Update(p) => p.id,
            Change::Remove(id) => *id,
        }
    }
}

#[derive(Default)]
struct Inner {
    products: DashMap<Uuid, Product>,
    categories: DashMap<Uuid, Category>,
    staged: Mutex<Vec<Change>>,
    reads: AtomicUsize,
    offline: AtomicBool,
}

/// In-process entity store.
///
/// `contains` matches case-insensitively and ignores whitespace around the
/// search term. Name ordering is case-insensitive too; ties are broken by id
/// so paging is stable. Clones share state.
#[derive(Clone, Default)]
pub struct InMemoryEntityStore {
    inner: Arc<Inner>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert committed rows directly, bypassing staging
    pub fn seed(&self, categories: Vec<Category>, products: Vec<Product>) {
        for category in categories {
            self.inner.categories.insert(category.id, category);
        }
        for mut product in products {
            product.category = None;
            self.inner.products.insert(product.id, product);
        }
    }

    /// Number of read calls served so far
    pub fn read_count(&self) -> usize {
        self.inner.reads.load(Ordering::SeqCst)
    }

    /// Make every call fail with [`StoreError::Unavailable`] until switched back
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    /// Committed product count
    pub fn len(&self) -> usize {
        self.inner.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.products.is_empty()
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.inner.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("entity store offline".to_string()));
        }
        Ok(())
    }

    fn begin_read(&self) -> Result<(), StoreError> {
        self.check_online()?;
        self.inner.reads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn stage(&self, change: Change) -> Result<(), StoreError> {
        self.check_online()?;
        self.inner.staged.lock().push(change);
        Ok(())
    }

    fn joined(&self, product: &Product) -> Product {
        let mut product = product.clone();
        product.category = product
            .category_id
            .and_then(|id| self.inner.categories.get(&id).map(|c| c.clone()));
        product
    }

    fn matching(&self, filter: Option<&Predicate>) -> Vec<Product> {
        self.inner
            .products
            .iter()
            .map(|entry| self.joined(entry.value()))
            .filter(|product| filter.is_none_or(|predicate| matches(predicate, product)))
            .collect()
    }
}

fn contains(haystack: &str, term: &str) -> bool {
    haystack.to_lowercase().contains(&term.trim().to_lowercase())
}

fn matches(predicate: &Predicate, product: &Product) -> bool {
    predicate.any_of.iter().any(|condition| {
        let value = match condition.field {
            FilterField::Name => Some(product.name.as_str()),
            FilterField::Description => product.description.as_deref(),
            FilterField::CategoryName => product.category.as_ref().map(|c| c.name.as_str()),
        };
        match condition.operator {
            FilterOperator::Contains => value.is_some_and(|v| contains(v, &condition.value)),
        }
    })
}

fn compare(a: &Product, b: &Product, sort: &SortSpec) -> CmpOrdering {
    let ordering = match sort.field {
        SortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortField::Price => a.price.total_cmp(&b.price),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
    };
    let ordering = match sort.direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    };
    ordering.then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        self.begin_read()?;
        Ok(self.inner.products.get(&id).map(|p| self.joined(p.value())))
    }

    async fn get_page(
        &self,
        filter: Option<&Predicate>,
        sort: &SortSpec,
        skip: u64,
        take: u32,
    ) -> Result<Vec<Product>, StoreError> {
        self.begin_read()?;
        let mut rows = self.matching(filter);
        rows.sort_by(|a, b| compare(a, b, sort));

        let skip = usize::try_from(skip).unwrap_or(usize::MAX);
        Ok(rows.into_iter().skip(skip).take(take as usize).collect())
    }

    async fn count(&self, filter: Option<&Predicate>) -> Result<u64, StoreError> {
        self.begin_read()?;
        Ok(self.matching(filter).len() as u64)
    }

    async fn categories(&self) -> Result<Vec<Category>, StoreError> {
        self.begin_read()?;
        let mut categories: Vec<Category> = self
            .inner
            .categories
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn add(&self, product: Product) -> Result<(), StoreError> {
        self.stage(Change::Add(product))
    }

    async fn update(&self, product: Product) -> Result<(), StoreError> {
        self.stage(Change::Update(product))
    }

    async fn remove(&self, id: Uuid) -> Result<(), StoreError> {
        self.stage(Change::Remove(id))
    }

    async fn commit(&self) -> Result<usize, StoreError> {
        self.check_online()?;
        let changes = std::mem::take(&mut *self.inner.staged.lock());

        // Validate the whole batch before applying any of it.
        let mut present: HashSet<Uuid> = changes
            .iter()
            .map(Change::id)
            .filter(|id| self.inner.products.contains_key(id))
            .collect();
        for change in &changes {
            let id = change.id();
            match change {
                Change::Add(_) if !present.insert(id) => {
                    return Err(StoreError::Operation(format!("duplicate product {id}")));
                }
                Change::Update(_) if !present.contains(&id) => {
                    return Err(StoreError::Operation(format!("product {id} no longer exists")));
                }
                Change::Remove(_) if !present.remove(&id) => {
                    return Err(StoreError::Operation(format!("product {id} no longer exists")));
                }
                _ => {}
            }
        }

        let applied = changes.len();
        for change in changes {
            match change {
                Change::Add(mut product) | Change::Update(mut product) => {
                    product.category = None;
                    self.inner.products.insert(product.id, product);
                }
                Change::Remove(id) => {
                    self.inner.products.remove(&id);
                }
            }
        }
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProductDraft;
    use crate::query::{build_filter, build_sort};
    use chrono::{Duration, Utc};

    fn product(name: &str, price: f64, age_days: i64, category: Option<&Category>) -> Product {
        let mut draft = ProductDraft::new(name, price);
        if let Some(category) = category {
            draft = draft.category(category.id);
        }
        let mut product = Product::from_draft(draft);
        product.created_at = Utc::now() - Duration::days(age_days);
        product
    }

    fn seeded() -> InMemoryEntityStore {
        let lighting = Category::new("Lighting");
        let store = InMemoryEntityStore::new();
        store.seed(
            vec![lighting.clone(), Category::new("Furniture")],
            vec![
                product("Desk Lamp", 25.0, 3, Some(&lighting)),
                product("Chair", 80.0, 2, None),
                product("bulb", 5.0, 1, Some(&lighting)),
            ],
        );
        store
    }

    #[tokio::test]
    async fn test_staged_writes_invisible_until_commit() {
        let store = InMemoryEntityStore::new();
        let p = product("Lamp", 10.0, 0, None);

        store.add(p.clone()).await.unwrap();
        assert!(store.get_by_id(p.id).await.unwrap().is_none());

        assert_eq!(store.commit().await.unwrap(), 1);
        assert_eq!(store.get_by_id(p.id).await.unwrap().unwrap().name, "Lamp");
    }

    #[tokio::test]
    async fn test_get_by_id_joins_category() {
        let store = seeded();
        let page = store
            .get_page(None, &build_sort(Some("name"), "asc"), 0, 10)
            .await
            .unwrap();
        let lamp = page.iter().find(|p| p.name == "Desk Lamp").unwrap();

        let fetched = store.get_by_id(lamp.id).await.unwrap().unwrap();
        assert_eq!(fetched.category.unwrap().name, "Lighting");
    }

    #[tokio::test]
    async fn test_contains_is_case_insensitive_and_trimmed() {
        let store = seeded();
        let filter = build_filter(Some("  LAMP ")).unwrap();

        assert_eq!(store.count(Some(&filter)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_filter_matches_category_name() {
        let store = seeded();
        let filter = build_filter(Some("lighting")).unwrap();

        assert_eq!(store.count(Some(&filter)).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_sort_and_paging() {
        let store = seeded();

        let newest = store.get_page(None, &SortSpec::default(), 0, 2).await.unwrap();
        let names: Vec<_> = newest.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["bulb", "Chair"]);

        let by_price = store
            .get_page(None, &build_sort(Some("price"), "asc"), 1, 5)
            .await
            .unwrap();
        let names: Vec<_> = by_price.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Desk Lamp", "Chair"]);

        let by_name = store
            .get_page(None, &build_sort(Some("name"), "asc"), 0, 5)
            .await
            .unwrap();
        assert_eq!(by_name[0].name, "bulb");
    }

    #[tokio::test]
    async fn test_commit_rejects_missing_row() {
        let store = InMemoryEntityStore::new();
        store.remove(Uuid::new_v4()).await.unwrap();

        assert!(matches!(store.commit().await, Err(StoreError::Operation(_))));
    }

    #[tokio::test]
    async fn test_offline_store_fails_every_call() {
        let store = seeded();
        store.set_offline(true);

        assert!(matches!(
            store.count(None).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.categories().await.is_err());

        store.set_offline(false);
        assert_eq!(store.categories().await.unwrap().len(), 2);
    }
}
