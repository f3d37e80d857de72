use catalog_cache::prelude::*;
use catalog_cache::{StampedeGuard, TracingMetrics};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> CatalogResult<()> {
    // DEBUG shows cache hits, misses and invalidations
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    let settings = CacheSettings::default();
    let cache = CacheAside::with_serializer_and_metrics(
        MemoryStore::with_defaults(),
        StampedeGuard::new(),
        JsonSerializer,
        TracingMetrics::new().with_service_name("catalog-demo"),
        &settings,
    );

    let store = InMemoryEntityStore::new();
    let lighting = Category::new("Lighting");
    store.seed(vec![lighting.clone(), Category::new("Furniture")], vec![]);
    let catalog = ProductCatalog::new(store, cache);

    println!("\nCreating products...");
    let lamp = catalog
        .create(
            ProductDraft::new("Desk Lamp", 24.0)
                .description("Adjustable arm")
                .category(lighting.id),
        )
        .await?;
    catalog.create(ProductDraft::new("Armchair", 180.0)).await?;

    println!("\nReading a product twice (miss, then hit)...");
    catalog.get(lamp.id).await?;
    let cached = catalog.get(lamp.id).await?;
    println!("   Got: {} ({:?})", cached.name, cached.category.map(|c| c.name));

    println!("\nListing products matching \"LAMP\"...");
    let request = ListRequest::new().filter("LAMP").sort_by("price", "asc");
    let page = catalog.list(&request).await?;
    println!("   {} of {} on page {}", page.items.len(), page.total_count, page.page);

    println!("\nUpdating the lamp (evicts the product, bumps the list version)...");
    catalog
        .update(lamp.id, ProductDraft::new("Reading Lamp", 29.0).category(lighting.id))
        .await?;
    let page = catalog.list(&request).await?;
    println!("   First match is now: {}", page.items[0].name);

    let names: Vec<String> = catalog
        .categories()
        .await?
        .into_iter()
        .map(|c| c.name)
        .collect();
    println!("\nCategories: {names:?}");

    Ok(())
}
