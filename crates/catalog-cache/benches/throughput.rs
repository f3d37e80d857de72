//! Benchmarks for the cache-aside hot paths

use catalog_cache::{
    CacheAside, CacheSettings, CatalogError, ListRequest, MemoryStore, StampedeGuard,
    build_list_key,
};
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use tokio::runtime::Runtime;

fn create_executor() -> CacheAside<MemoryStore> {
    CacheAside::new(
        MemoryStore::with_defaults(),
        StampedeGuard::new(),
        &CacheSettings::default(),
    )
}

fn bench_get_or_load(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let cache = create_executor();

    // Pre-populate
    rt.block_on(async {
        cache
            .get_or_load("product:1", || async { Ok::<_, CatalogError>(42u64) })
            .await
            .unwrap();
    });

    let mut group = c.benchmark_group("get_or_load");
    group.throughput(Throughput::Elements(1));

    group.bench_function("hit", |b| {
        b.iter(|| {
            rt.block_on(async {
                let value = cache
                    .get_or_load(black_box("product:1"), || async {
                        Ok::<_, CatalogError>(0u64)
                    })
                    .await
                    .unwrap();
                black_box(value);
            });
        });
    });

    group.bench_function("disabled", |b| {
        let cache = CacheAside::new(
            MemoryStore::with_defaults(),
            StampedeGuard::new(),
            &CacheSettings::disabled(),
        );
        b.iter(|| {
            rt.block_on(async {
                let value = cache
                    .get_or_load(black_box("product:1"), || async {
                        Ok::<_, CatalogError>(0u64)
                    })
                    .await
                    .unwrap();
                black_box(value);
            });
        });
    });

    group.finish();
}

fn bench_list_key(c: &mut Criterion) {
    let request = ListRequest::new()
        .filter("  Desk Lamp ")
        .sort_by("Price", "ASC")
        .page(3)
        .page_size(25);

    let mut group = c.benchmark_group("list_key");
    group.throughput(Throughput::Elements(1));

    group.bench_function("build", |b| {
        b.iter(|| {
            black_box(build_list_key(
                black_box("products:list:"),
                black_box("9f86d081884c7d659a2feaa0c55ad015"),
                black_box(&request),
            ))
        });
    });

    group.finish();
}

fn bench_guard(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let guard = StampedeGuard::new();

    let mut group = c.benchmark_group("stampede_guard");
    group.throughput(Throughput::Elements(1));

    group.bench_function("acquire_release", |b| {
        b.iter(|| {
            rt.block_on(async {
                let handle = guard.acquire(black_box("product:1")).await;
                handle.release();
            });
        });
    });

    group.finish();
}

criterion_group!(benches, bench_get_or_load, bench_list_key, bench_guard);
criterion_main!(benches);
