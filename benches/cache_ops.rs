//! Micro-operation benchmarks for the entity cache.
//!
//! Run with: `cargo bench --bench cache_ops`
//!
//! Measures point hits on each tier, tombstone hits, stores, and certified
//! range scans.

use std::hint::black_box;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use entity_cache::builder::CacheBuilder;
use entity_cache::cache::Cache;
use entity_cache::traits::{Entity, TypeTag};

const ENTRIES: u32 = 10_000;
const OPS: u64 = 100_000;

struct Row {
    path: Vec<u32>,
    value: u64,
}

impl Entity for Row {
    type Key = Vec<u32>;

    const TYPE_TAG: TypeTag = TypeTag::new("Row");

    fn key(&self) -> Vec<u32> {
        self.path.clone()
    }
}

fn key(i: u32) -> Vec<u32> {
    vec![i % 10, i]
}

fn populated(canonical: bool, expiring: bool) -> Arc<Cache<Row>> {
    let cache = CacheBuilder::new(Duration::from_secs(3600))
        .canonical(canonical)
        .build::<Row>();
    for i in 0..ENTRIES {
        cache
            .put_on_store(
                Row {
                    path: key(i),
                    value: u64::from(i),
                },
                expiring,
            )
            .unwrap();
    }
    Arc::new(cache)
}

// ============================================================================
// Point lookups (ns/op)
// ============================================================================

fn bench_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_ns");
    group.throughput(Throughput::Elements(OPS));

    for (name, expiring) in [("manual_hit", false), ("ttl_hit", true)] {
        let cache = populated(false, expiring);
        let keys: Vec<_> = (0..ENTRIES).map(key).collect();
        group.bench_function(name, |b| {
            b.iter_custom(|iters| {
                let start = Instant::now();
                for _ in 0..iters {
                    for i in 0..OPS {
                        let k = &keys[(i % u64::from(ENTRIES)) as usize];
                        black_box(cache.get(k).map(|h| h.get().map(|r| r.value)));
                    }
                }
                start.elapsed()
            })
        });
    }

    let cache = populated(true, false);
    for region in 0..10 {
        cache.put_prefix(vec![region]);
    }
    group.bench_function("tombstone_hit", |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();
            for _ in 0..iters {
                for i in 0..OPS {
                    let k = vec![(i % 10) as u32, ENTRIES + (i % 64) as u32];
                    black_box(cache.get(&k));
                }
            }
            start.elapsed()
        })
    });

    group.finish();
}

// ============================================================================
// Writes (ns/op)
// ============================================================================

fn bench_store(c: &mut Criterion) {
    let mut group = c.benchmark_group("put_on_store_ns");
    group.throughput(Throughput::Elements(u64::from(ENTRIES)));

    for (name, expiring) in [("manual", false), ("ttl", true)] {
        group.bench_function(name, |b| {
            b.iter_custom(|iters| {
                let cache = populated(false, expiring);
                let start = Instant::now();
                for round in 0..iters {
                    for i in 0..ENTRIES {
                        let row = Row {
                            path: key(i),
                            value: round,
                        };
                        black_box(cache.put_on_store(row, expiring).ok());
                    }
                }
                start.elapsed()
            })
        });
    }

    group.finish();
}

// ============================================================================
// Range scans
// ============================================================================

fn bench_get_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_all");

    for (name, canonical) in [("canonical", true), ("expiring", false)] {
        let cache = populated(canonical, false);
        for region in 0..10 {
            cache.put_prefix(vec![region]);
        }
        group.bench_function(name, |b| {
            let mut region = 0u32;
            b.iter(|| {
                region = (region + 1) % 10;
                black_box(cache.get_all(&vec![region]).map(|all| all.len()))
            })
        });
    }

    group.finish();
}

// ============================================================================
// Contended reads
// ============================================================================

fn bench_contended_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended_get");
    let threads = 4;
    group.throughput(Throughput::Elements(OPS * threads as u64));

    let cache = populated(false, false);
    group.bench_function("4_threads", |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();
            for _ in 0..iters {
                let handles: Vec<_> = (0..threads)
                    .map(|t| {
                        let cache = Arc::clone(&cache);
                        thread::spawn(move || {
                            for i in 0..OPS {
                                let k = key(((i + t) % u64::from(ENTRIES)) as u32);
                                black_box(cache.get(&k));
                            }
                        })
                    })
                    .collect();
                for h in handles {
                    let _ = h.join();
                }
            }
            start.elapsed()
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_get,
    bench_store,
    bench_get_all,
    bench_contended_get
);
criterion_main!(benches);
