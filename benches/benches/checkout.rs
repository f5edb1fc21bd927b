//! Benchmarks for connection checkout and return.
//!
//! Run with: `cargo bench --package wirepool-benches --bench checkout`

// Allow missing docs for criterion_group! macro generated functions
#![allow(missing_docs)]

use std::time::Duration;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use wirepool_transport::{Deadline, MemoryDialer, Pool, PoolConfig};

fn warm_pool(rt: &tokio::runtime::Runtime, capacity: usize) -> Pool<MemoryDialer> {
    rt.block_on(async {
        let pool = Pool::with_config(
            "bench",
            PoolConfig::new().capacity(capacity),
            MemoryDialer::new(),
        );
        pool.connect().await.unwrap();
        let handle = pool.get(&Deadline::none()).await.unwrap();
        handle.release().await.unwrap();
        pool
    })
}

/// Benchmark a single get/release cycle against a warm idle store.
fn bench_get_release(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let pool = warm_pool(&rt, 16);

    c.bench_function("get_release_warm", |b| {
        b.to_async(&rt).iter(|| async {
            let handle = pool.get(&Deadline::none()).await.unwrap();
            handle.release().await.unwrap();
        });
    });

    let deadline = Deadline::after(Duration::from_secs(3600));
    c.bench_function("get_release_with_deadline", |b| {
        b.to_async(&rt).iter(|| async {
            let handle = pool.get(&deadline).await.unwrap();
            handle.release().await.unwrap();
        });
    });
}

/// Benchmark checkout when every get must dial.
fn bench_get_dial(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let pool = warm_pool(&rt, 0);
    let dialer = pool.dialer().clone();

    c.bench_function("get_close_cold", |b| {
        b.to_async(&rt).iter(|| async {
            let handle = pool.get(&Deadline::none()).await.unwrap();
            handle.close().await.unwrap();
            // Remote ends pile up otherwise.
            drop(dialer.take_peers());
        });
    });
}

/// Benchmark concurrent get/release from many tasks.
fn bench_contention(c: &mut Criterion) {
    let mut group = c.benchmark_group("contention");
    let rt = tokio::runtime::Runtime::new().unwrap();

    for tasks in [2u64, 8, 32] {
        let pool = warm_pool(&rt, 32);
        group.throughput(Throughput::Elements(tasks));
        group.bench_with_input(BenchmarkId::new("tasks", tasks), &tasks, |b, &tasks| {
            b.to_async(&rt).iter(|| {
                let pool = pool.clone();
                async move {
                    let mut joins = Vec::new();
                    for _ in 0..tasks {
                        let pool = pool.clone();
                        joins.push(tokio::spawn(async move {
                            let handle = pool.get(&Deadline::none()).await.unwrap();
                            handle.release().await.unwrap();
                        }));
                    }
                    for join in joins {
                        join.await.unwrap();
                    }
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_get_release, bench_get_dial, bench_contention);
criterion_main!(benches);
