//! Benchmarks for pool connect/disconnect cycles.
//!
//! Run with: `cargo bench --package wirepool-benches --bench lifecycle`

// Allow missing docs for criterion_group! macro generated functions
#![allow(missing_docs)]

use std::time::Duration;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use wirepool_core::PoolError;
use wirepool_transport::{Deadline, MemoryDialer, Pool};

async fn cycle(pool: &Pool<MemoryDialer>, idle: usize) -> Result<(), PoolError> {
    pool.connect().await?;
    let mut handles = Vec::with_capacity(idle);
    for _ in 0..idle {
        handles.push(pool.get(&Deadline::none()).await?);
    }
    for handle in &handles {
        handle.release().await?;
    }
    pool.disconnect(&Deadline::none()).await
}

/// Benchmark a full connect, fill, disconnect cycle.
fn bench_connect_disconnect(c: &mut Criterion) {
    let mut group = c.benchmark_group("connect_disconnect");
    let rt = tokio::runtime::Runtime::new().unwrap();

    for idle in [0usize, 8, 64] {
        let pool = Pool::new("bench", idle.max(1), MemoryDialer::new());
        group.bench_with_input(BenchmarkId::new("idle", idle), &idle, |b, &idle| {
            b.to_async(&rt).iter(|| async {
                cycle(&pool, idle).await.unwrap();
                drop(pool.dialer().take_peers());
            });
        });
    }

    group.finish();
}

/// Benchmark a disconnect that has to force-close checked-out connections.
fn bench_forced_disconnect(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let pool = Pool::new("bench", 8, MemoryDialer::new());

    c.bench_function("forced_disconnect_8", |b| {
        b.to_async(&rt).iter(|| async {
            pool.connect().await.unwrap();
            let mut held = Vec::new();
            for _ in 0..8 {
                held.push(pool.get(&Deadline::none()).await.unwrap());
            }
            pool.disconnect(&Deadline::after(Duration::ZERO))
                .await
                .unwrap();
            drop(held);
            drop(pool.dialer().take_peers());
        });
    });
}

criterion_group!(benches, bench_connect_disconnect, bench_forced_disconnect);
criterion_main!(benches);
