//! Throughput benchmark for sequential loads against an identity batch
//! function.
//!
//! Run with: cargo bench -p dataloader

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dataloader::{BatchFn, BatchResult, Loader};

struct IdentityBatchFn;

#[async_trait]
impl BatchFn<String, String> for IdentityBatchFn {
    async fn load(&self, keys: &[String]) -> Vec<BatchResult<String>> {
        keys.iter().cloned().map(Ok).collect()
    }
}

fn loader_throughput(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
    let loader = Loader::new(IdentityBatchFn);
    let sequence = AtomicU64::new(0);

    c.bench_function("load_unique_keys", |b| {
        b.to_async(&runtime).iter(|| {
            let loader = loader.clone();
            let key = sequence.fetch_add(1, Ordering::Relaxed).to_string();
            async move { black_box(loader.load(key).await) }
        })
    });
}

criterion_group!(benches, loader_throughput);
criterion_main!(benches);
