//! Benchmarks for linear-scan comparison.
//!
//! Measures `compare` over file-backed and in-memory collections of growing
//! size, with a tenth of the rows tombstoned.

// Criterion macros generate items without docs - this is expected for benchmarks
// Benchmarks use expect/unwrap for simplicity - panics are acceptable in benchmarks
#![allow(missing_docs)]
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::cast_precision_loss
)]

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use tempfile::TempDir;
use vecdb::{ArrayBackend, CosineSimilarity, DatasetStore, Order, VecDb};

const DIMS: usize = 128;
const SIZES: &[usize] = &[100, 1_000, 10_000];

/// Deterministic pseudo-random rows.
fn sample_rows(count: usize) -> Vec<Vec<f32>> {
    let mut state: u32 = 0x9E37_79B9;
    (0..count)
        .map(|_| {
            (0..DIMS)
                .map(|_| {
                    state ^= state << 13;
                    state ^= state >> 17;
                    state ^= state << 5;
                    (state % 2_000) as f32 / 1_000.0 - 1.0
                })
                .collect()
        })
        .collect()
}

fn populate<B: ArrayBackend>(store: &DatasetStore<B>, count: usize) {
    store.store(&sample_rows(count), "bench").expect("populate");
    for index in (0..count).step_by(10) {
        store.delete(index, "bench").expect("tombstone");
    }
}

fn bench_compare(c: &mut Criterion) {
    let mut group = c.benchmark_group("compare");
    let query = sample_rows(1).remove(0);

    for &size in SIZES {
        group.throughput(Throughput::Elements(size as u64));

        let memory = DatasetStore::in_memory(DIMS).expect("memory store");
        populate(&memory, size);
        group.bench_with_input(BenchmarkId::new("memory", size), &size, |b, _| {
            b.iter(|| {
                memory
                    .compare(
                        black_box(&query),
                        &CosineSimilarity,
                        Order::Descending,
                        "bench",
                    )
                    .expect("compare")
            });
        });

        let dir = TempDir::new().expect("tempdir");
        let file = VecDb::open(dir.path().join("bench.vdb"), DIMS).expect("file store");
        populate(&file, size);
        group.bench_with_input(BenchmarkId::new("file", size), &size, |b, _| {
            b.iter(|| {
                file.compare(
                    black_box(&query),
                    &CosineSimilarity,
                    Order::Descending,
                    "bench",
                )
                .expect("compare")
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_compare);
criterion_main!(benches);
