//! Benchmarks for search, list and delete.
//!
//! Each operation is a full scan of the table, so cost grows with the number
//! of stored memories: measured at 100, 1,000 and 10,000.

// Criterion macros generate items without docs - this is expected for benchmarks
// Benchmarks use expect/unwrap for simplicity - panics are acceptable in benchmarks
#![allow(missing_docs)]
#![allow(clippy::expect_used, clippy::unwrap_used)]

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use simple_memory::models::AddMemory;
use simple_memory::{MemoryService, SqliteMemoryStore};
use std::hint::black_box;
use std::sync::Arc;
use tempfile::TempDir;

const SIZES: [usize; 3] = [100, 1_000, 10_000];

/// Creates a file-backed service holding `count` memories; every tenth
/// carries the tag `needle`.
fn populated_service(dir: &TempDir, count: usize) -> MemoryService {
    let path = dir.path().join(format!("bench_{count}.db"));
    let store = SqliteMemoryStore::open(path).expect("Failed to open store");
    let service = MemoryService::new(Arc::new(store));
    for i in 0..count {
        let mut request = AddMemory::new(format!("Memory {i}: decision about module {}", i % 37))
            .with_title(format!("note {i}"));
        if i % 10 == 0 {
            request = request.with_tags("needle");
        }
        service.add(request).unwrap();
    }
    service
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    let dir = TempDir::new().unwrap();

    for size in SIZES {
        let service = populated_service(&dir, size);
        group.bench_with_input(BenchmarkId::new("hit", size), &size, |b, _| {
            b.iter(|| black_box(service.search(black_box("needle")).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("miss", size), &size, |b, _| {
            b.iter(|| black_box(service.search(black_box("absent")).unwrap()));
        });
    }

    group.finish();
}

fn bench_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("list");
    let dir = TempDir::new().unwrap();

    for size in SIZES {
        let service = populated_service(&dir, size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| black_box(service.list().unwrap()));
        });
    }

    group.finish();
}

fn bench_delete(c: &mut Criterion) {
    let mut group = c.benchmark_group("delete");
    group.sample_size(10);

    for size in [100, 1_000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter_batched(
                || {
                    let dir = TempDir::new().unwrap();
                    let service = populated_service(&dir, size);
                    (dir, service)
                },
                |(_dir, service)| black_box(service.delete("needle").unwrap()),
                BatchSize::PerIteration,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_search, bench_list, bench_delete);
criterion_main!(benches);
