//! Chaos testing for concurrent access.
//!
//! Many threads add, list, search and delete against one file-backed store:
//! - no operation fails with a lock error
//! - ids are unique and every list is ascending
//! - reads never observe a half-applied delete

// Chaos tests use expect/unwrap/panic for simplicity - panics are acceptable in tests
// Excessive nesting is acceptable in concurrent test code with thread spawns
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::excessive_nesting
)]

use simple_memory::models::AddMemory;
use simple_memory::{MemoryService, MemoryStore, SqliteMemoryStore};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use tempfile::TempDir;

fn file_service(dir: &TempDir) -> Arc<MemoryService> {
    let store = SqliteMemoryStore::open(dir.path().join("chaos.db")).unwrap();
    Arc::new(MemoryService::new(Arc::new(store)))
}

fn assert_ascending(service: &MemoryService) {
    let ids: Vec<i64> = service.list().unwrap().iter().map(|r| r.id).collect();
    assert!(ids.windows(2).all(|w| w[0] < w[1]), "not ascending: {ids:?}");
}

/// Test: concurrent writers get unique ids and lose nothing.
#[test]
fn test_concurrent_adds_unique_ids() {
    let dir = TempDir::new().unwrap();
    let service = file_service(&dir);
    let num_threads = 8;
    let adds_per_thread = 25;

    let handles: Vec<_> = (0..num_threads)
        .map(|t| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                (0..adds_per_thread)
                    .map(|i| {
                        service
                            .add(AddMemory::new(format!("thread {t} note {i}")))
                            .unwrap()
                            .id
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        let thread_ids = handle.join().expect("writer panicked");
        assert!(thread_ids.windows(2).all(|w| w[0] < w[1]));
        ids.extend(thread_ids);
    }

    assert_eq!(ids.len(), num_threads * adds_per_thread);
    assert_eq!(service.list().unwrap().len(), num_threads * adds_per_thread);
    assert_ascending(&service);
}

/// Test: readers run alongside writers without errors, and always see an
/// ascending list.
#[test]
fn test_mixed_read_write_workload() {
    let dir = TempDir::new().unwrap();
    let service = file_service(&dir);
    for i in 0..20 {
        service.add(AddMemory::new(format!("seed {i}"))).unwrap();
    }

    let reads = Arc::new(AtomicUsize::new(0));
    let mut handles = Vec::new();

    for t in 0..4 {
        let service = Arc::clone(&service);
        handles.push(thread::spawn(move || {
            for i in 0..30 {
                let tag = if i % 2 == 0 { "temp" } else { "keep" };
                service
                    .add(AddMemory::new(format!("w{t}-{i}")).with_tags(tag))
                    .unwrap();
                if i % 10 == 9 {
                    service.delete("temp").unwrap();
                }
            }
        }));
    }

    for _ in 0..4 {
        let service = Arc::clone(&service);
        let reads = Arc::clone(&reads);
        handles.push(thread::spawn(move || {
            for _ in 0..50 {
                assert_ascending(&service);
                service.search("seed").unwrap();
                reads.fetch_add(1, Ordering::Relaxed);
            }
        }));
    }

    for handle in handles {
        handle.join().expect("worker panicked");
    }

    assert_eq!(reads.load(Ordering::Relaxed), 200);
    assert_eq!(service.search("seed").unwrap().len(), 20);
    assert_eq!(service.search("keep").unwrap().len(), 4 * 15);
    assert_ascending(&service);
}

/// Test: a delete racing with searches never exposes a partial removal.
#[test]
fn test_delete_is_atomic_to_readers() {
    let dir = TempDir::new().unwrap();
    let service = file_service(&dir);
    for i in 0..200 {
        service.add(AddMemory::new(format!("batch {i}"))).unwrap();
    }

    let reader = {
        let service = Arc::clone(&service);
        thread::spawn(move || {
            for _ in 0..100 {
                let seen = service.search("batch").unwrap().len();
                assert!(seen == 200 || seen == 0, "saw partial delete: {seen}");
            }
        })
    };

    assert_eq!(service.delete("batch").unwrap().removed, 200);
    reader.join().expect("reader panicked");
    assert_eq!(service.store().count().unwrap(), 0);
}
