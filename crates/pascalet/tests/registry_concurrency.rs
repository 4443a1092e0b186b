//! Concurrent method registration.
//!
//! Registration takes the write lock, lookups the read lock; an id, once
//! assigned, answers with the same metadata forever regardless of
//! concurrent registrations. N threads registering M methods each must end
//! with N*M distinct ids and every id resolving to the method it was
//! assigned for.

use std::sync::Arc;
use std::thread;

use pascalet::{MethodBody, MethodId, MethodMetadata, MethodRegistry, NodeId};

fn meta(name: &str) -> MethodMetadata {
    MethodMetadata::new(name, MethodBody::Ast(NodeId(0)))
}

// =============================================================================
// 1. Parallel registration
// =============================================================================

/// 8 threads x 50 methods: all ids distinct, all lookups consistent.
#[test]
fn parallel_registration_assigns_distinct_stable_ids() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 50;

    let registry = Arc::new(MethodRegistry::new());
    let mut handles = Vec::new();
    for t in 0..THREADS {
        let registry = Arc::clone(&registry);
        handles.push(thread::spawn(move || {
            let mut assigned = Vec::with_capacity(PER_THREAD);
            for m in 0..PER_THREAD {
                let name = format!("Worker{t}_Method{m}");
                let id = registry.register(meta(&name));
                // Read back immediately under concurrent writers.
                let found = registry.get(id).expect("id must resolve right after registration");
                assert_eq!(found.name, name);
                assigned.push((id, name));
            }
            assigned
        }));
    }

    let mut all: Vec<(MethodId, String)> = Vec::new();
    for handle in handles {
        all.extend(handle.join().expect("registration thread panicked"));
    }

    assert_eq!(all.len(), THREADS * PER_THREAD);
    let mut ids: Vec<u32> = all.iter().map(|(id, _)| id.index()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), THREADS * PER_THREAD, "every id must be distinct");
    assert!(ids.iter().all(|&id| id >= 1), "id 0 is reserved");

    // Stability: every id still answers with its method after the dust
    // settles.
    for (id, name) in &all {
        assert_eq!(&registry.get(*id).unwrap().name, name);
    }
    assert_eq!(registry.len(), THREADS * PER_THREAD);
}

// =============================================================================
// 2. Readers during registration
// =============================================================================

/// A reader hammering `get` while a writer registers never observes a
/// torn or missing entry for an id it was handed.
#[test]
fn readers_never_observe_missing_entries() {
    let registry = Arc::new(MethodRegistry::new());
    let seed = registry.register(meta("Seed"));

    let reader = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || {
            for _ in 0..10_000 {
                assert_eq!(registry.get(seed).unwrap().name, "Seed");
            }
        })
    };
    let writer = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || {
            for m in 0..1_000 {
                registry.register(meta(&format!("Churn{m}")));
            }
        })
    };
    reader.join().expect("reader panicked");
    writer.join().expect("writer panicked");
    assert_eq!(registry.len(), 1_001);
}

// =============================================================================
// 3. The overload index
// =============================================================================

/// Same-named registrations from different threads all land in the
/// overload index.
#[test]
fn overload_index_collects_across_threads() {
    let registry = Arc::new(MethodRegistry::new());
    let mut handles = Vec::new();
    for _ in 0..4 {
        let registry = Arc::clone(&registry);
        handles.push(thread::spawn(move || {
            for _ in 0..25 {
                registry.register(meta("Overloaded"));
            }
        }));
    }
    for handle in handles {
        handle.join().expect("thread panicked");
    }
    assert_eq!(registry.lookup_name("OVERLOADED").len(), 100);
}
