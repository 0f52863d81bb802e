// ==============================================
// CONCURRENT CACHE TESTS (integration)
// ==============================================
//
// Requests from several threads through ConcurrentResourceCache. Each
// request runs to completion under the lock, so budgets and pinning must hold
// at every observation point.

#![cfg(feature = "concurrency")]

mod common;

use std::sync::{Arc, Barrier};
use std::thread;

use depcache::manager::{ConcurrentResourceCache, ResourceCacheManager};
use depcache::strategy::GraphStrategy;

use common::init_logging;

fn layered_graph() -> GraphStrategy<u32> {
    let mut graph = GraphStrategy::new();
    // 0..8 are shared bases; every other resource depends on one of them.
    for id in 0..8u32 {
        graph.insert(id, 2, []);
    }
    for id in 8..128u32 {
        graph.insert(id, 1, [id % 8]);
    }
    graph
}

#[test]
fn racing_requests_respect_budgets() {
    init_logging();
    let cache = Arc::new(ConcurrentResourceCache::new(ResourceCacheManager::new(
        layered_graph(),
        12,
        20,
    )));
    let barrier = Arc::new(Barrier::new(4));

    let handles: Vec<_> = (0..4u32)
        .map(|t| {
            let cache = Arc::clone(&cache);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..200u32 {
                    let a = 8 + (t * 31 + i * 7) % 120;
                    let b = 8 + (t * 17 + i * 11) % 120;
                    let _ = cache.load_request(&[a, b]);
                    cache.with_manager(|manager| {
                        assert!(manager.len() <= 12);
                        assert!(manager.used_space() <= 20);
                        manager.check_invariants().unwrap();
                    });
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    cache.destroy();
    let manager = Arc::try_unwrap(cache).unwrap().into_inner();
    assert!(manager.strategy().loaded().next().is_none());
}

#[test]
fn dependency_of_last_request_is_pinned() {
    init_logging();
    let cache = Arc::new(ConcurrentResourceCache::new(ResourceCacheManager::new(
        layered_graph(),
        12,
        20,
    )));

    let handles: Vec<_> = (0..3u32)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..50u32 {
                    let id = 8 + (t * 40 + i) % 120;
                    cache.with_manager(|manager| {
                        manager.load_request(&[id]).unwrap();
                        assert!(manager.contains(&id));
                        assert!(manager.is_pinned(&(id % 8)));
                    });
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}
