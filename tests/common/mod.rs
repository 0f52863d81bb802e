//! Shared helpers for integration tests.

#![allow(dead_code)]

use depcache::manager::ResourceCacheManager;
use depcache::strategy::GraphStrategy;

/// Routes `log` output through the test harness. Set `RUST_LOG=depcache=trace`
/// to see it.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Graph of independent resources with the given sizes.
pub fn flat_graph(sizes: &[(&'static str, u64)]) -> GraphStrategy<&'static str> {
    let mut graph = GraphStrategy::new();
    for &(name, size) in sizes {
        graph.insert(name, size, []);
    }
    graph
}

pub fn mru(cache: &ResourceCacheManager<GraphStrategy<&'static str>>) -> Vec<&'static str> {
    cache.mru_order().copied().collect()
}

pub fn loaded(cache: &ResourceCacheManager<GraphStrategy<&'static str>>) -> Vec<&'static str> {
    let mut loaded: Vec<_> = cache.strategy().loaded().copied().collect();
    loaded.sort_unstable();
    loaded
}
