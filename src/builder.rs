//! Builder for [`ResourceCacheManager`].
//!
//! Collects the budget and rollback behavior in one place and validates them.
//!
//! ## Example
//!
//! ```rust
//! use depcache::builder::{ResourceCacheBuilder, RollbackPolicy};
//! use depcache::strategy::GraphStrategy;
//!
//! let mut graph = GraphStrategy::new();
//! graph.insert(1u32, 10, []);
//!
//! let mut cache = ResourceCacheBuilder::new(16, 1024)
//!     .rollback(RollbackPolicy::Replay)
//!     .try_build(graph)
//!     .unwrap();
//! cache.load_request(&[1]).unwrap();
//! assert_eq!(cache.used_space(), 10);
//! ```

use crate::error::ConfigError;
use crate::manager::ResourceCacheManager;
use crate::traits::LoadingStrategy;

/// How a failed request returns to the last known-good working set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RollbackPolicy {
    /// Unload what the request loaded, then reload what it evicted, in
    /// reverse eviction order, at the LRU end. One bounded pass.
    #[default]
    Journal,
    /// Unload what the request loaded, then run the last committed request
    /// again. If that replay fails it is undone and not retried.
    Replay,
}

/// Builder for creating resource cache managers.
#[derive(Debug, Clone)]
pub struct ResourceCacheBuilder {
    max_elements: usize,
    capacity: u64,
    rollback: RollbackPolicy,
}

impl ResourceCacheBuilder {
    /// Creates a builder for a cache of at most `max_elements` resources
    /// occupying at most `capacity` space units.
    pub fn new(max_elements: usize, capacity: u64) -> Self {
        Self {
            max_elements,
            capacity,
            rollback: RollbackPolicy::default(),
        }
    }

    pub fn rollback(mut self, policy: RollbackPolicy) -> Self {
        self.rollback = policy;
        self
    }

    /// Builds the manager without validating the budget.
    pub fn build<S: LoadingStrategy>(self, strategy: S) -> ResourceCacheManager<S> {
        ResourceCacheManager::with_policy(strategy, self.max_elements, self.capacity, self.rollback)
    }

    /// Builds the manager, rejecting budgets that can never hold a resource.
    pub fn try_build<S: LoadingStrategy>(
        self,
        strategy: S,
    ) -> Result<ResourceCacheManager<S>, ConfigError> {
        if self.max_elements == 0 {
            return Err(ConfigError::new("max_elements must be > 0"));
        }
        if self.capacity == 0 {
            return Err(ConfigError::new("capacity must be > 0"));
        }
        Ok(self.build(strategy))
    }
}
