//! # Loading Strategy Contract
//!
//! The resource cache never materializes anything itself. Everything it knows
//! about a resource comes from a [`LoadingStrategy`]: how much space it
//! occupies, what it depends on, and how to load or unload it. The strategy
//! in turn tells the cache when a loaded resource gains its first dependent or
//! loses its last one, through the [`UsageObserver`] handles the cache
//! registers per resource.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────┐  occupied_space / dependencies   ┌────────────────────────┐
//!   │  ResourceCacheManager    │ ───────────────────────────────► │   LoadingStrategy      │
//!   │                          │  load / unload / is_loaded       │   (caller supplied)    │
//!   │   per-node observer  ◄───┼──────────────────────────────────┤ UserCount per resource │
//!   └──────────────────────────┘  became_used / became_unused     └────────────────────────┘
//! ```
//!
//! ## Contract
//!
//! | Method             | Called by the cache when                                   |
//! |--------------------|------------------------------------------------------------|
//! | `occupied_space`   | a resource is about to be loaded                           |
//! | `dependencies`     | an unloaded resource is expanded during the closure walk   |
//! | `load`             | every dependency of the resource is already loaded         |
//! | `unload`           | the resource has no loaded dependents (teardown excepted)  |
//! | `is_loaded`        | invariant checks and diagnostics                           |
//! | `attach_observer`  | right after `load` succeeds                                |
//! | `detach_observer`  | right before `unload`                                      |
//!
//! `occupied_space` must return the same value for a resource for as long as
//! the cache may hold it; the cache fixes the value at load time and credits
//! exactly that amount back on unload.

use std::error::Error;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

/// Listener notified when a resource crosses the used/unused boundary.
///
/// "Used" means at least one other loaded resource depends on it.
pub trait UsageObserver: Send + Sync {
    /// The resource gained its first live dependent.
    fn became_used(&self);

    /// The resource lost its last live dependent.
    fn became_unused(&self);
}

/// Shared observer handle. Identity is pointer identity (`Arc::ptr_eq`).
pub type ObserverHandle = Arc<dyn UsageObserver>;

/// Knows how to measure, load, unload and enumerate dependencies of resources.
pub trait LoadingStrategy {
    /// Identity of a resource. Cloned into the cache's bookkeeping.
    type Resource: Clone + Eq + Hash + Debug;

    /// Failure to materialize a resource.
    type Error: Error + Send + Sync + 'static;

    /// Space the resource occupies once loaded.
    fn occupied_space(&self, resource: &Self::Resource) -> u64;

    /// Resources that must be loaded before `resource` can be.
    fn dependencies(&self, resource: &Self::Resource) -> Vec<Self::Resource>;

    /// Materializes `resource`. All of its dependencies are loaded.
    fn load(&mut self, resource: &Self::Resource) -> Result<(), Self::Error>;

    /// Releases `resource`.
    fn unload(&mut self, resource: &Self::Resource);

    fn is_loaded(&self, resource: &Self::Resource) -> bool;

    /// Registers `observer` for usage transitions of a loaded `resource`.
    fn attach_observer(&mut self, resource: &Self::Resource, observer: ObserverHandle);

    /// Removes an observer previously passed to [`attach_observer`](Self::attach_observer).
    fn detach_observer(&mut self, resource: &Self::Resource, observer: &ObserverHandle);
}
