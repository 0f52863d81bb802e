//! depcache: a budgeted, dependency-aware resource cache.
//!
//! A [`ResourceCacheManager`](manager::ResourceCacheManager) keeps a working
//! set of resources loaded through a [`LoadingStrategy`](traits::LoadingStrategy)
//! under two budgets, a resource count and an aggregate occupied space. A
//! request loads every requested resource together with its transitive
//! dependencies, evicting the least recently used unpinned resources to make
//! room. Resources that a loaded resource depends on are pinned and never
//! evicted. A request that cannot fit is undone.
//!
//! ```
//! use depcache::prelude::*;
//!
//! let mut graph = GraphStrategy::new();
//! graph
//!     .insert("shader", 2, [])
//!     .insert("material", 1, ["shader"])
//!     .insert("mesh", 6, ["material"]);
//!
//! let mut cache = ResourceCacheBuilder::new(4, 16).try_build(graph).unwrap();
//! cache.load_request(&["mesh"]).unwrap();
//!
//! assert_eq!(cache.len(), 3);
//! assert!(cache.is_pinned(&"shader"));
//! assert_eq!(cache.mru_order().collect::<Vec<_>>(), vec![&"mesh"]);
//! ```

pub mod builder;
pub mod ds;
pub mod error;
pub mod manager;

#[cfg(feature = "metrics")]
pub mod metrics;

pub mod prelude;
pub mod strategy;
pub mod traits;
pub mod user_count;
