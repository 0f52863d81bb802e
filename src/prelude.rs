pub use crate::builder::{ResourceCacheBuilder, RollbackPolicy};
pub use crate::ds::{IntrusiveList, Linkage, SlotArena, SlotId};
pub use crate::error::{CacheError, CapacityError, ConfigError, InvariantError};
#[cfg(feature = "concurrency")]
pub use crate::manager::ConcurrentResourceCache;
pub use crate::manager::ResourceCacheManager;
#[cfg(feature = "metrics")]
pub use crate::metrics::snapshot::ManagerMetricsSnapshot;
pub use crate::strategy::{GraphError, GraphStrategy, StrategyEvent};
pub use crate::traits::{LoadingStrategy, ObserverHandle, UsageObserver};
pub use crate::user_count::UserCount;
