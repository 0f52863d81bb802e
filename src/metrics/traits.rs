//! # Metrics Traits
//!
//! Recording, snapshotting and export are split into small traits so the
//! manager only ever writes counters, while tests and monitoring read them
//! through a snapshot.
//!
//! ```text
//!   ┌─────────────────────────────┐
//!   │   ManagerMetricsRecorder    │   written by ResourceCacheManager
//!   │ request/hit/load/evict/...  │
//!   └──────────────┬──────────────┘
//!                  │
//!     ┌────────────┴──────────────────────────┐
//!     ▼                                       ▼
//!   ┌──────────────────────────────┐    ┌──────────────────────────────┐
//!   │ MetricsSnapshotProvider<S>   │    │ MetricsExporter<S>           │
//!   │ (bench/test)                 │    │ (production monitoring)      │
//!   └──────────────────────────────┘    └──────────────────────────────┘
//! ```

/// Counters for the resource cache manager.
pub trait ManagerMetricsRecorder {
    fn record_request(&mut self);
    fn record_request_failure(&mut self);
    /// A requested resource was already loaded.
    fn record_hit(&mut self);
    /// An already loaded, unpinned resource moved to the MRU head.
    fn record_bump(&mut self);
    fn record_load(&mut self);
    fn record_eviction(&mut self);
    fn record_evict_scan_step(&mut self);
    fn record_pin(&mut self);
    fn record_unpin(&mut self);
    fn record_rollback(&mut self);
    fn record_restore_failure(&mut self);
}

/// Snapshot provider for bench/testing.
pub trait MetricsSnapshotProvider<S> {
    fn snapshot(&self) -> S;
}

/// Export/publish metrics to production monitoring backends.
pub trait MetricsExporter<S> {
    fn export(&self, snapshot: &S);
}
