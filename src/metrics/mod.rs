//! Manager metrics (feature `metrics`).

pub mod exporter;
pub mod metrics_impl;
pub mod snapshot;
pub mod traits;

pub use exporter::PrometheusTextExporter;
pub use metrics_impl::ManagerMetrics;
pub use snapshot::ManagerMetricsSnapshot;
pub use traits::{ManagerMetricsRecorder, MetricsExporter, MetricsSnapshotProvider};
