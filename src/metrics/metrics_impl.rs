use crate::metrics::snapshot::ManagerMetricsSnapshot;
use crate::metrics::traits::ManagerMetricsRecorder;

#[derive(Debug, Default)]
pub struct ManagerMetrics {
    pub requests: u64,
    pub request_failures: u64,
    pub hits: u64,
    pub bumps: u64,
    pub loads: u64,
    pub evictions: u64,
    pub evict_scan_steps: u64,
    pub pins: u64,
    pub unpins: u64,
    pub rollbacks: u64,
    pub restore_failures: u64,
}

impl ManagerMetrics {
    /// Copies the counters into a snapshot; gauges are left at zero for the
    /// caller to fill in.
    pub fn counters(&self) -> ManagerMetricsSnapshot {
        ManagerMetricsSnapshot {
            requests: self.requests,
            request_failures: self.request_failures,
            hits: self.hits,
            bumps: self.bumps,
            loads: self.loads,
            evictions: self.evictions,
            evict_scan_steps: self.evict_scan_steps,
            pins: self.pins,
            unpins: self.unpins,
            rollbacks: self.rollbacks,
            restore_failures: self.restore_failures,
            ..ManagerMetricsSnapshot::default()
        }
    }
}

impl ManagerMetricsRecorder for ManagerMetrics {
    fn record_request(&mut self) {
        self.requests += 1;
    }

    fn record_request_failure(&mut self) {
        self.request_failures += 1;
    }

    fn record_hit(&mut self) {
        self.hits += 1;
    }

    fn record_bump(&mut self) {
        self.bumps += 1;
    }

    fn record_load(&mut self) {
        self.loads += 1;
    }

    fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    fn record_evict_scan_step(&mut self) {
        self.evict_scan_steps += 1;
    }

    fn record_pin(&mut self) {
        self.pins += 1;
    }

    fn record_unpin(&mut self) {
        self.unpins += 1;
    }

    fn record_rollback(&mut self) {
        self.rollbacks += 1;
    }

    fn record_restore_failure(&mut self) {
        self.restore_failures += 1;
    }
}
