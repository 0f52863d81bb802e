#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ManagerMetricsSnapshot {
    pub requests: u64,
    pub request_failures: u64,
    pub hits: u64,
    pub bumps: u64,
    pub loads: u64,
    pub evictions: u64,
    pub evict_scan_steps: u64, // MRU nodes inspected while looking for room
    pub pins: u64,
    pub unpins: u64,
    pub rollbacks: u64,
    pub restore_failures: u64,

    // gauges captured at snapshot time
    pub len: usize,
    pub pinned: usize,
    pub used_space: u64,
    pub capacity: u64,
    pub max_elements: usize,
}
