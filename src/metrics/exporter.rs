use std::io::Write;

use parking_lot::Mutex;

use crate::metrics::snapshot::ManagerMetricsSnapshot;
use crate::metrics::traits::MetricsExporter;

/// Prometheus text exporter for manager metrics snapshots.
///
/// Writes the Prometheus text exposition format so it can be scraped by
/// Prometheus or forwarded to an OpenTelemetry collector.
#[derive(Debug)]
pub struct PrometheusTextExporter<W: Write + Send> {
    prefix: String,
    writer: Mutex<W>,
}

impl<W: Write + Send> PrometheusTextExporter<W> {
    pub fn new(prefix: impl Into<String>, writer: W) -> Self {
        Self {
            prefix: prefix.into(),
            writer: Mutex::new(writer),
        }
    }

    /// Returns the writer, e.g. to read back an in-memory buffer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn write_metric(&self, kind: &str, suffix: &str, value: u64) {
        let name = self.metric_name(suffix);
        let mut writer = self.writer.lock();
        // Best effort: write errors are dropped.
        let _ = writeln!(writer, "# TYPE {} {}", name, kind);
        let _ = writeln!(writer, "{} {}", name, value);
    }

    fn write_counter(&self, suffix: &str, value: u64) {
        self.write_metric("counter", suffix, value);
    }

    fn write_gauge(&self, suffix: &str, value: u64) {
        self.write_metric("gauge", suffix, value);
    }

    fn metric_name(&self, suffix: &str) -> String {
        if self.prefix.is_empty() {
            suffix.to_string()
        } else {
            format!("{}_{}", self.prefix, suffix)
        }
    }
}

impl<W: Write + Send> MetricsExporter<ManagerMetricsSnapshot> for PrometheusTextExporter<W> {
    fn export(&self, snapshot: &ManagerMetricsSnapshot) {
        self.write_counter("requests_total", snapshot.requests);
        self.write_counter("request_failures_total", snapshot.request_failures);
        self.write_counter("hits_total", snapshot.hits);
        self.write_counter("bumps_total", snapshot.bumps);
        self.write_counter("loads_total", snapshot.loads);
        self.write_counter("evictions_total", snapshot.evictions);
        self.write_counter("evict_scan_steps_total", snapshot.evict_scan_steps);
        self.write_counter("pins_total", snapshot.pins);
        self.write_counter("unpins_total", snapshot.unpins);
        self.write_counter("rollbacks_total", snapshot.rollbacks);
        self.write_counter("restore_failures_total", snapshot.restore_failures);
        self.write_gauge("resources", snapshot.len as u64);
        self.write_gauge("pinned_resources", snapshot.pinned as u64);
        self.write_gauge("used_space", snapshot.used_space);
        self.write_gauge("capacity", snapshot.capacity);
        self.write_gauge("max_elements", snapshot.max_elements as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_writes_prefixed_counters_and_gauges() {
        let exporter = PrometheusTextExporter::new("depcache", Vec::new());
        let snapshot = ManagerMetricsSnapshot {
            requests: 3,
            evictions: 2,
            used_space: 17,
            capacity: 25,
            ..ManagerMetricsSnapshot::default()
        };
        exporter.export(&snapshot);

        let text = String::from_utf8(exporter.into_inner()).unwrap();
        assert!(text.contains("# TYPE depcache_requests_total counter\n"));
        assert!(text.contains("depcache_requests_total 3\n"));
        assert!(text.contains("depcache_evictions_total 2\n"));
        assert!(text.contains("# TYPE depcache_used_space gauge\n"));
        assert!(text.contains("depcache_capacity 25\n"));
    }

    #[test]
    fn empty_prefix_uses_bare_names() {
        let exporter = PrometheusTextExporter::new("", Vec::new());
        exporter.export(&ManagerMetricsSnapshot::default());
        let text = String::from_utf8(exporter.into_inner()).unwrap();
        assert!(text.contains("\nloads_total 0\n"));
    }
}
