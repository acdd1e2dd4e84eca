use std::io::Write;

use parking_lot::Mutex;

use crate::metrics::snapshot::CacheMetricsSnapshot;
use crate::metrics::traits::MetricsExporter;

/// Prometheus text exporter for cache metrics snapshots.
///
/// Writes the Prometheus text exposition format. Write errors are dropped:
/// export is best-effort and must not disturb the cache.
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

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn write_counter(&self, name: &str, value: u64) {
        let mut writer = self.writer.lock();
        let _ = writeln!(writer, "# TYPE {} counter", name);
        let _ = writeln!(writer, "{} {}", name, value);
    }

    fn write_gauge(&self, name: &str, value: u64) {
        let mut writer = self.writer.lock();
        let _ = writeln!(writer, "# TYPE {} gauge", name);
        let _ = writeln!(writer, "{} {}", name, value);
    }

    fn metric_name(&self, suffix: &str) -> String {
        if self.prefix.is_empty() {
            suffix.to_string()
        } else {
            format!("{}_{}", self.prefix, suffix)
        }
    }
}

impl<W: Write + Send> MetricsExporter<CacheMetricsSnapshot> for PrometheusTextExporter<W> {
    fn export(&self, snapshot: &CacheMetricsSnapshot) {
        let counters = [
            ("get_calls_total", snapshot.get_calls),
            ("get_hits_total", snapshot.get_hits),
            ("get_misses_total", snapshot.get_misses),
            ("tombstone_hits_total", snapshot.tombstone_hits),
            ("get_all_calls_total", snapshot.get_all_calls),
            ("get_all_certified_total", snapshot.get_all_certified),
            ("get_all_uncertified_total", snapshot.get_all_uncertified),
            ("prefix_registrations_total", snapshot.prefix_registrations),
            ("fetch_writes_total", snapshot.fetch_writes),
            ("store_writes_total", snapshot.store_writes),
            ("delete_writes_total", snapshot.delete_writes),
            ("rejected_writes_total", snapshot.rejected_writes),
            ("invalidations_total", snapshot.invalidations),
            ("purged_entries_total", snapshot.purged_entries),
        ];
        for (suffix, value) in counters {
            self.write_counter(&self.metric_name(suffix), value);
        }
        self.write_gauge(&self.metric_name("cache_len"), snapshot.cache_len as u64);
        self.write_gauge(&self.metric_name("prefix_len"), snapshot.prefix_len as u64);
    }
}
