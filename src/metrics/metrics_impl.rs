use crate::metrics::cell::MetricsCell;
use crate::metrics::snapshot::CacheMetricsSnapshot;
use crate::metrics::traits::CacheMetricsRecorder;

#[derive(Debug, Default)]
pub struct CacheMetrics {
    pub get_calls: MetricsCell,
    pub get_hits: MetricsCell,
    pub get_misses: MetricsCell,
    pub tombstone_hits: MetricsCell,
    pub get_all_calls: MetricsCell,
    pub get_all_certified: MetricsCell,
    pub get_all_uncertified: MetricsCell,
    pub prefix_registrations: MetricsCell,
    pub fetch_writes: MetricsCell,
    pub store_writes: MetricsCell,
    pub delete_writes: MetricsCell,
    pub rejected_writes: MetricsCell,
    pub invalidations: MetricsCell,
    pub purged_entries: MetricsCell,
}

impl CacheMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies the counters; gauges are filled in by the caller.
    pub fn snapshot(&self, cache_len: usize, prefix_len: usize) -> CacheMetricsSnapshot {
        CacheMetricsSnapshot {
            get_calls: self.get_calls.get(),
            get_hits: self.get_hits.get(),
            get_misses: self.get_misses.get(),
            tombstone_hits: self.tombstone_hits.get(),
            get_all_calls: self.get_all_calls.get(),
            get_all_certified: self.get_all_certified.get(),
            get_all_uncertified: self.get_all_uncertified.get(),
            prefix_registrations: self.prefix_registrations.get(),
            fetch_writes: self.fetch_writes.get(),
            store_writes: self.store_writes.get(),
            delete_writes: self.delete_writes.get(),
            rejected_writes: self.rejected_writes.get(),
            invalidations: self.invalidations.get(),
            purged_entries: self.purged_entries.get(),
            cache_len,
            prefix_len,
        }
    }

    pub fn reset(&self) {
        for cell in [
            &self.get_calls,
            &self.get_hits,
            &self.get_misses,
            &self.tombstone_hits,
            &self.get_all_calls,
            &self.get_all_certified,
            &self.get_all_uncertified,
            &self.prefix_registrations,
            &self.fetch_writes,
            &self.store_writes,
            &self.delete_writes,
            &self.rejected_writes,
            &self.invalidations,
            &self.purged_entries,
        ] {
            cell.reset();
        }
    }
}

impl CacheMetricsRecorder for CacheMetrics {
    fn record_get_hit(&self, tombstone: bool) {
        self.get_calls.incr();
        self.get_hits.incr();
        if tombstone {
            self.tombstone_hits.incr();
        }
    }

    fn record_get_miss(&self) {
        self.get_calls.incr();
        self.get_misses.incr();
    }

    fn record_get_all(&self, certified: bool) {
        self.get_all_calls.incr();
        if certified {
            self.get_all_certified.incr();
        } else {
            self.get_all_uncertified.incr();
        }
    }

    fn record_prefix_registration(&self) {
        self.prefix_registrations.incr();
    }

    fn record_fetch_write(&self) {
        self.fetch_writes.incr();
    }

    fn record_store_write(&self) {
        self.store_writes.incr();
    }

    fn record_delete_write(&self) {
        self.delete_writes.incr();
    }

    fn record_rejected_write(&self) {
        self.rejected_writes.incr();
    }

    fn record_invalidation(&self) {
        self.invalidations.incr();
    }

    fn record_purged(&self, entries: usize) {
        self.purged_entries.add(entries as u64);
    }
}
