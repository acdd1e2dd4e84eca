//! Recording and export seams for cache metrics.
//!
//! Recorders only bump counters, exporters only publish snapshots. Both take
//! `&self`: the cache is shared across threads and records from inside
//! `&self` operations.

use crate::metrics::snapshot::CacheMetricsSnapshot;

/// Counters bumped by cache operations.
pub trait CacheMetricsRecorder {
    fn record_get_hit(&self, tombstone: bool);
    fn record_get_miss(&self);
    fn record_get_all(&self, certified: bool);
    fn record_prefix_registration(&self);
    fn record_fetch_write(&self);
    fn record_store_write(&self);
    fn record_delete_write(&self);
    fn record_rejected_write(&self);
    fn record_invalidation(&self);
    fn record_purged(&self, entries: usize);
}

/// Publishes a snapshot to a monitoring backend.
pub trait MetricsExporter<S> {
    fn export(&self, snapshot: &S);
}

/// Exporter that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopExporter;

impl MetricsExporter<CacheMetricsSnapshot> for NoopExporter {
    fn export(&self, _snapshot: &CacheMetricsSnapshot) {}
}
