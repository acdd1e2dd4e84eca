#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheMetricsSnapshot {
    pub get_calls: u64,
    pub get_hits: u64,
    pub get_misses: u64,
    pub tombstone_hits: u64, // hits whose holder carries no value

    pub get_all_calls: u64,
    pub get_all_certified: u64,
    pub get_all_uncertified: u64,
    pub prefix_registrations: u64,

    pub fetch_writes: u64,
    pub store_writes: u64,
    pub delete_writes: u64,
    pub rejected_writes: u64,

    pub invalidations: u64,
    pub purged_entries: u64,

    // gauges captured at snapshot time
    pub cache_len: usize,
    pub prefix_len: usize,
}

impl CacheMetricsSnapshot {
    /// Fraction of point lookups that found a holder, or `0.0` before any.
    pub fn hit_ratio(&self) -> f64 {
        if self.get_calls == 0 {
            0.0
        } else {
            self.get_hits as f64 / self.get_calls as f64
        }
    }
}
