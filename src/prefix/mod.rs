//! Prefix-completeness index.
//!
//! Once the owning layer has loaded every entity under a key prefix, it
//! registers the prefix here. Range scans consult the index before touching
//! any shard: only a certified prefix may be answered from cache alone.
//!
//! ## Subsumption
//!
//! The stored set never holds two entries in a prefix relation.
//!
//! ```text
//!   add("1.2")   {1.2}
//!   add("1.3")   {1.2, 1.3}
//!   add("1")     {1}            broader prefix replaces what it covers
//!   add("1.7")   {1}            already covered: no-op, returns false
//! ```
//!
//! Because of that, `exists(key)` only has to look at the greatest stored
//! entry `<= key` and test whether it prefixes `key`.
//!
//! ## Variants
//!
//! | Variant             | Cache kind  | Entries age out             |
//! |---------------------|-------------|-----------------------------|
//! | [`ManualPrefixIndex`] | canonical | never                       |
//! | [`TtlPrefixIndex`]    | expiring  | after `PREFIX_TTL_RATIO × ttl` |
//!
//! Each variant owns its lock. The cache never holds it while holding a shard
//! lock.

pub mod manual;
pub mod ttl;

pub use manual::ManualPrefixIndex;
pub use ttl::TtlPrefixIndex;

use std::time::Duration;

/// Fraction of the value TTL after which a certified prefix goes stale.
///
/// Keeping it below 1.0 makes a prefix lapse before the values it vouches
/// for, trading extra backing-store reads for never serving a partial range.
pub const PREFIX_TTL_RATIO: f64 = 0.8;

/// Prefix TTL derived from a value TTL.
pub fn prefix_ttl(value_ttl: Duration) -> Duration {
    value_ttl.mul_f64(PREFIX_TTL_RATIO)
}

/// Contract shared by both prefix index variants.
pub trait PrefixIndex<K>: Send + Sync {
    /// Certifies `key` as complete. Returns `false` if an existing entry
    /// already covers it.
    fn add(&self, key: K) -> bool;

    /// Returns `true` if some certified entry prefixes `key`. `touch`
    /// refreshes the matched entry where entries can age.
    fn exists(&self, key: &K, touch: bool) -> bool;

    /// Number of stored entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
