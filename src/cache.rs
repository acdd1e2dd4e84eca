//! Sharded entity cache.
//!
//! A [`Cache`] routes every key to one of [`SHARD_COUNT`] [`Group`]s by its
//! [`group_code`](crate::traits::Key::group_code) and keeps a separate
//! [`PrefixIndex`] recording which key ranges are fully loaded.
//!
//! ## Architecture
//!
//! ```text
//!                        ┌───────────────────────────────┐
//!   get / put_on_* ─────►│ Cache<E>                      │
//!                        │   selector: code % SHARD_COUNT│
//!                        └──────┬─────────────────┬──────┘
//!                               │                 │
//!               ┌───────────────┼───────┐         ▼
//!               ▼               ▼       ▼   ┌──────────────────────┐
//!          ┌─────────┐    ┌─────────┐  ...  │ PrefixIndex          │
//!          │ Group 0 │    │ Group 1 │       │  Manual (canonical)  │
//!          │ RwLock  │    │ RwLock  │       │  Ttl (0.8 × ttl)     │
//!          └─────────┘    └─────────┘       └──────────────────────┘
//! ```
//!
//! The prefix index lock and a group lock are never held together: every
//! operation resolves the prefix question first, releases that lock, then
//! enters the group.
//!
//! ## Negative Caching
//!
//! A point miss becomes a tombstone only when the prefix index already
//! certifies a range covering the key; otherwise `get` reports a plain miss
//! and the caller consults the backing store. [`Cache::put_null_if_absent`]
//! creates a tombstone unconditionally.
//!
//! ## Consistency
//!
//! [`Cache::get_all`] visits the groups one after another, each under its own
//! lock. A write racing with the scan can be visible in a later group while
//! an earlier group reflects the state before it. The result is ordered by
//! shard index first, so it is in key order only within one group's run.
//!
//! ## Example Usage
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use entity_cache::builder::CacheBuilder;
//! use entity_cache::traits::{Entity, TypeTag};
//!
//! struct Account {
//!     path: Vec<u32>,
//!     balance: i64,
//! }
//!
//! impl Entity for Account {
//!     type Key = Vec<u32>;
//!     const TYPE_TAG: TypeTag = TypeTag::new("Account");
//!
//!     fn key(&self) -> Vec<u32> {
//!         self.path.clone()
//!     }
//! }
//!
//! let cache = CacheBuilder::new(Duration::from_secs(30))
//!     .canonical(true)
//!     .build::<Account>();
//!
//! cache.put_on_store(Account { path: vec![7, 1], balance: 10 }, false).unwrap();
//! cache.put_prefix(vec![7]);
//!
//! let holder = cache.get(&vec![7, 1]).unwrap();
//! assert_eq!(holder.get().unwrap().balance, 10);
//!
//! // The range is certified, so a missing key is a known absence.
//! assert!(cache.get(&vec![7, 2]).unwrap().is_tombstone());
//! assert_eq!(cache.get_all(&vec![7]).unwrap().len(), 1);
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::builder::CacheConfig;
use crate::clock::Clock;
use crate::ds::shard::ShardSelector;
use crate::error::CacheError;
use crate::group::Group;
use crate::holder::Holder;
use crate::local::LocalCopies;
#[cfg(feature = "metrics")]
use crate::metrics::{CacheMetrics, CacheMetricsRecorder, CacheMetricsSnapshot};
use crate::prefix::{prefix_ttl, ManualPrefixIndex, PrefixIndex, TtlPrefixIndex};
use crate::traits::{Entity, TypeTag};

/// Number of groups every cache is split into.
pub const SHARD_COUNT: usize = 10;

/// Thread-safe entity cache with permanent and expiring tiers.
///
/// Construct through [`CacheBuilder`](crate::builder::CacheBuilder).
pub struct Cache<E: Entity> {
    groups: Box<[Group<E>]>,
    selector: ShardSelector,
    prefix: Box<dyn PrefixIndex<E::Key>>,
    canonical: bool,
    ttl: Duration,
    #[cfg(feature = "metrics")]
    metrics: CacheMetrics,
}

impl<E: Entity> Cache<E> {
    pub(crate) fn from_config(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        let groups: Box<[Group<E>]> = (0..SHARD_COUNT)
            .map(|_| Group::new(config.ttl, Arc::clone(&clock)))
            .collect();
        let prefix: Box<dyn PrefixIndex<E::Key>> = if config.canonical {
            Box::new(ManualPrefixIndex::new())
        } else {
            Box::new(TtlPrefixIndex::with_clock(prefix_ttl(config.ttl), clock))
        };

        let element_type = E::TYPE_TAG;
        tracing::debug!(
            %element_type,
            ttl_ms = u64::try_from(config.ttl.as_millis()).unwrap_or(u64::MAX),
            canonical = config.canonical,
            shards = SHARD_COUNT,
            "cache created"
        );

        Self {
            groups,
            selector: ShardSelector::new(SHARD_COUNT),
            prefix,
            canonical: config.canonical,
            ttl: config.ttl,
            #[cfg(feature = "metrics")]
            metrics: CacheMetrics::new(),
        }
    }

    pub fn element_type(&self) -> TypeTag {
        E::TYPE_TAG
    }

    pub fn is_canonical(&self) -> bool {
        self.canonical
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn group_for(&self, key: &E::Key) -> Option<&Group<E>> {
        self.selector
            .shard_for_key(key)
            .map(|shard| &self.groups[shard])
    }

    /// Resolves `key` to its holder.
    ///
    /// Returns `None` on a plain miss and for keys that opt out of caching.
    /// A miss inside a certified prefix range yields a fresh tombstone.
    pub fn get(&self, key: &E::Key) -> Option<Arc<Holder<E>>> {
        let Some(group) = self.group_for(key) else {
            #[cfg(feature = "metrics")]
            self.metrics.record_get_miss();
            return None;
        };

        let known_complete = self.prefix.exists(key, false);
        let holder = group.get(key, known_complete);

        #[cfg(feature = "metrics")]
        {
            match &holder {
                Some(h) => self.metrics.record_get_hit(h.is_tombstone()),
                None => self.metrics.record_get_miss(),
            }
        }
        holder
    }

    /// Every cached holder under `prefix`, or `None` unless the range is
    /// certified complete.
    ///
    /// Canonical caches return permanent holders only. Otherwise each group
    /// contributes its permanent matches then its expiring ones, each run in
    /// key order.
    ///
    /// Groups are concatenated in shard index order, not merged by key: under
    /// `SHARD_COUNT = 10` with `Vec<u32>` keys, `[10, 0]` (shard 0) comes
    /// before `[9, 0]` (shard 9). Callers that need a global key order sort
    /// the result themselves.
    pub fn get_all(&self, prefix: &E::Key) -> Option<Vec<Arc<Holder<E>>>> {
        let certified = self.prefix.exists(prefix, true);
        #[cfg(feature = "metrics")]
        self.metrics.record_get_all(certified);
        if !certified {
            return None;
        }

        Some(
            self.groups
                .iter()
                .flat_map(|group| group.get_all(prefix, self.canonical))
                .collect(),
        )
    }

    /// Certifies that every entity under `prefix` is now cached. Returns
    /// `false` if an existing entry already covered it.
    pub fn put_prefix(&self, prefix: E::Key) -> bool {
        let added = self.prefix.add(prefix);
        #[cfg(feature = "metrics")]
        {
            if added {
                self.metrics.record_prefix_registration();
            }
        }
        added
    }

    /// Returns the holder for `key`, caching a tombstone if there is none.
    pub fn put_null_if_absent(&self, key: &E::Key) -> Option<Arc<Holder<E>>> {
        self.group_for(key)?.get(key, true)
    }

    fn check_write(&self, value: &E, expiring: bool) -> Result<(), CacheError> {
        if expiring && self.canonical {
            tracing::warn!(key = ?value.key(), "expiring write rejected by canonical cache");
            #[cfg(feature = "metrics")]
            self.metrics.record_rejected_write();
            return Err(CacheError::ExpiringOnCanonical);
        }
        self.check_type(value)
    }

    fn check_type(&self, value: &E) -> Result<(), CacheError> {
        let expected = E::TYPE_TAG;
        let actual = value.type_tag();
        if expected.admits(&actual) {
            return Ok(());
        }
        tracing::warn!(%expected, %actual, "write rejected on type mismatch");
        #[cfg(feature = "metrics")]
        self.metrics.record_rejected_write();
        Err(CacheError::TypeMismatch { expected, actual })
    }

    /// Caches a value just loaded from the backing store.
    ///
    /// An existing holder keeps its current value and only moves to the tier
    /// `expiring` selects; a tombstone stays in the expiring tier regardless.
    /// `Ok(None)` means the key opts out of caching.
    ///
    /// # Errors
    ///
    /// [`CacheError::ExpiringOnCanonical`] or [`CacheError::TypeMismatch`],
    /// both raised before any state changes.
    pub fn put_on_fetch(
        &self,
        value: impl Into<Arc<E>>,
        expiring: bool,
    ) -> Result<Option<Arc<Holder<E>>>, CacheError> {
        let value = value.into();
        self.check_write(&value, expiring)?;
        let key = value.key();
        let Some(group) = self.group_for(&key) else {
            return Ok(None);
        };

        #[cfg(feature = "metrics")]
        self.metrics.record_fetch_write();
        Ok(Some(group.put_on_fetch(key, value, expiring)?))
    }

    /// Caches a value just written to the backing store, replacing whatever
    /// the key's holder carried.
    ///
    /// # Errors
    ///
    /// Same as [`put_on_fetch`](Self::put_on_fetch).
    pub fn put_on_store(
        &self,
        value: impl Into<Arc<E>>,
        expiring: bool,
    ) -> Result<Option<Arc<Holder<E>>>, CacheError> {
        let value = value.into();
        self.check_write(&value, expiring)?;
        let key = value.key();
        let Some(group) = self.group_for(&key) else {
            return Ok(None);
        };

        #[cfg(feature = "metrics")]
        self.metrics.record_store_write();
        Ok(Some(group.put_on_store(key, value, expiring)?))
    }

    /// Records that `value` was deleted from the backing store. Its holder
    /// becomes an expiring tombstone, created if necessary.
    ///
    /// # Errors
    ///
    /// [`CacheError::TypeMismatch`] if `value` is not admitted by this cache.
    pub fn put_on_delete(&self, value: &E) -> Result<Option<Arc<Holder<E>>>, CacheError> {
        self.check_type(value)?;
        let key = value.key();
        let Some(group) = self.group_for(&key) else {
            return Ok(None);
        };

        #[cfg(feature = "metrics")]
        self.metrics.record_delete_write();
        Ok(Some(group.put_on_delete(key)?))
    }

    /// Drops the holder for `key` from the cache. The returned holder is
    /// left uncached.
    pub fn invalidate(&self, key: &E::Key) -> Option<Arc<Holder<E>>> {
        let removed = self.group_for(key)?.invalidate(key);
        #[cfg(feature = "metrics")]
        {
            if removed.is_some() {
                self.metrics.record_invalidation();
            }
        }
        removed
    }

    /// Sweeps every group's expiring tier. Returns the number of holders
    /// evicted.
    pub fn purge_expired(&self) -> usize {
        let purged: usize = self.groups.iter().map(Group::purge_expired).sum();
        if purged > 0 {
            tracing::debug!(purged, "expired holders purged");
        }
        #[cfg(feature = "metrics")]
        self.metrics.record_purged(purged);
        purged
    }

    /// Reads `key` through a set of local copies.
    ///
    /// Returns the pinned copy if there is one. Otherwise resolves the cached
    /// value, pins it in `local` and returns it. Misses and tombstones return
    /// `None` and pin nothing.
    pub fn read<L>(&self, key: &E::Key, local: &mut L) -> Option<Arc<E>>
    where
        L: LocalCopies<E> + ?Sized,
    {
        if let Some(copy) = local.get_local_copy(key) {
            return Some(copy);
        }
        let value = self.get(key)?.get()?;
        local.put_local_copy(Arc::clone(&value));
        Some(value)
    }

    /// Cached holders across all groups, including tombstones and expiring
    /// entries not yet swept.
    pub fn len(&self) -> usize {
        self.groups.iter().map(Group::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(Group::is_empty)
    }

    /// Entries in the prefix index.
    pub fn prefix_count(&self) -> usize {
        self.prefix.len()
    }

    #[cfg(feature = "metrics")]
    pub fn metrics_snapshot(&self) -> CacheMetricsSnapshot {
        self.metrics.snapshot(self.len(), self.prefix_count())
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        for group in self.groups.iter() {
            group.debug_validate_invariants();
        }
    }
}

impl<E: Entity> fmt::Debug for Cache<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("element_type", &E::TYPE_TAG)
            .field("ttl", &self.ttl)
            .field("canonical", &self.canonical)
            .field("len", &self.len())
            .field("prefix_count", &self.prefix_count())
            .finish()
    }
}
