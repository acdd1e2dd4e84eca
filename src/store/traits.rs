//! Holder stores for cache shards.
//!
//! Each shard keeps two ordered maps from key to [`Holder`]: a permanent one
//! and a time-expiring one. Stores own the bookkeeping of
//! [`HolderState`](crate::holder::HolderState): inserting marks the holder as
//! belonging to the store, removing or evicting marks it uncached.
//!
//! Both maps are `BTreeMap`s so a key prefix can be scanned as one contiguous
//! range:
//!
//! ```text
//!   range(prefix..)  ──►  [1]  [1,2]  [1,3]  [1,4]  [2]  ...
//!                         └──── take_while(prefix.is_prefix_of) ────┘ stop
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::holder::Holder;
use crate::traits::{Entity, Key};

/// Operations shared by the permanent and expiring holder stores.
pub trait HolderStore<E: Entity> {
    /// Looks a holder up without sweeping or refreshing recency.
    fn peek(&self, key: &E::Key) -> Option<&Arc<Holder<E>>>;

    /// Indexes `holder` under its key and marks it as owned by this store.
    fn insert(&mut self, holder: Arc<Holder<E>>);

    /// Drops the holder for `key` and marks it uncached.
    fn remove(&mut self, key: &E::Key) -> Option<Arc<Holder<E>>>;

    /// Current number of entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every holder, marking each uncached.
    fn clear(&mut self);
}

/// Entries of `map` whose keys `prefix` is a prefix of, in key order.
///
/// Relies on the [`Key`] ordering contract: all such keys sort at or after
/// `prefix` and are contiguous.
pub fn prefix_range<'a, K, V>(
    map: &'a BTreeMap<K, V>,
    prefix: &'a K,
) -> impl Iterator<Item = (&'a K, &'a V)> + 'a
where
    K: Key,
{
    map.range(prefix..)
        .take_while(move |(key, _)| prefix.is_prefix_of(key))
}

/// Greatest entry whose key is `<= key`.
pub fn floor_entry<'a, K, V>(map: &'a BTreeMap<K, V>, key: &K) -> Option<(&'a K, &'a V)>
where
    K: Ord,
{
    map.range(..=key).next_back()
}
