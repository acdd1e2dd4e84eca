//! Permanent holder store.
//!
//! Entries stay until explicitly removed or switched to the expiring tier.
//! Lookups take `&self`, so a shard can serve them under its read lock.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::holder::{Holder, HolderState};
use crate::store::traits::{prefix_range, HolderStore};
use crate::traits::Entity;

/// Ordered map from key to permanently cached holder.
pub struct ManualStore<E: Entity> {
    map: BTreeMap<E::Key, Arc<Holder<E>>>,
}

impl<E: Entity> ManualStore<E> {
    pub fn new() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: &E::Key) -> Option<Arc<Holder<E>>> {
        self.map.get(key).cloned()
    }

    /// Holders whose keys `prefix` is a prefix of, in key order.
    pub fn get_all_with_prefix(&self, prefix: &E::Key) -> Vec<Arc<Holder<E>>> {
        prefix_range(&self.map, prefix)
            .map(|(_, holder)| Arc::clone(holder))
            .collect()
    }
}

impl<E: Entity> HolderStore<E> for ManualStore<E> {
    fn peek(&self, key: &E::Key) -> Option<&Arc<Holder<E>>> {
        self.map.get(key)
    }

    fn insert(&mut self, holder: Arc<Holder<E>>) {
        holder.set_state(HolderState::Manual);
        if let Some(previous) = self.map.insert(holder.key().clone(), Arc::clone(&holder)) {
            if !Arc::ptr_eq(&previous, &holder) {
                previous.set_state(HolderState::Uncached);
            }
        }
    }

    fn remove(&mut self, key: &E::Key) -> Option<Arc<Holder<E>>> {
        let holder = self.map.remove(key)?;
        holder.set_state(HolderState::Uncached);
        Some(holder)
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn clear(&mut self) {
        for holder in self.map.values() {
            holder.set_state(HolderState::Uncached);
        }
        self.map.clear();
    }
}

impl<E: Entity> Default for ManualStore<E> {
    fn default() -> Self {
        Self::new()
    }
}
