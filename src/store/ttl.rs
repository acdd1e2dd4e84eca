//! Time-expiring holder store.
//!
//! Every holder is also a node in a [`TtlEngine`]. Sweeps are lazy: a normal
//! `get` and every prefix scan first evict whatever has outlived the TTL, then
//! refresh the recency of what they return. Peek lookups do neither, so a
//! shard can inspect state without side effects.
//!
//! ```text
//!   map: BTreeMap<Key, NodeHandle> ──► engine: TtlEngine<Arc<Holder>>
//!                                          │ expire()
//!                                          ▼
//!                                  map.remove(holder.key)
//!                                  holder.state = Uncached
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::Clock;
use crate::ds::ttl_engine::{NodeHandle, TtlEngine};
use crate::holder::{Holder, HolderState};
use crate::store::traits::{prefix_range, HolderStore};
use crate::traits::Entity;

/// Ordered map from key to expiring holder, threaded through a TTL ring.
pub struct TtlStore<E: Entity> {
    map: BTreeMap<E::Key, NodeHandle>,
    engine: TtlEngine<Arc<Holder<E>>>,
}

impl<E: Entity> TtlStore<E> {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            map: BTreeMap::new(),
            engine: TtlEngine::with_clock(ttl, clock),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.engine.ttl()
    }

    /// Looks up `key`. Unless `peek` is set, sweeps expired entries first and
    /// refreshes the hit's recency.
    pub fn get(&mut self, key: &E::Key, peek: bool) -> Option<Arc<Holder<E>>> {
        if peek {
            return self.peek(key).cloned();
        }

        self.expire();
        let handle = *self.map.get(key)?;
        self.engine.touch(handle);
        self.engine.get(handle).cloned()
    }

    /// Sweeps, then returns every holder `prefix` covers in key order,
    /// refreshing each one's recency.
    pub fn get_all_with_prefix(&mut self, prefix: &E::Key) -> Vec<Arc<Holder<E>>> {
        self.expire();
        let handles: Vec<NodeHandle> = prefix_range(&self.map, prefix)
            .map(|(_, handle)| *handle)
            .collect();

        handles
            .into_iter()
            .filter_map(|handle| {
                self.engine.touch(handle);
                self.engine.get(handle).cloned()
            })
            .collect()
    }

    /// Restamps the entry for `key` and moves it to the head of the ring.
    /// Returns `false` if the key is not indexed here.
    pub fn touch(&mut self, key: &E::Key) -> bool {
        match self.map.get(key) {
            Some(handle) => self.engine.touch(*handle),
            None => false,
        }
    }

    /// Evicts every entry older than the TTL. Returns how many were dropped.
    pub fn expire(&mut self) -> usize {
        let map = &mut self.map;
        let evicted = self.engine.expire(|holder| {
            map.remove(holder.key());
            holder.set_state(HolderState::Uncached);
        });
        if evicted > 0 {
            tracing::trace!(evicted, remaining = self.map.len(), "ttl store sweep");
        }
        evicted
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        assert_eq!(self.map.len(), self.engine.len());
        for (key, handle) in &self.map {
            let holder = self.engine.get(*handle).expect("indexed node expired");
            assert_eq!(holder.key(), key);
            assert_eq!(holder.state(), HolderState::Expiring);
        }
        self.engine.debug_validate_invariants();
    }
}

impl<E: Entity> HolderStore<E> for TtlStore<E> {
    fn peek(&self, key: &E::Key) -> Option<&Arc<Holder<E>>> {
        let handle = self.map.get(key)?;
        self.engine.get(*handle)
    }

    /// Links `holder` at the head of the ring.
    fn insert(&mut self, holder: Arc<Holder<E>>) {
        holder.set_state(HolderState::Expiring);
        let key = holder.key().clone();
        let handle = self.engine.add(holder);
        if let Some(previous) = self.map.insert(key, handle) {
            if let Some(old) = self.engine.remove(previous) {
                if self.engine.get(handle).is_some_and(|h| !Arc::ptr_eq(h, &old)) {
                    old.set_state(HolderState::Uncached);
                }
            }
        }
    }

    fn remove(&mut self, key: &E::Key) -> Option<Arc<Holder<E>>> {
        let handle = self.map.remove(key)?;
        let holder = self.engine.remove(handle)?;
        holder.set_state(HolderState::Uncached);
        Some(holder)
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn clear(&mut self) {
        for holder in self.engine.iter() {
            holder.set_state(HolderState::Uncached);
        }
        self.engine.clear();
        self.map.clear();
    }
}
