//! Aging prefix index for expiring caches.
//!
//! Same floor-lookup and subsumption rules as
//! [`ManualPrefixIndex`](crate::prefix::ManualPrefixIndex), but each entry is
//! also a node in a [`TtlEngine`]. Every `exists` sweeps first, even when the
//! caller does not ask for a touch, so a lapsed certification is never
//! reported.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::clock::{Clock, SystemClock};
use crate::ds::ttl_engine::{NodeHandle, TtlEngine};
use crate::prefix::PrefixIndex;
use crate::store::traits::{floor_entry, prefix_range};
use crate::traits::Key;

struct Entries<K: Key> {
    map: BTreeMap<K, NodeHandle>,
    engine: TtlEngine<K>,
}

impl<K: Key> Entries<K> {
    fn expire(&mut self) -> usize {
        let map = &mut self.map;
        let expired = self.engine.expire(|key| {
            map.remove(&key);
        });
        if expired > 0 {
            tracing::debug!(expired, remaining = self.map.len(), "prefix certifications lapsed");
        }
        expired
    }

    fn covering(&self, key: &K) -> Option<NodeHandle> {
        floor_entry(&self.map, key)
            .filter(|(floor, _)| floor.is_prefix_of(key))
            .map(|(_, handle)| *handle)
    }
}

/// Prefix index whose entries lapse after a TTL without access.
pub struct TtlPrefixIndex<K: Key> {
    entries: Mutex<Entries<K>>,
}

impl<K: Key> TtlPrefixIndex<K> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(Entries {
                map: BTreeMap::new(),
                engine: TtlEngine::with_clock(ttl, clock),
            }),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.entries.lock().engine.ttl()
    }

    /// Snapshot of the stored prefixes in key order, including any not yet
    /// swept.
    pub fn keys(&self) -> Vec<K> {
        self.entries.lock().map.keys().cloned().collect()
    }
}

impl<K: Key> PrefixIndex<K> for TtlPrefixIndex<K> {
    fn add(&self, key: K) -> bool {
        let mut entries = self.entries.lock();
        entries.expire();
        if entries.covering(&key).is_some() {
            return false;
        }

        let subsumed: Vec<(K, NodeHandle)> = prefix_range(&entries.map, &key)
            .map(|(entry, handle)| (entry.clone(), *handle))
            .collect();
        for (entry, handle) in &subsumed {
            entries.engine.remove(*handle);
            entries.map.remove(entry);
        }

        tracing::debug!(prefix = ?key, subsumed = subsumed.len(), "prefix certified");
        let handle = entries.engine.add(key.clone());
        entries.map.insert(key, handle);
        true
    }

    fn exists(&self, key: &K, touch: bool) -> bool {
        let mut entries = self.entries.lock();
        entries.expire();
        match entries.covering(key) {
            None => false,
            Some(handle) => {
                if touch {
                    entries.engine.touch(handle);
                }
                true
            },
        }
    }

    fn len(&self) -> usize {
        self.entries.lock().map.len()
    }
}
