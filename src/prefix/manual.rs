//! Permanent prefix index for canonical caches.

use std::collections::BTreeSet;

use parking_lot::RwLock;

use crate::prefix::PrefixIndex;
use crate::traits::Key;

/// Prefix index whose entries never age out.
#[derive(Debug)]
pub struct ManualPrefixIndex<K: Key> {
    entries: RwLock<BTreeSet<K>>,
}

impl<K: Key> ManualPrefixIndex<K> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeSet::new()),
        }
    }

    /// Snapshot of the stored prefixes in key order.
    pub fn keys(&self) -> Vec<K> {
        self.entries.read().iter().cloned().collect()
    }

    fn covered(entries: &BTreeSet<K>, key: &K) -> bool {
        entries
            .range(..=key)
            .next_back()
            .is_some_and(|floor| floor.is_prefix_of(key))
    }
}

impl<K: Key> PrefixIndex<K> for ManualPrefixIndex<K> {
    fn add(&self, key: K) -> bool {
        let mut entries = self.entries.write();
        if Self::covered(&entries, &key) {
            return false;
        }

        let subsumed: Vec<K> = entries
            .range(&key..)
            .take_while(|entry| key.is_prefix_of(entry))
            .cloned()
            .collect();
        for entry in &subsumed {
            entries.remove(entry);
        }
        tracing::debug!(prefix = ?key, subsumed = subsumed.len(), "prefix certified");
        entries.insert(key);
        true
    }

    fn exists(&self, key: &K, _touch: bool) -> bool {
        Self::covered(&self.entries.read(), key)
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }
}

impl<K: Key> Default for ManualPrefixIndex<K> {
    fn default() -> Self {
        Self::new()
    }
}
