//! One cache shard.
//!
//! A [`Group`] owns a [`ManualStore`] and a [`TtlStore`] behind a single
//! `parking_lot::RwLock` and implements the per-key state machine that moves a
//! [`Holder`] between the permanent and expiring tiers.
//!
//! ## Lookup Path
//!
//! ```text
//!   get(key, create_negative)
//!        │
//!        ▼
//!   ┌──────────────────────────┐   hit
//!   │ read lock: manual.get    │──────────► Some(holder)
//!   └──────────────────────────┘
//!        │ miss (drop read lock)
//!        ▼
//!   ┌──────────────────────────┐   hit
//!   │ write lock: manual.get   │──────────► Some(holder)
//!   │             ttl.get      │  (sweep + touch)
//!   └──────────────────────────┘
//!        │ miss
//!        ▼
//!   create_negative ? insert tombstone into ttl : None
//! ```
//!
//! Permanent hits never contend on the write lock. Expiring hits need it
//! because the hit refreshes recency, and the tombstone path inserts.
//!
//! ## Write Paths
//!
//! | Operation       | Absent                 | Present                              |
//! |-----------------|------------------------|--------------------------------------|
//! | `put_on_fetch`  | create in chosen tier  | keep value, align tier               |
//! | `put_on_store`  | create in chosen tier  | overwrite value, align tier          |
//! | `put_on_delete` | tombstone in ttl tier  | clear value, force into ttl tier     |
//!
//! Every write sweeps the expiring tier first, so a holder past its TTL counts
//! as absent and the write gets a fresh one. Aligning onto the expiring tier
//! restarts the holder's TTL. A tombstone never leaves the expiring tier: a
//! fetch that asks for the permanent tier leaves it where it is.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use crate::clock::Clock;
use crate::error::InvariantError;
use crate::holder::{Holder, HolderState};
use crate::store::{HolderStore, ManualStore, TtlStore};
use crate::traits::Entity;

struct GroupInner<E: Entity> {
    manual: ManualStore<E>,
    ttl: TtlStore<E>,
}

impl<E: Entity> GroupInner<E> {
    fn peek(&self, key: &E::Key) -> Option<Arc<Holder<E>>> {
        self.manual
            .peek(key)
            .or_else(|| self.ttl.peek(key))
            .cloned()
    }

    fn create(&mut self, key: E::Key, value: Option<Arc<E>>, expiring: bool) -> Arc<Holder<E>> {
        let holder = Holder::new(key, value);
        if expiring {
            self.ttl.insert(Arc::clone(&holder));
        } else {
            self.manual.insert(Arc::clone(&holder));
        }
        holder
    }

    fn switch_store(&mut self, holder: &Arc<Holder<E>>, expiring: bool) -> Result<(), InvariantError> {
        let expiring = expiring || holder.is_tombstone();
        match (holder.state(), expiring) {
            (HolderState::Uncached, _) => Err(InvariantError::new(format!(
                "cannot switch tier of uncached holder {:?}",
                holder.key()
            ))),
            (HolderState::Manual, false) => Ok(()),
            (HolderState::Expiring, true) => {
                self.ttl.touch(holder.key());
                Ok(())
            },
            (HolderState::Manual, true) => {
                self.manual.remove(holder.key());
                self.ttl.insert(Arc::clone(holder));
                tracing::debug!(key = ?holder.key(), "holder demoted to expiring tier");
                Ok(())
            },
            (HolderState::Expiring, false) => {
                self.ttl.remove(holder.key());
                self.manual.insert(Arc::clone(holder));
                tracing::debug!(key = ?holder.key(), "holder promoted to manual tier");
                Ok(())
            },
        }
    }
}

/// Cache shard: permanent and expiring stores under one reader-writer lock.
pub struct Group<E: Entity> {
    inner: RwLock<GroupInner<E>>,
}

impl<E: Entity> Group<E> {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: RwLock::new(GroupInner {
                manual: ManualStore::new(),
                ttl: TtlStore::new(ttl, clock),
            }),
        }
    }

    /// Resolves `key`, optionally caching a tombstone on a miss.
    pub fn get(&self, key: &E::Key, create_negative_if_absent: bool) -> Option<Arc<Holder<E>>> {
        {
            let inner = self.inner.read();
            if let Some(holder) = inner.manual.get(key) {
                return Some(holder);
            }
        }

        let mut inner = self.inner.write();
        if let Some(holder) = inner.manual.get(key) {
            return Some(holder);
        }
        if let Some(holder) = inner.ttl.get(key, false) {
            return Some(holder);
        }
        if !create_negative_if_absent {
            return None;
        }

        tracing::trace!(key = ?key, "caching tombstone");
        Some(inner.create(key.clone(), None, true))
    }

    /// Holders under `prefix`: permanent ones first, then (unless `canonical`)
    /// expiring ones, each run in key order.
    pub fn get_all(&self, prefix: &E::Key, canonical: bool) -> Vec<Arc<Holder<E>>> {
        if canonical {
            return self.inner.read().manual.get_all_with_prefix(prefix);
        }

        let mut inner = self.inner.write();
        let mut all = inner.manual.get_all_with_prefix(prefix);
        all.extend(inner.ttl.get_all_with_prefix(prefix));
        all
    }

    /// Caches a value loaded from the backing store. An existing holder keeps
    /// its value, tombstones included; only its tier follows `expiring`.
    pub fn put_on_fetch(
        &self,
        key: E::Key,
        value: Arc<E>,
        expiring: bool,
    ) -> Result<Arc<Holder<E>>, InvariantError> {
        let mut inner = self.inner.write();
        inner.ttl.expire();
        match inner.peek(&key) {
            None => Ok(inner.create(key, Some(value), expiring)),
            Some(existing) => {
                inner.switch_store(&existing, expiring)?;
                Ok(existing)
            },
        }
    }

    /// Caches a value just written to the backing store, overwriting any
    /// existing value.
    pub fn put_on_store(
        &self,
        key: E::Key,
        value: Arc<E>,
        expiring: bool,
    ) -> Result<Arc<Holder<E>>, InvariantError> {
        let mut inner = self.inner.write();
        inner.ttl.expire();
        match inner.peek(&key) {
            None => Ok(inner.create(key, Some(value), expiring)),
            Some(existing) => {
                existing.set(Some(value));
                inner.switch_store(&existing, expiring)?;
                Ok(existing)
            },
        }
    }

    /// Records a deletion: the key's holder becomes an expiring tombstone.
    pub fn put_on_delete(&self, key: E::Key) -> Result<Arc<Holder<E>>, InvariantError> {
        let mut inner = self.inner.write();
        inner.ttl.expire();
        match inner.peek(&key) {
            None => Ok(inner.create(key, None, true)),
            Some(existing) => {
                existing.set(None);
                inner.switch_store(&existing, true)?;
                Ok(existing)
            },
        }
    }

    /// Drops the holder for `key` from whichever tier indexes it.
    pub fn invalidate(&self, key: &E::Key) -> Option<Arc<Holder<E>>> {
        let mut inner = self.inner.write();
        match inner.manual.remove(key) {
            Some(holder) => Some(holder),
            None => inner.ttl.remove(key),
        }
    }

    /// Sweeps the expiring tier. Returns the number of evicted holders.
    pub fn purge_expired(&self) -> usize {
        self.inner.write().ttl.expire()
    }

    pub fn manual_len(&self) -> usize {
        self.inner.read().manual.len()
    }

    /// Expiring entries, including any not yet swept.
    pub fn ttl_len(&self) -> usize {
        self.inner.read().ttl.len()
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.read();
        inner.manual.len() + inner.ttl.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.manual.clear();
        inner.ttl.clear();
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        let inner = self.inner.read();
        inner.ttl.debug_validate_invariants();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::test_support::Record;

    fn group() -> (Group<Record>, ManualClock) {
        let clock = ManualClock::new();
        let group = Group::new(Duration::from_millis(1000), Arc::new(clock.clone()));
        (group, clock)
    }

    fn record(key: &[u32], payload: u32) -> Arc<Record> {
        Arc::new(Record::new(key, payload))
    }

    #[test]
    fn get_misses_without_negative_caching() {
        let (group, _clock) = group();
        assert!(group.get(&vec![1, 2], false).is_none());
        assert!(group.is_empty());
    }

    #[test]
    fn get_creates_tombstone_when_asked() {
        let (group, _clock) = group();
        let tomb = group.get(&vec![1, 2], true).unwrap();
        assert!(tomb.is_tombstone());
        assert_eq!(tomb.state(), HolderState::Expiring);
        assert_eq!(group.ttl_len(), 1);

        let again = group.get(&vec![1, 2], true).unwrap();
        assert!(Arc::ptr_eq(&tomb, &again));
    }

    #[test]
    fn put_on_store_then_get_returns_same_holder() {
        let (group, _clock) = group();
        let value = record(&[1, 2], 1);
        let stored = group
            .put_on_store(vec![1, 2], Arc::clone(&value), false)
            .unwrap();

        let a = group.get(&vec![1, 2], false).unwrap();
        let b = group.get(&vec![1, 2], false).unwrap();
        assert!(Arc::ptr_eq(&stored, &a));
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&a.get().unwrap(), &value));
        assert_eq!(a.state(), HolderState::Manual);
    }

    #[test]
    fn put_on_fetch_keeps_first_value() {
        let (group, _clock) = group();
        let first = record(&[1, 2], 1);
        let h1 = group
            .put_on_fetch(vec![1, 2], Arc::clone(&first), false)
            .unwrap();
        let h2 = group
            .put_on_fetch(vec![1, 2], record(&[1, 2], 2), false)
            .unwrap();

        assert!(Arc::ptr_eq(&h1, &h2));
        assert!(Arc::ptr_eq(&h2.get().unwrap(), &first));
    }

    #[test]
    fn put_on_fetch_aligns_tier_of_existing_holder() {
        let (group, _clock) = group();
        let h = group
            .put_on_fetch(vec![1, 2], record(&[1, 2], 1), true)
            .unwrap();
        assert_eq!(h.state(), HolderState::Expiring);

        group
            .put_on_fetch(vec![1, 2], record(&[1, 2], 2), false)
            .unwrap();
        assert_eq!(h.state(), HolderState::Manual);
        assert_eq!(group.manual_len(), 1);
        assert_eq!(group.ttl_len(), 0);
    }

    #[test]
    fn put_on_store_overwrites_and_switches_tier() {
        let (group, _clock) = group();
        let h = group
            .put_on_store(vec![1, 2], record(&[1, 2], 1), false)
            .unwrap();

        let newer = record(&[1, 2], 2);
        let h2 = group
            .put_on_store(vec![1, 2], Arc::clone(&newer), true)
            .unwrap();
        assert!(Arc::ptr_eq(&h, &h2));
        assert!(Arc::ptr_eq(&h.get().unwrap(), &newer));
        assert_eq!(h.state(), HolderState::Expiring);
        assert_eq!(group.manual_len(), 0);
        assert_eq!(group.ttl_len(), 1);

        group
            .put_on_store(vec![1, 2], record(&[1, 2], 3), false)
            .unwrap();
        assert_eq!(h.state(), HolderState::Manual);
        assert_eq!(h.get().unwrap().payload, 3);
        group.debug_validate_invariants();
    }

    #[test]
    fn put_on_delete_of_absent_key_caches_tombstone() {
        let (group, _clock) = group();
        let tomb = group.put_on_delete(vec![4, 4]).unwrap();
        assert!(tomb.is_tombstone());
        assert_eq!(tomb.state(), HolderState::Expiring);
        assert!(Arc::ptr_eq(&group.get(&vec![4, 4], false).unwrap(), &tomb));
    }

    #[test]
    fn put_on_delete_forces_permanent_entry_to_expire() {
        let (group, clock) = group();
        let h = group
            .put_on_store(vec![1, 2], record(&[1, 2], 1), false)
            .unwrap();

        group.put_on_delete(vec![1, 2]).unwrap();
        assert!(h.is_tombstone());
        assert_eq!(h.state(), HolderState::Expiring);

        clock.advance(Duration::from_millis(1001));
        assert!(group.get(&vec![1, 2], false).is_none());
        assert!(!h.is_cached());
    }

    #[test]
    fn fetch_after_delete_keeps_tombstone_expiring() {
        let (group, clock) = group();
        let h = group
            .put_on_store(vec![1, 2], record(&[1, 2], 1), false)
            .unwrap();
        group.put_on_delete(vec![1, 2]).unwrap();

        let fetched = group
            .put_on_fetch(vec![1, 2], record(&[1, 2], 2), false)
            .unwrap();
        assert!(Arc::ptr_eq(&fetched, &h));
        assert!(h.is_tombstone());
        assert_eq!(h.state(), HolderState::Expiring);
        assert_eq!(group.manual_len(), 0);
        assert_eq!(group.ttl_len(), 1);
        group.debug_validate_invariants();

        clock.advance(Duration::from_millis(1001));
        assert!(group.get(&vec![1, 2], false).is_none());
        assert!(!h.is_cached());
    }

    #[test]
    fn write_onto_unswept_expired_entry_creates_fresh_holder() {
        let (group, clock) = group();
        let old = group
            .put_on_store(vec![1, 2], record(&[1, 2], 1), true)
            .unwrap();
        clock.advance(Duration::from_millis(1500));

        let new = group
            .put_on_store(vec![1, 2], record(&[1, 2], 2), true)
            .unwrap();
        assert!(!Arc::ptr_eq(&old, &new));
        assert_eq!(old.state(), HolderState::Uncached);
        assert_eq!(new.state(), HolderState::Expiring);

        let hit = group.get(&vec![1, 2], false).unwrap();
        assert!(Arc::ptr_eq(&hit, &new));
        assert_eq!(hit.get().unwrap().payload, 2);

        clock.advance(Duration::from_millis(1500));
        let fetched = group
            .put_on_fetch(vec![1, 2], record(&[1, 2], 3), true)
            .unwrap();
        assert_eq!(fetched.get().unwrap().payload, 3);
        assert!(!new.is_cached());

        clock.advance(Duration::from_millis(1500));
        let tomb = group.put_on_delete(vec![1, 2]).unwrap();
        assert!(!Arc::ptr_eq(&tomb, &fetched));
        assert!(tomb.is_tombstone());
        assert_eq!(tomb.state(), HolderState::Expiring);
        group.debug_validate_invariants();
    }

    #[test]
    fn repeated_expiring_write_restarts_ttl() {
        let (group, clock) = group();
        group
            .put_on_store(vec![1, 2], record(&[1, 2], 1), true)
            .unwrap();

        clock.advance(Duration::from_millis(900));
        group
            .put_on_store(vec![1, 2], record(&[1, 2], 2), true)
            .unwrap();
        clock.advance(Duration::from_millis(200));
        assert_eq!(group.purge_expired(), 0);
        assert_eq!(group.len(), 1);

        clock.advance(Duration::from_millis(700));
        group
            .put_on_fetch(vec![1, 2], record(&[1, 2], 3), true)
            .unwrap();
        clock.advance(Duration::from_millis(700));
        assert_eq!(group.purge_expired(), 0);

        group.put_on_delete(vec![1, 2]).unwrap();
        clock.advance(Duration::from_millis(700));
        assert_eq!(group.purge_expired(), 0);

        clock.advance(Duration::from_millis(301));
        assert_eq!(group.purge_expired(), 1);
        assert!(group.is_empty());
    }

    #[test]
    fn expiring_entry_is_evicted_after_ttl() {
        let (group, clock) = group();
        let h = group
            .put_on_store(vec![1, 2], record(&[1, 2], 1), true)
            .unwrap();

        clock.advance(Duration::from_millis(900));
        assert!(group.get(&vec![1, 2], false).is_some());

        clock.advance(Duration::from_millis(1001));
        assert!(group.get(&vec![1, 2], false).is_none());
        assert_eq!(h.state(), HolderState::Uncached);
    }

    #[test]
    fn evicted_key_gets_fresh_holder_on_reinsert() {
        let (group, clock) = group();
        let old = group
            .put_on_store(vec![1, 2], record(&[1, 2], 1), true)
            .unwrap();
        clock.advance(Duration::from_millis(1001));
        assert_eq!(group.purge_expired(), 1);

        let new = group
            .put_on_store(vec![1, 2], record(&[1, 2], 2), true)
            .unwrap();
        assert!(!Arc::ptr_eq(&old, &new));
        assert!(!old.is_cached());
    }

    #[test]
    fn get_all_orders_manual_before_ttl() {
        let (group, _clock) = group();
        group
            .put_on_store(vec![1, 3], record(&[1, 3], 0), true)
            .unwrap();
        group
            .put_on_store(vec![1, 4], record(&[1, 4], 0), false)
            .unwrap();
        group
            .put_on_store(vec![1, 2], record(&[1, 2], 0), false)
            .unwrap();
        group
            .put_on_store(vec![2, 1], record(&[2, 1], 0), false)
            .unwrap();

        let keys = |holders: Vec<Arc<Holder<Record>>>| -> Vec<Vec<u32>> {
            holders.iter().map(|h| h.key().clone()).collect()
        };
        assert_eq!(
            keys(group.get_all(&vec![1], false)),
            vec![vec![1, 2], vec![1, 4], vec![1, 3]]
        );
        assert_eq!(
            keys(group.get_all(&vec![1], true)),
            vec![vec![1, 2], vec![1, 4]]
        );
    }

    #[test]
    fn switch_store_rejects_uncached_holder() {
        let (group, _clock) = group();
        let orphan = Holder::new(vec![9], Some(record(&[9], 0)));
        let err = group
            .inner
            .write()
            .switch_store(&orphan, true)
            .unwrap_err();
        assert!(err.message().contains("uncached"));
    }

    #[test]
    fn invalidate_drops_from_either_tier() {
        let (group, _clock) = group();
        let m = group
            .put_on_store(vec![1], record(&[1], 0), false)
            .unwrap();
        let t = group.put_on_store(vec![2], record(&[2], 0), true).unwrap();

        assert!(Arc::ptr_eq(&group.invalidate(&vec![1]).unwrap(), &m));
        assert!(Arc::ptr_eq(&group.invalidate(&vec![2]).unwrap(), &t));
        assert!(group.invalidate(&vec![3]).is_none());
        assert!(!m.is_cached());
        assert!(!t.is_cached());
        assert!(group.is_empty());
    }

    #[test]
    fn clear_uncaches_everything() {
        let (group, _clock) = group();
        let m = group
            .put_on_store(vec![1], record(&[1], 0), false)
            .unwrap();
        let t = group.get(&vec![2], true).unwrap();
        group.clear();
        assert!(group.is_empty());
        assert!(!m.is_cached());
        assert!(!t.is_cached());
    }
}
