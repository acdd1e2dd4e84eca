//! Per-unit-of-work copies of cached entities.
//!
//! A caller that must see one stable version of an entity for the duration of
//! some task keeps it in a [`LocalCopies`] implementation and reads through
//! [`Cache::read`](crate::cache::Cache::read). The first read pins whatever the
//! shared holder carries at that moment; later reads in the same unit of work
//! return the pinned copy even if another writer has since replaced it.
//!
//! How a unit of work is scoped (thread, task, request) is up to the caller.

use std::hash::Hash;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::traits::Entity;

/// Storage for local copies, keyed by entity key.
pub trait LocalCopies<E: Entity> {
    fn get_local_copy(&self, key: &E::Key) -> Option<Arc<E>>;

    /// Pins `value` under its own key, replacing any earlier copy.
    fn put_local_copy(&mut self, value: Arc<E>);
}

/// Hash map of local copies for one unit of work.
pub struct LocalCopyMap<E: Entity>
where
    E::Key: Hash,
{
    copies: FxHashMap<E::Key, Arc<E>>,
}

impl<E: Entity> LocalCopyMap<E>
where
    E::Key: Hash,
{
    pub fn new() -> Self {
        Self {
            copies: FxHashMap::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.copies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.copies.is_empty()
    }

    /// Forgets the copy for `key`, so the next read goes back to the cache.
    pub fn discard(&mut self, key: &E::Key) -> Option<Arc<E>> {
        self.copies.remove(key)
    }

    pub fn clear(&mut self) {
        self.copies.clear();
    }
}

impl<E: Entity> LocalCopies<E> for LocalCopyMap<E>
where
    E::Key: Hash,
{
    fn get_local_copy(&self, key: &E::Key) -> Option<Arc<E>> {
        self.copies.get(key).cloned()
    }

    fn put_local_copy(&mut self, value: Arc<E>) {
        self.copies.insert(value.key(), value);
    }
}

impl<E: Entity> Default for LocalCopyMap<E>
where
    E::Key: Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> std::fmt::Debug for LocalCopyMap<E>
where
    E::Key: Hash,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalCopyMap")
            .field("len", &self.copies.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Record;

    #[test]
    fn put_then_get_by_entity_key() {
        let mut local = LocalCopyMap::<Record>::new();
        let value = Arc::new(Record::new(&[1, 2], 5));
        local.put_local_copy(Arc::clone(&value));

        assert!(Arc::ptr_eq(&local.get_local_copy(&vec![1, 2]).unwrap(), &value));
        assert!(local.get_local_copy(&vec![1, 3]).is_none());
        assert_eq!(local.len(), 1);
    }

    #[test]
    fn later_copy_replaces_earlier() {
        let mut local = LocalCopyMap::<Record>::new();
        local.put_local_copy(Arc::new(Record::new(&[1], 1)));
        local.put_local_copy(Arc::new(Record::new(&[1], 2)));
        assert_eq!(local.get_local_copy(&vec![1]).unwrap().payload, 2);
        assert_eq!(local.len(), 1);
    }

    #[test]
    fn discard_and_clear() {
        let mut local = LocalCopyMap::<Record>::new();
        local.put_local_copy(Arc::new(Record::new(&[1], 1)));
        local.put_local_copy(Arc::new(Record::new(&[2], 2)));

        assert_eq!(local.discard(&vec![1]).unwrap().payload, 1);
        assert!(local.discard(&vec![1]).is_none());
        local.clear();
        assert!(local.is_empty());
    }
}
