//! Identity-stable cells for cached values.
//!
//! A [`Holder`] is created once per cached key and handed out as
//! `Arc<Holder<E>>`. Callers that resolve the same live key get the same
//! allocation, so a later `put_on_store` or `put_on_delete` is visible through
//! a holder obtained earlier without another lookup.
//!
//! ```text
//!   caller A ──┐
//!              ├──► Arc<Holder { key, value: Some(v1) → Some(v2), state }>
//!   caller B ──┘                       ▲
//!                                      └── put_on_store(v2)
//! ```
//!
//! The state names the single store indexing the holder:
//!
//! ```text
//!   Uncached ──insert──► Manual ◄──switch──► Expiring
//!                          │                    │
//!                          └──remove / expire───┴──► Uncached (terminal)
//! ```
//!
//! A holder with no value is a tombstone: the key is known to be absent from
//! the backing store.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::traits::Entity;

/// Which store, if any, currently indexes a holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HolderState {
    Uncached = 0,
    Manual = 1,
    Expiring = 2,
}

impl HolderState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => HolderState::Manual,
            2 => HolderState::Expiring,
            _ => HolderState::Uncached,
        }
    }
}

/// Mutable, identity-stable cell wrapping one cached value.
pub struct Holder<E: Entity> {
    key: E::Key,
    value: RwLock<Option<Arc<E>>>,
    state: AtomicU8,
}

impl<E: Entity> Holder<E> {
    /// Creates an uncached holder. Stores flip the state on insert.
    pub(crate) fn new(key: E::Key, value: Option<Arc<E>>) -> Arc<Self> {
        Arc::new(Self {
            key,
            value: RwLock::new(value),
            state: AtomicU8::new(HolderState::Uncached as u8),
        })
    }

    pub fn key(&self) -> &E::Key {
        &self.key
    }

    /// Current value; `None` for a tombstone.
    pub fn get(&self) -> Option<Arc<E>> {
        self.value.read().clone()
    }

    pub fn is_tombstone(&self) -> bool {
        self.value.read().is_none()
    }

    pub fn state(&self) -> HolderState {
        HolderState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Returns `true` while some store indexes this holder.
    pub fn is_cached(&self) -> bool {
        self.state() != HolderState::Uncached
    }

    pub(crate) fn set(&self, value: Option<Arc<E>>) {
        *self.value.write() = value;
    }

    pub(crate) fn set_state(&self, state: HolderState) {
        self.state.store(state as u8, Ordering::Release);
    }
}

impl<E: Entity> fmt::Debug for Holder<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Holder")
            .field("key", &self.key)
            .field("state", &self.state())
            .field("tombstone", &self.is_tombstone())
            .finish()
    }
}
