//! Recency ring with bulk time-based eviction.
//!
//! Stores nodes in a [`SlotArena`] and links them into a circular doubly
//! linked ring by [`SlotId`]. The head is the most recently touched node and
//! `head.prev` is the least recently touched one, so a sweep walks backwards
//! from the tail and stops at the first node that is still fresh.
//!
//! ## Architecture
//!
//! ```text
//!   arena (SlotArena<Node<V>>)
//!   ┌────────┬──────────────────────────────────────────────────┐
//!   │ SlotId │ Node { value, touched, prev, next }              │
//!   ├────────┼──────────────────────────────────────────────────┤
//!   │ id_1   │ { value: A, touched: t3, prev: id_3, next: id_2 }│
//!   │ id_2   │ { value: B, touched: t2, prev: id_1, next: id_3 }│
//!   │ id_3   │ { value: C, touched: t1, prev: id_2, next: id_1 }│
//!   └────────┴──────────────────────────────────────────────────┘
//!
//!          ┌──────────────────────────────────────┐
//!          ▼                                      │
//!   head ─► [A t3] ◄──► [B t2] ◄──► [C t1] ◄── tail (= head.prev)
//!                                              ▲
//!                          expire() starts here, walks toward head
//! ```
//!
//! ## Handles
//!
//! [`NodeHandle`] pairs the engine's id with a generational slot id. A handle
//! is *expired* once its node has been removed or swept: the slot's generation
//! moves on and the handle no longer resolves. Handles minted by a different
//! engine never resolve either, so `touch` and `remove` on them are no-ops.
//!
//! ## Operations
//! - `add(value)`: stamp now, link at head
//! - `touch(handle)`: restamp, move to head
//! - `remove(handle)`: unlink + free slot
//! - `expire(f)`: unlink + free every node older than the TTL, oldest first
//!
//! ## Performance
//! - `add` / `touch` / `remove`: O(1)
//! - `expire`: O(k) in the number of expired nodes
//!
//! Sweeps are never scheduled; owners call `expire` on the access paths that
//! already hold their lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::clock::{Clock, SystemClock};
use crate::ds::slot_arena::{SlotArena, SlotId};

static NEXT_ENGINE_ID: AtomicU64 = AtomicU64::new(1);

/// Stable reference to a node in one [`TtlEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle {
    engine: u64,
    slot: SlotId,
}

#[derive(Debug)]
struct Node<V> {
    value: V,
    touched: Instant,
    prev: Option<SlotId>,
    next: Option<SlotId>,
}

/// Arena-backed recency ring that evicts nodes untouched for longer than `ttl`.
#[derive(Debug)]
pub struct TtlEngine<V> {
    id: u64,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    arena: SlotArena<Node<V>>,
    head: Option<SlotId>,
}

impl<V> TtlEngine<V> {
    /// Creates an empty engine driven by the system clock.
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// Creates an empty engine driven by `clock`.
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            id: NEXT_ENGINE_ID.fetch_add(1, Ordering::Relaxed),
            ttl,
            clock,
            arena: SlotArena::new(),
            head: None,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the number of linked nodes.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Wraps `value` in a fresh node at the head of the ring.
    pub fn add(&mut self, value: V) -> NodeHandle {
        let touched = self.clock.now();
        let slot = self.arena.insert(Node {
            value,
            touched,
            prev: None,
            next: None,
        });
        self.link_front(slot);
        NodeHandle {
            engine: self.id,
            slot,
        }
    }

    /// Returns the payload of a live node.
    pub fn get(&self, handle: NodeHandle) -> Option<&V> {
        if handle.engine != self.id {
            return None;
        }
        self.arena.get(handle.slot).map(|node| &node.value)
    }

    /// Returns `true` once `handle` no longer refers to a node in this ring.
    pub fn is_expired(&self, handle: NodeHandle) -> bool {
        !self.owns(handle)
    }

    /// Restamps the node and moves it to the head; `false` if not owned here.
    pub fn touch(&mut self, handle: NodeHandle) -> bool {
        if !self.owns(handle) {
            return false;
        }
        let now = self.clock.now();
        if let Some(node) = self.arena.get_mut(handle.slot) {
            node.touched = now;
        }
        if self.head != Some(handle.slot) {
            self.unlink(handle.slot);
            self.link_front(handle.slot);
        }
        true
    }

    /// Unlinks the node and returns its payload; `None` if not owned here.
    pub fn remove(&mut self, handle: NodeHandle) -> Option<V> {
        if !self.owns(handle) {
            return None;
        }
        self.unlink(handle.slot)?;
        self.arena.remove(handle.slot).map(|node| node.value)
    }

    /// Evicts every node whose age exceeds the TTL, oldest first, handing each
    /// payload to `on_expire`. Returns the number of evicted nodes.
    pub fn expire<F>(&mut self, mut on_expire: F) -> usize
    where
        F: FnMut(V),
    {
        let now = self.clock.now();
        let mut expired = 0;
        while let Some(tail) = self.tail() {
            let stale = self
                .arena
                .get(tail)
                .is_some_and(|node| now.saturating_duration_since(node.touched) > self.ttl);
            if !stale {
                break;
            }
            self.unlink(tail);
            if let Some(node) = self.arena.remove(tail) {
                on_expire(node.value);
                expired += 1;
            }
        }
        expired
    }

    /// Drops every node. Outstanding handles become expired.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.head = None;
    }

    /// Iterates payloads from most to least recently touched.
    pub fn iter(&self) -> TtlEngineIter<'_, V> {
        TtlEngineIter {
            engine: self,
            current: self.head,
            remaining: self.len(),
        }
    }

    fn owns(&self, handle: NodeHandle) -> bool {
        handle.engine == self.id && self.arena.contains(handle.slot)
    }

    fn tail(&self) -> Option<SlotId> {
        let head = self.head?;
        self.arena.get(head)?.prev
    }

    fn link_front(&mut self, id: SlotId) -> Option<()> {
        match self.head {
            None => {
                let node = self.arena.get_mut(id)?;
                node.prev = Some(id);
                node.next = Some(id);
            },
            Some(head) => {
                let tail = self.arena.get(head)?.prev?;
                {
                    let node = self.arena.get_mut(id)?;
                    node.prev = Some(tail);
                    node.next = Some(head);
                }
                self.arena.get_mut(tail)?.next = Some(id);
                self.arena.get_mut(head)?.prev = Some(id);
            },
        }
        self.head = Some(id);
        Some(())
    }

    fn unlink(&mut self, id: SlotId) -> Option<()> {
        let (prev, next) = {
            let node = self.arena.get(id)?;
            (node.prev?, node.next?)
        };

        if next == id {
            self.head = None;
        } else {
            self.arena.get_mut(prev)?.next = Some(next);
            self.arena.get_mut(next)?.prev = Some(prev);
            if self.head == Some(id) {
                self.head = Some(next);
            }
        }

        let node = self.arena.get_mut(id)?;
        node.prev = None;
        node.next = None;
        Some(())
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        let Some(head) = self.head else {
            assert_eq!(self.len(), 0);
            return;
        };

        let mut seen = std::collections::HashSet::new();
        let mut current = head;
        let mut previous_touch: Option<Instant> = None;
        loop {
            assert!(seen.insert(current), "ring revisits a node");
            let node = self.arena.get(current).expect("linked node missing");
            let next = node.next.expect("linked node without next");
            let next_node = self.arena.get(next).expect("next node missing");
            assert_eq!(next_node.prev, Some(current));
            if let Some(newer) = previous_touch {
                assert!(node.touched <= newer, "ring not ordered by recency");
            }
            previous_touch = Some(node.touched);
            current = next;
            if current == head {
                break;
            }
        }
        assert_eq!(seen.len(), self.len());
    }
}

/// Iterator over payloads from head (newest) to tail (oldest).
pub struct TtlEngineIter<'a, V> {
    engine: &'a TtlEngine<V>,
    current: Option<SlotId>,
    remaining: usize,
}

impl<'a, V> Iterator for TtlEngineIter<'a, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.current?;
        let node = self.engine.arena.get(id)?;
        self.current = node.next;
        self.remaining -= 1;
        Some(&node.value)
    }
}
