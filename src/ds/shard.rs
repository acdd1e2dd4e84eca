//! Shard routing from key-supplied group codes.
//!
//! Keys pick their own shard through [`Key::group_code`](crate::traits::Key::group_code);
//! the selector only folds that code into `[0, shards)`. Routing is a pure
//! function of the key, so one logical operation never needs more than one
//! shard lock.
//!
//! ```text
//!   group_code()      ShardSelector { shards: 4 }
//!   ────────────      ────────────────────────────
//!   Some(0)      ──►  0
//!   Some(6)      ──►  2          (6 % 4)
//!   None         ──►  not routed (never cached)
//! ```
//!
//! ## Example Usage
//!
//! ```
//! use entity_cache::ds::ShardSelector;
//!
//! let selector = ShardSelector::new(4);
//! assert_eq!(selector.shard_for_code(Some(6)), Some(2));
//! assert_eq!(selector.shard_for_code(None), None);
//! ```

use crate::traits::Key;

/// Maps group codes onto a fixed number of shards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardSelector {
    shards: usize,
}

impl ShardSelector {
    /// Creates a selector for `shards` shards; zero is clamped to one.
    pub fn new(shards: usize) -> Self {
        Self {
            shards: shards.max(1),
        }
    }

    pub fn shard_count(&self) -> usize {
        self.shards
    }

    /// Folds a group code into a shard index; `None` stays unrouted.
    pub fn shard_for_code(&self, code: Option<u32>) -> Option<usize> {
        code.map(|code| code as usize % self.shards)
    }

    /// Shard index for `key`, or `None` if the key opts out of caching.
    pub fn shard_for_key<K: Key>(&self, key: &K) -> Option<usize> {
        self.shard_for_code(key.group_code())
    }
}

impl Default for ShardSelector {
    fn default() -> Self {
        Self::new(1)
    }
}
