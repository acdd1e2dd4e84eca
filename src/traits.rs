//! # Cacheable Type Contracts
//!
//! Every value stored in a [`Cache`](crate::cache::Cache) is an [`Entity`]
//! identified by a [`Key`]. The cache never inspects values beyond these two
//! traits.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────┐
//!   │ Entity                                   │
//!   │                                          │
//!   │   type Key: Key                          │
//!   │   const TYPE_TAG: TypeTag                │
//!   │   key(&) → Self::Key                     │
//!   │   type_tag(&) → TypeTag                  │
//!   └──────────────────┬───────────────────────┘
//!                      │ key()
//!                      ▼
//!   ┌──────────────────────────────────────────┐
//!   │ Key: Ord + Clone                         │
//!   │                                          │
//!   │   is_prefix_of(&, &Self) → bool          │
//!   │   group_code(&) → Option<u32>            │
//!   └──────────────────────────────────────────┘
//! ```
//!
//! ## Key Ordering Contract
//!
//! Range scans locate the first key `>= prefix` and consume entries while
//! `prefix.is_prefix_of(key)` holds, stopping at the first mismatch. This is
//! only correct if:
//!
//! 1. every key prefixed by `p` sorts at or after `p`, and
//! 2. all keys prefixed by `p` are contiguous in key order.
//!
//! Lexicographic orders over segments (strings, `Vec<u32>`, tuples compared
//! field by field with shorter-is-smaller) satisfy both.
//!
//! ```text
//!   "a" < "a_b" < "a_c" < "b"          [1] < [1,2] < [1,3] < [2]
//!    └── prefix "a" ──┘                 └── prefix [1] ──┘
//! ```
//!
//! ## Shard Codes
//!
//! `group_code` picks the shard (`code % SHARD_COUNT`). Returning `None`
//! opts the key out of caching entirely: every cache operation on it is a
//! no-op that reports a miss.

use std::fmt;

/// Identifier contract for cacheable entities.
///
/// See the [module docs](self) for the ordering contract that `Ord` and
/// [`is_prefix_of`](Key::is_prefix_of) must jointly satisfy.
pub trait Key: Ord + Clone + fmt::Debug + Send + Sync + 'static {
    /// Returns `true` if `self` is a prefix of `other` (a key is a prefix of
    /// itself).
    fn is_prefix_of(&self, other: &Self) -> bool;

    /// Shard hint, or `None` if the key must never be cached.
    fn group_code(&self) -> Option<u32>;
}

impl Key for String {
    fn is_prefix_of(&self, other: &Self) -> bool {
        other.starts_with(self.as_str())
    }

    fn group_code(&self) -> Option<u32> {
        Some(self.bytes().next().map_or(0, u32::from))
    }
}

impl Key for Vec<u32> {
    fn is_prefix_of(&self, other: &Self) -> bool {
        other.starts_with(self)
    }

    fn group_code(&self) -> Option<u32> {
        Some(self.first().copied().unwrap_or(0))
    }
}

/// Runtime type tag for values sharing one cache.
///
/// A cache configured for tag `T` admits values tagged exactly `T` and values
/// whose tag was [`derived`](TypeTag::derived) directly from `T`. Tags are
/// compared by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeTag {
    name: &'static str,
    base: Option<&'static str>,
}

impl TypeTag {
    /// Creates a root tag.
    pub const fn new(name: &'static str) -> Self {
        Self { name, base: None }
    }

    /// Creates a tag for a type generated directly from `base`.
    pub const fn derived(name: &'static str, base: TypeTag) -> Self {
        Self {
            name,
            base: Some(base.name),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn base(&self) -> Option<&'static str> {
        self.base
    }

    /// Returns `true` if a cache of type `self` may hold a value tagged `other`.
    pub fn admits(&self, other: &TypeTag) -> bool {
        other == self || other.base == Some(self.name)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A cacheable record.
///
/// `TYPE_TAG` is the declared type a [`Cache`](crate::cache::Cache) is
/// configured with; [`type_tag`](Entity::type_tag) reports the runtime type of
/// a particular instance and defaults to `TYPE_TAG`. Implementations that
/// carry generated subtypes in one Rust type override it.
pub trait Entity: Send + Sync + 'static {
    type Key: Key;

    const TYPE_TAG: TypeTag;

    /// Derives this value's key.
    fn key(&self) -> Self::Key;

    fn type_tag(&self) -> TypeTag {
        Self::TYPE_TAG
    }
}
