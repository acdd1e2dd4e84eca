//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use entity_cache::builder::CacheBuilder;
use entity_cache::cache::Cache;
use entity_cache::clock::ManualClock;
use entity_cache::traits::{Entity, Key, TypeTag};

pub const ACCOUNT: TypeTag = TypeTag::new("Account");
pub const ACCOUNT_ENTITY: TypeTag = TypeTag::derived("AccountEntity", ACCOUNT);
pub const LEDGER: TypeTag = TypeTag::new("Ledger");

/// Two-part key where only the first `significant` parts take part in
/// ordering and prefix tests. `(1, _, 1)` is the prefix of every `(1, x)`.
#[derive(Debug, Clone, Copy)]
pub struct AccountKey {
    region: i32,
    number: i32,
    significant: u8,
}

impl AccountKey {
    pub fn new(region: i32, number: i32) -> Self {
        Self {
            region,
            number,
            significant: 2,
        }
    }

    pub fn all() -> Self {
        Self {
            region: 0,
            number: 0,
            significant: 0,
        }
    }

    pub fn region(region: i32) -> Self {
        Self {
            region,
            number: 0,
            significant: 1,
        }
    }

    fn field(&self, index: u8) -> i32 {
        match index {
            0 => self.region,
            _ => self.number,
        }
    }
}

impl PartialEq for AccountKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for AccountKey {}

impl Hash for AccountKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.significant.hash(state);
        for i in 0..self.significant {
            self.field(i).hash(state);
        }
    }
}

impl PartialOrd for AccountKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AccountKey {
    fn cmp(&self, other: &Self) -> Ordering {
        let shared = self.significant.min(other.significant);
        (0..shared)
            .map(|i| self.field(i).cmp(&other.field(i)))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| self.significant.cmp(&other.significant))
    }
}

impl Key for AccountKey {
    fn is_prefix_of(&self, other: &Self) -> bool {
        self.significant <= other.significant
            && (0..self.significant).all(|i| self.field(i) == other.field(i))
    }

    /// Negative regions are never cached.
    fn group_code(&self) -> Option<u32> {
        u32::try_from(self.region).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub key: AccountKey,
    pub balance: i64,
    pub tag: TypeTag,
}

impl Account {
    pub fn new(region: i32, number: i32, balance: i64) -> Self {
        Self {
            key: AccountKey::new(region, number),
            balance,
            tag: ACCOUNT,
        }
    }

    pub fn tagged(mut self, tag: TypeTag) -> Self {
        self.tag = tag;
        self
    }
}

impl Entity for Account {
    type Key = AccountKey;

    const TYPE_TAG: TypeTag = ACCOUNT;

    fn key(&self) -> AccountKey {
        self.key
    }

    fn type_tag(&self) -> TypeTag {
        self.tag
    }
}

pub const TTL: Duration = Duration::from_millis(1000);

pub fn cache(canonical: bool) -> (Arc<Cache<Account>>, ManualClock) {
    let clock = ManualClock::new();
    let cache = CacheBuilder::new(TTL)
        .canonical(canonical)
        .clock(Arc::new(clock.clone()))
        .build();
    (Arc::new(cache), clock)
}
