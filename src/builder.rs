//! Cache configuration and construction.
//!
//! [`CacheConfig`] carries the two knobs a cache has: the TTL of its expiring
//! tier and whether it is canonical. [`CacheBuilder`] validates a config and
//! produces a [`Cache`] for a given entity type, optionally with an injected
//! [`Clock`].
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use entity_cache::builder::CacheBuilder;
//! use entity_cache::traits::{Entity, TypeTag};
//!
//! struct Note {
//!     id: String,
//! }
//!
//! impl Entity for Note {
//!     type Key = String;
//!     const TYPE_TAG: TypeTag = TypeTag::new("Note");
//!
//!     fn key(&self) -> String {
//!         self.id.clone()
//!     }
//! }
//!
//! let cache = CacheBuilder::new(Duration::from_secs(60))
//!     .try_build::<Note>()
//!     .unwrap();
//! assert!(!cache.is_canonical());
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::cache::Cache;
use crate::clock::{Clock, SystemClock};
use crate::error::ConfigError;
use crate::traits::Entity;

/// Settings shared by every group of one cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CacheConfig {
    /// Lifetime of an untouched expiring entry. Tombstones use it even in
    /// canonical caches.
    pub ttl: Duration,
    /// Canonical caches hold permanent entries only and never age their
    /// prefix certifications.
    #[cfg_attr(feature = "serde", serde(default))]
    pub canonical: bool,
}

impl CacheConfig {
    pub fn new(ttl: Duration, canonical: bool) -> Self {
        Self { ttl, canonical }
    }

    /// # Errors
    ///
    /// Returns [`ConfigError`] if the TTL is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ttl.is_zero() {
            return Err(ConfigError::new("cache ttl must be greater than zero"));
        }
        Ok(())
    }
}

/// Builder for [`Cache`] instances.
#[derive(Debug, Clone)]
pub struct CacheBuilder {
    config: CacheConfig,
    clock: Arc<dyn Clock>,
}

impl CacheBuilder {
    /// Starts a non-canonical cache with the given TTL on the system clock.
    pub fn new(ttl: Duration) -> Self {
        Self::from_config(CacheConfig::new(ttl, false))
    }

    pub fn from_config(config: CacheConfig) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn canonical(mut self, canonical: bool) -> Self {
        self.config.canonical = canonical;
        self
    }

    /// Replaces the time source used for every TTL decision.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// # Errors
    ///
    /// See [`CacheConfig::validate`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.config.validate()
    }

    /// Builds the cache.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid. For a non-panicking
    /// alternative, use [`try_build`](Self::try_build).
    pub fn build<E: Entity>(self) -> Cache<E> {
        match self.try_build() {
            Ok(cache) => cache,
            Err(e) => panic!("{}", e),
        }
    }

    /// Builds the cache, returning an error on invalid configuration instead
    /// of panicking.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the TTL is zero.
    pub fn try_build<E: Entity>(self) -> Result<Cache<E>, ConfigError> {
        self.config.validate()?;
        Ok(Cache::from_config(&self.config, self.clock))
    }
}

impl<E: Entity> Cache<E> {
    /// Shorthand for [`CacheBuilder::new`].
    pub fn builder(ttl: Duration) -> CacheBuilder {
        CacheBuilder::new(ttl)
    }
}
