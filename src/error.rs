//! Error types for the entity cache.
//!
//! ## Key Components
//!
//! - [`CacheError`]: Returned by write operations on [`Cache`](crate::cache::Cache)
//!   when a call is rejected before any state is touched.
//! - [`ConfigError`]: Returned when cache configuration parameters are invalid
//!   (e.g. a zero TTL).
//! - [`InvariantError`]: Returned when an internal invariant of a shard is
//!   violated, such as switching the tier of a holder that is no longer cached.
//!
//! ## Example Usage
//!
//! ```
//! use std::time::Duration;
//!
//! use entity_cache::builder::CacheBuilder;
//! use entity_cache::error::ConfigError;
//!
//! let err: ConfigError = CacheBuilder::new(Duration::ZERO).validate().unwrap_err();
//! assert!(err.to_string().contains("ttl"));
//! ```

use std::fmt;

use crate::traits::TypeTag;

// ---------------------------------------------------------------------------
// CacheError
// ---------------------------------------------------------------------------

/// Error returned by cache write operations.
///
/// [`ExpiringOnCanonical`](Self::ExpiringOnCanonical) and
/// [`TypeMismatch`](Self::TypeMismatch) are detected before any shard is
/// locked, so those failures leave the cache exactly as it was.
/// [`Invariant`](Self::Invariant) is raised from inside a locked shard and
/// signals a bug; the holder's value may already have been updated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    /// An expiring write was issued against a canonical cache.
    #[error("canonical cache does not accept expiring entries")]
    ExpiringOnCanonical,

    /// The value's runtime type is not admitted by the cache's element type.
    #[error("type mismatch: cache holds `{expected}`, value is `{actual}`")]
    TypeMismatch { expected: TypeTag, actual: TypeTag },

    /// A shard detected a broken internal invariant.
    #[error(transparent)]
    Invariant(#[from] InvariantError),
}

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal cache invariants are violated.
///
/// Produced by the shard tier-switch when asked to move a holder that is not
/// indexed by either store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when cache configuration parameters are invalid.
///
/// Produced by [`CacheBuilder::try_build`](crate::builder::CacheBuilder::try_build)
/// and [`CacheBuilder::validate`](crate::builder::CacheBuilder::validate).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
