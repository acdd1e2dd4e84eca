//! entity-cache: sharded in-process cache for keyed entities with permanent
//! and expiring tiers, tombstones, and prefix-complete range scans.
//!
//! See `DESIGN.md` for internal architecture and invariants.

pub mod builder;
pub mod cache;
pub mod clock;
pub mod ds;
pub mod error;
pub mod group;
pub mod holder;
pub mod local;

#[cfg(feature = "metrics")]
pub mod metrics;

pub mod prefix;
pub mod prelude;
pub mod store;
pub mod traits;

#[cfg(test)]
mod test_support;
