//! Per-shard holder stores.
//!
//! - [`ManualStore`]: permanent tier.
//! - [`TtlStore`]: expiring tier backed by a [`TtlEngine`](crate::ds::TtlEngine).

pub mod manual;
pub mod traits;
pub mod ttl;

pub use manual::ManualStore;
pub use traits::HolderStore;
pub use ttl::TtlStore;
