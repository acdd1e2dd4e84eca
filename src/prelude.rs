pub use crate::builder::{CacheBuilder, CacheConfig};
pub use crate::cache::{Cache, SHARD_COUNT};
pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::error::{CacheError, ConfigError, InvariantError};
pub use crate::holder::{Holder, HolderState};
pub use crate::local::{LocalCopies, LocalCopyMap};
#[cfg(feature = "metrics")]
pub use crate::metrics::snapshot::CacheMetricsSnapshot;
pub use crate::traits::{Entity, Key, TypeTag};
