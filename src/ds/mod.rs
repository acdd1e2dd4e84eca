pub mod shard;
pub mod slot_arena;
pub mod ttl_engine;

pub use shard::ShardSelector;
pub use slot_arena::{SlotArena, SlotId};
pub use ttl_engine::{NodeHandle, TtlEngine};
