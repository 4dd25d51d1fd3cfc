//! Fixed-capacity slab arena
//!
//! All string and node storage is checked out of preallocated pools and
//! returned when the owning handle is dropped.

pub mod arena;
pub mod slab_string;

pub use arena::{
    Arena, ArenaStats, ClassStats, NodeSlot, PoolKind, SizeClass, global_arena,
    initialize_global_arena,
};
pub use slab_string::SlabString;
