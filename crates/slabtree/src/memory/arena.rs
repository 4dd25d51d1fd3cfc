//! Size-classed slab pools backed by free-list stacks
//!
//! Each pool owns a fixed number of slots allocated once, when the arena is
//! built. Checking out pops a slot from the pool's free list; dropping the
//! owning handle ([`SlabString`] or [`NodeSlot`]) pushes it back. An empty free
//! list is reported as [`Error::Exhausted`]; pools never grow and a request is
//! never served from a larger class than the one it maps to.

use crate::{
    config::ArenaConfig,
    error::{Error, Result},
    memory::SlabString,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    sync::{Arc, OnceLock},
};
use tracing::{debug, error, warn};

/// String slot capacities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SizeClass {
    /// Short keys and scalar values (16 B)
    B16 = 16,
    /// Typical strings (256 B)
    B256 = 256,
    /// Paragraph-sized text (4 KiB)
    B4096 = 4096,
    /// Serialized documents (64 KiB)
    B65536 = 65536,
    /// Large serialized documents (1 MiB)
    B1048576 = 1048576,
}

impl SizeClass {
    /// All classes, smallest first
    pub const ALL: [SizeClass; 5] = [
        SizeClass::B16,
        SizeClass::B256,
        SizeClass::B4096,
        SizeClass::B65536,
        SizeClass::B1048576,
    ];

    /// The class with the biggest slots
    pub const LARGEST: SizeClass = SizeClass::B1048576;

    /// Slot capacity in bytes
    pub const fn capacity(self) -> usize {
        self as usize
    }

    /// Smallest class whose slots hold `capacity` bytes
    pub fn for_capacity(capacity: usize) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|class| capacity <= class.capacity())
    }

    const fn index(self) -> usize {
        match self {
            SizeClass::B16 => 0,
            SizeClass::B256 => 1,
            SizeClass::B4096 => 2,
            SizeClass::B65536 => 3,
            SizeClass::B1048576 => 4,
        }
    }
}

/// Identifies one pool of an arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolKind {
    /// String slots of one size class
    String(SizeClass),
    /// Tree node slots
    Node,
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolKind::String(class) => write!(f, "string{}", class.capacity()),
            PoolKind::Node => f.write_str("node"),
        }
    }
}

struct Pool<S> {
    kind: PoolKind,
    total: usize,
    state: Mutex<PoolState<S>>,
}

struct PoolState<S> {
    free: Vec<S>,
    peak_in_use: usize,
    exhausted: u64,
}

impl<S> Pool<S> {
    fn new(kind: PoolKind, slots: Vec<S>) -> Self {
        let total = slots.len();
        Self {
            kind,
            total,
            state: Mutex::new(PoolState {
                free: slots,
                peak_in_use: 0,
                exhausted: 0,
            }),
        }
    }

    fn checkout(&self) -> Result<S> {
        let mut state = self.state.lock();
        if let Some(slot) = state.free.pop() {
            let in_use = self.total - state.free.len();
            state.peak_in_use = state.peak_in_use.max(in_use);
            return Ok(slot);
        }
        state.exhausted += 1;
        drop(state);

        warn!(pool = %self.kind, slots = self.total, "arena pool exhausted");
        Err(Error::Exhausted { pool: self.kind })
    }

    fn give_back(&self, slot: S) {
        let mut state = self.state.lock();
        if state.free.len() >= self.total {
            drop(state);
            error!(pool = %self.kind, "free list overflow, slot discarded");
            return;
        }
        state.free.push(slot);
    }

    fn free_count(&self) -> usize {
        self.state.lock().free.len()
    }

    fn stats(&self) -> ClassStats {
        let state = self.state.lock();
        ClassStats {
            pool: self.kind,
            total_slots: self.total,
            free_slots: state.free.len(),
            in_use: self.total - state.free.len(),
            peak_in_use: state.peak_in_use,
            exhausted_count: state.exhausted,
        }
    }
}

struct ArenaInner {
    config: ArenaConfig,
    strings: [Pool<Box<[u8]>>; 5],
    nodes: Pool<u32>,
}

/// Shared handle to a set of preallocated pools
///
/// Cloning is cheap and yields a handle to the same pools. Every pool is
/// guarded by its own mutex, so an arena can be shared between threads even
/// though each tree is owned and mutated by one thread at a time.
#[derive(Clone)]
pub struct Arena {
    inner: Arc<ArenaInner>,
}

impl Arena {
    /// Build an arena, preallocating every slot described by `config`
    pub fn new(config: ArenaConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: ArenaConfig) -> Self {
        let strings = SizeClass::ALL.map(|class| {
            let slots = (0..config.slots_for(class))
                .map(|_| vec![0u8; class.capacity()].into_boxed_slice())
                .collect();
            Pool::new(PoolKind::String(class), slots)
        });
        // Reversed so the first checkout hands out slot 0
        let nodes = Pool::new(PoolKind::Node, (0..config.node_slots as u32).rev().collect());

        debug!(
            string_bytes = config.string_bytes(),
            string16 = config.string16_slots,
            string256 = config.string256_slots,
            string4096 = config.string4096_slots,
            string65536 = config.string65536_slots,
            string1048576 = config.string1048576_slots,
            nodes = config.node_slots,
            "arena initialized"
        );

        Self {
            inner: Arc::new(ArenaInner {
                config,
                strings,
                nodes,
            }),
        }
    }

    /// Configuration this arena was built with
    pub fn config(&self) -> &ArenaConfig {
        &self.inner.config
    }

    /// Check out an empty string buffer able to hold `capacity` bytes
    pub fn alloc_string(&self, capacity: usize) -> Result<SlabString> {
        let class = SizeClass::for_capacity(capacity).ok_or(Error::CapacityTooLarge {
            requested: capacity,
            max: SizeClass::LARGEST.capacity(),
        })?;
        let buf = self.checkout_string_slot(class)?;
        Ok(SlabString::from_slot(self.clone(), class, buf))
    }

    /// Check out a string buffer holding a copy of `text`
    pub fn string_from(&self, text: &str) -> Result<SlabString> {
        let mut string = self.alloc_string(text.len())?;
        string.push_str(text)?;
        Ok(string)
    }

    /// Check out one node slot
    pub fn checkout_node(&self) -> Result<NodeSlot> {
        let id = self.inner.nodes.checkout()?;
        Ok(NodeSlot {
            arena: self.clone(),
            id,
        })
    }

    /// Number of slots currently on a pool's free list
    pub fn free_count(&self, pool: PoolKind) -> usize {
        match pool {
            PoolKind::String(class) => self.string_pool(class).free_count(),
            PoolKind::Node => self.inner.nodes.free_count(),
        }
    }

    /// Number of slots a pool was built with
    pub fn total_slots(&self, pool: PoolKind) -> usize {
        match pool {
            PoolKind::String(class) => self.string_pool(class).total,
            PoolKind::Node => self.inner.nodes.total,
        }
    }

    /// Snapshot of every pool's usage
    pub fn stats(&self) -> ArenaStats {
        let mut pools: Vec<ClassStats> = self
            .inner
            .strings
            .iter()
            .map(|pool| pool.stats())
            .collect();
        pools.push(self.inner.nodes.stats());
        ArenaStats { pools }
    }

    /// Whether both handles refer to the same pools
    pub fn same_arena(&self, other: &Arena) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn checkout_string_slot(&self, class: SizeClass) -> Result<Box<[u8]>> {
        self.string_pool(class).checkout()
    }

    pub(crate) fn release_string(&self, class: SizeClass, buf: Box<[u8]>) {
        self.string_pool(class).give_back(buf);
    }

    fn string_pool(&self, class: SizeClass) -> &Pool<Box<[u8]>> {
        &self.inner.strings[class.index()]
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

/// A checked-out node slot
///
/// Only [`Arena::checkout_node`] creates one and only dropping it returns the
/// slot, so a slot can never be handed back twice.
pub struct NodeSlot {
    arena: Arena,
    id: u32,
}

impl NodeSlot {
    /// Index of the slot inside its pool
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Arena the slot belongs to
    pub fn arena(&self) -> &Arena {
        &self.arena
    }
}

impl Drop for NodeSlot {
    fn drop(&mut self) {
        self.arena.inner.nodes.give_back(self.id);
    }
}

impl fmt::Debug for NodeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodeSlot").field(&self.id).finish()
    }
}

/// Usage counters for one pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassStats {
    /// Which pool
    pub pool: PoolKind,
    /// Slots the pool was built with
    pub total_slots: usize,
    /// Slots on the free list
    pub free_slots: usize,
    /// Slots currently checked out
    pub in_use: usize,
    /// Highest simultaneous checkout count seen
    pub peak_in_use: usize,
    /// Checkouts refused because the free list was empty
    pub exhausted_count: u64,
}

/// Usage counters for every pool of an arena
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArenaStats {
    /// One entry per string class, smallest first, then the node pool
    pub pools: Vec<ClassStats>,
}

impl ArenaStats {
    /// Counters for one pool
    pub fn pool(&self, pool: PoolKind) -> Option<&ClassStats> {
        self.pools.iter().find(|stats| stats.pool == pool)
    }

    /// Slots checked out across all pools
    pub fn total_in_use(&self) -> usize {
        self.pools.iter().map(|stats| stats.in_use).sum()
    }
}

static GLOBAL_ARENA: OnceLock<Arena> = OnceLock::new();

/// Process-wide arena, built with [`ArenaConfig::default`] on first use
pub fn global_arena() -> &'static Arena {
    GLOBAL_ARENA.get_or_init(|| Arena::build(ArenaConfig::default()))
}

/// Install a custom configuration for the process-wide arena
pub fn initialize_global_arena(config: ArenaConfig) -> Result<()> {
    let arena = Arena::new(config)?;
    GLOBAL_ARENA
        .set(arena)
        .map_err(|_| Error::config("global arena already initialized"))
}
