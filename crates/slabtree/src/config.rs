//! Arena sizing and parse limits
//!
//! Every pool is sized once, when its [`Arena`](crate::Arena) is built; there
//! is no resizing afterwards. The presets cover the common deployments:
//!
//! - [`ArenaConfig::default`]: about 5 MiB of string slots and 4096 nodes,
//!   enough for configuration files and agent memory documents.
//! - [`ArenaConfig::low_memory`]: a quarter of the default footprint.
//! - [`ArenaConfig::high_capacity`]: four times the default.
//! - [`ArenaConfig::testing`]: small counts so exhaustion is easy to provoke.

use crate::{
    error::{Error, Result},
    memory::SizeClass,
};
use serde::{Deserialize, Serialize};

/// Slot counts for each arena pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Number of 16-byte string slots
    pub string16_slots: usize,
    /// Number of 256-byte string slots
    pub string256_slots: usize,
    /// Number of 4 KiB string slots
    pub string4096_slots: usize,
    /// Number of 64 KiB string slots
    pub string65536_slots: usize,
    /// Number of 1 MiB string slots
    pub string1048576_slots: usize,
    /// Number of tree node slots
    pub node_slots: usize,
}

impl ArenaConfig {
    /// Configuration for memory-constrained hosts
    pub fn low_memory() -> Self {
        Self {
            string16_slots: 16_384,
            string256_slots: 1_024,
            string4096_slots: 64,
            string65536_slots: 4,
            string1048576_slots: 1,
            node_slots: 1_024,
        }
    }

    /// Configuration for large documents
    pub fn high_capacity() -> Self {
        Self {
            string16_slots: 262_144,
            string256_slots: 16_384,
            string4096_slots: 1_024,
            string65536_slots: 64,
            string1048576_slots: 4,
            node_slots: 16_384,
        }
    }

    /// Small pools for tests that need to reach exhaustion quickly
    pub fn testing() -> Self {
        Self {
            string16_slots: 256,
            string256_slots: 64,
            string4096_slots: 8,
            string65536_slots: 2,
            string1048576_slots: 1,
            node_slots: 512,
        }
    }

    /// Slot count configured for a string size class
    pub fn slots_for(&self, class: SizeClass) -> usize {
        match class {
            SizeClass::B16 => self.string16_slots,
            SizeClass::B256 => self.string256_slots,
            SizeClass::B4096 => self.string4096_slots,
            SizeClass::B65536 => self.string65536_slots,
            SizeClass::B1048576 => self.string1048576_slots,
        }
    }

    /// Total bytes preallocated for string slots
    pub fn string_bytes(&self) -> usize {
        SizeClass::ALL
            .iter()
            .map(|class| class.capacity() * self.slots_for(*class))
            .sum()
    }

    /// Check that every pool has at least one slot
    pub fn validate(&self) -> Result<()> {
        for class in SizeClass::ALL {
            if self.slots_for(class) == 0 {
                return Err(Error::config(format!(
                    "{} pool must have at least one slot",
                    crate::memory::PoolKind::String(class)
                )));
            }
        }
        if self.node_slots == 0 {
            return Err(Error::config("node pool must have at least one slot"));
        }
        if self.node_slots > u32::MAX as usize {
            return Err(Error::config(format!(
                "node pool size {} exceeds maximum {}",
                self.node_slots,
                u32::MAX
            )));
        }
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            string16_slots: 65_536,
            string256_slots: 4_096,
            string4096_slots: 256,
            string65536_slots: 16,
            string1048576_slots: 1,
            node_slots: 4_096,
        }
    }
}

/// Nesting limits for parsing, serialization and path assignment
///
/// The writers apply the same limit the parsers do, so a tree that parses
/// under a given limit also serializes under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseLimits {
    /// Maximum container/element nesting depth
    pub max_depth: usize,
}

impl ParseLimits {
    /// Tight limits for input from unknown sources
    pub fn strict() -> Self {
        Self { max_depth: 16 }
    }

    /// Loose limits for trusted, deeply structured documents
    pub fn permissive() -> Self {
        Self { max_depth: 512 }
    }
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self { max_depth: 64 }
    }
}

/// Arena sizing and parse limits bundled together
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Pool sizes
    pub arena: ArenaConfig,
    /// Parser limits
    pub limits: ParseLimits,
}

impl TreeConfig {
    /// Low-memory preset with strict parse limits
    pub fn low_memory() -> Self {
        Self {
            arena: ArenaConfig::low_memory(),
            limits: ParseLimits::strict(),
        }
    }

    /// Large pools with permissive parse limits
    pub fn high_capacity() -> Self {
        Self {
            arena: ArenaConfig::high_capacity(),
            limits: ParseLimits::permissive(),
        }
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.arena.validate()?;
        if self.limits.max_depth == 0 {
            return Err(Error::config("max_depth must be at least 1"));
        }
        Ok(())
    }
}
