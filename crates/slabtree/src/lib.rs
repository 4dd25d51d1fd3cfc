//! # slabtree
//!
//! Arena-backed value trees with JSON and XML front ends.
//!
//! Every string and node is checked out of a fixed set of preallocated pools
//! (an [`Arena`]) and handed back when its owner is dropped, so memory use is
//! bounded up front and exhaustion shows up as an error instead of an
//! allocation failure. On top of the arena sit:
//!
//! - [`Node`]: a tree of nulls, raw text leaves, keyed objects and arrays
//! - [`json`]: a lenient JSON parser and a compact serializer
//! - [`xml`]: a parser and serializer for attribute-free XML
//! - [`TreePath`]: `a.b[2].c` navigation with `get` and `set`
//!
//! ```
//! use slabtree::{Arena, ArenaConfig, Node};
//!
//! let arena = Arena::new(ArenaConfig::testing())?;
//! let mut doc = Node::parse_json(&arena, r#"{"agent": {"name": "scout"}}"#)?;
//! doc.set_text("agent.state", "idle")?;
//!
//! assert_eq!(doc.get_text("agent.name")?, "scout");
//! assert_eq!(doc.to_json()?, r#"{"agent":{"name":"scout","state":"idle"}}"#);
//! assert_eq!(
//!     doc.to_xml()?,
//!     "<agent><name>scout</name><state>idle</state></agent>"
//! );
//! # Ok::<(), slabtree::Error>(())
//! ```

#![warn(rust_2018_idioms)]
#![warn(missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod json;
pub mod memory;
pub mod path;
pub(crate) mod scan;
pub mod security;
pub mod tree;
pub mod xml;

pub use config::{ArenaConfig, ParseLimits, TreeConfig};
pub use error::{Error, JsonErrorKind, PathErrorKind, Result, XmlErrorKind};
pub use json::{EmptyContainers, JsonOptions, JsonParser, JsonWriter};
pub use memory::{
    Arena, ArenaStats, ClassStats, NodeSlot, PoolKind, SizeClass, SlabString, global_arena,
    initialize_global_arena,
};
pub use path::{PathSegment, TreePath};
pub use security::DepthTracker;
pub use tree::{KeyOrder, Member, Node, NodeKind};
pub use xml::{EntityStyle, XmlOptions, XmlParser, XmlWriter};

/// Build an arena and parse limits from one configuration
pub fn from_config(config: &TreeConfig) -> Result<(Arena, ParseLimits)> {
    config.validate()?;
    let arena = Arena::new(config.arena.clone())?;
    Ok((arena, config.limits))
}
