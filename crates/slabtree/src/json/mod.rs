//! JSON text to and from value trees
//!
//! Scalars stay raw text in the tree. On output a leaf is written unquoted
//! when it reads as `null`, a boolean or a JSON number, and as an escaped
//! string otherwise.

pub mod parser;
pub mod writer;

pub use parser::JsonParser;
pub use writer::{EmptyContainers, JsonOptions, JsonWriter, is_json_primitive};

use crate::{
    error::Result,
    memory::{Arena, SlabString},
    tree::Node,
};

/// Parse a JSON document with default limits
pub fn parse(arena: &Arena, input: &str) -> Result<Node> {
    JsonParser::new(arena).parse(input)
}

/// Serialize with default options into an arena buffer
pub fn to_slab_string(arena: &Arena, node: &Node) -> Result<SlabString> {
    JsonWriter::new(arena).write(node)
}

/// Serialize with default options into an owned `String`
pub fn to_string(arena: &Arena, node: &Node) -> Result<String> {
    let out = to_slab_string(arena, node)?;
    Ok(out.as_str()?.to_owned())
}

impl Node {
    /// Parse JSON into a tree allocated from `arena`
    pub fn parse_json(arena: &Arena, input: &str) -> Result<Node> {
        parse(arena, input)
    }

    /// Serialize this tree as compact JSON using its own arena
    pub fn to_json(&self) -> Result<String> {
        to_string(self.arena(), self)
    }
}
