//! XML text to and from value trees
//!
//! The dialect has no attributes. Elements map to keyed members, and text
//! content maps to leaves. Arrays are written as `item0`, `item1`, ... and read
//! back as objects with those keys.

pub mod entities;
pub mod parser;
pub mod writer;

pub use entities::EntityStyle;
pub use parser::XmlParser;
pub use writer::{XmlOptions, XmlWriter};

use crate::{
    error::Result,
    memory::{Arena, SlabString},
    tree::Node,
};

/// Parse an XML document with default limits
pub fn parse(arena: &Arena, input: &str) -> Result<Node> {
    XmlParser::new(arena).parse(input)
}

/// Serialize with default options into an arena buffer
pub fn to_slab_string(arena: &Arena, node: &Node) -> Result<SlabString> {
    XmlWriter::new(arena).write(node)
}

/// Serialize with default options into an owned `String`
pub fn to_string(arena: &Arena, node: &Node) -> Result<String> {
    let out = to_slab_string(arena, node)?;
    Ok(out.as_str()?.to_owned())
}

impl Node {
    /// Parse XML into a tree allocated from `arena`
    pub fn parse_xml(arena: &Arena, input: &str) -> Result<Node> {
        parse(arena, input)
    }

    /// Serialize this tree as XML using its own arena
    pub fn to_xml(&self) -> Result<String> {
        to_string(self.arena(), self)
    }
}
