//! XML serializer writing into an arena buffer

use crate::{
    config::ParseLimits,
    error::Result,
    memory::{Arena, SlabString},
    security::DepthTracker,
    tree::{KeyOrder, Member, Node, NodeKind},
    xml::entities::{EntityStyle, encode_into},
};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Element name used when the root is not a non-empty container
const ROOT_ELEMENT: &str = "value";

/// XML output options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct XmlOptions {
    /// Member order inside objects
    pub key_order: KeyOrder,
    /// Entity rendering for markup characters
    pub escape: EntityStyle,
}

impl Default for XmlOptions {
    fn default() -> Self {
        Self {
            key_order: KeyOrder::Sorted,
            escape: EntityStyle::Padded,
        }
    }
}

impl XmlOptions {
    /// Plain entities, members in insertion order
    pub fn compact() -> Self {
        Self {
            key_order: KeyOrder::Insertion,
            escape: EntityStyle::Compact,
        }
    }
}

#[derive(Clone, Copy)]
enum ElementName<'n> {
    Key(&'n str),
    Item(usize),
}

/// XML serializer bound to an arena
#[derive(Debug, Clone)]
pub struct XmlWriter<'a> {
    arena: &'a Arena,
    options: XmlOptions,
    limits: ParseLimits,
}

impl<'a> XmlWriter<'a> {
    pub fn new(arena: &'a Arena) -> Self {
        Self {
            arena,
            options: XmlOptions::default(),
            limits: ParseLimits::default(),
        }
    }

    pub fn with_options(mut self, options: XmlOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the element nesting limit; deeper trees fail with `TooDeep`
    pub fn with_limits(mut self, limits: ParseLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Serialize `node` into a buffer checked out of the writer's arena
    ///
    /// A non-empty root object is written as its members and a non-empty root
    /// array as `item0`, `item1`, ...; anything else is wrapped in `<value>`.
    /// Every element counts toward the depth limit.
    pub fn write(&self, node: &Node) -> Result<SlabString> {
        node.validate()?;
        let mut out = self.arena.alloc_string(0)?;
        let mut depth = DepthTracker::from_limits(&self.limits);
        match node.kind() {
            NodeKind::Object(members) if !members.is_empty() => {
                self.members(members, &mut out, &mut depth)?;
            }
            NodeKind::Array(elements) if !elements.is_empty() => {
                self.items(elements, &mut out, &mut depth)?;
            }
            _ => self.element(ElementName::Key(ROOT_ELEMENT), node, &mut out, &mut depth)?,
        }
        trace!(bytes = out.len(), "serialized XML");
        Ok(out)
    }

    fn element(
        &self,
        name: ElementName<'_>,
        node: &Node,
        out: &mut SlabString,
        depth: &mut DepthTracker,
    ) -> Result<()> {
        depth.enter()?;
        match node.kind() {
            NodeKind::Leaf(text) => {
                self.open(name, out)?;
                encode_into(text.as_str()?, self.options.escape, out)?;
                self.close(name, out)?;
            }
            NodeKind::Object(members) if !members.is_empty() => {
                self.open(name, out)?;
                self.members(members, out, depth)?;
                self.close(name, out)?;
            }
            NodeKind::Array(elements) if !elements.is_empty() => {
                self.open(name, out)?;
                self.items(elements, out, depth)?;
                self.close(name, out)?;
            }
            _ => {
                out.push('<')?;
                self.name(name, out)?;
                out.push_str("/>")?;
            }
        }
        depth.exit();
        Ok(())
    }

    fn members(
        &self,
        members: &[Member],
        out: &mut SlabString,
        depth: &mut DepthTracker,
    ) -> Result<()> {
        for member in self.options.key_order.arrange(members) {
            let name = ElementName::Key(member.key().as_str()?);
            self.element(name, member.value(), out, depth)?;
        }
        Ok(())
    }

    fn items(
        &self,
        elements: &[Node],
        out: &mut SlabString,
        depth: &mut DepthTracker,
    ) -> Result<()> {
        for (index, element) in elements.iter().enumerate() {
            self.element(ElementName::Item(index), element, out, depth)?;
        }
        Ok(())
    }

    fn open(&self, name: ElementName<'_>, out: &mut SlabString) -> Result<()> {
        out.push('<')?;
        self.name(name, out)?;
        out.push('>')
    }

    fn close(&self, name: ElementName<'_>, out: &mut SlabString) -> Result<()> {
        out.push_str("</")?;
        self.name(name, out)?;
        out.push('>')
    }

    fn name(&self, name: ElementName<'_>, out: &mut SlabString) -> Result<()> {
        match name {
            ElementName::Key(key) => encode_into(key, self.options.escape, out),
            ElementName::Item(index) => {
                out.push_str("item")?;
                push_decimal(index, out)
            }
        }
    }
}

fn push_decimal(mut value: usize, out: &mut SlabString) -> Result<()> {
    let mut digits = [0u8; 20];
    let mut start = digits.len();
    loop {
        start -= 1;
        digits[start] = b'0' + (value % 10) as u8;
        value /= 10;
        if value == 0 {
            break;
        }
    }
    for &digit in &digits[start..] {
        out.push(char::from(digit))?;
    }
    Ok(())
}
