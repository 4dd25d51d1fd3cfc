//! Compact JSON serializer writing into an arena buffer

use crate::{
    config::ParseLimits,
    error::Result,
    memory::{Arena, SlabString},
    security::DepthTracker,
    tree::{KeyOrder, Member, Node, NodeKind},
};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// How empty objects and arrays are written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmptyContainers {
    /// `{}` and `[]`
    #[default]
    Preserve,
    /// `null`, as older consumers of agent memory files expect
    Null,
}

/// JSON output options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonOptions {
    /// Member order inside objects
    pub key_order: KeyOrder,
    /// Rendering of empty containers
    pub empty_containers: EmptyContainers,
}

impl JsonOptions {
    /// Output compatible with the historical format: empty containers as `null`
    pub fn legacy() -> Self {
        Self {
            empty_containers: EmptyContainers::Null,
            ..Self::default()
        }
    }

    /// Members sorted by key, for stable diffs
    pub fn sorted() -> Self {
        Self {
            key_order: KeyOrder::Sorted,
            ..Self::default()
        }
    }
}

/// JSON serializer bound to an arena
#[derive(Debug, Clone)]
pub struct JsonWriter<'a> {
    arena: &'a Arena,
    options: JsonOptions,
    limits: ParseLimits,
}

impl<'a> JsonWriter<'a> {
    pub fn new(arena: &'a Arena) -> Self {
        Self {
            arena,
            options: JsonOptions::default(),
            limits: ParseLimits::default(),
        }
    }

    pub fn with_options(mut self, options: JsonOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the container nesting limit; deeper trees fail with `TooDeep`
    pub fn with_limits(mut self, limits: ParseLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Serialize `node` into a buffer checked out of the writer's arena
    ///
    /// The tree is validated first; nothing is written for a corrupt tree.
    /// Containers count toward the depth limit the same way the parser
    /// counts them.
    pub fn write(&self, node: &Node) -> Result<SlabString> {
        node.validate()?;
        let mut out = self.arena.alloc_string(0)?;
        let mut depth = DepthTracker::from_limits(&self.limits);
        self.node(node, &mut out, &mut depth)?;
        trace!(bytes = out.len(), "serialized JSON");
        Ok(out)
    }

    fn node(&self, node: &Node, out: &mut SlabString, depth: &mut DepthTracker) -> Result<()> {
        match node.kind() {
            NodeKind::Null => out.push_str("null"),
            NodeKind::Leaf(text) => {
                let text = text.as_str()?;
                if is_json_primitive(text) {
                    out.push_str(text)
                } else {
                    write_quoted(text, out)
                }
            }
            NodeKind::Object(members) => {
                depth.enter()?;
                self.object(members, out, depth)?;
                depth.exit();
                Ok(())
            }
            NodeKind::Array(elements) => {
                depth.enter()?;
                self.array(elements, out, depth)?;
                depth.exit();
                Ok(())
            }
        }
    }

    fn object(
        &self,
        members: &[Member],
        out: &mut SlabString,
        depth: &mut DepthTracker,
    ) -> Result<()> {
        if members.is_empty() {
            return self.empty(out, "{}");
        }
        out.push('{')?;
        for (i, member) in self.options.key_order.arrange(members).iter().enumerate() {
            if i > 0 {
                out.push(',')?;
            }
            write_quoted(member.key().as_str()?, out)?;
            out.push(':')?;
            self.node(member.value(), out, depth)?;
        }
        out.push('}')
    }

    fn array(
        &self,
        elements: &[Node],
        out: &mut SlabString,
        depth: &mut DepthTracker,
    ) -> Result<()> {
        if elements.is_empty() {
            return self.empty(out, "[]");
        }
        out.push('[')?;
        for (i, element) in elements.iter().enumerate() {
            if i > 0 {
                out.push(',')?;
            }
            self.node(element, out, depth)?;
        }
        out.push(']')
    }

    fn empty(&self, out: &mut SlabString, brackets: &str) -> Result<()> {
        match self.options.empty_containers {
            EmptyContainers::Preserve => out.push_str(brackets),
            EmptyContainers::Null => out.push_str("null"),
        }
    }
}

/// Whether leaf text is written unquoted: `null`, `true`, `false` or a JSON
/// number
pub fn is_json_primitive(text: &str) -> bool {
    matches!(text, "null" | "true" | "false") || is_json_number(text)
}

fn is_json_number(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut i = 0;

    if bytes.first() == Some(&b'-') {
        i += 1;
    }
    match bytes.get(i) {
        Some(b'0') => i += 1,
        Some(b'1'..=b'9') => i += count_digits(&bytes[i..]),
        _ => return false,
    }
    if bytes.get(i) == Some(&b'.') {
        let digits = count_digits(&bytes[i + 1..]);
        if digits == 0 {
            return false;
        }
        i += 1 + digits;
    }
    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        i += 1;
        if matches!(bytes.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let digits = count_digits(&bytes[i..]);
        if digits == 0 {
            return false;
        }
        i += digits;
    }
    i == bytes.len()
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

fn write_quoted(text: &str, out: &mut SlabString) -> Result<()> {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";

    out.push('"')?;
    let mut run = 0;
    for (i, byte) in text.bytes().enumerate() {
        let escaped = match byte {
            b'"' => "\\\"",
            b'\\' => "\\\\",
            0x08 => "\\b",
            0x0C => "\\f",
            b'\n' => "\\n",
            b'\r' => "\\r",
            b'\t' => "\\t",
            0x00..=0x1F => "",
            _ => continue,
        };
        out.push_str(&text[run..i])?;
        if escaped.is_empty() {
            out.push_str("\\u00")?;
            out.push(char::from(HEX[usize::from(byte >> 4)]))?;
            out.push(char::from(HEX[usize::from(byte & 0x0F)]))?;
        } else {
            out.push_str(escaped)?;
        }
        run = i + 1;
    }
    out.push_str(&text[run..])?;
    out.push('"')
}
