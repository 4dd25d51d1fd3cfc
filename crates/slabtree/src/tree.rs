//! Value tree
//!
//! A [`Node`] owns one arena node slot plus its content: nothing, a text leaf,
//! an ordered list of keyed members, or an ordered list of elements. Children
//! are moved into their parent by value, so trees are acyclic and every
//! subtree has exactly one owner. Dropping a node releases its children first,
//! in order, then its own string and slot.
//!
//! Walks over a whole subtree (drop, counting, validation, copying and
//! equality) keep their own stack, so arbitrarily deep trees never exhaust
//! the thread's stack.

use crate::{
    error::{Error, Result},
    memory::{Arena, NodeSlot, SlabString},
};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Content of a node
#[derive(Debug, PartialEq)]
pub enum NodeKind {
    /// No value (`null` in JSON, `<a/>` in XML)
    Null,
    /// Raw scalar text; JSON classification happens at serialization
    Leaf(SlabString),
    /// Keyed children in insertion order; duplicate keys are allowed
    Object(Vec<Member>),
    /// Positional children
    Array(Vec<Node>),
}

impl NodeKind {
    /// Short name used in error messages
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Null => "null",
            NodeKind::Leaf(_) => "leaf",
            NodeKind::Object(_) => "object",
            NodeKind::Array(_) => "array",
        }
    }

    pub(crate) fn mismatch(&self, expected: &'static str) -> Error {
        Error::WrongKind {
            expected,
            found: self.name(),
        }
    }
}

/// Keyed child of an object
#[derive(Debug, PartialEq)]
pub struct Member {
    value: Node,
    key: SlabString,
}

impl Member {
    /// Pair an already allocated key with a value
    pub fn new(key: SlabString, value: Node) -> Self {
        Self { value, key }
    }

    pub fn key(&self) -> &SlabString {
        &self.key
    }

    pub fn value(&self) -> &Node {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut Node {
        &mut self.value
    }

    /// Replace the value, returning the previous one
    pub fn replace_value(&mut self, value: Node) -> Node {
        std::mem::replace(&mut self.value, value)
    }

    pub fn into_value(self) -> Node {
        self.value
    }

    pub(crate) fn has_key(&self, key: &str) -> bool {
        self.key.as_bytes() == key.as_bytes()
    }
}

/// Member ordering used by the serializers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyOrder {
    /// Members in the order they were inserted
    #[default]
    Insertion,
    /// Members sorted byte-wise by key; equal keys keep insertion order
    Sorted,
}

impl KeyOrder {
    pub(crate) fn arrange<'a>(self, members: &'a [Member]) -> SmallVec<[&'a Member; 16]> {
        let mut ordered: SmallVec<[&Member; 16]> = members.iter().collect();
        if self == KeyOrder::Sorted {
            ordered.sort_by(|a, b| a.key.as_bytes().cmp(b.key.as_bytes()));
        }
        ordered
    }
}

/// One node of a value tree
pub struct Node {
    // Declared first so a leaf's text is released before this node's slot
    kind: NodeKind,
    slot: NodeSlot,
}

impl Node {
    /// Create a node with the given content
    pub fn from_kind(arena: &Arena, kind: NodeKind) -> Result<Self> {
        let slot = arena.checkout_node()?;
        Ok(Self { kind, slot })
    }

    pub fn null(arena: &Arena) -> Result<Self> {
        Self::from_kind(arena, NodeKind::Null)
    }

    /// Create a leaf holding a copy of `text`
    pub fn leaf(arena: &Arena, text: &str) -> Result<Self> {
        let text = arena.string_from(text)?;
        Self::from_kind(arena, NodeKind::Leaf(text))
    }

    /// Create a leaf that takes ownership of an existing buffer
    pub fn leaf_from(text: SlabString) -> Result<Self> {
        let arena = text.arena().clone();
        Self::from_kind(&arena, NodeKind::Leaf(text))
    }

    /// Create an empty object
    pub fn object(arena: &Arena) -> Result<Self> {
        Self::from_kind(arena, NodeKind::Object(Vec::new()))
    }

    /// Create an empty array
    pub fn array(arena: &Arena) -> Result<Self> {
        Self::from_kind(arena, NodeKind::Array(Vec::new()))
    }

    /// Arena this node's slot belongs to
    pub fn arena(&self) -> &Arena {
        self.slot.arena()
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }

    /// Replace the content, returning the previous content
    pub fn set_kind(&mut self, kind: NodeKind) -> NodeKind {
        std::mem::replace(&mut self.kind, kind)
    }

    /// Release the slot and keep the content
    pub fn into_kind(mut self) -> NodeKind {
        std::mem::replace(&mut self.kind, NodeKind::Null)
    }

    pub fn kind_name(&self) -> &'static str {
        self.kind.name()
    }

    /// Whether this node holds no value
    ///
    /// Only empty XML elements and explicitly built nulls are null. The JSON
    /// parser keeps the bare token `null` as leaf text like any other scalar,
    /// so `{"n": null}` has a leaf at `n`.
    pub fn is_null(&self) -> bool {
        matches!(self.kind, NodeKind::Null)
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self.kind, NodeKind::Object(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, NodeKind::Array(_))
    }

    /// Leaf text, if this is a leaf with valid content
    pub fn as_text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Leaf(text) => text.as_str().ok(),
            _ => None,
        }
    }

    /// Leaf text, failing on any other kind
    pub fn text(&self) -> Result<&str> {
        match &self.kind {
            NodeKind::Leaf(text) => text.as_str(),
            other => Err(other.mismatch("leaf")),
        }
    }

    /// Number of direct children (0 for leaves and nulls)
    pub fn len(&self) -> usize {
        match &self.kind {
            NodeKind::Object(members) => members.len(),
            NodeKind::Array(elements) => elements.len(),
            NodeKind::Null | NodeKind::Leaf(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Object members, empty for any other kind
    pub fn members(&self) -> &[Member] {
        match &self.kind {
            NodeKind::Object(members) => members,
            _ => &[],
        }
    }

    /// Array elements, empty for any other kind
    pub fn elements(&self) -> &[Node] {
        match &self.kind {
            NodeKind::Array(elements) => elements,
            _ => &[],
        }
    }

    /// Append an element to an array
    pub fn push(&mut self, child: Node) -> Result<()> {
        match &mut self.kind {
            NodeKind::Array(elements) => {
                elements.push(child);
                Ok(())
            }
            other => Err(other.mismatch("array")),
        }
    }

    /// Append a member to an object; the key is copied into this node's arena
    pub fn insert(&mut self, key: &str, child: Node) -> Result<()> {
        if !self.is_object() {
            return Err(self.kind.mismatch("object"));
        }
        let key = self.arena().string_from(key)?;
        self.push_member(Member::new(key, child))
    }

    /// Append a prepared member to an object
    pub fn push_member(&mut self, member: Member) -> Result<()> {
        match &mut self.kind {
            NodeKind::Object(members) => {
                members.push(member);
                Ok(())
            }
            other => Err(other.mismatch("object")),
        }
    }

    /// First member value with this key
    pub fn get_key(&self, key: &str) -> Option<&Node> {
        self.members()
            .iter()
            .find(|member| member.has_key(key))
            .map(Member::value)
    }

    pub fn get_key_mut(&mut self, key: &str) -> Option<&mut Node> {
        match &mut self.kind {
            NodeKind::Object(members) => members
                .iter_mut()
                .find(|member| member.has_key(key))
                .map(Member::value_mut),
            _ => None,
        }
    }

    /// The n-th child: an array element or the value of an object member
    pub fn get_index(&self, index: usize) -> Option<&Node> {
        match &self.kind {
            NodeKind::Array(elements) => elements.get(index),
            NodeKind::Object(members) => members.get(index).map(Member::value),
            _ => None,
        }
    }

    pub fn get_index_mut(&mut self, index: usize) -> Option<&mut Node> {
        match &mut self.kind {
            NodeKind::Array(elements) => elements.get_mut(index),
            NodeKind::Object(members) => members.get_mut(index).map(Member::value_mut),
            _ => None,
        }
    }

    /// Direct children in order: member values or array elements
    pub fn children(&self) -> impl Iterator<Item = &Node> + '_ {
        self.members()
            .iter()
            .map(Member::value)
            .chain(self.elements())
    }

    /// Number of nodes in this subtree, including itself
    pub fn count_nodes(&self) -> usize {
        let mut count = 0;
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            count += 1;
            pending.extend(node.children());
        }
        count
    }

    /// Release the whole subtree, returning how many node slots went back
    pub fn destroy(self) -> usize {
        let released = self.count_nodes();
        drop(self);
        released
    }

    /// Deep copy with freshly checked-out slots from the same arena
    ///
    /// Children are copied before their parent's slot is taken. On failure
    /// everything copied so far goes back to the arena.
    pub fn try_clone(&self) -> Result<Node> {
        let arena = self.arena();
        let mut parents: Vec<Copying<'_>> = Vec::new();
        let mut current = Copying::start(self, None)?;

        loop {
            if let Some((key, child)) = current.next_child() {
                let key = key.map(SlabString::try_clone).transpose()?;
                let child = Copying::start(child, key)?;
                parents.push(std::mem::replace(&mut current, child));
                continue;
            }

            let node = Node::from_kind(arena, current.kind)?;
            match parents.pop() {
                Some(mut parent) => {
                    parent.attach(current.key, node)?;
                    current = parent;
                }
                None => return Ok(node),
            }
        }
    }

    /// Check every key and leaf buffer in the subtree
    pub fn validate(&self) -> Result<()> {
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            match &node.kind {
                NodeKind::Null => {}
                NodeKind::Leaf(text) => text.validate()?,
                NodeKind::Object(members) => {
                    for member in members {
                        member.key.validate()?;
                        pending.push(&member.value);
                    }
                }
                NodeKind::Array(elements) => pending.extend(elements),
            }
        }
        Ok(())
    }

    /// Move the direct children onto `out`, last child first
    fn detach_children(&mut self, out: &mut Vec<Node>) {
        match &mut self.kind {
            NodeKind::Object(members) => {
                out.extend(members.drain(..).rev().map(Member::into_value));
            }
            NodeKind::Array(elements) => out.extend(elements.drain(..).rev()),
            NodeKind::Null | NodeKind::Leaf(_) => {}
        }
    }
}

/// A node being deep-copied whose children are not all copied yet
struct Copying<'n> {
    source: &'n Node,
    key: Option<SlabString>,
    kind: NodeKind,
}

impl<'n> Copying<'n> {
    fn start(source: &'n Node, key: Option<SlabString>) -> Result<Self> {
        let kind = match &source.kind {
            NodeKind::Null => NodeKind::Null,
            NodeKind::Leaf(text) => NodeKind::Leaf(text.try_clone()?),
            NodeKind::Object(members) => NodeKind::Object(Vec::with_capacity(members.len())),
            NodeKind::Array(elements) => NodeKind::Array(Vec::with_capacity(elements.len())),
        };
        Ok(Self { source, key, kind })
    }

    /// Next source child to copy, with its key when the source is an object
    fn next_child(&self) -> Option<(Option<&'n SlabString>, &'n Node)> {
        match (&self.source.kind, &self.kind) {
            (NodeKind::Object(source), NodeKind::Object(copied)) => source
                .get(copied.len())
                .map(|member| (Some(&member.key), &member.value)),
            (NodeKind::Array(source), NodeKind::Array(copied)) => {
                source.get(copied.len()).map(|element| (None, element))
            }
            _ => None,
        }
    }

    fn attach(&mut self, key: Option<SlabString>, node: Node) -> Result<()> {
        match (&mut self.kind, key) {
            (NodeKind::Object(members), Some(key)) => members.push(Member::new(key, node)),
            (NodeKind::Array(elements), None) => elements.push(node),
            (kind, _) => return Err(kind.mismatch("container")),
        }
        Ok(())
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.detach_children(&mut pending);

        // A node goes back on the stack under its own children, so it is
        // released only after all of them
        while let Some(mut node) = pending.pop() {
            if !node.is_empty() {
                let mut children = Vec::new();
                node.detach_children(&mut children);
                pending.push(node);
                pending.append(&mut children);
            }
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some((left, right)) = pending.pop() {
            match (&left.kind, &right.kind) {
                (NodeKind::Null, NodeKind::Null) => {}
                (NodeKind::Leaf(a), NodeKind::Leaf(b)) if a == b => {}
                (NodeKind::Object(a), NodeKind::Object(b))
                    if a.len() == b.len() && a.iter().zip(b).all(|(m, n)| m.key == n.key) =>
                {
                    pending.extend(a.iter().zip(b).map(|(m, n)| (&m.value, &n.value)));
                }
                (NodeKind::Array(a), NodeKind::Array(b)) if a.len() == b.len() => {
                    pending.extend(a.iter().zip(b));
                }
                _ => return false,
            }
        }
        true
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.kind, f)
    }
}
