//! Dotted path navigation: `config.agent.tools[2].name`
//!
//! A key segment selects the first object member with that key. An index
//! segment selects the n-th element of an array, or the value of the n-th
//! member of an object.

use crate::{
    config::ParseLimits,
    error::{Error, PathErrorKind, Result},
    tree::{Member, Node, NodeKind},
};
use smallvec::SmallVec;
use std::{fmt, str::FromStr};

/// One step of a path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object member key
    Key(String),
    /// Position among a container's children
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// Parsed path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TreePath {
    segments: SmallVec<[PathSegment; 8]>,
    text: String,
}

impl TreePath {
    /// Parse `a.b[2].c` style text
    pub fn parse(text: &str) -> Result<Self> {
        let malformed = |reason| Error::path(text, PathErrorKind::Malformed(reason));
        if text.is_empty() {
            return Err(malformed("empty path"));
        }

        let bytes = text.as_bytes();
        let mut segments = SmallVec::new();
        let mut i = 0;
        let mut first = true;
        loop {
            let start = i;
            while i < bytes.len() && !matches!(bytes[i], b'.' | b'[' | b']') {
                i += 1;
            }
            if i > start {
                segments.push(PathSegment::Key(text[start..i].to_owned()));
            } else if !(first && bytes.get(i) == Some(&b'[')) {
                return Err(malformed("empty segment"));
            }

            while bytes.get(i) == Some(&b'[') {
                i += 1;
                let digits = i;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                match bytes.get(i) {
                    None => return Err(malformed("missing ']'")),
                    Some(b']') if i > digits => {}
                    Some(_) => return Err(malformed("index must be a non-negative integer")),
                }
                let index = text[digits..i]
                    .parse()
                    .map_err(|_| malformed("index too large"))?;
                segments.push(PathSegment::Index(index));
                i += 1;
            }

            match bytes.get(i) {
                None => break,
                Some(b'.') if i + 1 < bytes.len() => i += 1,
                Some(b'.') => return Err(malformed("empty segment")),
                Some(b']') => return Err(malformed("unexpected ']'")),
                Some(_) => return Err(malformed("unexpected character after ']'")),
            }
            first = false;
        }

        Ok(Self {
            segments,
            text: text.to_owned(),
        })
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Text the path was parsed from
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Resolve against `root` without modifying it
    pub fn resolve<'n>(&self, root: &'n Node) -> Result<&'n Node> {
        self.segments
            .iter()
            .try_fold(root, |node, segment| self.step(node, segment))
    }

    /// Resolve against `root` for in-place modification
    pub fn resolve_mut<'n>(&self, root: &'n mut Node) -> Result<&'n mut Node> {
        let mut node = root;
        for segment in &self.segments {
            node = self.step_mut(node, segment)?;
        }
        Ok(node)
    }

    /// Store `value` at this path, creating missing objects along the way
    ///
    /// A `null` on the way is turned into an empty object. Leaves are never
    /// replaced by objects, and that includes a `null` read from JSON, which
    /// is leaf text. Whatever previously sat at the final position is dropped.
    /// Index segments never extend an array.
    ///
    /// Paths with more segments than the default nesting limit fail with
    /// `TooDeep` before anything is created.
    pub fn assign(&self, root: &mut Node, value: Node) -> Result<()> {
        self.assign_with_limits(root, value, &ParseLimits::default())
    }

    /// [`assign`](Self::assign) with an explicit nesting limit
    pub fn assign_with_limits(
        &self,
        root: &mut Node,
        value: Node,
        limits: &ParseLimits,
    ) -> Result<()> {
        if self.segments.len() > limits.max_depth {
            return Err(Error::TooDeep {
                depth: self.segments.len(),
                max: limits.max_depth,
            });
        }
        let Some((last, parents)) = self.segments.split_last() else {
            return Err(self.error(PathErrorKind::Malformed("empty path")));
        };

        let mut node = root;
        for segment in parents {
            node = match segment {
                PathSegment::Key(key) => self.member_or_insert(node, key)?,
                PathSegment::Index(_) => self.step_mut(node, segment)?,
            };
        }

        match last {
            PathSegment::Key(key) => {
                let arena = node.arena().clone();
                let members = self.object_members(node)?;
                match members.iter_mut().find(|m| m.has_key(key)) {
                    Some(member) => {
                        member.replace_value(value);
                    }
                    None => members.push(Member::new(arena.string_from(key)?, value)),
                }
            }
            PathSegment::Index(_) => *self.step_mut(node, last)? = value,
        }
        Ok(())
    }

    fn step<'n>(&self, node: &'n Node, segment: &PathSegment) -> Result<&'n Node> {
        match (segment, node.kind()) {
            (PathSegment::Key(key), NodeKind::Object(_)) => node
                .get_key(key)
                .ok_or_else(|| self.error(PathErrorKind::KeyNotFound(key.clone()))),
            (PathSegment::Index(index), NodeKind::Object(_) | NodeKind::Array(_)) => {
                node.get_index(*index).ok_or_else(|| {
                    self.error(PathErrorKind::IndexOutOfRange {
                        index: *index,
                        len: node.len(),
                    })
                })
            }
            (_, kind) => Err(self.error(PathErrorKind::NotAContainer(kind.name()))),
        }
    }

    fn step_mut<'n>(&self, node: &'n mut Node, segment: &PathSegment) -> Result<&'n mut Node> {
        let len = node.len();
        match (segment, node.kind_mut()) {
            (PathSegment::Key(key), NodeKind::Object(members)) => members
                .iter_mut()
                .find(|m| m.has_key(key))
                .map(Member::value_mut)
                .ok_or_else(|| self.error(PathErrorKind::KeyNotFound(key.clone()))),
            (PathSegment::Index(index), NodeKind::Object(members)) => members
                .get_mut(*index)
                .map(Member::value_mut)
                .ok_or_else(|| self.out_of_range(*index, len)),
            (PathSegment::Index(index), NodeKind::Array(elements)) => elements
                .get_mut(*index)
                .ok_or_else(|| self.out_of_range(*index, len)),
            (_, kind) => Err(self.error(PathErrorKind::NotAContainer(kind.name()))),
        }
    }

    fn member_or_insert<'n>(&self, node: &'n mut Node, key: &str) -> Result<&'n mut Node> {
        let arena = node.arena().clone();
        let members = self.object_members(node)?;
        let index = match members.iter().position(|m| m.has_key(key)) {
            Some(index) => index,
            None => {
                let key = arena.string_from(key)?;
                members.push(Member::new(key, Node::object(&arena)?));
                members.len() - 1
            }
        };
        Ok(members[index].value_mut())
    }

    /// Member list of `node`, turning a null into an empty object first
    fn object_members<'n>(&self, node: &'n mut Node) -> Result<&'n mut Vec<Member>> {
        if node.is_null() {
            node.set_kind(NodeKind::Object(Vec::new()));
        }
        match node.kind_mut() {
            NodeKind::Object(members) => Ok(members),
            other => Err(self.error(PathErrorKind::NotAContainer(other.name()))),
        }
    }

    fn out_of_range(&self, index: usize, len: usize) -> Error {
        self.error(PathErrorKind::IndexOutOfRange { index, len })
    }

    fn error(&self, kind: PathErrorKind) -> Error {
        Error::path(self.text.as_str(), kind)
    }
}

impl FromStr for TreePath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Look up the node at `path`
pub fn get<'n>(root: &'n Node, path: &str) -> Result<&'n Node> {
    TreePath::parse(path)?.resolve(root)
}

/// Look up the node at `path` for modification
pub fn get_mut<'n>(root: &'n mut Node, path: &str) -> Result<&'n mut Node> {
    TreePath::parse(path)?.resolve_mut(root)
}

/// Store `value` at `path`
pub fn set(root: &mut Node, path: &str, value: Node) -> Result<()> {
    TreePath::parse(path)?.assign(root, value)
}

impl Node {
    /// Node at `path`; see [`TreePath`] for the syntax
    pub fn get(&self, path: &str) -> Result<&Node> {
        get(self, path)
    }

    pub fn get_mut(&mut self, path: &str) -> Result<&mut Node> {
        get_mut(self, path)
    }

    /// Store `value` at `path`, creating intermediate objects
    pub fn set(&mut self, path: &str, value: Node) -> Result<()> {
        set(self, path, value)
    }

    /// Store a text leaf at `path`
    pub fn set_text(&mut self, path: &str, text: &str) -> Result<()> {
        let leaf = Node::leaf(self.arena(), text)?;
        set(self, path, leaf)
    }

    /// Text of the leaf at `path`
    pub fn get_text(&self, path: &str) -> Result<&str> {
        let node = get(self, path)?;
        match node.kind() {
            NodeKind::Leaf(text) => text.as_str(),
            _ => Err(Error::path(path, PathErrorKind::TypeMismatch("text"))),
        }
    }

    /// Leaf at `path` parsed as a signed integer
    pub fn get_i64(&self, path: &str) -> Result<i64> {
        self.get_parsed(path, "integer")
    }

    /// Leaf at `path` parsed as a float
    pub fn get_f64(&self, path: &str) -> Result<f64> {
        self.get_parsed(path, "number")
    }

    /// Leaf at `path` read as `true` or `false`
    pub fn get_bool(&self, path: &str) -> Result<bool> {
        self.get_parsed(path, "boolean")
    }

    fn get_parsed<T: FromStr>(&self, path: &str, expected: &'static str) -> Result<T> {
        let text = self.get_text(path).map_err(|err| match err {
            Error::Path {
                kind: PathErrorKind::TypeMismatch(_),
                ..
            } => Error::path(path, PathErrorKind::TypeMismatch(expected)),
            other => other,
        })?;
        text.trim()
            .parse()
            .map_err(|_| Error::path(path, PathErrorKind::TypeMismatch(expected)))
    }
}
