//! Recursive-descent JSON parser producing arena-backed trees
//!
//! The dialect is lenient in the same places agent output tends to be sloppy:
//! bare tokens are kept as raw text, `\uXXXX` escapes pass through untouched,
//! unknown escapes keep their backslash, and a trailing comma before `}` or `]`
//! is accepted.

use crate::{
    config::ParseLimits,
    error::{Error, JsonErrorKind, Result},
    memory::{Arena, SizeClass, SlabString},
    scan::{Cursor, is_whitespace},
    security::DepthTracker,
    tree::{Member, Node, NodeKind},
};
use tracing::{debug, trace};

/// JSON parser bound to an arena
#[derive(Debug, Clone)]
pub struct JsonParser<'a> {
    arena: &'a Arena,
    limits: ParseLimits,
}

impl<'a> JsonParser<'a> {
    /// Create a parser with default limits
    pub fn new(arena: &'a Arena) -> Self {
        Self {
            arena,
            limits: ParseLimits::default(),
        }
    }

    /// Override the nesting limit
    pub fn with_limits(mut self, limits: ParseLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Parse one JSON document
    ///
    /// On error every slot checked out so far has already been returned.
    pub fn parse(&self, input: &str) -> Result<Node> {
        trace!(bytes = input.len(), "parsing JSON");
        if input.is_empty() {
            return Err(Error::json(0, JsonErrorKind::EmptyInput));
        }

        let mut state = ParseState {
            arena: self.arena,
            cursor: Cursor::new(input),
            depth: DepthTracker::from_limits(&self.limits),
        };
        let result = state.document();
        match &result {
            Ok(node) => trace!(nodes = node.count_nodes(), "parsed JSON"),
            Err(error) => debug!(%error, "JSON parse failed"),
        }
        result
    }
}

struct ParseState<'a, 'i> {
    arena: &'a Arena,
    cursor: Cursor<'i>,
    depth: DepthTracker,
}

impl ParseState<'_, '_> {
    fn document(&mut self) -> Result<Node> {
        let root = self.value()?;
        self.cursor.skip_whitespace();
        if !self.cursor.is_eof() {
            return Err(self.error(JsonErrorKind::TrailingCharacters));
        }
        Ok(root)
    }

    fn value(&mut self) -> Result<Node> {
        self.cursor.skip_whitespace();
        match self.cursor.peek() {
            None => Err(self.error(JsonErrorKind::UnexpectedEnd)),
            Some(b'{') => self.object(),
            Some(b'[') => self.array(),
            Some(b'"') => {
                let text = self.string()?;
                Node::leaf_from(text)
            }
            Some(_) => self.bare_token(),
        }
    }

    fn object(&mut self) -> Result<Node> {
        self.depth.enter()?;
        self.cursor.bump();

        let mut members = Vec::new();
        loop {
            self.cursor.skip_whitespace();
            match self.cursor.peek() {
                None => return Err(self.error(JsonErrorKind::UnexpectedEnd)),
                Some(b'}') => {
                    self.cursor.bump();
                    break;
                }
                Some(b'"') => {}
                Some(_) => return Err(self.error(JsonErrorKind::NonStringKey)),
            }

            let key = self.string()?;
            self.cursor.skip_whitespace();
            if !self.cursor.eat(b':') {
                return Err(self.missing(JsonErrorKind::ExpectedColon));
            }
            let value = self.value()?;
            members.push(Member::new(key, value));

            if self.separator(b'}')? {
                break;
            }
        }

        self.depth.exit();
        Node::from_kind(self.arena, NodeKind::Object(members))
    }

    fn array(&mut self) -> Result<Node> {
        self.depth.enter()?;
        self.cursor.bump();

        let mut elements = Vec::new();
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.eat(b']') {
                break;
            }
            elements.push(self.value()?);

            if self.separator(b']')? {
                break;
            }
        }

        self.depth.exit();
        Node::from_kind(self.arena, NodeKind::Array(elements))
    }

    /// Consume `,` or the closing bracket; true when the container ended
    fn separator(&mut self, closing: u8) -> Result<bool> {
        self.cursor.skip_whitespace();
        match self.cursor.peek() {
            Some(b',') => {
                self.cursor.bump();
                Ok(false)
            }
            Some(byte) if byte == closing => {
                self.cursor.bump();
                Ok(true)
            }
            None => Err(self.error(JsonErrorKind::UnexpectedEnd)),
            Some(_) => Err(self.error(JsonErrorKind::ExpectedCommaOrEnd {
                closing: char::from(closing),
            })),
        }
    }

    fn string(&mut self) -> Result<SlabString> {
        let open = self.cursor.pos();
        self.cursor.bump();

        // Escapes never lengthen the text, so the distance to the first quote
        // is a good first guess for the buffer size.
        let hint = self
            .cursor
            .find(b'"')
            .map_or(0, |end| end - self.cursor.pos())
            .min(SizeClass::LARGEST.capacity());
        let mut text = self.arena.alloc_string(hint)?;

        loop {
            let Some(stop) = self.cursor.find2(b'"', b'\\') else {
                return Err(Error::json(open, JsonErrorKind::UnterminatedString));
            };
            text.push_str(self.cursor.slice(self.cursor.pos(), stop))?;
            self.cursor.set_pos(stop);

            if self.cursor.eat(b'"') {
                return Ok(text);
            }

            // Backslash
            self.cursor.bump();
            let Some(escaped) = self.cursor.peek() else {
                return Err(Error::json(open, JsonErrorKind::UnterminatedString));
            };
            let decoded = match escaped {
                b'"' => "\"",
                b'\\' => "\\",
                b'/' => "/",
                b'b' => "\u{08}",
                b'f' => "\u{0C}",
                b'n' => "\n",
                b'r' => "\r",
                b't' => "\t",
                b'u' => "\\u",
                _ => {
                    // Keep the backslash; the character itself is copied with
                    // the next run
                    text.push('\\')?;
                    continue;
                }
            };
            text.push_str(decoded)?;
            self.cursor.bump();
        }
    }

    fn bare_token(&mut self) -> Result<Node> {
        let start = self.cursor.pos();
        let token = self.cursor.take_while(|b| !is_delimiter(b));
        if token.is_empty() {
            self.cursor.set_pos(start);
            return Err(self.error(JsonErrorKind::InvalidValue));
        }
        Node::leaf(self.arena, token)
    }

    fn error(&self, kind: JsonErrorKind) -> Error {
        Error::json(self.cursor.pos(), kind)
    }

    fn missing(&self, kind: JsonErrorKind) -> Error {
        if self.cursor.is_eof() {
            self.error(JsonErrorKind::UnexpectedEnd)
        } else {
            self.error(kind)
        }
    }
}

fn is_delimiter(byte: u8) -> bool {
    is_whitespace(byte) || matches!(byte, b',' | b'}' | b']' | b':' | b'{' | b'[' | b'"')
}
