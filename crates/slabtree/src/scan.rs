//! Byte cursor shared by the JSON and XML parsers
//!
//! Positions only ever stop on ASCII bytes or at the end of input, so every
//! slice taken between two positions falls on a UTF-8 character boundary.

use memchr::{memchr, memchr2, memmem};

#[derive(Debug, Clone)]
pub(crate) struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn len(&self) -> usize {
        self.input.len()
    }

    pub(crate) fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    pub(crate) fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    pub(crate) fn bump(&mut self) {
        self.advance(1);
    }

    pub(crate) fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.input.len());
    }

    /// Consume `byte` if it is next
    pub(crate) fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub(crate) fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }

    pub(crate) fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    pub(crate) fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.input[start..end]
    }

    /// Skip space, tab, CR and LF
    pub(crate) fn skip_whitespace(&mut self) {
        let skipped = self
            .rest()
            .bytes()
            .take_while(|b| is_whitespace(*b))
            .count();
        self.pos += skipped;
    }

    /// Advance while `pred` holds, returning the consumed text
    pub(crate) fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        let taken = self.rest().bytes().take_while(|b| pred(*b)).count();
        self.pos += taken;
        self.slice(start, self.pos)
    }

    /// Absolute position of the next `byte`
    pub(crate) fn find(&self, byte: u8) -> Option<usize> {
        memchr(byte, self.rest().as_bytes()).map(|i| self.pos + i)
    }

    /// Absolute position of the next `a` or `b`
    pub(crate) fn find2(&self, a: u8, b: u8) -> Option<usize> {
        memchr2(a, b, self.rest().as_bytes()).map(|i| self.pos + i)
    }

    /// Absolute position of the next occurrence of `needle`, searching from
    /// `from` bytes ahead
    pub(crate) fn find_str(&self, needle: &str, from: usize) -> Option<usize> {
        let start = (self.pos + from).min(self.input.len());
        memmem::find(&self.input.as_bytes()[start..], needle.as_bytes()).map(|i| start + i)
    }

    pub(crate) fn set_pos(&mut self, pos: usize) {
        self.pos = pos.min(self.input.len());
    }
}

pub(crate) fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r' | b'\n')
}
