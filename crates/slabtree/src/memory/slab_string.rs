//! Capacity-bounded string buffer backed by an arena slot

use crate::{
    error::{Error, Result},
    memory::{Arena, SizeClass},
};
use std::fmt;

/// Growable UTF-8 buffer whose bytes live in an arena string slot
///
/// Appending past the current capacity moves the content into a slot of the
/// smallest class that fits and hands the old slot back. The slot is returned
/// to its pool when the buffer is dropped.
pub struct SlabString {
    buf: Option<Box<[u8]>>,
    len: usize,
    class: SizeClass,
    arena: Arena,
}

impl SlabString {
    pub(crate) fn from_slot(arena: Arena, class: SizeClass, buf: Box<[u8]>) -> Self {
        Self {
            buf: Some(buf),
            len: 0,
            class,
            arena,
        }
    }

    /// Append a string slice, growing into a larger slot if needed
    ///
    /// On failure the buffer is left unchanged.
    pub fn push_str(&mut self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        let needed = self.len.saturating_add(text.len());
        if needed > self.capacity() {
            self.grow(needed)?;
        }
        let start = self.len;
        let buf = self.buf_mut()?;
        buf[start..needed].copy_from_slice(text.as_bytes());
        self.len = needed;
        Ok(())
    }

    /// Append one character
    pub fn push(&mut self, ch: char) -> Result<()> {
        let mut encoded = [0u8; 4];
        self.push_str(ch.encode_utf8(&mut encoded))
    }

    /// Drop the content, keeping the slot
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Shorten to `new_len` bytes; no effect if `new_len` is not shorter or
    /// does not fall on a character boundary
    pub fn truncate(&mut self, new_len: usize) {
        if new_len < self.len && self.as_str().is_ok_and(|s| s.is_char_boundary(new_len)) {
            self.len = new_len;
        }
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Capacity of the current slot in bytes
    pub fn capacity(&self) -> usize {
        self.class.capacity()
    }

    /// Size class of the current slot
    pub fn size_class(&self) -> SizeClass {
        self.class
    }

    /// Arena the slot was checked out from
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Raw content bytes
    pub fn as_bytes(&self) -> &[u8] {
        match self.buf.as_deref() {
            Some(buf) => &buf[..self.len.min(buf.len())],
            None => &[],
        }
    }

    /// Content as `&str`
    pub fn as_str(&self) -> Result<&str> {
        std::str::from_utf8(self.as_bytes())
            .map_err(|e| Error::integrity(format!("string buffer is not valid UTF-8: {e}")))
    }

    /// Copy the content into a freshly checked-out slot
    pub fn try_clone(&self) -> Result<Self> {
        let mut copy = self.arena.alloc_string(self.len)?;
        let len = self.len;
        copy.buf_mut()?[..len].copy_from_slice(self.as_bytes());
        copy.len = len;
        Ok(copy)
    }

    /// Check the buffer's internal consistency
    pub fn validate(&self) -> Result<()> {
        let Some(buf) = self.buf.as_deref() else {
            return Err(Error::integrity("string buffer has no slot"));
        };
        if buf.len() != self.class.capacity() {
            return Err(Error::integrity(format!(
                "slot of {} bytes tagged as size class {}",
                buf.len(),
                self.class.capacity()
            )));
        }
        if self.len > buf.len() {
            return Err(Error::integrity(format!(
                "length {} exceeds capacity {}",
                self.len,
                buf.len()
            )));
        }
        self.as_str().map(|_| ())
    }

    fn grow(&mut self, needed: usize) -> Result<()> {
        let class = SizeClass::for_capacity(needed).ok_or(Error::CapacityTooLarge {
            requested: needed,
            max: SizeClass::LARGEST.capacity(),
        })?;
        let mut fresh = self.arena.checkout_string_slot(class)?;
        let len = self.len;
        let Some(old) = self.buf.take() else {
            self.arena.release_string(class, fresh);
            return Err(Error::integrity("string buffer has no slot"));
        };
        fresh[..len].copy_from_slice(&old[..len]);
        self.arena.release_string(self.class, old);
        self.buf = Some(fresh);
        self.class = class;
        Ok(())
    }

    fn buf_mut(&mut self) -> Result<&mut [u8]> {
        self.buf
            .as_deref_mut()
            .ok_or_else(|| Error::integrity("string buffer has no slot"))
    }

    #[cfg(test)]
    pub(crate) fn corrupt_len(&mut self, len: usize) {
        self.len = len;
    }

    #[cfg(test)]
    pub(crate) fn corrupt_byte(&mut self, index: usize, byte: u8) {
        if let Some(buf) = self.buf.as_deref_mut() {
            buf[index] = byte;
        }
    }
}

impl Drop for SlabString {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            self.arena.release_string(self.class, buf);
        }
    }
}

impl PartialEq for SlabString {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for SlabString {}

impl PartialEq<str> for SlabString {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<&str> for SlabString {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl fmt::Display for SlabString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.as_bytes()))
    }
}

impl fmt::Debug for SlabString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(self.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::ArenaConfig, memory::PoolKind};

    fn arena() -> Arena {
        Arena::new(ArenaConfig::testing()).unwrap()
    }

    #[test]
    fn test_push_within_capacity() {
        let arena = arena();
        let mut s = arena.alloc_string(10).unwrap();
        s.push_str("hello").unwrap();
        s.push(' ').unwrap();
        s.push('é').unwrap();
        assert_eq!(s.as_str().unwrap(), "hello é");
        assert_eq!(s.len(), 8);
        assert_eq!(s.size_class(), SizeClass::B16);
    }

    #[test]
    fn test_growth_moves_to_larger_class() {
        let arena = arena();
        let small = PoolKind::String(SizeClass::B16);
        let medium = PoolKind::String(SizeClass::B256);
        let small_free = arena.free_count(small);
        let medium_free = arena.free_count(medium);

        let mut s = arena.string_from("0123456789").unwrap();
        assert_eq!(arena.free_count(small), small_free - 1);

        s.push_str("0123456789").unwrap();
        assert_eq!(s.size_class(), SizeClass::B256);
        assert_eq!(s.as_str().unwrap(), "01234567890123456789");
        // The old slot went back, the new one is out
        assert_eq!(arena.free_count(small), small_free);
        assert_eq!(arena.free_count(medium), medium_free - 1);

        drop(s);
        assert_eq!(arena.free_count(medium), medium_free);
    }

    #[test]
    fn test_growth_failure_leaves_buffer_unchanged() {
        let arena = Arena::new(ArenaConfig {
            string256_slots: 1,
            ..ArenaConfig::testing()
        })
        .unwrap();
        let _hold = arena.alloc_string(200).unwrap();

        let mut s = arena.string_from("abc").unwrap();
        let err = s.push_str(&"x".repeat(100)).unwrap_err();
        assert_eq!(
            err,
            Error::Exhausted {
                pool: PoolKind::String(SizeClass::B256)
            }
        );
        assert_eq!(s.as_str().unwrap(), "abc");
        assert_eq!(s.size_class(), SizeClass::B16);
    }

    #[test]
    fn test_growth_past_largest_class() {
        let arena = arena();
        let mut s = arena.alloc_string(SizeClass::LARGEST.capacity()).unwrap();
        s.push_str(&"a".repeat(SizeClass::LARGEST.capacity())).unwrap();
        let err = s.push('b').unwrap_err();
        assert!(matches!(err, Error::CapacityTooLarge { .. }));
        assert_eq!(s.len(), SizeClass::LARGEST.capacity());
    }

    #[test]
    fn test_clear_keeps_slot() {
        let arena = arena();
        let mut s = arena.string_from("some text").unwrap();
        let class = s.size_class();
        s.clear();
        assert!(s.is_empty());
        assert_eq!(s.size_class(), class);
        s.push_str("again").unwrap();
        assert_eq!(s, "again");

        s.push_str("é").unwrap();
        s.truncate(6);
        assert_eq!(s, "againé");
        s.truncate(5);
        assert_eq!(s, "again");
    }

    #[test]
    fn test_try_clone_checks_out_new_slot() {
        let arena = arena();
        let pool = PoolKind::String(SizeClass::B16);
        let s = arena.string_from("copy me").unwrap();
        let before = arena.free_count(pool);
        let copy = s.try_clone().unwrap();
        assert_eq!(copy, s);
        assert_eq!(arena.free_count(pool), before - 1);
    }

    #[test]
    fn test_validate_detects_corruption() {
        let arena = arena();
        let mut s = arena.string_from("ok").unwrap();
        assert!(s.validate().is_ok());

        s.corrupt_len(17);
        assert!(matches!(s.validate(), Err(Error::Integrity(_))));

        s.corrupt_len(2);
        s.corrupt_byte(0, 0xFF);
        assert!(matches!(s.validate(), Err(Error::Integrity(_))));
        assert!(s.as_str().is_err());
        assert_eq!(s.to_string(), "\u{FFFD}k");
    }

    #[test]
    fn test_equality_and_formatting() {
        let arena = arena();
        let a = arena.string_from("same").unwrap();
        let b = arena.string_from("same").unwrap();
        assert_eq!(a, b);
        assert!(a == "same");
        assert_eq!(format!("{a}"), "same");
        assert_eq!(format!("{a:?}"), "\"same\"");
    }
}
