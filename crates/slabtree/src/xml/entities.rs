//! Entity encoding and decoding for element text and names

use crate::{error::Result, memory::SlabString};
use memchr::memchr;
use serde::{Deserialize, Serialize};

/// Longest entity body considered, `#x10FFFF` plus slack
const MAX_ENTITY_LEN: usize = 10;

/// How the five markup characters are written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityStyle {
    /// Entities surrounded by one space each side: `" &lt; "`
    #[default]
    Padded,
    /// Plain entities: `&lt;`
    Compact,
}

impl EntityStyle {
    fn entity(self, byte: u8) -> Option<&'static str> {
        let (padded, compact) = match byte {
            b'<' => (" &lt; ", "&lt;"),
            b'>' => (" &gt; ", "&gt;"),
            b'&' => (" &amp; ", "&amp;"),
            b'"' => (" &quot; ", "&quot;"),
            b'\'' => (" &apos; ", "&apos;"),
            _ => return None,
        };
        Some(match self {
            EntityStyle::Padded => padded,
            EntityStyle::Compact => compact,
        })
    }
}

/// Append `text` with markup characters escaped and control bytes other than
/// tab, CR and LF dropped
pub(crate) fn encode_into(text: &str, style: EntityStyle, out: &mut SlabString) -> Result<()> {
    let mut run = 0;
    for (i, byte) in text.bytes().enumerate() {
        let replacement = match byte {
            b'\t' | b'\n' | b'\r' => continue,
            0x00..=0x1F => "",
            _ => match style.entity(byte) {
                Some(entity) => entity,
                None => continue,
            },
        };
        out.push_str(&text[run..i])?;
        out.push_str(replacement)?;
        run = i + 1;
    }
    out.push_str(&text[run..])
}

/// Append `text` with predefined entities and character references decoded;
/// anything unrecognized is copied as is
pub(crate) fn decode_into(text: &str, out: &mut SlabString) -> Result<()> {
    let bytes = text.as_bytes();
    let mut run = 0;
    let mut search = 0;

    while let Some(offset) = memchr(b'&', &bytes[search..]) {
        let amp = search + offset;
        search = amp + 1;

        let window_end = (amp + 2 + MAX_ENTITY_LEN).min(bytes.len());
        let Some(len) = memchr(b';', &bytes[amp + 1..window_end]) else {
            continue;
        };
        let body = &text[amp + 1..amp + 1 + len];
        let Some(ch) = decode_entity(body) else {
            continue;
        };

        out.push_str(&text[run..amp])?;
        out.push(ch)?;
        run = amp + len + 2;
        search = run;
    }
    out.push_str(&text[run..])
}

fn decode_entity(body: &str) -> Option<char> {
    match body {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let reference = body.strip_prefix('#')?;
            let (digits, radix) = match reference.strip_prefix(['x', 'X']) {
                Some(hex) => (hex, 16),
                None => (reference, 10),
            };
            // from_str_radix would accept a leading sign
            if !digits.chars().all(|c| c.is_digit(radix)) {
                return None;
            }
            char::from_u32(u32::from_str_radix(digits, radix).ok()?)
        }
    }
}
