//! Character encoding attached to an element's textual source data.

use encoding_rs::Encoding;
use std::borrow::Cow;
use std::fmt;

/// Thin wrapper over an `encoding_rs` encoding so the rest of the pipeline
/// never touches labels directly.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Charset(&'static Encoding);

impl Charset {
    pub const UTF_8: Charset = Charset(&encoding_rs::UTF_8_INIT);

    /// Look up a WHATWG encoding label (`utf-8`, `cp1252`, `shift_jis`, ...).
    pub fn for_label(label: &str) -> Option<Charset> {
        Encoding::for_label(label.trim().as_bytes()).map(Charset)
    }

    pub fn name(&self) -> &'static str {
        self.0.name()
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.0
    }

    /// Encode text, returning `None` if any character has no mapping in this
    /// charset. UTF-16 is written without a byte-order mark.
    pub fn encode<'a>(&self, text: &'a str) -> Option<Cow<'a, [u8]>> {
        if self.0 == encoding_rs::UTF_16LE {
            return Some(Cow::Owned(text.encode_utf16().flat_map(u16::to_le_bytes).collect()));
        }
        if self.0 == encoding_rs::UTF_16BE {
            return Some(Cow::Owned(text.encode_utf16().flat_map(u16::to_be_bytes).collect()));
        }
        let (bytes, _, had_unmappable) = self.0.encode(text);
        if had_unmappable { None } else { Some(bytes) }
    }

    /// Decode bytes in this charset. A byte-order mark for this charset is
    /// stripped. Returns `None` on malformed input or on a byte-order mark
    /// announcing a different charset.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Option<Cow<'a, str>> {
        if let Some(bom) = Self::sniff_bom(bytes) {
            if bom != *self {
                return None;
            }
        }
        let (text, had_errors) = self.0.decode_with_bom_removal(bytes);
        if had_errors { None } else { Some(text) }
    }

    /// The charset announced by a leading byte-order mark, if any.
    pub fn sniff_bom(bytes: &[u8]) -> Option<Charset> {
        Encoding::for_bom(bytes).map(|(encoding, _)| Charset(encoding))
    }
}

impl Default for Charset {
    fn default() -> Self {
        Self::UTF_8
    }
}

impl From<&'static Encoding> for Charset {
    fn from(encoding: &'static Encoding) -> Self {
        Charset(encoding)
    }
}

impl fmt::Debug for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Charset({})", self.name())
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
