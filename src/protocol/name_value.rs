//! Name/value pair list codec.
//!
//! Used by `Params`, `GetValues` and `GetValuesResult` bodies. Each pair is
//! written as:
//! ```text
//! ┌─────────────┬──────────────┬────────────┬─────────────┐
//! │ Name length │ Value length │ Name bytes │ Value bytes │
//! │ 1 or 4      │ 1 or 4       │            │             │
//! └─────────────┴──────────────┴────────────┴─────────────┘
//! ```
//!
//! A length up to 127 takes one byte. Longer lengths take four bytes, Big
//! Endian, with the top bit set as a continuation flag (not a sign), leaving
//! 31 bits for the length.

use bytes::{BufMut, Bytes};

use crate::error::{FcgiError, Result};

/// Largest length that fits the single-byte prefix.
pub const MAX_SHORT_LENGTH: usize = 127;

/// Largest length the 4-byte prefix can carry (2^31 - 1).
pub const MAX_PAIR_LENGTH: usize = 0x7FFF_FFFF;

/// Continuation flag on the first byte of a 4-byte length.
const LONG_LENGTH_FLAG: u32 = 0x8000_0000;

/// A single name/value pair. Order and duplicates in a list are preserved.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NameValuePair {
    /// Raw name bytes.
    pub name: Bytes,
    /// Raw value bytes (may be empty).
    pub value: Bytes,
}

impl NameValuePair {
    /// Create a pair from anything convertible to `Bytes`.
    pub fn new(name: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Create a pair with an empty value (a bare name in `GetValues`).
    pub fn name_only(name: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            value: Bytes::new(),
        }
    }

    /// Name as UTF-8, if valid.
    pub fn name_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.name).ok()
    }

    /// Value as UTF-8, if valid.
    pub fn value_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.value).ok()
    }

    /// Encoded size of this pair, prefixes included.
    #[inline]
    pub fn encoded_len(&self) -> usize {
        prefix_len(self.name.len()) + prefix_len(self.value.len()) + self.name.len() + self.value.len()
    }
}

impl<N: Into<Bytes>, V: Into<Bytes>> From<(N, V)> for NameValuePair {
    fn from((name, value): (N, V)) -> Self {
        Self::new(name, value)
    }
}

/// Size of the length prefix for a field of `len` bytes.
#[inline]
fn prefix_len(len: usize) -> usize {
    if len > MAX_SHORT_LENGTH {
        4
    } else {
        1
    }
}

/// Total encoded size of a pair list.
pub fn pairs_size(pairs: &[NameValuePair]) -> usize {
    pairs.iter().map(NameValuePair::encoded_len).sum()
}

/// Write a length prefix.
///
/// # Panics
///
/// If `len` exceeds [`MAX_PAIR_LENGTH`].
fn put_length<B: BufMut>(dst: &mut B, len: usize) {
    if len > MAX_SHORT_LENGTH {
        assert!(
            len <= MAX_PAIR_LENGTH,
            "name/value field of {} bytes exceeds the 4-byte length prefix",
            len
        );
        dst.put_u32(len as u32 | LONG_LENGTH_FLAG);
    } else {
        dst.put_u8(len as u8);
    }
}

/// Encode a pair list: for each pair, name length, value length, name, value.
///
/// Writes exactly [`pairs_size`] bytes. Field lengths must not exceed
/// [`MAX_PAIR_LENGTH`]; any list that fits a record body satisfies this.
///
/// # Panics
///
/// If a name or value is longer than [`MAX_PAIR_LENGTH`].
///
/// # Example
///
/// ```
/// use fcgi_wire::protocol::{encode_pairs, NameValuePair};
///
/// let mut out = Vec::new();
/// encode_pairs(&[NameValuePair::new("Test", "Value")], &mut out);
/// assert_eq!(out, b"\x04\x05TestValue");
/// ```
pub fn encode_pairs<B: BufMut>(pairs: &[NameValuePair], dst: &mut B) {
    for pair in pairs {
        put_length(dst, pair.name.len());
        put_length(dst, pair.value.len());
        dst.put_slice(&pair.name);
        dst.put_slice(&pair.value);
    }
}

/// Cursor over a pair list body. Slices share the body's allocation.
struct PairReader<'a> {
    body: &'a Bytes,
    offset: usize,
}

impl<'a> PairReader<'a> {
    fn new(body: &'a Bytes) -> Self {
        Self { body, offset: 0 }
    }

    fn has_remaining(&self) -> bool {
        self.offset < self.body.len()
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        if self.body.len() - self.offset < needed {
            return Err(FcgiError::MalformedPair {
                offset: self.offset,
                needed,
                available: self.body.len(),
            });
        }
        Ok(())
    }

    fn read_length(&mut self) -> Result<usize> {
        self.ensure(1)?;
        let first = self.body[self.offset];
        if first & 0x80 == 0 {
            self.offset += 1;
            return Ok(first as usize);
        }

        self.ensure(4)?;
        let b = &self.body[self.offset..self.offset + 4];
        let len = u32::from_be_bytes([b[0] & 0x7F, b[1], b[2], b[3]]);
        self.offset += 4;
        Ok(len as usize)
    }

    fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        self.ensure(len)?;
        let bytes = self.body.slice(self.offset..self.offset + len);
        self.offset += len;
        Ok(bytes)
    }
}

/// Decode a pair list, consuming the whole body.
///
/// A pair with an empty value is still returned as a pair. Reading past the
/// end of the body yields [`FcgiError::MalformedPair`].
pub fn decode_pairs(body: &Bytes) -> Result<Vec<NameValuePair>> {
    let mut reader = PairReader::new(body);
    let mut pairs = Vec::new();

    while reader.has_remaining() {
        let name_len = reader.read_length()?;
        let value_len = reader.read_length()?;
        let name = reader.read_bytes(name_len)?;
        let value = reader.read_bytes(value_len)?;
        pairs.push(NameValuePair { name, value });
    }

    Ok(pairs)
}
