//! Wire format encoding and decoding.
//!
//! Implements the fixed 8-byte record header:
//! ```text
//! ┌─────────┬────────┬────────────┬───────────────┬─────────┬──────────┐
//! │ Version │ Type   │ Request ID │ ContentLength │ Padding │ Reserved │
//! │ 1 byte  │ 1 byte │ 2 bytes    │ 2 bytes       │ 1 byte  │ 1 byte   │
//! │         │        │ uint16 BE  │ uint16 BE     │         │ always 0 │
//! └─────────┴────────┴────────────┴───────────────┴─────────┴──────────┘
//! ```
//!
//! All multi-byte integers are Big Endian.

use std::fmt;

/// Header size in bytes (fixed, exactly 8).
pub const HEADER_SIZE: usize = 8;

/// Protocol version written into every header.
pub const VERSION: u8 = 1;

/// Request ID used by management records (`GetValues`, `GetValuesResult`, `UnknownType`).
pub const NULL_REQUEST_ID: u16 = 0;

/// Maximum record body size (the content length field is 16 bits).
pub const MAX_CONTENT_LENGTH: usize = u16::MAX as usize;

/// Record type codes.
///
/// The set is closed: the protocol defines exactly these eleven types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RecordType {
    BeginRequest = 1,
    AbortRequest = 2,
    EndRequest = 3,
    Params = 4,
    StdIn = 5,
    StdOut = 6,
    StdErr = 7,
    Data = 8,
    GetValues = 9,
    GetValuesResult = 10,
    UnknownType = 11,
}

impl RecordType {
    /// Every record type, in code order.
    pub const ALL: [RecordType; 11] = [
        RecordType::BeginRequest,
        RecordType::AbortRequest,
        RecordType::EndRequest,
        RecordType::Params,
        RecordType::StdIn,
        RecordType::StdOut,
        RecordType::StdErr,
        RecordType::Data,
        RecordType::GetValues,
        RecordType::GetValuesResult,
        RecordType::UnknownType,
    ];

    /// Resolve a header type byte. Returns `None` for codes outside 1-11.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(RecordType::BeginRequest),
            2 => Some(RecordType::AbortRequest),
            3 => Some(RecordType::EndRequest),
            4 => Some(RecordType::Params),
            5 => Some(RecordType::StdIn),
            6 => Some(RecordType::StdOut),
            7 => Some(RecordType::StdErr),
            8 => Some(RecordType::Data),
            9 => Some(RecordType::GetValues),
            10 => Some(RecordType::GetValuesResult),
            11 => Some(RecordType::UnknownType),
            _ => None,
        }
    }

    /// The numeric code written into the header.
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Management records are not tied to a request and travel on request ID 0.
    #[inline]
    pub fn is_management(self) -> bool {
        matches!(
            self,
            RecordType::GetValues | RecordType::GetValuesResult | RecordType::UnknownType
        )
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

/// How the writer computes padding after a record body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaddingStrategy {
    /// `content_length % 8`. Byte-compatible with existing peers of this
    /// codec, but does not align frames to 8 bytes.
    #[default]
    Legacy,
    /// `(8 - content_length % 8) % 8`, aligning header + body + padding to 8 bytes.
    Aligned,
    /// No padding.
    Disabled,
}

impl PaddingStrategy {
    /// Padding length for a body of `content_length` bytes.
    #[inline]
    pub fn padding_for(self, content_length: usize) -> u8 {
        // Both formulas yield a value in 0..8.
        match self {
            PaddingStrategy::Legacy => (content_length % 8) as u8,
            PaddingStrategy::Aligned => ((8 - content_length % 8) % 8) as u8,
            PaddingStrategy::Disabled => 0,
        }
    }
}

/// Decoded record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Protocol version (1).
    pub version: u8,
    /// Raw record type byte (see [`RecordType`]).
    pub record_type: u8,
    /// Request identifier (0 = management record).
    pub request_id: u16,
    /// Body length in bytes.
    pub content_length: u16,
    /// Padding bytes following the body.
    pub padding_length: u8,
}

impl Header {
    /// Create a version-1 header.
    pub fn new(record_type: u8, request_id: u16, content_length: u16, padding_length: u8) -> Self {
        Self {
            version: VERSION,
            record_type,
            request_id,
            content_length,
            padding_length,
        }
    }

    /// Encode header to bytes (Big Endian). The reserved byte is always 0.
    ///
    /// # Example
    ///
    /// ```
    /// use fcgi_wire::protocol::Header;
    ///
    /// let header = Header::new(1, 42, 8, 0);
    /// assert_eq!(header.encode(), [1, 1, 0, 42, 0, 8, 0, 0]);
    /// ```
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        self.encode_into(&mut buf);
        buf
    }

    /// Encode header into an existing buffer.
    ///
    /// # Panics
    ///
    /// Panics if buffer is smaller than `HEADER_SIZE` (8 bytes).
    pub fn encode_into(&self, buf: &mut [u8]) {
        buf[0] = self.version;
        buf[1] = self.record_type;
        buf[2..4].copy_from_slice(&self.request_id.to_be_bytes());
        buf[4..6].copy_from_slice(&self.content_length.to_be_bytes());
        buf[6] = self.padding_length;
        buf[7] = 0;
    }

    /// Decode header from exactly 8 bytes. Never fails; the reserved byte is ignored.
    ///
    /// # Example
    ///
    /// ```
    /// use fcgi_wire::protocol::Header;
    ///
    /// let header = Header::decode(&[1, 4, 0, 7, 0, 11, 3, 0]);
    /// assert_eq!(header.record_type, 4);
    /// assert_eq!(header.request_id, 7);
    /// assert_eq!(header.content_length, 11);
    /// assert_eq!(header.padding_length, 3);
    /// ```
    pub fn decode(buf: &[u8; HEADER_SIZE]) -> Self {
        Self {
            version: buf[0],
            record_type: buf[1],
            request_id: u16::from_be_bytes([buf[2], buf[3]]),
            content_length: u16::from_be_bytes([buf[4], buf[5]]),
            padding_length: buf[6],
        }
    }

    /// Decode header from the front of a slice.
    ///
    /// Returns `None` if buffer is too short.
    pub fn from_slice(buf: &[u8]) -> Option<Self> {
        let bytes: &[u8; HEADER_SIZE] = buf.get(..HEADER_SIZE)?.try_into().ok()?;
        Some(Self::decode(bytes))
    }

    /// Resolve the type byte against the known record types.
    #[inline]
    pub fn known_type(&self) -> Option<RecordType> {
        RecordType::from_code(self.record_type)
    }

    /// Body plus padding bytes that follow this header.
    #[inline]
    pub fn body_and_padding(&self) -> usize {
        self.content_length as usize + self.padding_length as usize
    }

    /// Total frame size (header + body + padding).
    #[inline]
    pub fn frame_len(&self) -> usize {
        HEADER_SIZE + self.body_and_padding()
    }
}

/// Encode a header to bytes (standalone function).
#[inline]
pub fn encode_header(header: &Header) -> [u8; HEADER_SIZE] {
    header.encode()
}

/// Decode a header from bytes (standalone function).
#[inline]
pub fn decode_header(buf: &[u8; HEADER_SIZE]) -> Header {
    Header::decode(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_encode_decode_roundtrip() {
        let original = Header::new(RecordType::Params.code(), 42, 300, 4);
        let decoded = Header::decode(&original.encode());
        assert_eq!(original, decoded);
    }

    #[test]
    fn test_header_big_endian_byte_order() {
        let header = Header::new(0x05, 0x0102, 0x0304, 0x06);
        let bytes = header.encode();

        assert_eq!(bytes[0], VERSION);
        assert_eq!(bytes[1], 0x05);
        // Request ID: 0x0102 in BE
        assert_eq!(bytes[2], 0x01);
        assert_eq!(bytes[3], 0x02);
        // Content length: 0x0304 in BE
        assert_eq!(bytes[4], 0x03);
        assert_eq!(bytes[5], 0x04);
        assert_eq!(bytes[6], 0x06);
        assert_eq!(bytes[7], 0);
    }

    #[test]
    fn test_header_size_is_exactly_8() {
        assert_eq!(HEADER_SIZE, 8);
        assert_eq!(Header::new(1, 1, 0, 0).encode().len(), 8);
    }

    #[test]
    fn test_reserved_byte_ignored_on_decode() {
        let header = Header::decode(&[1, 6, 0, 1, 0, 0, 0, 0xFF]);
        assert_eq!(header.record_type, 6);
        // Re-encoding clears it.
        assert_eq!(header.encode()[7], 0);
    }

    #[test]
    fn test_decode_does_not_validate() {
        let header = Header::decode(&[9, 200, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0]);
        assert_eq!(header.version, 9);
        assert_eq!(header.record_type, 200);
        assert_eq!(header.request_id, u16::MAX);
        assert_eq!(header.content_length, u16::MAX);
        assert_eq!(header.padding_length, 0xFF);
        assert!(header.known_type().is_none());
    }

    #[test]
    fn test_from_slice_too_short() {
        assert!(Header::from_slice(&[1, 1, 0, 1, 0, 8, 0]).is_none());
        assert!(Header::from_slice(&[1, 1, 0, 1, 0, 8, 0, 0, 99]).is_some());
    }

    #[test]
    fn test_record_type_codes() {
        for (i, ty) in RecordType::ALL.iter().enumerate() {
            assert_eq!(ty.code() as usize, i + 1);
            assert_eq!(RecordType::from_code(ty.code()), Some(*ty));
        }
        assert_eq!(RecordType::from_code(0), None);
        assert_eq!(RecordType::from_code(12), None);
    }

    #[test]
    fn test_management_types() {
        assert!(RecordType::GetValues.is_management());
        assert!(RecordType::UnknownType.is_management());
        assert!(!RecordType::StdOut.is_management());
    }

    #[test]
    fn test_padding_strategies() {
        assert_eq!(PaddingStrategy::Legacy.padding_for(11), 3);
        assert_eq!(PaddingStrategy::Legacy.padding_for(8), 0);
        assert_eq!(PaddingStrategy::Aligned.padding_for(11), 5);
        assert_eq!(PaddingStrategy::Aligned.padding_for(16), 0);
        assert_eq!(PaddingStrategy::Disabled.padding_for(11), 0);
        assert_eq!(PaddingStrategy::default(), PaddingStrategy::Legacy);
    }

    #[test]
    fn test_frame_len() {
        let header = Header::new(4, 1, 11, 3);
        assert_eq!(header.body_and_padding(), 14);
        assert_eq!(header.frame_len(), 22);
    }

    #[test]
    fn test_standalone_functions() {
        let header = Header::new(3, 7, 8, 0);
        assert_eq!(decode_header(&encode_header(&header)), header);
    }
}
