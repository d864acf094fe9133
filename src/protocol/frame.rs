//! Frame struct and outgoing frame construction.
//!
//! A [`Frame`] is what the framer emits: the request ID from the header and
//! the decoded record. [`build_frame`] turns one back into wire bytes:
//! header, body, then zeroed padding, in one freshly allocated buffer.
//!
//! # Example
//!
//! ```
//! use fcgi_wire::protocol::{build_frame, PaddingStrategy, Record, Role};
//!
//! let bytes = build_frame(42, &Record::begin_request(Role::Responder, true), PaddingStrategy::Legacy).unwrap();
//! assert_eq!(&bytes[..8], &[1, 1, 0, 42, 0, 8, 0, 0]);
//! assert_eq!(&bytes[8..], &[0, 1, 1, 0, 0, 0, 0, 0]);
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use super::record::Record;
use super::wire_format::{Header, PaddingStrategy, HEADER_SIZE, MAX_CONTENT_LENGTH};
use crate::error::{FcgiError, Result};

/// A complete record as emitted by the framer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Request the record belongs to (0 for management records).
    pub request_id: u16,
    /// Decoded record.
    pub record: Record,
}

impl Frame {
    /// Pair a record with the request it belongs to.
    pub fn new(request_id: u16, record: Record) -> Self {
        Self { request_id, record }
    }

    /// Request id from the header; 0 for management records.
    #[inline]
    pub fn request_id(&self) -> u16 {
        self.request_id
    }

    #[inline]
    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Take the record, dropping the request ID.
    #[inline]
    pub fn into_record(self) -> Record {
        self.record
    }

    /// Split into `(request_id, record)`.
    #[inline]
    pub fn into_parts(self) -> (u16, Record) {
        (self.request_id, self.record)
    }

    /// Header this frame is written with.
    pub fn header(&self, padding: PaddingStrategy) -> Result<Header> {
        frame_header(self.request_id, &self.record, padding)
    }
}

impl From<(u16, Record)> for Frame {
    fn from((request_id, record): (u16, Record)) -> Self {
        Self::new(request_id, record)
    }
}

/// Compute the header for `record`, rejecting bodies over 65535 bytes.
pub fn frame_header(request_id: u16, record: &Record, padding: PaddingStrategy) -> Result<Header> {
    let body_len = record.size();
    if body_len > MAX_CONTENT_LENGTH {
        return Err(FcgiError::RecordTooLarge { size: body_len });
    }

    Ok(Header::new(
        record.record_type().code(),
        request_id,
        body_len as u16,
        padding.padding_for(body_len),
    ))
}

/// Append a complete frame (header, body, zero padding) to `dst`.
pub fn encode_frame_into(
    request_id: u16,
    record: &Record,
    padding: PaddingStrategy,
    dst: &mut BytesMut,
) -> Result<()> {
    let header = frame_header(request_id, record, padding)?;
    dst.reserve(header.frame_len());
    dst.put_slice(&header.encode());
    record.encode_body(dst);
    dst.put_bytes(0, header.padding_length as usize);
    Ok(())
}

/// Build a complete frame as a single, freshly allocated buffer.
///
/// Each call owns its buffer, so frames built concurrently never share bytes.
pub fn build_frame(request_id: u16, record: &Record, padding: PaddingStrategy) -> Result<Bytes> {
    let mut buf = BytesMut::new();
    encode_frame_into(request_id, record, padding, &mut buf)?;
    debug_assert!(buf.len() >= HEADER_SIZE);
    Ok(buf.freeze())
}
