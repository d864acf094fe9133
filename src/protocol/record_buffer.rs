//! Record framer for accumulating partial reads.
//!
//! Uses `bytes::BytesMut` for zero-copy buffer management.
//! Implements a state machine for handling fragmented records:
//! - `AwaitingHeader`: Need at least 8 bytes
//! - `AwaitingBody`: Header parsed, need `content_length + padding_length` more bytes
//!
//! [`RecordDecoder`] holds only the state and runs against any `BytesMut`
//! (this is what [`RecordCodec`](crate::codec::RecordCodec) drives).
//! [`RecordBuffer`] owns its accumulation buffer and is the usual entry point.
//!
//! # Example
//!
//! ```
//! use fcgi_wire::protocol::{build_frame, PaddingStrategy, Record, RecordBuffer};
//!
//! let bytes = build_frame(1, &Record::std_out("hello"), PaddingStrategy::Legacy).unwrap();
//! let mut buffer = RecordBuffer::new();
//!
//! // Data arrives in chunks from the transport
//! assert!(buffer.push(&bytes[..5]).unwrap().is_empty());
//! let frames = buffer.push(&bytes[5..]).unwrap();
//!
//! assert_eq!(frames.len(), 1);
//! assert_eq!(frames[0].record, Record::std_out("hello"));
//! ```

use bytes::{Buf, BytesMut};

use super::registry::{RecordRegistry, StandardRegistry};
use super::wire_format::{Header, HEADER_SIZE, VERSION};
use super::Frame;
use crate::error::{FcgiError, Result};

/// Default accumulation buffer capacity (64KB).
pub const DEFAULT_BUFFER_CAPACITY: usize = 64 * 1024;

/// State machine for record parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Waiting for a complete header (need 8 bytes).
    AwaitingHeader,
    /// Header parsed, waiting for body and padding bytes.
    AwaitingBody { header: Header },
}

/// Incremental record decoder.
///
/// Holds the parsed header between calls so a record may span any number of
/// input chunks. No maximum body size is enforced beyond the 16-bit content
/// length in the header.
#[derive(Debug, Clone)]
pub struct RecordDecoder<R = StandardRegistry> {
    state: State,
    registry: R,
}

impl RecordDecoder<StandardRegistry> {
    /// Create a decoder backed by the standard registry.
    pub fn new() -> Self {
        Self::with_registry(StandardRegistry)
    }
}

impl Default for RecordDecoder<StandardRegistry> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RecordRegistry> RecordDecoder<R> {
    /// Create a decoder resolving type codes through `registry`.
    pub fn with_registry(registry: R) -> Self {
        Self {
            state: State::AwaitingHeader,
            registry,
        }
    }

    /// The registry used to resolve type codes.
    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Try to extract one record from the front of `buf`.
    ///
    /// Returns:
    /// - `Ok(Some(frame))` if a complete record was extracted
    /// - `Ok(None)` if more data is needed
    /// - `Err(...)` if the record's body failed to decode; its bytes have been
    ///   consumed and the decoder is ready for the next header
    pub fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>> {
        loop {
            match self.state {
                State::AwaitingHeader => {
                    if buf.len() < HEADER_SIZE {
                        return Ok(None);
                    }

                    let mut raw = [0u8; HEADER_SIZE];
                    raw.copy_from_slice(&buf[..HEADER_SIZE]);
                    buf.advance(HEADER_SIZE);

                    let header = Header::decode(&raw);
                    if header.version != VERSION {
                        tracing::debug!(
                            "Record header with version {} (request {})",
                            header.version,
                            header.request_id
                        );
                    }

                    self.state = State::AwaitingBody { header };
                }

                State::AwaitingBody { header } => {
                    if buf.len() < header.body_and_padding() {
                        return Ok(None);
                    }

                    let body = buf.split_to(header.content_length as usize).freeze();
                    buf.advance(header.padding_length as usize);

                    // Reset before decoding so a bad body leaves the stream in sync.
                    self.state = State::AwaitingHeader;

                    let record = self.registry.decode(header.record_type, body)?;
                    return Ok(Some(Frame::new(header.request_id, record)));
                }
            }
        }
    }

    /// Like [`decode`](Self::decode), for when the transport has closed.
    ///
    /// Fails with [`FcgiError::PrematureEof`] if a header has been parsed but
    /// its body never fully arrived. A trailing partial header is discarded.
    pub fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>> {
        if let Some(frame) = self.decode(buf)? {
            return Ok(Some(frame));
        }

        match self.state {
            State::AwaitingBody { header } => {
                let buffered = buf.len();
                buf.clear();
                self.state = State::AwaitingHeader;
                Err(FcgiError::PrematureEof {
                    buffered,
                    expected: header.body_and_padding(),
                })
            }
            State::AwaitingHeader => {
                if !buf.is_empty() {
                    tracing::warn!(
                        "Discarding {} bytes of partial record header at end of stream",
                        buf.len()
                    );
                    buf.clear();
                }
                Ok(None)
            }
        }
    }

    /// Whether a header has been parsed and its body is still outstanding.
    #[inline]
    pub fn is_awaiting_body(&self) -> bool {
        matches!(self.state, State::AwaitingBody { .. })
    }

    /// Header of the record currently being received, if any.
    pub fn pending_header(&self) -> Option<&Header> {
        match &self.state {
            State::AwaitingBody { header } => Some(header),
            State::AwaitingHeader => None,
        }
    }

    /// Forget any parsed header.
    pub fn reset(&mut self) {
        self.state = State::AwaitingHeader;
    }
}

/// Buffer for accumulating incoming bytes and extracting complete records.
///
/// Uses a state machine to handle partial reads efficiently.
/// All data is stored in a single `BytesMut` buffer to minimize allocations.
/// One `RecordBuffer` per connection; registries may be shared.
pub struct RecordBuffer<R = StandardRegistry> {
    /// Accumulated bytes from transport reads.
    buffer: BytesMut,
    /// Parsing state.
    decoder: RecordDecoder<R>,
    /// Decode error held back so records completed before it are delivered first.
    deferred_error: Option<FcgiError>,
    /// Set once the transport has closed; later input is ignored.
    closed: bool,
}

impl RecordBuffer<StandardRegistry> {
    /// Create a new record buffer with default settings.
    ///
    /// Default capacity: 64KB, standard registry.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_CAPACITY)
    }

    /// Create a new record buffer with custom initial capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_registry(capacity, StandardRegistry)
    }
}

impl Default for RecordBuffer<StandardRegistry> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RecordRegistry> RecordBuffer<R> {
    /// Create a new record buffer resolving type codes through `registry`.
    pub fn with_registry(registry: R) -> Self {
        Self::with_capacity_and_registry(DEFAULT_BUFFER_CAPACITY, registry)
    }

    /// Create a new record buffer with custom capacity and registry.
    pub fn with_capacity_and_registry(capacity: usize, registry: R) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
            decoder: RecordDecoder::with_registry(registry),
            deferred_error: None,
            closed: false,
        }
    }

    /// Push data into the buffer and extract all complete records.
    ///
    /// This is the main API for processing incoming data from the transport.
    /// Returns records in arrival order. If data is fragmented, partial data
    /// is buffered internally for the next push.
    ///
    /// # Errors
    ///
    /// Processing stops at the first record whose body fails to decode. If
    /// records completed before it in the same call, they are returned and the
    /// error is reported by the next call instead. Bytes after the failed
    /// record stay buffered and are processed by the next call.
    ///
    /// After [`close`](Self::close), data is ignored.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Frame>> {
        if self.closed {
            tracing::trace!("Ignoring {} bytes received after close", data.len());
            return Ok(Vec::new());
        }

        // Single allocation to add data to buffer
        self.buffer.extend_from_slice(data);
        self.drain()
    }

    /// Append data to the buffer without extracting records.
    ///
    /// Pair with [`next_record`](Self::next_record).
    pub fn extend(&mut self, data: &[u8]) {
        if self.closed {
            return;
        }
        self.buffer.extend_from_slice(data);
    }

    /// Extract the next complete record, if one is buffered.
    pub fn next_record(&mut self) -> Result<Option<Frame>> {
        if let Some(err) = self.deferred_error.take() {
            return Err(err);
        }
        self.decoder.decode(&mut self.buffer)
    }

    /// Mark the transport closed. Later `push`/`extend` calls are ignored.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Close and extract any records still buffered.
    ///
    /// If a fault follows records that did decode, those records are returned
    /// and the fault comes from the next `finish` or `next_record` call.
    ///
    /// # Errors
    ///
    /// - [`FcgiError::PrematureEof`] if a record's body was still outstanding
    /// - a decode fault, if it is the first thing left in the buffer
    pub fn finish(&mut self) -> Result<Vec<Frame>> {
        self.closed = true;
        let mut frames = self.drain()?;

        // A fault behind delivered records stays deferred for the next call
        if self.deferred_error.is_some() {
            return Ok(frames);
        }
        match self.decoder.decode_eof(&mut self.buffer) {
            Ok(Some(frame)) => frames.push(frame),
            Ok(None) => {}
            Err(err) if frames.is_empty() => return Err(err),
            Err(err) => self.deferred_error = Some(err),
        }
        Ok(frames)
    }

    /// Extract records until more data is needed or a decode fails.
    fn drain(&mut self) -> Result<Vec<Frame>> {
        let mut frames = Vec::new();

        loop {
            match self.next_record() {
                Ok(Some(frame)) => frames.push(frame),
                Ok(None) => return Ok(frames),
                Err(err) if frames.is_empty() => return Err(err),
                Err(err) => {
                    self.deferred_error = Some(err);
                    return Ok(frames);
                }
            }
        }
    }

    /// Get the number of buffered, unconsumed bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Whether a header has been parsed and its body is still outstanding.
    pub fn is_awaiting_body(&self) -> bool {
        self.decoder.is_awaiting_body()
    }

    /// Whether [`close`](Self::close) or [`finish`](Self::finish) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The registry used to resolve type codes.
    pub fn registry(&self) -> &R {
        self.decoder.registry()
    }

    /// Clear the buffer and reset state.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.decoder.reset();
        self.deferred_error = None;
    }

    /// Get the current state for debugging.
    #[cfg(test)]
    fn state_name(&self) -> &'static str {
        if self.decoder.is_awaiting_body() {
            "AwaitingBody"
        } else {
            "AwaitingHeader"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{
        build_frame, PaddingStrategy, PermissiveRegistry, ProtocolStatus, Record, Role,
    };

    /// Helper to create a valid record as bytes.
    fn make_record_bytes(request_id: u16, record: &Record) -> Vec<u8> {
        build_frame(request_id, record, PaddingStrategy::Legacy)
            .unwrap()
            .to_vec()
    }

    /// Hand-built frame with an arbitrary type byte.
    fn raw_frame(record_type: u8, request_id: u16, body: &[u8], padding: u8) -> Vec<u8> {
        let header = Header::new(record_type, request_id, body.len() as u16, padding);
        let mut bytes = header.encode().to_vec();
        bytes.extend_from_slice(body);
        bytes.extend(std::iter::repeat(0u8).take(padding as usize));
        bytes
    }

    #[test]
    fn test_single_complete_record() {
        let mut buffer = RecordBuffer::new();
        let bytes = make_record_bytes(42, &Record::std_out("hello"));

        let frames = buffer.push(&bytes).unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].request_id, 42);
        assert_eq!(frames[0].record, Record::std_out("hello"));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_multiple_records_in_one_push() {
        let mut buffer = RecordBuffer::new();

        let mut combined = Vec::new();
        combined.extend(make_record_bytes(1, &Record::begin_request(Role::Responder, true)));
        combined.extend(make_record_bytes(1, &Record::params([("Test", "Value")])));
        combined.extend(make_record_bytes(1, &Record::std_in("")));

        let frames = buffer.push(&combined).unwrap();

        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].record, Record::begin_request(Role::Responder, true));
        assert_eq!(frames[1].record, Record::params([("Test", "Value")]));
        assert_eq!(frames[2].record, Record::std_in(""));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_fragmented_header() {
        let mut buffer = RecordBuffer::new();
        let bytes = make_record_bytes(42, &Record::std_out("test"));

        // Push first 5 bytes of header
        let frames = buffer.push(&bytes[..5]).unwrap();
        assert!(frames.is_empty());
        assert_eq!(buffer.state_name(), "AwaitingHeader");

        // Push rest of header and body
        let frames = buffer.push(&bytes[5..]).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].request_id, 42);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_fragmented_body() {
        let mut buffer = RecordBuffer::new();
        let payload = b"this is a longer payload that will be fragmented";
        let bytes = make_record_bytes(42, &Record::std_in(&payload[..]));

        // Push header + partial body
        let partial_len = HEADER_SIZE + 10;
        let frames = buffer.push(&bytes[..partial_len]).unwrap();
        assert!(frames.is_empty());
        assert_eq!(buffer.state_name(), "AwaitingBody");

        // Push rest of body
        let frames = buffer.push(&bytes[partial_len..]).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].record.payload().unwrap(), &payload[..]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_waits_for_padding() {
        let mut buffer = RecordBuffer::new();
        // 11-byte body, 3 bytes padding
        let bytes = make_record_bytes(1, &Record::params([("Test", "Value")]));
        assert_eq!(bytes.len(), 8 + 11 + 3);

        // Body complete, padding missing
        let frames = buffer.push(&bytes[..8 + 11 + 2]).unwrap();
        assert!(frames.is_empty());
        assert_eq!(buffer.state_name(), "AwaitingBody");

        let frames = buffer.push(&bytes[8 + 11 + 2..]).unwrap();
        assert_eq!(frames.len(), 1);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_padding_skipped_unread() {
        let mut buffer = RecordBuffer::new();
        let mut bytes = raw_frame(6, 9, b"abc", 5);
        // Non-zero padding must be ignored
        let len = bytes.len();
        bytes[len - 1] = 0xEE;
        bytes.extend(raw_frame(6, 9, b"", 0));

        let frames = buffer.push(&bytes).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].record, Record::std_out("abc"));
        assert_eq!(frames[1].record, Record::std_out(""));
    }

    #[test]
    fn test_empty_body() {
        let mut buffer = RecordBuffer::new();
        let bytes = make_record_bytes(42, &Record::AbortRequest);

        let frames = buffer.push(&bytes).unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].record, Record::AbortRequest);
    }

    #[test]
    fn test_large_body() {
        let mut buffer = RecordBuffer::new();
        let payload = vec![0xAB; 65535];
        let bytes = make_record_bytes(42, &Record::std_out(payload.clone()));

        let frames = buffer.push(&bytes).unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].record.payload().unwrap().len(), 65535);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_unknown_type_is_error() {
        let mut buffer = RecordBuffer::new();
        let bytes = raw_frame(42, 1, &[0; 8], 0);

        let result = buffer.push(&bytes);
        assert!(matches!(result, Err(FcgiError::UnknownRecordType(42))));
        // Record consumed; buffer back in sync
        assert!(buffer.is_empty());
        assert_eq!(buffer.state_name(), "AwaitingHeader");
    }

    #[test]
    fn test_permissive_registry_substitutes_unknown_type() {
        let mut buffer = RecordBuffer::with_registry(PermissiveRegistry::default());
        let bytes = raw_frame(42, 0, &[1, 2, 3], 0);

        let frames = buffer.push(&bytes).unwrap();
        assert_eq!(frames[0].record, Record::unknown_type(42));
    }

    #[test]
    fn test_error_stops_chunk_and_keeps_earlier_records() {
        let mut buffer = RecordBuffer::new();

        let mut data = make_record_bytes(1, &Record::std_out("first"));
        data.extend(raw_frame(4, 1, &[0x04, 0x05, b'T'], 0)); // truncated pair
        data.extend(make_record_bytes(1, &Record::std_out("after")));

        // Record before the fault is delivered
        let frames = buffer.push(&data).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].record, Record::std_out("first"));
        // Remaining bytes were not processed
        assert!(!buffer.is_empty());

        // Fault surfaces on the next call
        let result = buffer.push(&[]);
        assert!(matches!(result, Err(FcgiError::MalformedPair { .. })));

        // Stream continues after the fault
        let frames = buffer.push(&[]).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].record, Record::std_out("after"));
    }

    #[test]
    fn test_finish_keeps_records_before_error() {
        let mut buffer = RecordBuffer::new();

        let mut data = make_record_bytes(1, &Record::std_out("first"));
        data.extend(raw_frame(4, 1, &[0x04, 0x05, b'T'], 0)); // truncated pair
        data.extend(make_record_bytes(1, &Record::std_out("after")));
        buffer.extend(&data);

        let frames = buffer.finish().unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].record, Record::std_out("first"));

        let result = buffer.finish();
        assert!(matches!(result, Err(FcgiError::MalformedPair { .. })));

        let frames = buffer.finish().unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].record, Record::std_out("after"));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_finish_keeps_records_before_premature_eof() {
        let mut buffer = RecordBuffer::new();

        let mut data = make_record_bytes(1, &Record::std_out("first"));
        let second = make_record_bytes(1, &Record::std_out("second"));
        data.extend_from_slice(&second[..10]);
        buffer.extend(&data);

        let frames = buffer.finish().unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].record, Record::std_out("first"));

        let result = buffer.finish();
        assert!(matches!(result, Err(FcgiError::PrematureEof { buffered: 2, .. })));
        assert!(buffer.finish().unwrap().is_empty());
    }

    #[test]
    fn test_clear_resets_state() {
        let mut buffer = RecordBuffer::new();

        // Push partial header (not complete)
        let bytes = make_record_bytes(1, &Record::std_out("test"));
        buffer.push(&bytes[..5]).unwrap();

        assert_eq!(buffer.state_name(), "AwaitingHeader");
        assert!(!buffer.is_empty());
        assert_eq!(buffer.len(), 5);

        // Push rest of header to transition to AwaitingBody
        buffer.push(&bytes[5..HEADER_SIZE]).unwrap();
        assert_eq!(buffer.state_name(), "AwaitingBody");

        buffer.clear();

        assert_eq!(buffer.state_name(), "AwaitingHeader");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_mixed_complete_and_partial() {
        let mut buffer = RecordBuffer::new();

        let first = make_record_bytes(1, &Record::std_out("first"));
        let second = make_record_bytes(2, &Record::end_request(0, ProtocolStatus::RequestComplete));

        // Push first complete record + partial second
        let mut data = first.clone();
        data.extend_from_slice(&second[..5]);

        let frames = buffer.push(&data).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].request_id, 1);
        assert_eq!(buffer.state_name(), "AwaitingHeader");

        // Complete second record
        let frames = buffer.push(&second[5..]).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].request_id, 2);
    }

    #[test]
    fn test_byte_at_a_time() {
        let mut buffer = RecordBuffer::new();
        let bytes = make_record_bytes(42, &Record::params([("Test", "Value")]));

        let mut all_frames = Vec::new();

        for byte in &bytes {
            let frames = buffer.push(&[*byte]).unwrap();
            all_frames.extend(frames);
        }

        assert_eq!(all_frames.len(), 1);
        assert_eq!(all_frames[0].request_id, 42);
        assert_eq!(all_frames[0].record, Record::params([("Test", "Value")]));
    }

    #[test]
    fn test_extend_then_next_record() {
        let mut buffer = RecordBuffer::new();
        buffer.extend(&make_record_bytes(3, &Record::std_err("oops")));
        buffer.extend(&make_record_bytes(3, &Record::std_err("")));

        assert_eq!(buffer.next_record().unwrap().unwrap().record, Record::std_err("oops"));
        assert_eq!(buffer.next_record().unwrap().unwrap().record, Record::std_err(""));
        assert!(buffer.next_record().unwrap().is_none());
    }

    #[test]
    fn test_finish_mid_body_is_premature_eof() {
        let mut buffer = RecordBuffer::new();
        let bytes = make_record_bytes(1, &Record::std_out("truncated"));
        buffer.push(&bytes[..HEADER_SIZE + 3]).unwrap();

        let err = buffer.finish().unwrap_err();
        assert!(matches!(
            err,
            FcgiError::PrematureEof {
                buffered: 3,
                expected: 10
            }
        ));
    }

    #[test]
    fn test_finish_with_partial_header_is_clean() {
        let mut buffer = RecordBuffer::new();
        buffer.push(&[1, 6, 0]).unwrap();

        let frames = buffer.finish().unwrap();
        assert!(frames.is_empty());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_finish_drains_buffered_records() {
        let mut buffer = RecordBuffer::new();
        buffer.extend(&make_record_bytes(1, &Record::AbortRequest));

        let frames = buffer.finish().unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].record, Record::AbortRequest);
    }

    #[test]
    fn test_data_after_close_ignored() {
        let mut buffer = RecordBuffer::new();
        buffer.close();
        assert!(buffer.is_closed());

        let frames = buffer.push(&make_record_bytes(1, &Record::AbortRequest)).unwrap();
        assert!(frames.is_empty());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_decoder_against_external_buffer() {
        let mut decoder = RecordDecoder::new();
        let mut buf = BytesMut::from(&make_record_bytes(8, &Record::data("abc"))[..]);

        let frame = decoder.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame, Frame::new(8, Record::data("abc")));
        assert!(decoder.decode(&mut buf).unwrap().is_none());
        assert!(decoder.pending_header().is_none());
    }

    #[test]
    fn test_decoder_pending_header_persists() {
        let mut decoder = RecordDecoder::new();
        let bytes = make_record_bytes(8, &Record::data("abcdef"));
        let mut buf = BytesMut::from(&bytes[..HEADER_SIZE + 1]);

        assert!(decoder.decode(&mut buf).unwrap().is_none());
        let header = decoder.pending_header().unwrap();
        assert_eq!(header.request_id, 8);
        assert_eq!(header.content_length, 6);

        buf.extend_from_slice(&bytes[HEADER_SIZE + 1..]);
        assert!(decoder.decode(&mut buf).unwrap().is_some());
        assert!(!decoder.is_awaiting_body());
    }
}
