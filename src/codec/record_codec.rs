//! `Decoder`/`Encoder` implementation over [`RecordDecoder`].

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::FcgiError;
use crate::protocol::{
    encode_frame_into, Frame, PaddingStrategy, RecordDecoder, RecordRegistry, StandardRegistry,
};

/// Record codec for `tokio_util::codec::Framed`.
///
/// `Framed` stops yielding frames after the first error, so a decode fault
/// ends the stream. Use [`RecordReader`](crate::stream::RecordReader) to keep
/// reading past decode faults.
#[derive(Debug, Clone)]
pub struct RecordCodec<R = StandardRegistry> {
    decoder: RecordDecoder<R>,
    padding: PaddingStrategy,
}

impl RecordCodec<StandardRegistry> {
    /// Standard registry, legacy padding.
    pub fn new() -> Self {
        Self::with_registry(StandardRegistry)
    }
}

impl Default for RecordCodec<StandardRegistry> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RecordRegistry> RecordCodec<R> {
    /// Decode with `registry`, legacy padding.
    pub fn with_registry(registry: R) -> Self {
        Self {
            decoder: RecordDecoder::with_registry(registry),
            padding: PaddingStrategy::default(),
        }
    }

    /// Set the padding used for encoded records.
    pub fn padding(mut self, padding: PaddingStrategy) -> Self {
        self.padding = padding;
        self
    }

    /// Padding used for encoded records.
    pub fn padding_strategy(&self) -> PaddingStrategy {
        self.padding
    }
}

impl<R: RecordRegistry> Decoder for RecordCodec<R> {
    type Item = Frame;
    type Error = FcgiError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, FcgiError> {
        let frame = self.decoder.decode(src)?;
        if let Some(frame) = &frame {
            tracing::trace!(
                "Decoded {} record for request {}",
                frame.record.record_type(),
                frame.request_id
            );
        }
        Ok(frame)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, FcgiError> {
        self.decoder.decode_eof(src)
    }
}

impl<R> Encoder<Frame> for RecordCodec<R> {
    type Error = FcgiError;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), FcgiError> {
        encode_frame_into(frame.request_id, &frame.record, self.padding, dst)
    }
}

impl<R> Encoder<&Frame> for RecordCodec<R> {
    type Error = FcgiError;

    fn encode(&mut self, frame: &Frame, dst: &mut BytesMut) -> Result<(), FcgiError> {
        encode_frame_into(frame.request_id, &frame.record, self.padding, dst)
    }
}
