//! Codec module - `tokio_util` adapters for the record framer.
//!
//! [`RecordCodec`] plugs the framer into `tokio_util::codec::Framed`, so a
//! connection becomes a `Stream` of decoded frames and a `Sink` of frames to
//! write.
//!
//! # Example
//!
//! ```
//! use bytes::BytesMut;
//! use fcgi_wire::codec::RecordCodec;
//! use fcgi_wire::protocol::{Frame, Record};
//! use tokio_util::codec::{Decoder, Encoder};
//!
//! let mut codec = RecordCodec::new();
//! let mut buf = BytesMut::new();
//! codec.encode(Frame::new(1, Record::std_in("body")), &mut buf).unwrap();
//!
//! let frame = codec.decode(&mut buf).unwrap().unwrap();
//! assert_eq!(frame.record, Record::std_in("body"));
//! ```

mod record_codec;

pub use record_codec::RecordCodec;
