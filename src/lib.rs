//! # fcgi-wire
//!
//! FastCGI record framing for tokio.
//!
//! This crate turns the FastCGI byte stream into typed records and back. It
//! does not implement request handling or process management; those layer on
//! top of the frames it produces.
//!
//! ## Layers
//!
//! - [`protocol`]: header, name/value pair and record body codecs, plus the
//!   incremental framer ([`protocol::RecordBuffer`]) that accepts arbitrarily
//!   split chunks and yields `(request_id, record)` frames in arrival order
//! - [`codec`]: [`codec::RecordCodec`] for `tokio_util::codec::Framed`
//! - [`stream`]: async reader, duplex connection helper, reader task
//! - [`writer`]: direct record writer and a batched writer task
//!
//! ## Example
//!
//! ```
//! use fcgi_wire::protocol::{build_frame, PaddingStrategy, Record, RecordBuffer, Role};
//!
//! let mut wire = Vec::new();
//! wire.extend(build_frame(1, &Record::begin_request(Role::Responder, false), PaddingStrategy::Legacy).unwrap());
//! wire.extend(build_frame(1, &Record::params([("REQUEST_METHOD", "GET")]), PaddingStrategy::Legacy).unwrap());
//!
//! let mut buffer = RecordBuffer::new();
//! let mut frames = buffer.push(&wire[..7]).unwrap();
//! frames.extend(buffer.push(&wire[7..]).unwrap());
//!
//! assert_eq!(frames.len(), 2);
//! assert_eq!(frames[1].record.pairs().unwrap()[0].value_str(), Some("GET"));
//! ```

pub mod backpressure;
pub mod codec;
pub mod error;
pub mod protocol;
pub mod stream;
pub mod writer;

pub use error::{FcgiError, Result};
pub use protocol::{Frame, Record, RecordType};
pub use stream::{spawn_reader_task, FcgiStream, RecordReader, StreamConfig};
pub use writer::{spawn_writer_task, RecordWriter, WriterConfig, WriterHandle};
