//! Protocol module - wire format, record bodies, and framing.
//!
//! This module implements the binary record protocol:
//! - 8-byte header encoding/decoding
//! - Name/value pair lists
//! - The eleven record types and the registry that resolves them
//! - Record framer for accumulating partial reads
//! - Frame struct and outgoing frame construction

mod frame;
mod name_value;
mod record;
mod record_buffer;
mod registry;
mod wire_format;

pub use frame::{build_frame, encode_frame_into, frame_header, Frame};
pub use name_value::{
    decode_pairs, encode_pairs, pairs_size, NameValuePair, MAX_PAIR_LENGTH, MAX_SHORT_LENGTH,
};
pub use record::{
    flags, BeginRequest, EndRequest, ProtocolStatus, Record, Role, UnknownType,
};
pub use record_buffer::{RecordBuffer, RecordDecoder, DEFAULT_BUFFER_CAPACITY};
pub use registry::{PermissiveRegistry, RecordRegistry, StandardRegistry};
pub use wire_format::{
    decode_header, encode_header, Header, PaddingStrategy, RecordType, HEADER_SIZE,
    MAX_CONTENT_LENGTH, NULL_REQUEST_ID, VERSION,
};
