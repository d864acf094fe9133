//! Record bodies.
//!
//! [`Record`] is a closed sum over the eleven record types. Each variant
//! knows its type code, its encoded body size, and how to encode and decode
//! its body. Stream payloads (`StdIn`, `StdOut`, `StdErr`, `Data`) are opaque
//! bytes; any text encoding is the caller's concern.
//!
//! # Example
//!
//! ```
//! use fcgi_wire::protocol::{Record, RecordType, Role};
//!
//! let begin = Record::begin_request(Role::Responder, true);
//! assert_eq!(begin.record_type(), RecordType::BeginRequest);
//! assert_eq!(begin.size(), 8);
//!
//! let params = Record::params([("Test", "Value")]);
//! assert_eq!(params.size(), 11);
//! ```

use bytes::{BufMut, Bytes};

use super::name_value::{decode_pairs, encode_pairs, pairs_size, NameValuePair};
use super::wire_format::RecordType;
use crate::error::{FcgiError, Result};

/// `BeginRequest` flag constants.
pub mod flags {
    /// Keep the connection open after the request ends.
    pub const KEEP_CONNECTION: u8 = 0b0000_0001;
}

/// Application role requested by `BeginRequest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Role {
    Responder = 1,
    Authorizer = 2,
    Filter = 3,
}

impl TryFrom<u16> for Role {
    type Error = u16;

    fn try_from(value: u16) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(Role::Responder),
            2 => Ok(Role::Authorizer),
            3 => Ok(Role::Filter),
            other => Err(other),
        }
    }
}

/// Protocol-level outcome reported by `EndRequest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ProtocolStatus {
    RequestComplete = 0,
    CantMultiplexConnection = 1,
    Overloaded = 2,
    UnknownRole = 3,
}

impl TryFrom<u8> for ProtocolStatus {
    type Error = u8;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(ProtocolStatus::RequestComplete),
            1 => Ok(ProtocolStatus::CantMultiplexConnection),
            2 => Ok(ProtocolStatus::Overloaded),
            3 => Ok(ProtocolStatus::UnknownRole),
            other => Err(other),
        }
    }
}

/// Check that a fixed-size body carries at least `needed` bytes.
fn require(record_type: RecordType, body: &[u8], needed: usize) -> Result<()> {
    if body.len() < needed {
        return Err(FcgiError::MalformedBody {
            record_type: record_type.code(),
            expected: needed,
            actual: body.len(),
        });
    }
    Ok(())
}

/// `BeginRequest` body: role (u16), flags (u8), 5 reserved bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BeginRequest {
    /// Raw role value. Unknown roles are kept so they can be answered with
    /// [`ProtocolStatus::UnknownRole`].
    pub role: u16,
    /// Flag bits (see [`flags`]).
    pub flags: u8,
}

impl BeginRequest {
    /// Encoded body size.
    pub const SIZE: usize = 8;

    /// Body for `role`, setting the keep-connection flag if asked.
    pub fn new(role: Role, keep_connection: bool) -> Self {
        Self {
            role: role as u16,
            flags: if keep_connection {
                flags::KEEP_CONNECTION
            } else {
                0
            },
        }
    }

    /// The role, if it is one the protocol defines.
    pub fn role(&self) -> Option<Role> {
        Role::try_from(self.role).ok()
    }

    /// Whether the application should keep the connection open after the request.
    #[inline]
    pub fn keep_connection(&self) -> bool {
        self.flags & flags::KEEP_CONNECTION != 0
    }

    fn encode<B: BufMut>(&self, dst: &mut B) {
        dst.put_u16(self.role);
        dst.put_u8(self.flags);
        dst.put_bytes(0, 5);
    }

    fn decode(body: &[u8]) -> Result<Self> {
        require(RecordType::BeginRequest, body, 3)?;
        Ok(Self {
            role: u16::from_be_bytes([body[0], body[1]]),
            flags: body[2],
        })
    }
}

/// `EndRequest` body: app status (u32), protocol status (u8), 3 reserved bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EndRequest {
    /// Application exit status.
    pub app_status: u32,
    /// Raw protocol status (see [`ProtocolStatus`]).
    pub protocol_status: u8,
}

impl EndRequest {
    /// Encoded body size.
    pub const SIZE: usize = 8;

    /// Body carrying the application's exit status and a protocol status.
    pub fn new(app_status: u32, protocol_status: ProtocolStatus) -> Self {
        Self {
            app_status,
            protocol_status: protocol_status as u8,
        }
    }

    /// The protocol status, if it is one the protocol defines.
    pub fn protocol_status(&self) -> Option<ProtocolStatus> {
        ProtocolStatus::try_from(self.protocol_status).ok()
    }

    fn encode<B: BufMut>(&self, dst: &mut B) {
        dst.put_u32(self.app_status);
        dst.put_u8(self.protocol_status);
        dst.put_bytes(0, 3);
    }

    fn decode(body: &[u8]) -> Result<Self> {
        require(RecordType::EndRequest, body, 5)?;
        Ok(Self {
            app_status: u32::from_be_bytes([body[0], body[1], body[2], body[3]]),
            protocol_status: body[4],
        })
    }
}

/// `UnknownType` body: the offending type byte plus 7 reserved bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnknownType {
    /// The record type byte the peer did not understand.
    pub record_type: u8,
}

impl UnknownType {
    /// Encoded body size.
    pub const SIZE: usize = 8;

    /// Reply to a management record of type `record_type`.
    pub fn new(record_type: u8) -> Self {
        Self { record_type }
    }

    fn encode<B: BufMut>(&self, dst: &mut B) {
        dst.put_u8(self.record_type);
        dst.put_bytes(0, 7);
    }

    fn decode(body: &[u8]) -> Result<Self> {
        require(RecordType::UnknownType, body, 1)?;
        Ok(Self {
            record_type: body[0],
        })
    }
}

/// A decoded (or to-be-encoded) record body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    BeginRequest(BeginRequest),
    AbortRequest,
    EndRequest(EndRequest),
    Params(Vec<NameValuePair>),
    StdIn(Bytes),
    StdOut(Bytes),
    StdErr(Bytes),
    Data(Bytes),
    /// Variable names queried; values are normally empty.
    GetValues(Vec<NameValuePair>),
    GetValuesResult(Vec<NameValuePair>),
    UnknownType(UnknownType),
}

impl Record {
    /// `BeginRequest` for `role`. See [`BeginRequest::new`].
    pub fn begin_request(role: Role, keep_connection: bool) -> Self {
        Record::BeginRequest(BeginRequest::new(role, keep_connection))
    }

    /// `EndRequest` with the given statuses.
    pub fn end_request(app_status: u32, protocol_status: ProtocolStatus) -> Self {
        Record::EndRequest(EndRequest::new(app_status, protocol_status))
    }

    /// `Params` from anything convertible to pairs, such as `(&str, &str)`
    /// tuples. Order is kept.
    ///
    /// ```
    /// use fcgi_wire::protocol::Record;
    ///
    /// let record = Record::params([("SCRIPT_NAME", "/index.php")]);
    /// assert_eq!(record.pairs().unwrap().len(), 1);
    /// ```
    pub fn params<I, P>(pairs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<NameValuePair>,
    {
        Record::Params(pairs.into_iter().map(Into::into).collect())
    }

    /// `GetValues` from bare names; each is sent with an empty value.
    pub fn get_values<I, N>(names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Bytes>,
    {
        Record::GetValues(
            names
                .into_iter()
                .map(|name| NameValuePair::name_only(name))
                .collect(),
        )
    }

    /// `GetValuesResult` answering a `GetValues` query.
    pub fn get_values_result<I, P>(pairs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<NameValuePair>,
    {
        Record::GetValuesResult(pairs.into_iter().map(Into::into).collect())
    }

    /// `StdIn` chunk. Empty data marks the end of the stream.
    pub fn std_in(data: impl Into<Bytes>) -> Self {
        Record::StdIn(data.into())
    }

    /// `StdOut` chunk. Empty data marks the end of the stream.
    pub fn std_out(data: impl Into<Bytes>) -> Self {
        Record::StdOut(data.into())
    }

    /// `StdErr` chunk. Empty data marks the end of the stream.
    pub fn std_err(data: impl Into<Bytes>) -> Self {
        Record::StdErr(data.into())
    }

    /// `Data` chunk for the filter role.
    pub fn data(data: impl Into<Bytes>) -> Self {
        Record::Data(data.into())
    }

    /// `UnknownType` reply naming the unrecognised type byte.
    pub fn unknown_type(record_type: u8) -> Self {
        Record::UnknownType(UnknownType::new(record_type))
    }

    /// The type code this record is written with.
    pub fn record_type(&self) -> RecordType {
        match self {
            Record::BeginRequest(_) => RecordType::BeginRequest,
            Record::AbortRequest => RecordType::AbortRequest,
            Record::EndRequest(_) => RecordType::EndRequest,
            Record::Params(_) => RecordType::Params,
            Record::StdIn(_) => RecordType::StdIn,
            Record::StdOut(_) => RecordType::StdOut,
            Record::StdErr(_) => RecordType::StdErr,
            Record::Data(_) => RecordType::Data,
            Record::GetValues(_) => RecordType::GetValues,
            Record::GetValuesResult(_) => RecordType::GetValuesResult,
            Record::UnknownType(_) => RecordType::UnknownType,
        }
    }

    /// Encoded body size in bytes (excluding header and padding).
    pub fn size(&self) -> usize {
        match self {
            Record::BeginRequest(_) => BeginRequest::SIZE,
            Record::AbortRequest => 0,
            Record::EndRequest(_) => EndRequest::SIZE,
            Record::Params(pairs) | Record::GetValues(pairs) | Record::GetValuesResult(pairs) => {
                pairs_size(pairs)
            }
            Record::StdIn(data) | Record::StdOut(data) | Record::StdErr(data) | Record::Data(data) => {
                data.len()
            }
            Record::UnknownType(_) => UnknownType::SIZE,
        }
    }

    /// Encode the body. Writes exactly [`Record::size`] bytes.
    pub fn encode_body<B: BufMut>(&self, dst: &mut B) {
        match self {
            Record::BeginRequest(body) => body.encode(dst),
            Record::AbortRequest => {}
            Record::EndRequest(body) => body.encode(dst),
            Record::Params(pairs) | Record::GetValues(pairs) | Record::GetValuesResult(pairs) => {
                encode_pairs(pairs, dst)
            }
            Record::StdIn(data) | Record::StdOut(data) | Record::StdErr(data) | Record::Data(data) => {
                dst.put_slice(data)
            }
            Record::UnknownType(body) => body.encode(dst),
        }
    }

    /// Decode a body into a fresh instance of `record_type`.
    ///
    /// An empty body yields the variant's zero value. Bytes beyond a
    /// fixed-size variant's fields are reserved and ignored.
    pub fn decode_body(record_type: RecordType, body: Bytes) -> Result<Self> {
        if body.is_empty() {
            return Ok(record_type.empty_record());
        }

        let record = match record_type {
            RecordType::BeginRequest => Record::BeginRequest(BeginRequest::decode(&body)?),
            RecordType::AbortRequest => Record::AbortRequest,
            RecordType::EndRequest => Record::EndRequest(EndRequest::decode(&body)?),
            RecordType::Params => Record::Params(decode_pairs(&body)?),
            RecordType::StdIn => Record::StdIn(body),
            RecordType::StdOut => Record::StdOut(body),
            RecordType::StdErr => Record::StdErr(body),
            RecordType::Data => Record::Data(body),
            RecordType::GetValues => Record::GetValues(decode_pairs(&body)?),
            RecordType::GetValuesResult => Record::GetValuesResult(decode_pairs(&body)?),
            RecordType::UnknownType => Record::UnknownType(UnknownType::decode(&body)?),
        };
        Ok(record)
    }

    /// Name/value pairs carried by `Params`, `GetValues` or `GetValuesResult`.
    pub fn pairs(&self) -> Option<&[NameValuePair]> {
        match self {
            Record::Params(pairs) | Record::GetValues(pairs) | Record::GetValuesResult(pairs) => {
                Some(pairs)
            }
            _ => None,
        }
    }

    /// Payload carried by `StdIn`, `StdOut`, `StdErr` or `Data`.
    pub fn payload(&self) -> Option<&Bytes> {
        match self {
            Record::StdIn(data) | Record::StdOut(data) | Record::StdErr(data) | Record::Data(data) => {
                Some(data)
            }
            _ => None,
        }
    }

    /// An empty stream record marks the end of that stream.
    pub fn is_end_of_stream(&self) -> bool {
        self.payload().is_some_and(Bytes::is_empty)
            || matches!(self, Record::Params(pairs) if pairs.is_empty())
    }
}
