//! Error types for fcgi-wire.

use thiserror::Error;

/// Main error type for all record framing and I/O operations.
#[derive(Debug, Error)]
pub enum FcgiError {
    /// I/O error while reading from the transport.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A name/value pair list ran past the end of its record body.
    #[error(
        "Malformed name/value pair: need {needed} bytes at offset {offset}, body has {available}"
    )]
    MalformedPair {
        /// Offset in the body where the read started.
        offset: usize,
        /// Bytes the read required.
        needed: usize,
        /// Total body length.
        available: usize,
    },

    /// Header type code not known to the record registry.
    #[error("Unknown record type: {0}")]
    UnknownRecordType(u8),

    /// A fixed-size record body was shorter than its fields.
    #[error("Malformed body for record type {record_type}: expected {expected} bytes, got {actual}")]
    MalformedBody {
        /// Type code of the offending record.
        record_type: u8,
        /// Bytes the variant needs to decode its fields.
        expected: usize,
        /// Bytes actually present.
        actual: usize,
    },

    /// Record body does not fit the 16-bit content length field.
    #[error("Record body of {size} bytes exceeds maximum content length 65535")]
    RecordTooLarge {
        /// Encoded body size.
        size: usize,
    },

    /// The transport rejected or failed a write.
    #[error("Transport write failed: {0}")]
    TransportWrite(#[source] std::io::Error),

    /// Transport closed while a record body was still being received.
    #[error("Transport closed mid-record: {buffered} of {expected} body bytes received")]
    PrematureEof {
        /// Body and padding bytes received before the close.
        buffered: usize,
        /// Body and padding bytes announced by the header.
        expected: usize,
    },

    /// Connection closed (writer task or reader channel gone).
    #[error("Connection closed")]
    ConnectionClosed,

    /// Backpressure timeout - write queue full.
    #[error("Backpressure timeout")]
    BackpressureTimeout,
}

impl FcgiError {
    /// Whether this error came from decoding record content, as opposed to
    /// the transport. The stream is still in sync after a decode error.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            FcgiError::MalformedPair { .. }
                | FcgiError::UnknownRecordType(_)
                | FcgiError::MalformedBody { .. }
        )
    }
}

/// Result type alias using FcgiError.
pub type Result<T> = std::result::Result<T, FcgiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_classification() {
        assert!(FcgiError::UnknownRecordType(42).is_decode_error());
        assert!(FcgiError::MalformedPair {
            offset: 0,
            needed: 4,
            available: 2
        }
        .is_decode_error());
        assert!(!FcgiError::ConnectionClosed.is_decode_error());
        assert!(!FcgiError::PrematureEof {
            buffered: 1,
            expected: 8
        }
        .is_decode_error());
    }

    #[test]
    fn test_error_messages() {
        let err = FcgiError::UnknownRecordType(99);
        assert_eq!(err.to_string(), "Unknown record type: 99");

        let err = FcgiError::RecordTooLarge { size: 70_000 };
        assert!(err.to_string().contains("70000"));
    }
}
