//! Record registry: resolves a header type byte to the variant that decodes it.
//!
//! The standard registry knows the eleven protocol types and rejects anything
//! else with [`FcgiError::UnknownRecordType`]. Callers that prefer to answer
//! unknown types instead of failing wrap it in [`PermissiveRegistry`].
//!
//! Registries are stateless and shared read-only across framers.
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use fcgi_wire::protocol::{PermissiveRegistry, Record, RecordRegistry, StandardRegistry};
//!
//! assert!(StandardRegistry.decode(42, Bytes::new()).is_err());
//!
//! let permissive = PermissiveRegistry::default();
//! let record = permissive.decode(42, Bytes::new()).unwrap();
//! assert_eq!(record, Record::unknown_type(42));
//! ```

use bytes::Bytes;

use super::record::{BeginRequest, EndRequest, Record, UnknownType};
use super::wire_format::RecordType;
use crate::error::{FcgiError, Result};

impl RecordType {
    /// Zero-value record of this type, the starting point for decoding.
    pub fn empty_record(self) -> Record {
        match self {
            RecordType::BeginRequest => Record::BeginRequest(BeginRequest::default()),
            RecordType::AbortRequest => Record::AbortRequest,
            RecordType::EndRequest => Record::EndRequest(EndRequest::default()),
            RecordType::Params => Record::Params(Vec::new()),
            RecordType::StdIn => Record::StdIn(Bytes::new()),
            RecordType::StdOut => Record::StdOut(Bytes::new()),
            RecordType::StdErr => Record::StdErr(Bytes::new()),
            RecordType::Data => Record::Data(Bytes::new()),
            RecordType::GetValues => Record::GetValues(Vec::new()),
            RecordType::GetValuesResult => Record::GetValuesResult(Vec::new()),
            RecordType::UnknownType => Record::UnknownType(UnknownType::default()),
        }
    }
}

/// Maps a header type byte to a decoded record.
pub trait RecordRegistry: Send + Sync {
    /// Decode `body` as a record of type `code`.
    fn decode(&self, code: u8, body: Bytes) -> Result<Record>;

    /// Whether `code` resolves to a variant.
    fn resolves(&self, code: u8) -> bool;
}

/// The fixed protocol registry (type codes 1-11).
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardRegistry;

impl RecordRegistry for StandardRegistry {
    fn decode(&self, code: u8, body: Bytes) -> Result<Record> {
        let record_type = RecordType::from_code(code).ok_or(FcgiError::UnknownRecordType(code))?;
        Record::decode_body(record_type, body)
    }

    fn resolves(&self, code: u8) -> bool {
        RecordType::from_code(code).is_some()
    }
}

/// Wraps a registry and substitutes `UnknownType { record_type: code }` for
/// any code the inner registry cannot resolve. The body of such a record is
/// discarded.
#[derive(Debug, Clone, Copy)]
pub struct PermissiveRegistry<R = StandardRegistry> {
    inner: R,
}

impl Default for PermissiveRegistry<StandardRegistry> {
    fn default() -> Self {
        Self::new(StandardRegistry)
    }
}

impl<R: RecordRegistry> PermissiveRegistry<R> {
    /// Wrap `inner`, turning codes it cannot resolve into `UnknownType` records.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// The wrapped registry.
    pub fn inner(&self) -> &R {
        &self.inner
    }
}

impl<R: RecordRegistry> RecordRegistry for PermissiveRegistry<R> {
    fn decode(&self, code: u8, body: Bytes) -> Result<Record> {
        match self.inner.decode(code, body) {
            Err(FcgiError::UnknownRecordType(code)) => Ok(Record::unknown_type(code)),
            other => other,
        }
    }

    fn resolves(&self, _code: u8) -> bool {
        true
    }
}

impl<R: RecordRegistry + ?Sized> RecordRegistry for &R {
    fn decode(&self, code: u8, body: Bytes) -> Result<Record> {
        (**self).decode(code, body)
    }

    fn resolves(&self, code: u8) -> bool {
        (**self).resolves(code)
    }
}

impl<R: RecordRegistry + ?Sized> RecordRegistry for std::sync::Arc<R> {
    fn decode(&self, code: u8, body: Bytes) -> Result<Record> {
        (**self).decode(code, body)
    }

    fn resolves(&self, code: u8) -> bool {
        (**self).resolves(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Role;

    #[test]
    fn test_standard_resolves_all_codes() {
        for code in 1..=11u8 {
            assert!(StandardRegistry.resolves(code));
            let record = StandardRegistry.decode(code, Bytes::new()).unwrap();
            assert_eq!(record.record_type().code(), code);
        }
    }

    #[test]
    fn test_standard_rejects_unknown_codes() {
        for code in [0u8, 12, 200, 255] {
            assert!(!StandardRegistry.resolves(code));
            let err = StandardRegistry.decode(code, Bytes::new()).unwrap_err();
            assert!(matches!(err, FcgiError::UnknownRecordType(c) if c == code));
        }
    }

    #[test]
    fn test_standard_decodes_body() {
        let body = Bytes::from_static(&[0, 1, 1, 0, 0, 0, 0, 0]);
        let record = StandardRegistry.decode(1, body).unwrap();
        assert_eq!(record, Record::begin_request(Role::Responder, true));
    }

    #[test]
    fn test_permissive_substitutes_unknown_type() {
        let registry = PermissiveRegistry::new(StandardRegistry);
        assert!(registry.resolves(99));

        let record = registry.decode(99, Bytes::from_static(b"junk")).unwrap();
        assert_eq!(record, Record::unknown_type(99));
    }

    #[test]
    fn test_permissive_keeps_other_errors() {
        let registry = PermissiveRegistry::default();
        let err = registry
            .decode(4, Bytes::from_static(&[0x04, 0x05, b'T']))
            .unwrap_err();
        assert!(matches!(err, FcgiError::MalformedPair { .. }));
    }

    #[test]
    fn test_shared_registry() {
        let shared = std::sync::Arc::new(StandardRegistry);
        let record = shared.decode(2, Bytes::new()).unwrap();
        assert_eq!(record, Record::AbortRequest);

        let borrowed = &StandardRegistry;
        assert!(borrowed.resolves(11));
    }
}
