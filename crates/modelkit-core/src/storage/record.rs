//! Record type for stored values.

use std::collections::BTreeMap;

use modelkit_proto::Value;
use rkyv::{Archive, Deserialize, Serialize};

use crate::error::Error;

/// Stored column values of one record, keyed by wire name.
pub type Row = BTreeMap<String, Value>;

/// A stored record.
#[derive(Debug, Clone, PartialEq, Default, Archive, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Column values keyed by wire name.
    pub fields: Row,
}

impl StoredRecord {
    /// Wrap a row.
    pub fn new(fields: Row) -> Self {
        Self { fields }
    }

    /// Serialize the record to bytes using rkyv.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map(|v| v.to_vec())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize a record from bytes using rkyv.
    ///
    /// Bytes coming out of sled carry no alignment guarantee, so they are
    /// copied into an aligned buffer first.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let mut aligned = rkyv::util::AlignedVec::<16>::with_capacity(bytes.len());
        aligned.extend_from_slice(bytes);
        rkyv::from_bytes::<Self, rkyv::rancor::Error>(&aligned)
            .map_err(|e| Error::Deserialization(e.to_string()))
    }
}
