//! Record key encoding.

use std::fmt;

use modelkit_proto::RecordId;

/// Byte separating the model name from the record id in an encoded key.
const MODEL_TERMINATOR: u8 = 0;

/// Size of the encoded record id.
pub const ID_SIZE: usize = 8;

/// Key of a stored record: model name plus record id.
///
/// Key format: `[model name][0x00][id (8 bytes, big-endian)]`
///
/// Big-endian ids keep a prefix scan over one model ordered by id.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    /// Model name.
    pub model: String,
    /// Record identifier.
    pub id: RecordId,
}

impl RecordKey {
    /// Create a new key.
    pub fn new(model: impl Into<String>, id: RecordId) -> Self {
        Self {
            model: model.into(),
            id,
        }
    }

    /// Encode the key to bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Self::model_prefix(&self.model);
        buf.extend_from_slice(&(self.id as u64).to_be_bytes());
        buf
    }

    /// Decode a key from bytes.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < ID_SIZE + 1 {
            return None;
        }
        let split = bytes.len() - ID_SIZE;
        if bytes[split - 1] != MODEL_TERMINATOR {
            return None;
        }
        let model = std::str::from_utf8(&bytes[..split - 1]).ok()?;
        let mut id_bytes = [0u8; ID_SIZE];
        id_bytes.copy_from_slice(&bytes[split..]);

        Some(Self {
            model: model.to_string(),
            id: u64::from_be_bytes(id_bytes) as RecordId,
        })
    }

    /// Prefix shared by every key of a model.
    pub fn model_prefix(model: &str) -> Vec<u8> {
        let mut buf = Vec::with_capacity(model.len() + 1 + ID_SIZE);
        buf.extend_from_slice(model.as_bytes());
        buf.push(MODEL_TERMINATOR);
        buf
    }
}

impl fmt::Debug for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.model, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_roundtrip() {
        let key = RecordKey::new("User", 42);
        let decoded = RecordKey::decode(&key.encode()).unwrap();
        assert_eq!(key, decoded);
    }

    #[test]
    fn test_prefix_isolates_models() {
        let user = RecordKey::new("User", 1).encode();
        let user_tag = RecordKey::new("UserTag", 1).encode();
        let prefix = RecordKey::model_prefix("User");

        assert!(user.starts_with(&prefix));
        assert!(!user_tag.starts_with(&prefix));
    }

    #[test]
    fn test_ids_sort_numerically() {
        let a = RecordKey::new("Tag", 2).encode();
        let b = RecordKey::new("Tag", 256).encode();
        assert!(a < b);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(RecordKey::decode(b"short").is_none());
        assert!(RecordKey::decode(b"Userx12345678").is_none());
    }
}
