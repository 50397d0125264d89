//! Materialized field values.

use std::collections::BTreeMap;

use modelkit_proto::Value;

use super::RecordCollection;

/// Value of one field of one record.
#[derive(Debug, Clone)]
pub enum FieldValue {
    /// Scalar value.
    Value(Value),
    /// Linked records of a relational field, bound to the reader's
    /// environment.
    Records(RecordCollection),
}

impl FieldValue {
    /// The scalar value, if this is not a relational field.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            FieldValue::Value(v) => Some(v),
            FieldValue::Records(_) => None,
        }
    }

    /// The linked records, if this is a relational field.
    pub fn as_records(&self) -> Option<&RecordCollection> {
        match self {
            FieldValue::Records(records) => Some(records),
            FieldValue::Value(_) => None,
        }
    }

    /// Check whether this is a relational value.
    pub fn is_records(&self) -> bool {
        matches!(self, FieldValue::Records(_))
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        FieldValue::Value(value)
    }
}

impl From<RecordCollection> for FieldValue {
    fn from(records: RecordCollection) -> Self {
        FieldValue::Records(records)
    }
}

/// Field values of one record, keyed by wire name.
pub type FieldMap = BTreeMap<String, FieldValue>;
