//! Core type definitions for the registry.

use modelkit_proto::Value;
use serde::{Deserialize, Serialize};

/// Data type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// Boolean value.
    Boolean,
    /// 64-bit signed integer.
    Integer,
    /// 64-bit floating point.
    Float,
    /// Short text.
    Char,
    /// Long text.
    Text,
    /// Date/time (microseconds since Unix epoch).
    DateTime,
    /// Foreign key to one record of the target model.
    Many2One,
    /// Unique foreign key to one record of the target model.
    One2One,
    /// Records of the target model whose reverse key points here.
    One2Many,
    /// The record of the target model whose unique reverse key points here.
    Rev2One,
}

impl FieldType {
    /// Whether the field points at records of another model.
    pub fn is_relational(&self) -> bool {
        matches!(
            self,
            FieldType::Many2One | FieldType::One2One | FieldType::One2Many | FieldType::Rev2One
        )
    }

    /// Whether the field stores a foreign key column on this model.
    pub fn is_foreign_key(&self) -> bool {
        matches!(self, FieldType::Many2One | FieldType::One2One)
    }

    /// Whether the field is the inverse side of a foreign key on another model.
    pub fn is_reverse(&self) -> bool {
        matches!(self, FieldType::One2Many | FieldType::Rev2One)
    }

    /// Check whether a value can be stored in a field of this type.
    ///
    /// Null is accepted by every type.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (FieldType::Boolean, Value::Bool(_)) => true,
            (FieldType::Integer, Value::Integer(_)) => true,
            (FieldType::Float, Value::Float(_) | Value::Integer(_)) => true,
            (FieldType::Char | FieldType::Text, Value::Text(_)) => true,
            (FieldType::DateTime, Value::Timestamp(_)) => true,
            (FieldType::Many2One | FieldType::One2One, Value::Integer(_)) => true,
            (FieldType::Many2One | FieldType::One2One, Value::Relation(ids)) => ids.len() <= 1,
            (FieldType::One2Many, Value::Relation(_)) => true,
            (FieldType::Rev2One, Value::Relation(ids)) => ids.len() <= 1,
            _ => false,
        }
    }
}
