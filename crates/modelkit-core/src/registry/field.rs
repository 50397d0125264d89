//! Field definitions for models.

use std::fmt;
use std::sync::Arc;

use modelkit_proto::Value;
use serde::Serialize;

use super::model::ModelDef;
use super::naming::snake_case;
use super::types::FieldType;
use crate::storage::Row;

/// Function computing a non-stored field from the stored row of a record.
pub type ComputeFn = Arc<dyn Fn(&Row) -> Value + Send + Sync>;

/// How a field gets its value.
#[derive(Clone)]
pub enum FieldKind {
    /// Persisted in the record's row.
    Stored,
    /// Computed on read, never stored.
    Computed(ComputeFn),
    /// Alias for a field reached through a dotted path from this model.
    Related {
        /// The aliased path, in programming or wire names.
        path: String,
    },
    /// Inverse side of a foreign key held by the target model.
    Reverse,
}

impl fmt::Debug for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Stored => f.write_str("Stored"),
            FieldKind::Computed(_) => f.write_str("Computed(<fn>)"),
            FieldKind::Related { path } => f.debug_struct("Related").field("path", path).finish(),
            FieldKind::Reverse => f.write_str("Reverse"),
        }
    }
}

/// A field definition within a model.
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Programming name, e.g. `BestPostTitle`.
    pub name: String,
    /// Wire name, e.g. `best_post_title`.
    pub json_name: String,
    /// Field data type.
    pub field_type: FieldType,
    /// How the value is obtained.
    pub kind: FieldKind,
    /// Target model of a relational field.
    pub target_model: Option<String>,
    /// For reverse fields, the foreign key field on the target model.
    pub reverse_fk: Option<String>,
    /// Whether a value must be present at creation.
    pub required: bool,
    /// Value used when none is given at creation.
    pub default: Option<Value>,
    /// Excluded from copies.
    pub sensitive: bool,
    /// Whether `copy()` carries the value over.
    pub copy: bool,
}

impl FieldDef {
    /// Create a stored field of the given type.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        Self {
            json_name: snake_case(&name),
            name,
            field_type,
            kind: FieldKind::Stored,
            target_model: None,
            reverse_fk: None,
            required: false,
            default: None,
            sensitive: false,
            copy: true,
        }
    }

    /// Create a many-to-one foreign key to `target`.
    pub fn many2one(name: impl Into<String>, target: impl Into<String>) -> Self {
        let mut field = Self::new(name, FieldType::Many2One);
        field.target_model = Some(target.into());
        field
    }

    /// Create a unique foreign key to `target`. Not copied.
    pub fn one2one(name: impl Into<String>, target: impl Into<String>) -> Self {
        let mut field = Self::new(name, FieldType::One2One);
        field.target_model = Some(target.into());
        field.copy = false;
        field
    }

    /// Create the inverse of the many-to-one `reverse_fk` on `target`.
    pub fn one2many(
        name: impl Into<String>,
        target: impl Into<String>,
        reverse_fk: impl Into<String>,
    ) -> Self {
        Self::reverse(name, FieldType::One2Many, target, reverse_fk)
    }

    /// Create the inverse of the one-to-one `reverse_fk` on `target`.
    pub fn rev2one(
        name: impl Into<String>,
        target: impl Into<String>,
        reverse_fk: impl Into<String>,
    ) -> Self {
        Self::reverse(name, FieldType::Rev2One, target, reverse_fk)
    }

    fn reverse(
        name: impl Into<String>,
        field_type: FieldType,
        target: impl Into<String>,
        reverse_fk: impl Into<String>,
    ) -> Self {
        let mut field = Self::new(name, field_type);
        field.kind = FieldKind::Reverse;
        field.target_model = Some(target.into());
        field.reverse_fk = Some(reverse_fk.into());
        field.copy = false;
        field
    }

    /// Create an alias for the field at `path`.
    ///
    /// The target model of a relational alias is filled in when the
    /// registry is built.
    pub fn related(name: impl Into<String>, field_type: FieldType, path: impl Into<String>) -> Self {
        let mut field = Self::new(name, field_type);
        field.kind = FieldKind::Related { path: path.into() };
        field.copy = false;
        field
    }

    /// Create a field computed from the record's stored row.
    pub fn computed<F>(name: impl Into<String>, field_type: FieldType, compute: F) -> Self
    where
        F: Fn(&Row) -> Value + Send + Sync + 'static,
    {
        let mut field = Self::new(name, field_type);
        field.kind = FieldKind::Computed(Arc::new(compute));
        field.copy = false;
        field
    }

    /// Override the wire name.
    pub fn with_json_name(mut self, json_name: impl Into<String>) -> Self {
        self.json_name = json_name.into();
        self
    }

    /// Mark as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the default value.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Mark as sensitive; sensitive fields are never copied.
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// Exclude from copies.
    pub fn no_copy(mut self) -> Self {
        self.copy = false;
        self
    }

    /// Whether the value lives in the record's row.
    pub fn is_stored(&self) -> bool {
        matches!(self.kind, FieldKind::Stored)
    }

    /// Check if this is a computed field.
    pub fn is_computed(&self) -> bool {
        matches!(self.kind, FieldKind::Computed(_))
    }

    /// Check if this is an alias for another field.
    pub fn is_related(&self) -> bool {
        matches!(self.kind, FieldKind::Related { .. })
    }

    /// The aliased path of a related field.
    pub fn related_path(&self) -> Option<&str> {
        match &self.kind {
            FieldKind::Related { path } => Some(path),
            _ => None,
        }
    }

    /// Whether `copy()` carries this field over.
    pub fn is_copyable(&self) -> bool {
        self.is_stored() && self.copy && !self.sensitive && !self.field_type.is_reverse()
    }

    /// Whether a name, in programming or wire form, designates this field.
    pub fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.json_name == name
    }

    /// Metadata summary of the field.
    pub fn info(&self) -> FieldInfo {
        FieldInfo {
            name: self.name.clone(),
            json_name: self.json_name.clone(),
            field_type: self.field_type,
            target_model: self.target_model.clone(),
            related: self.related_path().map(str::to_string),
            stored: self.is_stored(),
            readonly: !self.is_stored() || ModelDef::is_automatic(&self.name),
            required: self.required,
            default: self.default.clone(),
        }
    }
}

/// Field metadata reported to callers introspecting a model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldInfo {
    /// Programming name.
    pub name: String,
    /// Wire name.
    pub json_name: String,
    /// Field data type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Target model of a relational field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_model: Option<String>,
    /// Aliased path of a related field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related: Option<String>,
    /// Whether the value lives in the record's row.
    pub stored: bool,
    /// Writes to the field are rejected.
    pub readonly: bool,
    /// Whether a value must be present at creation.
    pub required: bool,
    /// Value used when none is given at creation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}
