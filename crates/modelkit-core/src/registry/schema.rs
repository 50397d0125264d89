//! JSON schema files describing models for tooling.

use std::path::Path;

use modelkit_proto::Value;
use serde::Deserialize;

use super::field::FieldDef;
use super::model::ModelDef;
use super::registry::{Registry, RegistryBuilder};
use super::types::FieldType;
use crate::error::{Error, Result};

/// A set of model definitions loaded from JSON.
///
/// ```json
/// {
///   "models": [
///     {
///       "name": "Tag",
///       "fields": [
///         {"name": "Name", "type": "Char", "required": true},
///         {"name": "Parent", "type": "Many2One", "target": "Tag"},
///         {"name": "ParentName", "type": "Char", "related": "Parent.Name"}
///       ]
///     }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaFile {
    /// Model definitions.
    #[serde(default)]
    pub models: Vec<ModelSchema>,
    /// Bound on related-field substitutions, when overriding the default.
    #[serde(default)]
    pub max_alias_depth: Option<usize>,
}

/// One model of a schema file.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelSchema {
    /// Model name.
    pub name: String,
    /// Explicit parent link for recursion checks.
    #[serde(default)]
    pub parent_field: Option<String>,
    /// Field definitions; the identity field is implicit.
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

/// One field of a schema file.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldSchema {
    /// Programming name.
    pub name: String,
    /// Data type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Wire name override.
    #[serde(default)]
    pub json_name: Option<String>,
    /// Target model of relational fields.
    #[serde(default)]
    pub target: Option<String>,
    /// Foreign key on the target model, for reverse fields.
    #[serde(default)]
    pub reverse_fk: Option<String>,
    /// Aliased path, for related fields.
    #[serde(default)]
    pub related: Option<String>,
    /// Computed fields read as null outside the program defining them.
    #[serde(default)]
    pub computed: bool,
    /// Records cannot be created or written without a value.
    #[serde(default)]
    pub required: bool,
    /// Scalar value given to new records that omit the field.
    #[serde(default)]
    pub default: Option<serde_json::Value>,
    /// Sensitive fields are never copied.
    #[serde(default)]
    pub sensitive: bool,
    /// Whether `copy` carries the field over; stored fields default to yes.
    #[serde(default)]
    pub copy: Option<bool>,
}

impl SchemaFile {
    /// Parse a schema from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Deserialization(e.to_string()))
    }

    /// Load a schema from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Convert into a registry builder.
    pub fn into_builder(self) -> Result<RegistryBuilder> {
        let mut builder = Registry::builder();
        if let Some(depth) = self.max_alias_depth {
            builder = builder.with_max_alias_depth(depth);
        }
        for model in self.models {
            builder.add_model(model.into_model()?);
        }
        Ok(builder)
    }

    /// Build and validate the registry.
    pub fn build(self) -> Result<Registry> {
        self.into_builder()?.build()
    }
}

impl ModelSchema {
    fn into_model(self) -> Result<ModelDef> {
        let mut model = ModelDef::new(&self.name);
        for field in self.fields {
            model = model.with_field(field.into_field(&self.name)?);
        }
        if let Some(parent) = self.parent_field {
            model = model.with_parent_field(parent);
        }
        Ok(model)
    }
}

impl FieldSchema {
    fn into_field(self, model: &str) -> Result<FieldDef> {
        let missing = |what: &str| {
            Error::Configuration(format!("{}.{} needs a '{}' entry", model, self.name, what))
        };

        let mut field = if let Some(path) = &self.related {
            FieldDef::related(&self.name, self.field_type, path)
        } else if self.computed {
            FieldDef::computed(&self.name, self.field_type, |_| Value::Null)
        } else {
            match self.field_type {
                FieldType::Many2One => {
                    FieldDef::many2one(&self.name, self.target.as_deref().ok_or_else(|| missing("target"))?)
                }
                FieldType::One2One => {
                    FieldDef::one2one(&self.name, self.target.as_deref().ok_or_else(|| missing("target"))?)
                }
                FieldType::One2Many => FieldDef::one2many(
                    &self.name,
                    self.target.as_deref().ok_or_else(|| missing("target"))?,
                    self.reverse_fk.as_deref().ok_or_else(|| missing("reverse_fk"))?,
                ),
                FieldType::Rev2One => FieldDef::rev2one(
                    &self.name,
                    self.target.as_deref().ok_or_else(|| missing("target"))?,
                    self.reverse_fk.as_deref().ok_or_else(|| missing("reverse_fk"))?,
                ),
                scalar => FieldDef::new(&self.name, scalar),
            }
        };

        if let Some(json_name) = self.json_name {
            field = field.with_json_name(json_name);
        }
        if self.required {
            field = field.required();
        }
        if let Some(default) = self.default {
            field = field.with_default(value_from_json(default).ok_or_else(|| {
                Error::Configuration(format!("{}.{} has a non-scalar default", model, self.name))
            })?);
        }
        if self.sensitive {
            field = field.sensitive();
        }
        if let Some(copy) = self.copy {
            field.copy = copy;
        }
        Ok(field)
    }
}

/// Convert a scalar JSON value.
pub fn value_from_json(value: serde_json::Value) -> Option<Value> {
    match value {
        serde_json::Value::Null => Some(Value::Null),
        serde_json::Value::Bool(b) => Some(Value::Bool(b)),
        serde_json::Value::Number(n) => n
            .as_i64()
            .map(Value::Integer)
            .or_else(|| n.as_f64().map(Value::Float)),
        serde_json::Value::String(s) => Some(Value::Text(s)),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
    }
}
