//! Model definitions.

use std::collections::{BTreeMap, HashMap};

use modelkit_proto::Value;

use super::field::{FieldDef, FieldInfo};
use super::types::FieldType;

/// Programming name of the implicit identity field.
pub const ID_FIELD: &str = "ID";

/// Wire name of the implicit identity field.
pub const ID_JSON: &str = "id";

/// Creation time, set when a record is created.
pub const CREATE_DATE_FIELD: &str = "CreateDate";

/// Time of the last write, null until the record is first written.
pub const WRITE_DATE_FIELD: &str = "WriteDate";

/// Write time if the record was written, creation time otherwise.
pub const LAST_UPDATE_FIELD: &str = "LastUpdate";

/// Field giving records their display name.
pub const NAME_FIELD: &str = "Name";

/// Field used for parent links when none is configured.
pub const DEFAULT_PARENT_FIELD: &str = "Parent";

/// A model definition: a named set of fields.
///
/// Every model carries an implicit integer `ID` field (wire name `id`) and
/// the audit fields `CreateDate`, `WriteDate` and `LastUpdate`. Fields are
/// found by programming or wire name.
#[derive(Debug, Clone)]
pub struct ModelDef {
    /// Model name (unique within a registry).
    pub name: String,
    fields: Vec<FieldDef>,
    index: HashMap<String, usize>,
    parent_field: Option<String>,
}

impl ModelDef {
    /// Create a new model definition holding only the identity and audit
    /// fields.
    pub fn new(name: impl Into<String>) -> Self {
        let mut model = Self {
            name: name.into(),
            fields: Vec::new(),
            index: HashMap::new(),
            parent_field: None,
        };
        model.insert(FieldDef::new(ID_FIELD, FieldType::Integer).no_copy());
        model.insert(FieldDef::new(CREATE_DATE_FIELD, FieldType::DateTime).no_copy());
        model.insert(FieldDef::new(WRITE_DATE_FIELD, FieldType::DateTime).no_copy());
        model.insert(FieldDef::computed(LAST_UPDATE_FIELD, FieldType::DateTime, |row| {
            match row.get("write_date") {
                Some(written @ Value::Timestamp(_)) => written.clone(),
                _ => row.get("create_date").cloned().unwrap_or_default(),
            }
        }));
        model
    }

    /// Add a field. A field with the same programming name is replaced.
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.insert(field);
        self
    }

    /// Add multiple fields.
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = FieldDef>) -> Self {
        for field in fields {
            self.insert(field);
        }
        self
    }

    /// Use `field` as the parent link checked for recursion.
    pub fn with_parent_field(mut self, field: impl Into<String>) -> Self {
        self.parent_field = Some(field.into());
        self
    }

    fn insert(&mut self, field: FieldDef) {
        match self.fields.iter().position(|f| f.name == field.name) {
            Some(pos) => self.fields[pos] = field,
            None => self.fields.push(field),
        }
        self.reindex();
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (pos, field) in self.fields.iter().enumerate() {
            self.index.entry(field.json_name.clone()).or_insert(pos);
            self.index.insert(field.name.clone(), pos);
        }
    }

    /// Get a field by programming or wire name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.index.get(name).map(|&pos| &self.fields[pos])
    }

    pub(crate) fn field_mut(&mut self, name: &str) -> Option<&mut FieldDef> {
        let pos = *self.index.get(name)?;
        Some(&mut self.fields[pos])
    }

    /// Check if the model has a field with this name.
    pub fn has_field(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// All fields, identity first, in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter()
    }

    /// Metadata of every field, keyed by wire name.
    pub fn fields_get(&self) -> BTreeMap<String, FieldInfo> {
        self.fields
            .iter()
            .map(|f| (f.json_name.clone(), f.info()))
            .collect()
    }

    /// Fields the caller sets, in declaration order.
    pub fn declared_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| !Self::is_automatic(&f.name))
    }

    /// Fields whose value lives in the stored row.
    pub fn stored_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields
            .iter()
            .filter(|f| f.is_stored() && f.name != ID_FIELD)
    }

    /// The parent link used by recursion checks, if the model has one.
    ///
    /// Without explicit configuration this is the field named `Parent`, when
    /// it is a foreign key to this model.
    pub fn parent_field(&self) -> Option<&FieldDef> {
        match &self.parent_field {
            Some(name) => self.field(name),
            None => self.field(DEFAULT_PARENT_FIELD).filter(|f| {
                f.field_type.is_foreign_key() && f.target_model.as_deref() == Some(self.name.as_str())
            }),
        }
    }

    /// The configured parent link name, if any.
    pub(crate) fn parent_field_name(&self) -> Option<&str> {
        self.parent_field.as_deref()
    }

    /// Check whether `name` designates the identity field.
    pub fn is_id(name: &str) -> bool {
        name == ID_FIELD || name == ID_JSON
    }

    /// Check whether the programming name `name` is a field maintained by
    /// the model itself.
    pub fn is_automatic(name: &str) -> bool {
        matches!(
            name,
            ID_FIELD | CREATE_DATE_FIELD | WRITE_DATE_FIELD | LAST_UPDATE_FIELD
        )
    }
}
