//! Display names and field metadata.

use std::collections::BTreeMap;

use modelkit_proto::{RecordId, Value};

use super::values::FieldValue;
use super::RecordCollection;
use crate::error::{Error, Result};
use crate::registry::{FieldInfo, ID_JSON, NAME_FIELD};

impl RecordCollection {
    /// Display name of every record, in order.
    ///
    /// A record is named by its `Name` field, or `Model(id)` when the model
    /// has no such field or the value is empty.
    pub fn name_get(&self) -> Result<Vec<(RecordId, String)>> {
        let def = self.model_def()?;
        let Some(name_field) = def.field(NAME_FIELD) else {
            return Ok(self
                .ids()?
                .into_iter()
                .map(|id| (id, self.fallback_name(id)))
                .collect());
        };

        Ok(self
            .read(&[name_field.name.as_str()])?
            .into_iter()
            .map(|map| {
                let id = map
                    .get(ID_JSON)
                    .and_then(FieldValue::as_value)
                    .and_then(Value::as_i64)
                    .unwrap_or_default();
                let name = match map.get(&name_field.json_name).and_then(FieldValue::as_value) {
                    Some(Value::Text(name)) if !name.is_empty() => name.clone(),
                    _ => self.fallback_name(id),
                };
                (id, name)
            })
            .collect())
    }

    /// Display name of the only record of the collection.
    pub fn display_name(&self) -> Result<String> {
        let id = self.ensure_one()?;
        self.name_get()?
            .pop()
            .map(|(_, name)| name)
            .ok_or_else(|| Error::Transaction(format!("{}({}) does not exist", self.model, id)))
    }

    fn fallback_name(&self, id: RecordId) -> String {
        format!("{}({})", self.model, id)
    }

    /// Metadata of one field, by programming or wire name.
    pub fn field_get(&self, field: &str) -> Result<FieldInfo> {
        self.model_def()?
            .field(field)
            .map(|f| f.info())
            .ok_or_else(|| Error::unresolved(&self.model, field))
    }

    /// Metadata of the given fields, or of every field when `fields` is
    /// empty, keyed by wire name.
    pub fn fields_get<S: AsRef<str>>(&self, fields: &[S]) -> Result<BTreeMap<String, FieldInfo>> {
        if fields.is_empty() {
            return Ok(self.model_def()?.fields_get());
        }
        fields
            .iter()
            .map(|name| {
                let info = self.field_get(name.as_ref())?;
                Ok((info.json_name.clone(), info))
            })
            .collect()
    }
}
