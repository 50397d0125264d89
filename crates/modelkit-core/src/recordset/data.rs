//! Reading and writing record data.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use modelkit_proto::{FieldPath, RecordId, Value};
use tracing::debug;

use super::values::{FieldMap, FieldValue};
use super::RecordCollection;
use crate::error::{Error, Result};
use crate::registry::{
    FieldDef, FieldType, ModelDef, CREATE_DATE_FIELD, ID_JSON, WRITE_DATE_FIELD,
};
use crate::storage::Row;

/// One requested field: its wire key, resolved path and, for relational
/// fields, the target model.
struct Column {
    key: String,
    path: String,
    target: Option<String>,
}

impl RecordCollection {
    /// Field values of every record, keyed by wire name.
    ///
    /// Each map holds the requested fields and `id`. An empty field list
    /// reads every field of the model. Relational fields come back as
    /// collections bound to this environment.
    pub fn read<S: AsRef<str>>(&self, fields: &[S]) -> Result<Vec<FieldMap>> {
        let def = self.model_def()?;
        let requested: Vec<String> = if fields.is_empty() {
            def.fields().map(|f| f.name.clone()).collect()
        } else {
            fields.iter().map(|f| f.as_ref().to_string()).collect()
        };

        let resolver = self.env.resolver();
        let mut fetch: BTreeSet<String> = resolver.expand_fields(&self.model, &requested)?;
        fetch.insert(ID_JSON.to_string());

        let mut columns = Vec::with_capacity(requested.len());
        for name in &requested {
            let path = FieldPath::from(name.as_str());
            let (resolved, _, terminal) = resolver.terminal(&self.model, &path)?;
            columns.push(Column {
                key: self.env.registry().jsonize(&self.model, &path)?.join(),
                path: resolved.path.join(),
                target: terminal
                    .target_model
                    .clone()
                    .filter(|_| terminal.field_type.is_relational()),
            });
        }

        let ids = self.ids()?;
        let paths: Vec<FieldPath> = fetch.iter().map(FieldPath::from).collect();
        let rows = self.env.executor().read(&self.model, &ids, &paths)?;

        Ok(rows
            .into_iter()
            .map(|(id, values)| {
                let mut map = FieldMap::new();
                map.insert(ID_JSON.to_string(), FieldValue::Value(Value::Integer(id)));
                for column in &columns {
                    let value = values.get(&column.path).cloned().unwrap_or_default();
                    let field_value = match &column.target {
                        Some(target) => FieldValue::Records(self.linked(target, value.record_ids())),
                        None => FieldValue::Value(value),
                    };
                    map.insert(column.key.clone(), field_value);
                }
                map
            })
            .collect())
    }

    /// Run the pending query and check that `fields` can be read, returning
    /// a collection of the matched records.
    pub fn load<S: AsRef<str>>(&self, fields: &[S]) -> Result<Self> {
        let loaded = self.scoped(self.ids()?);
        loaded.read(fields)?;
        Ok(loaded)
    }

    /// Value of `field` on the only record of the collection.
    pub fn get(&self, field: &str) -> Result<FieldValue> {
        self.ensure_one()?;
        let key = self
            .env
            .registry()
            .jsonize(&self.model, &FieldPath::from(field))?
            .join();
        self.read(&[field])?
            .pop()
            .and_then(|mut map| map.remove(&key))
            .ok_or_else(|| Error::unresolved(&self.model, field))
    }

    /// Create a record and return it.
    ///
    /// Values may name fields in programming or wire form. Missing fields
    /// take their declared default.
    pub fn create<K, V, I>(&self, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let def = self.model_def()?;
        let row = self.to_row(def, values, &[])?;
        self.insert_row(def, row)
    }

    /// Write the same values to every record.
    pub fn write<K, V, I>(&self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let def = self.model_def()?;
        let ids = self.ids()?;
        let mut row = self.to_row(def, values, &ids)?;
        debug!(model = %self.model, records = ids.len(), fields = row.len(), "records written");
        stamp(def, &mut row, WRITE_DATE_FIELD);

        let tx = self.env.transaction();
        for &id in &ids {
            tx.update(&self.model, id, row.clone())?;
        }
        Ok(())
    }

    /// Write one field of every record.
    pub fn set(&self, field: &str, value: impl Into<Value>) -> Result<()> {
        self.write([(field, value.into())])
    }

    /// Delete every record, returning how many were deleted.
    ///
    /// Foreign keys of remaining records that point at a deleted record are
    /// set to null in the same transaction.
    pub fn unlink(&self) -> Result<usize> {
        let ids = self.ids()?;
        if ids.is_empty() {
            return Ok(0);
        }
        let deleted: HashSet<RecordId> = ids.iter().copied().collect();
        let tx = self.env.transaction();

        for model in self.env.registry().models() {
            let links: Vec<&FieldDef> = model
                .stored_fields()
                .filter(|f| {
                    f.field_type.is_foreign_key()
                        && f.target_model.as_deref() == Some(self.model.as_str())
                })
                .collect();
            if links.is_empty() {
                continue;
            }

            for (id, row) in tx.scan(&model.name)? {
                if model.name == self.model && deleted.contains(&id) {
                    continue;
                }
                let cleared: Row = links
                    .iter()
                    .filter(|f| {
                        row.get(&f.json_name)
                            .is_some_and(|v| v.record_ids().iter().any(|r| deleted.contains(r)))
                    })
                    .map(|f| (f.json_name.clone(), Value::Null))
                    .collect();
                if !cleared.is_empty() {
                    debug!(model = %model.name, id, fields = cleared.len(), "dangling links cleared");
                    tx.update(&model.name, id, cleared)?;
                }
            }
        }

        for &id in &ids {
            tx.delete(&self.model, id)?;
        }
        debug!(model = %self.model, records = ids.len(), "records deleted");
        Ok(ids.len())
    }

    /// Duplicate the only record of the collection.
    ///
    /// Stored, copyable fields are carried over; computed, related, reverse
    /// and sensitive fields are not. `overrides` are applied last.
    pub fn copy<K, V, I>(&self, overrides: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let id = self.ensure_one()?;
        let def = self.model_def()?;
        let source = self
            .env
            .transaction()
            .get(&self.model, id)?
            .ok_or_else(|| Error::Transaction(format!("{}({}) does not exist", self.model, id)))?;

        let mut row: Row = def
            .stored_fields()
            .filter(|f| f.is_copyable())
            .filter_map(|f| source.get(&f.json_name).map(|v| (f.json_name.clone(), v.clone())))
            .collect();
        row.extend(self.to_row(def, overrides, &[])?);

        let copied = self.insert_row(def, row)?;
        debug!(model = %self.model, from = id, "record copied");
        Ok(copied)
    }

    /// Declared default values, keyed by wire name.
    pub fn default_get(&self) -> Result<BTreeMap<String, Value>> {
        Ok(self
            .model_def()?
            .fields()
            .filter_map(|f| f.default.clone().map(|d| (f.json_name.clone(), d)))
            .collect())
    }

    fn insert_row(&self, def: &ModelDef, mut row: Row) -> Result<Self> {
        for field in def.stored_fields() {
            if !row.contains_key(&field.json_name) {
                if let Some(default) = &field.default {
                    row.insert(field.json_name.clone(), default.clone());
                }
            }
            if field.required && row.get(&field.json_name).map_or(true, Value::is_null) {
                return Err(Error::InvalidValue(format!(
                    "{}.{} is required",
                    def.name, field.name
                )));
            }
        }
        stamp(def, &mut row, CREATE_DATE_FIELD);

        let id = self.env.transaction().insert(&self.model, row)?;
        debug!(model = %self.model, id, "record created");
        Ok(self.scoped(vec![id]))
    }

    /// Convert caller values to a stored row, checking every field is
    /// writable and every value fits. `writing` are the records the row is
    /// written to, if they exist already.
    fn to_row<K, V, I>(&self, def: &ModelDef, values: I, writing: &[RecordId]) -> Result<Row>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut row = Row::new();
        for (name, value) in values {
            let name = name.as_ref();
            let field = def
                .field(name)
                .ok_or_else(|| Error::unresolved(&def.name, name))?;
            if ModelDef::is_automatic(&field.name) || !field.is_stored() {
                return Err(Error::InvalidValue(format!(
                    "{}.{} is not writable",
                    def.name, field.name
                )));
            }

            let value = value.into();
            if !field.field_type.accepts(&value) {
                return Err(Error::InvalidValue(format!(
                    "{}.{} ({:?}) cannot hold a {} value",
                    def.name,
                    field.name,
                    field.field_type,
                    value.type_name()
                )));
            }
            if field.required && value.is_null() {
                return Err(Error::InvalidValue(format!(
                    "{}.{} is required",
                    def.name, field.name
                )));
            }

            let value = match (field.field_type, value) {
                (FieldType::Float, Value::Integer(i)) => Value::Float(i as f64),
                (t, value) if t.is_foreign_key() => self.foreign_key(def, field, value, writing)?,
                (_, value) => value,
            };
            row.insert(field.json_name.clone(), value);
        }
        Ok(row)
    }

    fn foreign_key(
        &self,
        def: &ModelDef,
        field: &FieldDef,
        value: Value,
        writing: &[RecordId],
    ) -> Result<Value> {
        let Some(&id) = value.record_ids().first() else {
            return Ok(Value::Null);
        };
        let target = field.target_model.as_deref().unwrap_or_default();
        let tx = self.env.transaction();
        if !tx.exists(target, id)? {
            return Err(Error::InvalidValue(format!(
                "{}.{}: {}({}) does not exist",
                def.name, field.name, target, id
            )));
        }

        if field.field_type == FieldType::One2One {
            let taken = tx.scan(&def.name)?.into_iter().any(|(other, row)| {
                !writing.contains(&other) && row.get(&field.json_name) == Some(&Value::Integer(id))
            });
            if taken || writing.len() > 1 {
                return Err(Error::InvalidValue(format!(
                    "{}.{}: {}({}) is already linked",
                    def.name, field.name, target, id
                )));
            }
        }

        Ok(Value::Integer(id))
    }
}

/// Set an audit timestamp of the row to the current time.
fn stamp(def: &ModelDef, row: &mut Row, field: &str) {
    if let Some(field) = def.field(field).filter(|f| f.is_stored()) {
        row.insert(field.json_name.clone(), Value::Timestamp(current_timestamp()));
    }
}

/// Current time in microseconds since the Unix epoch.
fn current_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_micros() as i64)
        .unwrap_or(0)
}
