//! Query executor running resolved queries against a transaction.
//!
//! The executor takes paths in resolved wire form, walks relational hops
//! through the transaction view, and evaluates conditions and sort keys.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use modelkit_proto::{FieldPath, RecordId, Value};
use tracing::debug;

use super::filter::FilterEvaluator;
use super::{OrderDirection, Query};
use crate::error::{Error, Result};
use crate::registry::{FieldDef, FieldKind, ModelDef, Registry, ID_FIELD};
use crate::storage::{Row, Transaction};

/// Query executor that runs resolved queries against a transaction.
pub struct QueryExecutor<'a> {
    tx: &'a Transaction,
    registry: &'a Registry,
}

impl<'a> QueryExecutor<'a> {
    /// Create a new executor over a transaction and registry.
    pub fn new(tx: &'a Transaction, registry: &'a Registry) -> Self {
        Self { tx, registry }
    }

    /// Ids of the records matching `query`, ordered and paged.
    ///
    /// When `within` is given, only those records are candidates.
    pub fn search(&self, model: &str, query: &Query, within: Option<&[RecordId]>) -> Result<Vec<RecordId>> {
        let def = self.registry.model(model)?;
        let matched = self.matching_rows(def, query, within)?;
        let total = matched.len();

        let ids: Vec<RecordId> = if query.order.is_empty() {
            matched.into_iter().map(|(id, _)| id).collect()
        } else {
            self.sorted(def, query, matched)?
        };

        let ids: Vec<RecordId> = ids
            .into_iter()
            .skip(query.offset)
            .take(query.limit.unwrap_or(usize::MAX))
            .collect();

        debug!(model, matched = total, returned = ids.len(), "search executed");
        Ok(ids)
    }

    /// Number of records matching the condition of `query`, ignoring paging.
    pub fn count(&self, model: &str, query: &Query, within: Option<&[RecordId]>) -> Result<usize> {
        let def = self.registry.model(model)?;
        Ok(self.matching_rows(def, query, within)?.len())
    }

    /// Values of `paths` for each record, keyed by joined path.
    ///
    /// Relational values are returned as [`Value::Relation`].
    pub fn read(
        &self,
        model: &str,
        ids: &[RecordId],
        paths: &[FieldPath],
    ) -> Result<Vec<(RecordId, BTreeMap<String, Value>)>> {
        let def = self.registry.model(model)?;
        let mut records = Vec::with_capacity(ids.len());

        for &id in ids {
            let row = self
                .tx
                .get(model, id)?
                .ok_or_else(|| Error::Transaction(format!("{}({}) does not exist", model, id)))?;
            let mut values = BTreeMap::new();
            for path in paths {
                values.insert(path.join(), self.value_at(def, id, &row, path.segments())?);
            }
            records.push((id, values));
        }

        Ok(records)
    }

    fn matching_rows(
        &self,
        def: &ModelDef,
        query: &Query,
        within: Option<&[RecordId]>,
    ) -> Result<Vec<(RecordId, Row)>> {
        let mut rows = self.tx.scan(&def.name)?;
        if let Some(ids) = within {
            let allowed: HashSet<RecordId> = ids.iter().copied().collect();
            rows.retain(|(id, _)| allowed.contains(id));
        }

        let Some(condition) = &query.condition else {
            return Ok(rows);
        };

        let mut matched = Vec::new();
        for (id, row) in rows {
            let keep = FilterEvaluator::evaluate(condition, &mut |path: &FieldPath| {
                self.reach(def, id, &row, path.segments())
            })?;
            if keep {
                matched.push((id, row));
            }
        }
        Ok(matched)
    }

    fn sorted(&self, def: &ModelDef, query: &Query, rows: Vec<(RecordId, Row)>) -> Result<Vec<RecordId>> {
        let mut keyed = Vec::with_capacity(rows.len());
        for (id, row) in &rows {
            let keys = query
                .order
                .iter()
                .map(|o| self.value_at(def, *id, row, o.path.segments()))
                .collect::<Result<Vec<_>>>()?;
            keyed.push((*id, keys));
        }

        keyed.sort_by(|(a_id, a), (b_id, b)| {
            for (i, order) in query.order.iter().enumerate() {
                let ord = FilterEvaluator::sort_order(&a[i], &b[i]);
                let ord = match order.direction {
                    OrderDirection::Asc => ord,
                    OrderDirection::Desc => ord.reverse(),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            a_id.cmp(b_id)
        });

        Ok(keyed.into_iter().map(|(id, _)| id).collect())
    }

    /// Values reached by `path` for filtering; relations are flattened to
    /// one integer per linked record.
    fn reach(&self, model: &ModelDef, id: RecordId, row: &Row, path: &[String]) -> Result<Vec<Value>> {
        let mut flat = Vec::new();
        for value in self.walk(model, id, row, path)? {
            match value {
                Value::Relation(ids) => flat.extend(ids.into_iter().map(Value::Integer)),
                other => flat.push(other),
            }
        }
        Ok(flat)
    }

    /// Single value of `path` for reading and sorting.
    ///
    /// A relational terminal gathers every reached record; a scalar terminal
    /// reached through a to-many hop yields the first value.
    fn value_at(&self, model: &ModelDef, id: RecordId, row: &Row, path: &[String]) -> Result<Value> {
        let (_, terminal) = self.registry.field_at(&model.name, path)?;
        let values = self.walk(model, id, row, path)?;

        if terminal.field_type.is_relational() {
            let mut seen = HashSet::new();
            let ids = values
                .iter()
                .flat_map(Value::record_ids)
                .filter(|id| seen.insert(*id))
                .collect();
            return Ok(Value::Relation(ids));
        }
        Ok(values.into_iter().next().unwrap_or_default())
    }

    fn walk(&self, model: &ModelDef, id: RecordId, row: &Row, path: &[String]) -> Result<Vec<Value>> {
        let Some((first, rest)) = path.split_first() else {
            return Ok(Vec::new());
        };
        let field = model
            .field(first)
            .ok_or_else(|| Error::unresolved(&model.name, first.clone()))?;

        if rest.is_empty() {
            return Ok(vec![self.field_value(model, id, row, field)?]);
        }

        let target = self.target(model, field)?;
        let mut values = Vec::new();
        for linked in self.field_value(model, id, row, field)?.record_ids() {
            if let Some(linked_row) = self.tx.get(&target.name, linked)? {
                values.extend(self.walk(target, linked, &linked_row, rest)?);
            }
        }
        Ok(values)
    }

    /// Value of one field of a record. Relational fields yield
    /// [`Value::Relation`].
    pub(crate) fn field_value(
        &self,
        model: &ModelDef,
        id: RecordId,
        row: &Row,
        field: &FieldDef,
    ) -> Result<Value> {
        if field.name == ID_FIELD {
            return Ok(Value::Integer(id));
        }

        match &field.kind {
            FieldKind::Stored => {
                let value = row.get(&field.json_name).cloned().unwrap_or_default();
                if field.field_type.is_foreign_key() {
                    Ok(Value::Relation(value.record_ids()))
                } else {
                    Ok(value)
                }
            }
            FieldKind::Computed(compute) => Ok(compute(row)),
            FieldKind::Reverse => Ok(Value::Relation(self.reverse_ids(model, id, field)?)),
            FieldKind::Related { path } => Err(Error::Configuration(format!(
                "related field {}.{} ({}) reached the executor unresolved",
                model.name, field.name, path
            ))),
        }
    }

    fn reverse_ids(&self, model: &ModelDef, id: RecordId, field: &FieldDef) -> Result<Vec<RecordId>> {
        let target = self.target(model, field)?;
        let fk = field
            .reverse_fk
            .as_deref()
            .and_then(|name| target.field(name))
            .ok_or_else(|| Error::unresolved(&model.name, field.name.clone()))?;

        Ok(self
            .tx
            .scan(&target.name)?
            .into_iter()
            .filter(|(_, row)| {
                row.get(&fk.json_name)
                    .is_some_and(|v| v.record_ids().contains(&id))
            })
            .map(|(linked, _)| linked)
            .collect())
    }

    fn target(&self, model: &ModelDef, field: &FieldDef) -> Result<&'a ModelDef> {
        let name = field
            .target_model
            .as_deref()
            .filter(|_| field.field_type.is_relational())
            .ok_or_else(|| Error::unresolved(&model.name, field.name.clone()))?;
        self.registry.model(name)
    }
}
