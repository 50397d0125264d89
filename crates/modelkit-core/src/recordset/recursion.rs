//! Cycle detection over parent links.

use std::collections::HashSet;

use modelkit_proto::RecordId;
use tracing::debug;

use super::RecordCollection;
use crate::error::Result;
use crate::storage::Transaction;

impl RecordCollection {
    /// Check that no record of the collection is part of, or leads into, a
    /// parent-link cycle.
    ///
    /// Models without a parent field always pass.
    pub fn check_recursion(&self) -> Result<bool> {
        Ok(self.recursion_report()?.iter().all(|(_, ok)| *ok))
    }

    /// Per-record result of the parent walk, in collection order.
    pub fn recursion_report(&self) -> Result<Vec<(RecordId, bool)>> {
        let ids = self.ids()?;
        let def = self.model_def()?;
        let Some(parent) = def.parent_field() else {
            return Ok(ids.into_iter().map(|id| (id, true)).collect());
        };

        let tx = self.env.transaction();
        let mut report = Vec::with_capacity(ids.len());
        for id in ids {
            let ok = walk_parents(tx, &self.model, &parent.json_name, id)?;
            if !ok {
                debug!(model = %self.model, id, "parent cycle detected");
            }
            report.push((id, ok));
        }
        Ok(report)
    }
}

/// Follow the parent link from `start`; a revisited id means a cycle.
fn walk_parents(tx: &Transaction, model: &str, parent: &str, start: RecordId) -> Result<bool> {
    let mut visited = HashSet::new();
    let mut current = Some(start);

    while let Some(id) = current {
        if !visited.insert(id) {
            return Ok(false);
        }
        current = tx
            .get(model, id)?
            .and_then(|row| row.get(parent).and_then(|v| v.record_ids().first().copied()));
    }

    Ok(true)
}
