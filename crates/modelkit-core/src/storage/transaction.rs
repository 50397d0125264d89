//! Transactions: the unit of work shared by an environment lineage.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use modelkit_proto::RecordId;
use parking_lot::Mutex;
use tracing::{debug, instrument};

use super::key::RecordKey;
use super::record::Row;
use super::StorageEngine;
use crate::error::Error;

static NEXT_TRANSACTION_ID: AtomicU64 = AtomicU64::new(1);

/// Lifecycle state of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Accepting reads and writes.
    Active,
    /// Writes were applied to storage.
    Committed,
    /// Writes were discarded.
    RolledBack,
}

#[derive(Debug)]
struct TransactionState {
    status: TransactionStatus,
    /// Uncommitted writes; `None` marks a deleted record.
    writes: BTreeMap<RecordKey, Option<Row>>,
}

/// A unit of work over the storage engine.
///
/// Writes are collected in a write cache and applied atomically on commit.
/// Reads see committed storage overlaid with the write cache, so every
/// holder of the same transaction observes every write made through it.
///
/// A transaction is shared through an `Arc` by all the environments derived
/// from one another; its state sits behind a mutex.
pub struct Transaction {
    id: u64,
    engine: Arc<StorageEngine>,
    state: Mutex<TransactionState>,
}

impl Transaction {
    /// Begin a new transaction.
    pub fn begin(engine: Arc<StorageEngine>) -> Self {
        let id = NEXT_TRANSACTION_ID.fetch_add(1, Ordering::Relaxed);
        debug!(tx = id, "transaction started");
        Self {
            id,
            engine,
            state: Mutex::new(TransactionState {
                status: TransactionStatus::Active,
                writes: BTreeMap::new(),
            }),
        }
    }

    /// Process-unique transaction number.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Current lifecycle state.
    pub fn status(&self) -> TransactionStatus {
        self.state.lock().status
    }

    /// Whether the transaction still accepts operations.
    pub fn is_active(&self) -> bool {
        self.status() == TransactionStatus::Active
    }

    /// Number of pending writes.
    pub fn pending_writes(&self) -> usize {
        self.state.lock().writes.len()
    }

    /// Read a record, uncommitted writes first.
    pub fn get(&self, model: &str, id: RecordId) -> Result<Option<Row>, Error> {
        let state = self.state.lock();
        Self::ensure_active(self.id, &state)?;
        if let Some(cached) = state.writes.get(&RecordKey::new(model, id)) {
            return Ok(cached.clone());
        }
        drop(state);
        self.engine.get(model, id)
    }

    /// Check whether a record exists in this transaction's view.
    pub fn exists(&self, model: &str, id: RecordId) -> Result<bool, Error> {
        Ok(self.get(model, id)?.is_some())
    }

    /// Every record of a model in this transaction's view, ordered by id.
    pub fn scan(&self, model: &str) -> Result<Vec<(RecordId, Row)>, Error> {
        let state = self.state.lock();
        Self::ensure_active(self.id, &state)?;

        let mut rows: BTreeMap<RecordId, Row> = self.engine.scan(model)?.into_iter().collect();
        for (key, write) in state.writes.iter().filter(|(k, _)| k.model == model) {
            match write {
                Some(row) => {
                    rows.insert(key.id, row.clone());
                }
                None => {
                    rows.remove(&key.id);
                }
            }
        }
        Ok(rows.into_iter().collect())
    }

    /// Insert a new record and return its id.
    pub fn insert(&self, model: &str, row: Row) -> Result<RecordId, Error> {
        let mut state = self.state.lock();
        Self::ensure_active(self.id, &state)?;
        let id = self.engine.generate_id()?;
        state.writes.insert(RecordKey::new(model, id), Some(row));
        Ok(id)
    }

    /// Merge `changes` into an existing record.
    pub fn update(&self, model: &str, id: RecordId, changes: Row) -> Result<(), Error> {
        let key = RecordKey::new(model, id);
        let mut state = self.state.lock();
        Self::ensure_active(self.id, &state)?;

        // Held across read-merge-write.
        let current = match state.writes.get(&key) {
            Some(cached) => cached.clone(),
            None => self.engine.get(model, id)?,
        };
        let mut current = current
            .ok_or_else(|| Error::Transaction(format!("{}({}) does not exist", model, id)))?;
        current.extend(changes);
        state.writes.insert(key, Some(current));
        Ok(())
    }

    /// Delete a record.
    pub fn delete(&self, model: &str, id: RecordId) -> Result<(), Error> {
        let mut state = self.state.lock();
        Self::ensure_active(self.id, &state)?;
        state.writes.insert(RecordKey::new(model, id), None);
        Ok(())
    }

    /// Apply every pending write atomically.
    ///
    /// Finishing an already finished transaction is a no-op.
    #[instrument(skip(self), fields(tx = self.id))]
    pub fn commit(&self) -> Result<(), Error> {
        let mut state = self.state.lock();
        if state.status != TransactionStatus::Active {
            debug!(status = ?state.status, "commit on finished transaction ignored");
            return Ok(());
        }
        self.engine.apply(state.writes.iter())?;
        debug!(writes = state.writes.len(), "transaction committed");
        state.writes.clear();
        state.status = TransactionStatus::Committed;
        Ok(())
    }

    /// Discard every pending write.
    ///
    /// Finishing an already finished transaction is a no-op.
    #[instrument(skip(self), fields(tx = self.id))]
    pub fn rollback(&self) -> Result<(), Error> {
        let mut state = self.state.lock();
        if state.status != TransactionStatus::Active {
            debug!(status = ?state.status, "rollback on finished transaction ignored");
            return Ok(());
        }
        debug!(writes = state.writes.len(), "transaction rolled back");
        state.writes.clear();
        state.status = TransactionStatus::RolledBack;
        Ok(())
    }

    fn ensure_active(id: u64, state: &TransactionState) -> Result<(), Error> {
        match state.status {
            TransactionStatus::Active => Ok(()),
            status => Err(Error::Transaction(format!(
                "transaction {} is {:?}",
                id, status
            ))),
        }
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("status", &self.status())
            .finish()
    }
}
