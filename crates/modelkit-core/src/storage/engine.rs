//! Storage engine implementation.

use modelkit_proto::RecordId;
use sled::{Batch, Db, Tree};
use tracing::info;

use super::key::RecordKey;
use super::record::{Row, StoredRecord};
use super::StorageConfig;
use crate::error::Error;

/// Tree name for record data.
const DATA_TREE: &str = "data";

/// The storage engine wrapping sled.
///
/// The engine only sees committed data. Uncommitted writes live in a
/// [`Transaction`](super::Transaction) until it commits.
pub struct StorageEngine {
    /// The underlying sled database.
    db: Db,

    /// Tree for record data (model + id -> record).
    data_tree: Tree,
}

impl StorageEngine {
    /// Open or create a storage engine with the given configuration.
    pub fn open(config: &StorageConfig) -> Result<Self, Error> {
        let db = config.to_sled_config().open()?;
        let data_tree = db.open_tree(DATA_TREE)?;

        info!(
            temporary = config.temporary,
            recovered = db.was_recovered(),
            "storage engine opened"
        );

        Ok(Self { db, data_tree })
    }

    /// Allocate a new record identifier.
    ///
    /// Identifiers are unique across models and never reused, even when the
    /// transaction that allocated them rolls back.
    pub fn generate_id(&self) -> Result<RecordId, Error> {
        Ok(self.db.generate_id()? as RecordId + 1)
    }

    /// Get the committed row of a record.
    pub fn get(&self, model: &str, id: RecordId) -> Result<Option<Row>, Error> {
        match self.data_tree.get(RecordKey::new(model, id).encode())? {
            Some(bytes) => Ok(Some(StoredRecord::from_bytes(&bytes)?.fields)),
            None => Ok(None),
        }
    }

    /// Scan every committed record of a model, ordered by id.
    pub fn scan(&self, model: &str) -> Result<Vec<(RecordId, Row)>, Error> {
        let mut rows = Vec::new();
        for result in self.data_tree.scan_prefix(RecordKey::model_prefix(model)) {
            let (key_bytes, value_bytes) = result?;
            let key = RecordKey::decode(&key_bytes)
                .ok_or_else(|| Error::Deserialization("invalid record key".to_string()))?;
            if key.model != model {
                continue;
            }
            rows.push((key.id, StoredRecord::from_bytes(&value_bytes)?.fields));
        }
        Ok(rows)
    }

    /// Atomically apply a set of writes. `None` deletes the record.
    pub(crate) fn apply<'a, I>(&self, writes: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = (&'a RecordKey, &'a Option<Row>)>,
    {
        let mut batch = Batch::default();
        for (key, row) in writes {
            match row {
                Some(fields) => {
                    let record = StoredRecord::new(fields.clone());
                    batch.insert(key.encode(), record.to_bytes()?);
                }
                None => batch.remove(key.encode()),
            }
        }
        self.data_tree.apply_batch(batch)?;
        Ok(())
    }

    /// Number of committed records of a model.
    pub fn count(&self, model: &str) -> Result<usize, Error> {
        let mut count = 0;
        for result in self.data_tree.scan_prefix(RecordKey::model_prefix(model)) {
            result?;
            count += 1;
        }
        Ok(count)
    }

    /// Flush pending writes to disk.
    pub fn flush(&self) -> Result<(), Error> {
        self.db.flush()?;
        Ok(())
    }
}
