//! Database handle combining the registry, storage engine and configuration.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::OrmConfig;
use crate::environment::{Environment, UserId};
use crate::error::Result;
use crate::registry::Registry;
use crate::storage::{StorageEngine, Transaction};

struct DatabaseInner {
    registry: Arc<Registry>,
    storage: Arc<StorageEngine>,
    config: OrmConfig,
}

/// Factory for environments over one storage engine and one registry.
///
/// Cloning is cheap and every clone refers to the same database.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

impl Database {
    /// Open the storage described by `config` for a finalized registry.
    pub fn open(config: OrmConfig, registry: impl Into<Arc<Registry>>) -> Result<Self> {
        let storage = Arc::new(StorageEngine::open(&config.storage)?);
        let registry = registry.into();
        info!(models = registry.len(), "database opened");
        Ok(Self {
            inner: Arc::new(DatabaseInner {
                registry,
                storage,
                config,
            }),
        })
    }

    /// A new environment acting as `uid`, with an empty context and a new
    /// transaction.
    pub fn environment(&self, uid: UserId) -> Environment {
        Environment::new(self.clone(), uid, Arc::new(self.begin()))
    }

    /// Run `f` in a new environment and roll back whatever it did.
    pub fn simulate<T, F>(&self, uid: UserId, f: F) -> Result<T>
    where
        F: FnOnce(&Environment) -> Result<T>,
    {
        let env = self.environment(uid);
        let result = f(&env);
        env.rollback()?;
        debug!(uid, ok = result.is_ok(), "simulation rolled back");
        result
    }

    /// Run `f` in a new environment, committing on success and rolling back
    /// on error.
    pub fn execute<T, F>(&self, uid: UserId, f: F) -> Result<T>
    where
        F: FnOnce(&Environment) -> Result<T>,
    {
        let env = self.environment(uid);
        match f(&env) {
            Ok(value) => {
                env.commit()?;
                Ok(value)
            }
            Err(e) => {
                env.rollback()?;
                Err(e)
            }
        }
    }

    /// The model registry.
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// The configuration the database was opened with.
    pub fn config(&self) -> &OrmConfig {
        &self.inner.config
    }

    /// The storage engine.
    pub fn storage(&self) -> &StorageEngine {
        &self.inner.storage
    }

    /// Flush committed data to disk.
    pub fn flush(&self) -> Result<()> {
        self.inner.storage.flush()
    }

    pub(crate) fn begin(&self) -> Transaction {
        Transaction::begin(self.inner.storage.clone())
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("models", &self.inner.registry.model_names())
            .field("config", &self.inner.config)
            .finish()
    }
}
