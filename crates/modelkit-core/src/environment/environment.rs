//! Environments: identity, context and unit of work.

use std::fmt;
use std::sync::Arc;

use modelkit_proto::Value;
use tracing::debug;

use super::context::Context;
use crate::database::Database;
use crate::error::Result;
use crate::query::QueryExecutor;
use crate::recordset::RecordCollection;
use crate::registry::Registry;
use crate::resolver::PathResolver;
use crate::storage::Transaction;

/// Identifier of the acting user.
pub type UserId = i64;

/// The identity, context and transaction under which operations run.
///
/// Environments are values: every derivation returns a new environment and
/// leaves the source untouched. The transaction is the one shared part, so
/// writes made under a derived identity are visible to the whole lineage.
#[derive(Clone)]
pub struct Environment {
    db: Database,
    uid: UserId,
    context: Context,
    tx: Arc<Transaction>,
}

impl Environment {
    pub(crate) fn new(db: Database, uid: UserId, tx: Arc<Transaction>) -> Self {
        Self {
            db,
            uid,
            context: Context::new(),
            tx,
        }
    }

    /// The acting user.
    pub fn uid(&self) -> UserId {
        self.uid
    }

    /// The request context.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// The database this environment belongs to.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// The model registry.
    pub fn registry(&self) -> &Registry {
        self.db.registry()
    }

    /// The shared transaction.
    pub fn transaction(&self) -> &Transaction {
        &self.tx
    }

    /// Check whether both environments work in the same transaction.
    pub fn shares_transaction(&self, other: &Environment) -> bool {
        Arc::ptr_eq(&self.tx, &other.tx)
    }

    /// A derived environment with one context key set.
    pub fn with_context(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            context: self.context.with_key(key, value),
            ..self.clone()
        }
    }

    /// A derived environment with the whole context replaced.
    pub fn with_new_context(&self, context: Context) -> Self {
        Self {
            context,
            ..self.clone()
        }
    }

    /// A derived environment acting as the superuser.
    pub fn sudo(&self) -> Self {
        self.sudo_as(self.db.config().superuser_id)
    }

    /// A derived environment acting as `uid`.
    pub fn sudo_as(&self, uid: UserId) -> Self {
        debug!(from = self.uid, to = uid, "identity switched");
        Self {
            uid,
            ..self.clone()
        }
    }

    /// A derived environment with the same identity and context on a fresh
    /// transaction.
    pub fn in_new_transaction(&self) -> Self {
        Self {
            tx: Arc::new(self.db.begin()),
            ..self.clone()
        }
    }

    /// An empty collection of `model` bound to this environment.
    pub fn pool(&self, model: &str) -> Result<RecordCollection> {
        RecordCollection::pool(self.clone(), model)
    }

    /// Commit the shared transaction. Later calls are no-ops.
    pub fn commit(&self) -> Result<()> {
        self.tx.commit()
    }

    /// Roll back the shared transaction. Later calls are no-ops.
    pub fn rollback(&self) -> Result<()> {
        self.tx.rollback()
    }

    pub(crate) fn resolver(&self) -> PathResolver<'_> {
        PathResolver::new(self.db.registry(), self.db.config().max_alias_depth)
    }

    pub(crate) fn executor(&self) -> QueryExecutor<'_> {
        QueryExecutor::new(&self.tx, self.db.registry())
    }
}

impl PartialEq for Environment {
    fn eq(&self, other: &Self) -> bool {
        self.uid == other.uid && self.context == other.context && self.shares_transaction(other)
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("uid", &self.uid)
            .field("context", &self.context)
            .field("tx", &self.tx.id())
            .finish()
    }
}
