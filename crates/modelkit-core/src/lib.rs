//! modelkit core - Environments, model registry, field-path resolution and
//! record collections.
//!
//! A [`Database`] pairs a finalized [`Registry`] with a sled-backed storage
//! engine and hands out [`Environment`]s. Collections obtained from an
//! environment resolve every field path, aliases included, before the
//! executor sees it.

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod config;
pub mod database;
pub mod environment;
pub mod error;
pub mod query;
pub mod recordset;
pub mod registry;
pub mod resolver;
pub mod storage;

pub use config::OrmConfig;
pub use database::Database;
pub use environment::{Context, Environment, UserId};
pub use error::{Error, Result};
pub use query::{OrderBy, OrderDirection, Query, QueryExecutor};
pub use recordset::{FieldMap, FieldValue, RecordCollection};
pub use registry::{
    FieldDef, FieldInfo, FieldKind, FieldType, ModelDef, Registry, RegistryBuilder, SchemaFile,
};
pub use resolver::{PathResolver, ResolvedPath};
pub use storage::{StorageConfig, StorageEngine, Transaction, TransactionStatus};

/// Re-export protocol types.
pub use modelkit_proto as proto;
