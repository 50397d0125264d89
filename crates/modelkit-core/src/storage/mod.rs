//! Storage layer for modelkit.
//!
//! This module provides the sled-based storage collaborator: committed
//! records live in the engine, uncommitted ones in a shared [`Transaction`].

mod config;
mod engine;
mod record;
mod transaction;

pub mod key;

pub use config::StorageConfig;
pub use engine::StorageEngine;
pub use key::RecordKey;
pub use record::{Row, StoredRecord};
pub use transaction::{Transaction, TransactionStatus};
