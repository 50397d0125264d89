//! Runtime configuration.

use std::path::Path;

use serde::Deserialize;

use crate::environment::UserId;
use crate::error::{Error, Result};
use crate::storage::StorageConfig;

/// Identity used by `sudo()` when no identity is given.
pub const DEFAULT_SUPERUSER_ID: UserId = 1;

/// Default bound on related-field substitutions for one path.
pub const DEFAULT_MAX_ALIAS_DEPTH: usize = 32;

/// Default page size for limited searches.
pub const DEFAULT_LIMIT: usize = 80;

/// modelkit configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OrmConfig {
    /// Superuser identity.
    pub superuser_id: UserId,

    /// Maximum number of related-field substitutions while resolving one
    /// path. Exceeding it is a configuration error.
    pub max_alias_depth: usize,

    /// Page size used when a limited search gets no explicit limit.
    pub default_limit: usize,

    /// Storage engine configuration.
    pub storage: StorageConfig,
}

impl Default for OrmConfig {
    fn default() -> Self {
        Self {
            superuser_id: DEFAULT_SUPERUSER_ID,
            max_alias_depth: DEFAULT_MAX_ALIAS_DEPTH,
            default_limit: DEFAULT_LIMIT,
            storage: StorageConfig::default(),
        }
    }
}

impl OrmConfig {
    /// Create a configuration with the given storage settings.
    pub fn new(storage: StorageConfig) -> Self {
        Self {
            storage,
            ..Default::default()
        }
    }

    /// Configuration backed by a temporary database.
    pub fn temporary() -> Self {
        Self::new(StorageConfig::temporary())
    }

    /// Load a configuration from a JSON document. Missing keys take their
    /// defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Deserialization(e.to_string()))
    }

    /// Load a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Set the superuser identity.
    pub fn with_superuser_id(mut self, uid: UserId) -> Self {
        self.superuser_id = uid;
        self
    }

    /// Set the related-field substitution bound.
    pub fn with_max_alias_depth(mut self, depth: usize) -> Self {
        self.max_alias_depth = depth.max(1);
        self
    }

    /// Set the default page size.
    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }
}
