//! Storage configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the SQLite store.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the database file. Default: `mantis.db`.
    pub database_path: Option<String>,
    /// Number of read connections for file databases. Default: 4.
    pub read_pool_size: Option<usize>,
}

impl StorageConfig {
    /// Returns the effective database path, defaulting to `mantis.db`.
    pub fn effective_database_path(&self) -> &str {
        self.database_path.as_deref().unwrap_or("mantis.db")
    }

    /// Returns the effective read pool size, defaulting to 4.
    pub fn effective_read_pool_size(&self) -> usize {
        self.read_pool_size.unwrap_or(4)
    }
}
