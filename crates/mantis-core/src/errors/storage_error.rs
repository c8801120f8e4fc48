//! Storage-layer errors for SQLite operations.

use super::error_code::{self, MantisErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("migration failed at version {version}: {message}")]
    MigrationFailed { version: u32, message: String },

    #[error("database busy")]
    DbBusy,

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },
}

impl StorageError {
    /// Wrap a rusqlite error, mapping SQLITE_BUSY to `DbBusy`.
    pub fn sqlite(e: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(ref failure, _) = e {
            if failure.code == rusqlite::ErrorCode::DatabaseBusy {
                return Self::DbBusy;
            }
        }
        Self::SqliteError {
            message: e.to_string(),
        }
    }
}

impl MantisErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::SqliteError { .. } => error_code::STORAGE_ERROR,
            Self::MigrationFailed { .. } => error_code::MIGRATION_FAILED,
            Self::DbBusy => error_code::DB_BUSY,
            Self::NotFound { .. } => error_code::NOT_FOUND,
        }
    }
}
