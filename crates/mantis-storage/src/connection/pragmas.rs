//! Connection settings for the store.
//!
//! The writer runs in WAL mode so read commands can open the database while
//! an import is running. Foreign keys are enforced on the writer only.

use mantis_core::errors::StorageError;
use rusqlite::Connection;

const SHARED: &[(&str, &str)] = &[
    ("cache_size", "-64000"),
    ("busy_timeout", "5000"),
    ("temp_store", "MEMORY"),
];

const WRITER: &[(&str, &str)] = &[
    ("journal_mode", "WAL"),
    ("synchronous", "NORMAL"),
    ("foreign_keys", "ON"),
];

fn apply(conn: &Connection, pragmas: &[(&str, &str)], role: &str) -> Result<(), StorageError> {
    let batch: String = pragmas
        .iter()
        .chain(SHARED)
        .map(|(name, value)| format!("PRAGMA {name} = {value};\n"))
        .collect();
    conn.execute_batch(&batch)
        .map_err(|e| StorageError::SqliteError {
            message: format!("failed to configure {role} connection: {e}"),
        })
}

/// Settings for the import writer.
pub fn apply_pragmas(conn: &Connection) -> Result<(), StorageError> {
    apply(conn, WRITER, "writer")
}

/// Settings for a read-only pool connection.
pub fn apply_read_pragmas(conn: &Connection) -> Result<(), StorageError> {
    apply(conn, &[("query_only", "ON")], "reader")
}

/// True when the connection's journal mode is WAL. In-memory databases
/// report `memory`.
pub fn verify_wal_mode(conn: &Connection) -> Result<bool, StorageError> {
    let mode: String = conn
        .pragma_query_value(None, "journal_mode", |row| row.get(0))
        .map_err(StorageError::sqlite)?;
    Ok(mode.eq_ignore_ascii_case("wal"))
}
