//! Queries for the import_history table: append-only log of import runs.

use mantis_core::errors::StorageError;
use rusqlite::{params, Connection};

/// An import history record.
#[derive(Debug, Clone)]
pub struct ImportHistoryRow {
    pub id: i64,
    pub started_at: i64,
    pub completed_at: Option<i64>,
    pub source: String,
    pub content_hash: Option<i64>,
    pub created_objects: Option<i64>,
    pub unchanged_objects: Option<i64>,
    pub replaced_objects: Option<i64>,
    pub skipped_objects: Option<i64>,
    pub status: String,
    pub error: Option<String>,
}

/// Completion data of an import run.
#[derive(Debug, Clone, Default)]
pub struct ImportCompletion<'a> {
    pub completed_at: i64,
    pub content_hash: Option<i64>,
    pub created_objects: i64,
    pub unchanged_objects: i64,
    pub replaced_objects: i64,
    pub skipped_objects: i64,
    pub status: &'a str,
    pub error: Option<&'a str>,
}

/// Insert a new record (status = 'running'). Returns the row id.
pub fn insert_import_start(
    conn: &Connection,
    started_at: i64,
    source: &str,
) -> Result<i64, StorageError> {
    conn.execute(
        "INSERT INTO import_history (started_at, source, status) VALUES (?1, ?2, 'running')",
        params![started_at, source],
    )
    .map_err(StorageError::sqlite)?;
    Ok(conn.last_insert_rowid())
}

pub fn update_import_complete(
    conn: &Connection,
    id: i64,
    done: &ImportCompletion<'_>,
) -> Result<(), StorageError> {
    conn.execute(
        "UPDATE import_history SET
            completed_at = ?1, content_hash = ?2, created_objects = ?3,
            unchanged_objects = ?4, replaced_objects = ?5, skipped_objects = ?6,
            status = ?7, error = ?8
         WHERE id = ?9",
        params![
            done.completed_at,
            done.content_hash,
            done.created_objects,
            done.unchanged_objects,
            done.replaced_objects,
            done.skipped_objects,
            done.status,
            done.error,
            id
        ],
    )
    .map_err(StorageError::sqlite)?;
    Ok(())
}

/// Most recent runs first.
pub fn query_recent(conn: &Connection, limit: usize) -> Result<Vec<ImportHistoryRow>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT id, started_at, completed_at, source, content_hash, created_objects,
                    unchanged_objects, replaced_objects, skipped_objects, status, error
             FROM import_history ORDER BY started_at DESC, id DESC LIMIT ?1",
        )
        .map_err(StorageError::sqlite)?;

    let rows = stmt
        .query_map(params![limit as i64], |row| {
            Ok(ImportHistoryRow {
                id: row.get(0)?,
                started_at: row.get(1)?,
                completed_at: row.get(2)?,
                source: row.get(3)?,
                content_hash: row.get(4)?,
                created_objects: row.get(5)?,
                unchanged_objects: row.get(6)?,
                replaced_objects: row.get(7)?,
                skipped_objects: row.get(8)?,
                status: row.get(9)?,
                error: row.get(10)?,
            })
        })
        .map_err(StorageError::sqlite)?;

    rows.collect::<Result<Vec<_>, _>>()
        .map_err(StorageError::sqlite)
}

pub fn count(conn: &Connection) -> Result<i64, StorageError> {
    conn.query_row("SELECT COUNT(*) FROM import_history", [], |row| row.get(0))
        .map_err(StorageError::sqlite)
}
