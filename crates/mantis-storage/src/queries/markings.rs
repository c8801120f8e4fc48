//! Queries for markings: provenance objects attached to marked objects.

use mantis_core::errors::StorageError;
use mantis_core::types::IobjectId;
use rusqlite::{params, Connection};

/// Attach `marking` to `iobject`. Attaching twice is a no-op.
pub fn add_marking(
    conn: &Connection,
    iobject: IobjectId,
    marking: IobjectId,
) -> Result<(), StorageError> {
    conn.prepare_cached(
        "INSERT OR IGNORE INTO markings (iobject_id, marking_iobject_id) VALUES (?1, ?2)",
    )
    .and_then(|mut stmt| stmt.execute(params![iobject, marking]))
    .map_err(StorageError::sqlite)?;
    Ok(())
}

pub fn markings_of(conn: &Connection, iobject: IobjectId) -> Result<Vec<IobjectId>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT marking_iobject_id FROM markings WHERE iobject_id = ?1 ORDER BY marking_iobject_id",
        )
        .map_err(StorageError::sqlite)?;
    let rows = stmt
        .query_map(params![iobject], |row| row.get(0))
        .map_err(StorageError::sqlite)?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(StorageError::sqlite)
}

/// Objects carrying `marking`.
pub fn marked_by(conn: &Connection, marking: IobjectId) -> Result<Vec<IobjectId>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT iobject_id FROM markings WHERE marking_iobject_id = ?1 ORDER BY iobject_id",
        )
        .map_err(StorageError::sqlite)?;
    let rows = stmt
        .query_map(params![marking], |row| row.get(0))
        .map_err(StorageError::sqlite)?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(StorageError::sqlite)
}
