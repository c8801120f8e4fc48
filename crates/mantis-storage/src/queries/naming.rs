//! Queries for naming_schemas.

use mantis_core::errors::StorageError;
use mantis_core::types::IobjectTypeId;
use rusqlite::{params, Connection};

/// Replace the templates of a type. Order is preserved.
pub fn replace_schemas(
    conn: &Connection,
    iobject_type: IobjectTypeId,
    templates: &[&str],
) -> Result<(), StorageError> {
    conn.execute(
        "DELETE FROM naming_schemas WHERE iobject_type_id = ?1",
        params![iobject_type],
    )
    .map_err(StorageError::sqlite)?;

    let mut stmt = conn
        .prepare_cached(
            "INSERT INTO naming_schemas (iobject_type_id, position, template) VALUES (?1, ?2, ?3)",
        )
        .map_err(StorageError::sqlite)?;
    for (position, template) in templates.iter().enumerate() {
        stmt.execute(params![iobject_type, position as i64, template])
            .map_err(StorageError::sqlite)?;
    }
    Ok(())
}

/// Templates of a type, in the order they are tried.
pub fn schemas_for(
    conn: &Connection,
    iobject_type: IobjectTypeId,
) -> Result<Vec<String>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT template FROM naming_schemas WHERE iobject_type_id = ?1 ORDER BY position",
        )
        .map_err(StorageError::sqlite)?;
    let rows = stmt
        .query_map(params![iobject_type], |row| row.get(0))
        .map_err(StorageError::sqlite)?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(StorageError::sqlite)
}
