//! Queries for iobject_families, revisions and iobject_types.

use mantis_core::errors::StorageError;
use mantis_core::types::{IobjectFamilyId, IobjectTypeId, IobjectTypeKey, RevisionId};
use rusqlite::{params, Connection, OptionalExtension};

pub fn get_or_create_family(conn: &Connection, name: &str) -> Result<IobjectFamilyId, StorageError> {
    conn.prepare_cached("INSERT INTO iobject_families (name) VALUES (?1) ON CONFLICT(name) DO NOTHING")
        .and_then(|mut stmt| stmt.execute(params![name]))
        .map_err(StorageError::sqlite)?;

    conn.prepare_cached("SELECT id FROM iobject_families WHERE name = ?1")
        .and_then(|mut stmt| stmt.query_row(params![name], |row| row.get(0)))
        .map_err(StorageError::sqlite)
}

pub fn get_or_create_revision(conn: &Connection, name: &str) -> Result<RevisionId, StorageError> {
    conn.prepare_cached("INSERT INTO revisions (name) VALUES (?1) ON CONFLICT(name) DO NOTHING")
        .and_then(|mut stmt| stmt.execute(params![name]))
        .map_err(StorageError::sqlite)?;

    conn.prepare_cached("SELECT id FROM revisions WHERE name = ?1")
        .and_then(|mut stmt| stmt.query_row(params![name], |row| row.get(0)))
        .map_err(StorageError::sqlite)
}

/// Get or create an object type together with its family.
pub fn get_or_create_iobject_type(
    conn: &Connection,
    key: &IobjectTypeKey,
) -> Result<IobjectTypeId, StorageError> {
    let family = get_or_create_family(conn, &key.family)?;

    conn.prepare_cached(
        "INSERT INTO iobject_types (name, namespace_uri, family_id) VALUES (?1, ?2, ?3)
         ON CONFLICT(name, namespace_uri, family_id) DO NOTHING",
    )
    .and_then(|mut stmt| stmt.execute(params![key.name, key.namespace_uri, family]))
    .map_err(StorageError::sqlite)?;

    conn.prepare_cached(
        "SELECT id FROM iobject_types WHERE name = ?1 AND namespace_uri = ?2 AND family_id = ?3",
    )
    .and_then(|mut stmt| {
        stmt.query_row(params![key.name, key.namespace_uri, family], |row| row.get(0))
    })
    .map_err(StorageError::sqlite)
}

/// Look up an object type without creating it.
pub fn find_iobject_type(
    conn: &Connection,
    key: &IobjectTypeKey,
) -> Result<Option<IobjectTypeId>, StorageError> {
    conn.query_row(
        "SELECT t.id FROM iobject_types t
         JOIN iobject_families f ON f.id = t.family_id
         WHERE t.name = ?1 AND t.namespace_uri = ?2 AND f.name = ?3",
        params![key.name, key.namespace_uri, key.family],
        |row| row.get(0),
    )
    .optional()
    .map_err(StorageError::sqlite)
}
