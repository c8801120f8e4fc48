//! Queries for identifier_namespaces and identifiers.

use mantis_core::errors::StorageError;
use mantis_core::types::{IdentifierId, IdentifierKey, IdentifierNamespaceId, IobjectId};
use rusqlite::{params, Connection, OptionalExtension};

pub fn get_or_create_namespace(
    conn: &Connection,
    uri: &str,
) -> Result<IdentifierNamespaceId, StorageError> {
    conn.prepare_cached(
        "INSERT INTO identifier_namespaces (uri) VALUES (?1) ON CONFLICT(uri) DO NOTHING",
    )
    .and_then(|mut stmt| stmt.execute(params![uri]))
    .map_err(StorageError::sqlite)?;

    conn.prepare_cached("SELECT id FROM identifier_namespaces WHERE uri = ?1")
        .and_then(|mut stmt| stmt.query_row(params![uri], |row| row.get(0)))
        .map_err(StorageError::sqlite)
}

/// Get or create the identifier for `key`, creating its namespace as needed.
pub fn get_or_create_identifier(
    conn: &Connection,
    key: &IdentifierKey,
) -> Result<IdentifierId, StorageError> {
    let ns = get_or_create_namespace(conn, &key.namespace_uri)?;

    conn.prepare_cached(
        "INSERT INTO identifiers (namespace_id, uid) VALUES (?1, ?2)
         ON CONFLICT(namespace_id, uid) DO NOTHING",
    )
    .and_then(|mut stmt| stmt.execute(params![ns, key.uid]))
    .map_err(StorageError::sqlite)?;

    conn.prepare_cached("SELECT id FROM identifiers WHERE namespace_id = ?1 AND uid = ?2")
        .and_then(|mut stmt| stmt.query_row(params![ns, key.uid], |row| row.get(0)))
        .map_err(StorageError::sqlite)
}

/// Look up an identifier without creating it.
pub fn find_identifier(
    conn: &Connection,
    key: &IdentifierKey,
) -> Result<Option<IdentifierId>, StorageError> {
    conn.query_row(
        "SELECT i.id FROM identifiers i
         JOIN identifier_namespaces n ON n.id = i.namespace_id
         WHERE n.uri = ?1 AND i.uid = ?2",
        params![key.namespace_uri, key.uid],
        |row| row.get(0),
    )
    .optional()
    .map_err(StorageError::sqlite)
}

pub fn identifier_key(conn: &Connection, id: IdentifierId) -> Result<IdentifierKey, StorageError> {
    conn.query_row(
        "SELECT n.uri, i.uid FROM identifiers i
         JOIN identifier_namespaces n ON n.id = i.namespace_id
         WHERE i.id = ?1",
        params![id],
        |row| Ok(IdentifierKey::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
    )
    .optional()
    .map_err(StorageError::sqlite)?
    .ok_or_else(|| StorageError::NotFound {
        entity: "identifier",
        key: id.to_string(),
    })
}

/// The newest revision recorded for an identifier, if any.
pub fn latest_iobject(
    conn: &Connection,
    id: IdentifierId,
) -> Result<Option<IobjectId>, StorageError> {
    conn.query_row(
        "SELECT latest_iobject_id FROM identifiers WHERE id = ?1",
        params![id],
        |row| row.get::<_, Option<IobjectId>>(0),
    )
    .optional()
    .map(Option::flatten)
    .map_err(StorageError::sqlite)
}

pub fn set_latest(
    conn: &Connection,
    id: IdentifierId,
    iobject: IobjectId,
) -> Result<(), StorageError> {
    conn.execute(
        "UPDATE identifiers SET latest_iobject_id = ?1 WHERE id = ?2",
        params![iobject, id],
    )
    .map_err(StorageError::sqlite)?;
    Ok(())
}
