//! Queries for info_objects: one row per object revision.

use mantis_core::errors::StorageError;
use mantis_core::types::{
    IdentifierId, IdentifierKey, IobjectFamilyId, IobjectId, IobjectTypeId, RevisionId,
};
use rusqlite::{params, Connection, OptionalExtension, Row};

/// Column values for a new object revision.
#[derive(Debug, Clone)]
pub struct NewInfoObjectRow {
    pub identifier: IdentifierId,
    pub iobject_type: IobjectTypeId,
    pub type_revision: RevisionId,
    pub family: IobjectFamilyId,
    pub family_revision: RevisionId,
    /// UTC microseconds.
    pub timestamp: i64,
    pub create_timestamp: i64,
    pub name: String,
    pub content_hash: i64,
}

/// An object revision joined with its identifier, type and family names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoObjectRow {
    pub id: IobjectId,
    pub identifier: IdentifierKey,
    pub type_name: String,
    pub type_namespace_uri: String,
    pub type_revision: String,
    pub family: String,
    pub family_revision: String,
    pub timestamp: i64,
    pub create_timestamp: i64,
    pub name: String,
    pub content_hash: i64,
    /// Whether this revision is the identifier's latest.
    pub is_latest: bool,
}

const SELECT_ROW: &str = "
    SELECT o.id, n.uri, i.uid, t.name, t.namespace_uri, tr.name, f.name, fr.name,
           o.timestamp, o.create_timestamp, o.name, o.content_hash,
           COALESCE(i.latest_iobject_id = o.id, 0)
    FROM info_objects o
    JOIN identifiers i ON i.id = o.identifier_id
    JOIN identifier_namespaces n ON n.id = i.namespace_id
    JOIN iobject_types t ON t.id = o.iobject_type_id
    JOIN revisions tr ON tr.id = o.iobject_type_revision_id
    JOIN iobject_families f ON f.id = o.iobject_family_id
    JOIN revisions fr ON fr.id = o.iobject_family_revision_id";

fn map_row(row: &Row<'_>) -> rusqlite::Result<InfoObjectRow> {
    Ok(InfoObjectRow {
        id: row.get(0)?,
        identifier: IdentifierKey::new(row.get::<_, String>(1)?, row.get::<_, String>(2)?),
        type_name: row.get(3)?,
        type_namespace_uri: row.get(4)?,
        type_revision: row.get(5)?,
        family: row.get(6)?,
        family_revision: row.get(7)?,
        timestamp: row.get(8)?,
        create_timestamp: row.get(9)?,
        name: row.get(10)?,
        content_hash: row.get(11)?,
        is_latest: row.get::<_, i64>(12)? != 0,
    })
}

pub fn insert_iobject(conn: &Connection, row: &NewInfoObjectRow) -> Result<IobjectId, StorageError> {
    conn.prepare_cached(
        "INSERT INTO info_objects (
            identifier_id, iobject_type_id, iobject_type_revision_id, iobject_family_id,
            iobject_family_revision_id, timestamp, create_timestamp, name, content_hash
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )
    .and_then(|mut stmt| {
        stmt.execute(params![
            row.identifier,
            row.iobject_type,
            row.type_revision,
            row.family,
            row.family_revision,
            row.timestamp,
            row.create_timestamp,
            row.name,
            row.content_hash,
        ])
    })
    .map_err(StorageError::sqlite)?;
    Ok(IobjectId::new(conn.last_insert_rowid()))
}

/// The revision of `identifier` at exactly `timestamp`, with its content hash.
pub fn find_revision(
    conn: &Connection,
    identifier: IdentifierId,
    timestamp: i64,
) -> Result<Option<(IobjectId, i64)>, StorageError> {
    conn.prepare_cached(
        "SELECT id, content_hash FROM info_objects WHERE identifier_id = ?1 AND timestamp = ?2",
    )
    .and_then(|mut stmt| {
        stmt.query_row(params![identifier, timestamp], |row| Ok((row.get(0)?, row.get(1)?)))
            .optional()
    })
    .map_err(StorageError::sqlite)
}

/// Replace the content hash of a revision whose facts were rewritten.
pub fn update_content(
    conn: &Connection,
    id: IobjectId,
    content_hash: i64,
    create_timestamp: i64,
) -> Result<(), StorageError> {
    conn.execute(
        "UPDATE info_objects SET content_hash = ?1, create_timestamp = ?2 WHERE id = ?3",
        params![content_hash, create_timestamp, id],
    )
    .map_err(StorageError::sqlite)?;
    Ok(())
}

pub fn set_name(conn: &Connection, id: IobjectId, name: &str) -> Result<(), StorageError> {
    conn.execute(
        "UPDATE info_objects SET name = ?1 WHERE id = ?2",
        params![name, id],
    )
    .map_err(StorageError::sqlite)?;
    Ok(())
}

pub fn timestamp_of(conn: &Connection, id: IobjectId) -> Result<Option<i64>, StorageError> {
    conn.query_row(
        "SELECT timestamp FROM info_objects WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )
    .optional()
    .map_err(StorageError::sqlite)
}

pub fn exists(conn: &Connection, id: IobjectId) -> Result<bool, StorageError> {
    Ok(timestamp_of(conn, id)?.is_some())
}

pub fn get_iobject(conn: &Connection, id: IobjectId) -> Result<Option<InfoObjectRow>, StorageError> {
    conn.query_row(&format!("{SELECT_ROW} WHERE o.id = ?1"), params![id], map_row)
        .optional()
        .map_err(StorageError::sqlite)
}

/// Type of a stored object revision.
pub fn iobject_type_of(conn: &Connection, id: IobjectId) -> Result<IobjectTypeId, StorageError> {
    conn.query_row(
        "SELECT iobject_type_id FROM info_objects WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )
    .optional()
    .map_err(StorageError::sqlite)?
    .ok_or_else(|| StorageError::NotFound {
        entity: "info object",
        key: id.to_string(),
    })
}

/// All revisions of an identifier, oldest first.
pub fn revisions_of(
    conn: &Connection,
    key: &IdentifierKey,
) -> Result<Vec<InfoObjectRow>, StorageError> {
    let mut stmt = conn
        .prepare(&format!(
            "{SELECT_ROW} WHERE n.uri = ?1 AND i.uid = ?2 ORDER BY o.timestamp ASC"
        ))
        .map_err(StorageError::sqlite)?;
    let rows = stmt
        .query_map(params![key.namespace_uri, key.uid], map_row)
        .map_err(StorageError::sqlite)?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(StorageError::sqlite)
}

/// Most recently created revisions first.
pub fn list_recent(conn: &Connection, limit: usize) -> Result<Vec<InfoObjectRow>, StorageError> {
    let mut stmt = conn
        .prepare(&format!(
            "{SELECT_ROW} ORDER BY o.create_timestamp DESC, o.id DESC LIMIT ?1"
        ))
        .map_err(StorageError::sqlite)?;
    let rows = stmt
        .query_map(params![limit as i64], map_row)
        .map_err(StorageError::sqlite)?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(StorageError::sqlite)
}

pub fn ids_of_type(conn: &Connection, iobject_type: IobjectTypeId) -> Result<Vec<IobjectId>, StorageError> {
    let mut stmt = conn
        .prepare_cached("SELECT id FROM info_objects WHERE iobject_type_id = ?1 ORDER BY id")
        .map_err(StorageError::sqlite)?;
    let rows = stmt
        .query_map(params![iobject_type], |row| row.get(0))
        .map_err(StorageError::sqlite)?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(StorageError::sqlite)
}
