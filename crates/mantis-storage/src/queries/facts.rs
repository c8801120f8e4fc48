//! Queries for datatypes, fact terms, values, facts, node ids and the
//! object-to-fact links.

use mantis_core::errors::StorageError;
use mantis_core::types::{
    DatatypeId, DatatypeKey, DatatypeNamespaceId, FactDataKind, FactId, FactTermId, FactValueId,
    IdentifierId, IdentifierKey, IobjectId, IobjectTypeId, NodeIdId,
};
use rusqlite::{params, Connection};

/// A fact as attached to an object, in attachment order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFact {
    pub node_id: String,
    pub term: String,
    pub attribute: Option<String>,
    pub values: Vec<String>,
    /// Datatype of the first value; `None` for reference facts.
    pub datatype: Option<String>,
    pub reference: Option<IdentifierKey>,
}

pub fn get_or_create_datatype_namespace(
    conn: &Connection,
    uri: &str,
    name: Option<&str>,
) -> Result<DatatypeNamespaceId, StorageError> {
    conn.prepare_cached(
        "INSERT INTO datatype_namespaces (uri, name) VALUES (?1, ?2) ON CONFLICT(uri) DO NOTHING",
    )
    .and_then(|mut stmt| stmt.execute(params![uri, name]))
    .map_err(StorageError::sqlite)?;

    conn.prepare_cached("SELECT id FROM datatype_namespaces WHERE uri = ?1")
        .and_then(|mut stmt| stmt.query_row(params![uri], |row| row.get(0)))
        .map_err(StorageError::sqlite)
}

pub fn get_or_create_datatype(
    conn: &Connection,
    key: &DatatypeKey,
) -> Result<DatatypeId, StorageError> {
    let ns = get_or_create_datatype_namespace(conn, &key.namespace_uri, key.namespace_name.as_deref())?;

    conn.prepare_cached(
        "INSERT INTO fact_datatypes (name, namespace_id, kind) VALUES (?1, ?2, ?3)
         ON CONFLICT(name, namespace_id) DO NOTHING",
    )
    .and_then(|mut stmt| stmt.execute(params![key.name, ns, key.kind.as_i64()]))
    .map_err(StorageError::sqlite)?;

    conn.prepare_cached("SELECT id FROM fact_datatypes WHERE name = ?1 AND namespace_id = ?2")
        .and_then(|mut stmt| stmt.query_row(params![key.name, ns], |row| row.get(0)))
        .map_err(StorageError::sqlite)
}

/// Kind recorded for a datatype.
pub fn datatype_kind(conn: &Connection, id: DatatypeId) -> Result<FactDataKind, StorageError> {
    conn.query_row(
        "SELECT kind FROM fact_datatypes WHERE id = ?1",
        params![id],
        |row| row.get::<_, i64>(0),
    )
    .map(FactDataKind::from_i64)
    .map_err(StorageError::sqlite)
}

pub fn get_or_create_fact_term(
    conn: &Connection,
    term: &str,
    attribute: Option<&str>,
) -> Result<FactTermId, StorageError> {
    let attribute = attribute.unwrap_or("");
    conn.prepare_cached(
        "INSERT INTO fact_terms (term, attribute) VALUES (?1, ?2)
         ON CONFLICT(term, attribute) DO NOTHING",
    )
    .and_then(|mut stmt| stmt.execute(params![term, attribute]))
    .map_err(StorageError::sqlite)?;

    conn.prepare_cached("SELECT id FROM fact_terms WHERE term = ?1 AND attribute = ?2")
        .and_then(|mut stmt| stmt.query_row(params![term, attribute], |row| row.get(0)))
        .map_err(StorageError::sqlite)
}

/// Record that `term` occurs in objects of type `iobject_type`.
pub fn link_term_to_type(
    conn: &Connection,
    term: FactTermId,
    iobject_type: IobjectTypeId,
) -> Result<(), StorageError> {
    conn.prepare_cached(
        "INSERT OR IGNORE INTO fact_term_types (fact_term_id, iobject_type_id) VALUES (?1, ?2)",
    )
    .and_then(|mut stmt| stmt.execute(params![term, iobject_type]))
    .map_err(StorageError::sqlite)?;
    Ok(())
}

pub fn get_or_create_value(
    conn: &Connection,
    value: &str,
    datatype: DatatypeId,
) -> Result<FactValueId, StorageError> {
    conn.prepare_cached(
        "INSERT INTO fact_values (value, datatype_id) VALUES (?1, ?2)
         ON CONFLICT(value, datatype_id) DO NOTHING",
    )
    .and_then(|mut stmt| stmt.execute(params![value, datatype]))
    .map_err(StorageError::sqlite)?;

    conn.prepare_cached("SELECT id FROM fact_values WHERE value = ?1 AND datatype_id = ?2")
        .and_then(|mut stmt| stmt.query_row(params![value, datatype], |row| row.get(0)))
        .map_err(StorageError::sqlite)
}

/// Content key of a fact: term id, ordered value ids, reference id.
pub fn fact_content_key(
    term: FactTermId,
    values: &[FactValueId],
    reference: Option<IdentifierId>,
) -> String {
    let values = values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",");
    let reference = reference.map(|r| r.to_string()).unwrap_or_default();
    format!("{term}|{values}|{reference}")
}

/// Get or create the fact with exactly this term, values and reference.
/// Identical facts are shared between objects.
pub fn get_or_create_fact(
    conn: &Connection,
    term: FactTermId,
    values: &[FactValueId],
    reference: Option<IdentifierId>,
) -> Result<FactId, StorageError> {
    let key = fact_content_key(term, values, reference);

    let inserted = conn
        .prepare_cached(
            "INSERT INTO facts (fact_term_id, value_identifier_id, content_key) VALUES (?1, ?2, ?3)
             ON CONFLICT(content_key) DO NOTHING",
        )
        .and_then(|mut stmt| stmt.execute(params![term, reference, key]))
        .map_err(StorageError::sqlite)?;

    if inserted == 0 {
        return conn
            .prepare_cached("SELECT id FROM facts WHERE content_key = ?1")
            .and_then(|mut stmt| stmt.query_row(params![key], |row| row.get(0)))
            .map_err(StorageError::sqlite);
    }

    let fact = FactId::new(conn.last_insert_rowid());
    let mut stmt = conn
        .prepare_cached(
            "INSERT INTO fact_value_links (fact_id, position, fact_value_id) VALUES (?1, ?2, ?3)",
        )
        .map_err(StorageError::sqlite)?;
    for (position, value) in values.iter().enumerate() {
        stmt.execute(params![fact, position as i64, value])
            .map_err(StorageError::sqlite)?;
    }
    Ok(fact)
}

pub fn get_or_create_node_id(conn: &Connection, name: &str) -> Result<NodeIdId, StorageError> {
    conn.prepare_cached("INSERT INTO node_ids (name) VALUES (?1) ON CONFLICT(name) DO NOTHING")
        .and_then(|mut stmt| stmt.execute(params![name]))
        .map_err(StorageError::sqlite)?;

    conn.prepare_cached("SELECT id FROM node_ids WHERE name = ?1")
        .and_then(|mut stmt| stmt.query_row(params![name], |row| row.get(0)))
        .map_err(StorageError::sqlite)
}

pub fn attach_fact(
    conn: &Connection,
    iobject: IobjectId,
    fact: FactId,
    node_id: NodeIdId,
) -> Result<(), StorageError> {
    conn.prepare_cached("INSERT INTO iobject_facts (iobject_id, fact_id, node_id) VALUES (?1, ?2, ?3)")
        .and_then(|mut stmt| stmt.execute(params![iobject, fact, node_id]))
        .map_err(StorageError::sqlite)?;
    Ok(())
}

/// Remove every fact link of an object. Returns the number of links removed.
/// Facts themselves stay: other objects may share them.
pub fn detach_all_facts(conn: &Connection, iobject: IobjectId) -> Result<usize, StorageError> {
    conn.execute("DELETE FROM iobject_facts WHERE iobject_id = ?1", params![iobject])
        .map_err(StorageError::sqlite)
}

/// Facts of an object in attachment order, with values resolved.
pub fn object_facts(conn: &Connection, iobject: IobjectId) -> Result<Vec<StoredFact>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT f.id, n.name, t.term, t.attribute, ns.uri, i.uid
             FROM iobject_facts l
             JOIN facts f ON f.id = l.fact_id
             JOIN fact_terms t ON t.id = f.fact_term_id
             JOIN node_ids n ON n.id = l.node_id
             LEFT JOIN identifiers i ON i.id = f.value_identifier_id
             LEFT JOIN identifier_namespaces ns ON ns.id = i.namespace_id
             WHERE l.iobject_id = ?1
             ORDER BY l.id",
        )
        .map_err(StorageError::sqlite)?;

    let rows = stmt
        .query_map(params![iobject], |row| {
            let attribute: String = row.get(3)?;
            let ns: Option<String> = row.get(4)?;
            let uid: Option<String> = row.get(5)?;
            Ok((
                row.get::<_, FactId>(0)?,
                StoredFact {
                    node_id: row.get(1)?,
                    term: row.get(2)?,
                    attribute: (!attribute.is_empty()).then_some(attribute),
                    values: Vec::new(),
                    datatype: None,
                    reference: ns.zip(uid).map(|(ns, uid)| IdentifierKey::new(ns, uid)),
                },
            ))
        })
        .map_err(StorageError::sqlite)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(StorageError::sqlite)?;

    let mut value_stmt = conn
        .prepare_cached(
            "SELECT v.value, d.name
             FROM fact_value_links l
             JOIN fact_values v ON v.id = l.fact_value_id
             JOIN fact_datatypes d ON d.id = v.datatype_id
             WHERE l.fact_id = ?1
             ORDER BY l.position",
        )
        .map_err(StorageError::sqlite)?;

    let mut facts = Vec::with_capacity(rows.len());
    for (fact_id, mut fact) in rows {
        let values = value_stmt
            .query_map(params![fact_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(StorageError::sqlite)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(StorageError::sqlite)?;
        fact.datatype = values.first().map(|(_, dt)| dt.clone());
        fact.values = values.into_iter().map(|(v, _)| v).collect();
        facts.push(fact);
    }
    Ok(facts)
}
