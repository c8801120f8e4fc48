//! Row counts per model, and the difference between two snapshots.
//! Import tests use the delta to assert exactly what an import created.

use mantis_core::errors::StorageError;
use rusqlite::Connection;

/// Model name and backing table, sorted by model name.
pub const MODELS: &[(&str, &str)] = &[
    ("DataTypeNameSpace", "datatype_namespaces"),
    ("Fact", "facts"),
    ("FactDataType", "fact_datatypes"),
    ("FactTerm", "fact_terms"),
    ("FactTerm2Type", "fact_term_types"),
    ("FactValue", "fact_values"),
    ("Identifier", "identifiers"),
    ("IdentifierNameSpace", "identifier_namespaces"),
    ("InfoObject", "info_objects"),
    ("InfoObject2Fact", "iobject_facts"),
    ("InfoObjectFamily", "iobject_families"),
    ("InfoObjectType", "iobject_types"),
    ("Marking2X", "markings"),
    ("NamingSchema", "naming_schemas"),
    ("NodeID", "node_ids"),
    ("Revision", "revisions"),
];

pub type ObjectCounts = Vec<(&'static str, i64)>;

/// Count the rows of every model.
pub fn object_counts(conn: &Connection) -> Result<ObjectCounts, StorageError> {
    MODELS
        .iter()
        .map(|(model, table)| {
            conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
                .map(|count: i64| (*model, count))
                .map_err(StorageError::sqlite)
        })
        .collect()
}

/// Non-zero per-model differences `after - before`.
pub fn delta(before: &ObjectCounts, after: &ObjectCounts) -> ObjectCounts {
    before
        .iter()
        .zip(after.iter())
        .filter_map(|((model, b), (_, a))| (a != b).then_some((*model, a - b)))
        .collect()
}
