//! V001: Initial schema: the information-object / fact model.
//! identifiers, families, revisions, types, info objects, datatypes,
//! fact terms, values, facts, node ids, object-to-fact links, markings.

pub const MIGRATION_SQL: &str = r#"
-- Identifier namespaces: the owner of an identifier (e.g. a CSIRT name).
CREATE TABLE IF NOT EXISTS identifier_namespaces (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    uri TEXT NOT NULL UNIQUE,
    name TEXT
) STRICT;

-- Identifiers outlive revisions; `latest_iobject_id` tracks the newest one.
-- Rows may exist before any object does (targets of reference facts).
CREATE TABLE IF NOT EXISTS identifiers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    namespace_id INTEGER NOT NULL REFERENCES identifier_namespaces(id),
    uid TEXT NOT NULL,
    latest_iobject_id INTEGER,
    UNIQUE(namespace_id, uid)
) STRICT;

CREATE TABLE IF NOT EXISTS iobject_families (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
) STRICT;

-- Revision names, shared by families and types. May be the empty string.
CREATE TABLE IF NOT EXISTS revisions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
) STRICT;

CREATE TABLE IF NOT EXISTS iobject_types (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    namespace_uri TEXT NOT NULL,
    family_id INTEGER NOT NULL REFERENCES iobject_families(id),
    UNIQUE(name, namespace_uri, family_id)
) STRICT;

-- One row per object revision. Timestamps are UTC microseconds.
CREATE TABLE IF NOT EXISTS info_objects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    identifier_id INTEGER NOT NULL REFERENCES identifiers(id),
    iobject_type_id INTEGER NOT NULL REFERENCES iobject_types(id),
    iobject_type_revision_id INTEGER NOT NULL REFERENCES revisions(id),
    iobject_family_id INTEGER NOT NULL REFERENCES iobject_families(id),
    iobject_family_revision_id INTEGER NOT NULL REFERENCES revisions(id),
    timestamp INTEGER NOT NULL,
    create_timestamp INTEGER NOT NULL,
    name TEXT NOT NULL DEFAULT '',
    content_hash INTEGER NOT NULL,
    UNIQUE(identifier_id, timestamp)
) STRICT;

CREATE INDEX IF NOT EXISTS idx_info_objects_type
    ON info_objects(iobject_type_id);
CREATE INDEX IF NOT EXISTS idx_info_objects_timestamp
    ON info_objects(timestamp DESC);

CREATE TABLE IF NOT EXISTS datatype_namespaces (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    uri TEXT NOT NULL UNIQUE,
    name TEXT
) STRICT;

CREATE TABLE IF NOT EXISTS fact_datatypes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    namespace_id INTEGER NOT NULL REFERENCES datatype_namespaces(id),
    kind INTEGER NOT NULL DEFAULT 0,
    UNIQUE(name, namespace_id)
) STRICT;

-- attribute is '' for element-value facts.
CREATE TABLE IF NOT EXISTS fact_terms (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    term TEXT NOT NULL,
    attribute TEXT NOT NULL DEFAULT '',
    UNIQUE(term, attribute)
) STRICT;

CREATE TABLE IF NOT EXISTS fact_term_types (
    fact_term_id INTEGER NOT NULL REFERENCES fact_terms(id),
    iobject_type_id INTEGER NOT NULL REFERENCES iobject_types(id),
    PRIMARY KEY (fact_term_id, iobject_type_id)
) STRICT;

CREATE TABLE IF NOT EXISTS fact_values (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    value TEXT NOT NULL,
    datatype_id INTEGER NOT NULL REFERENCES fact_datatypes(id),
    UNIQUE(value, datatype_id)
) STRICT;

-- Facts are content-addressed: content_key = term id | value ids | reference id.
CREATE TABLE IF NOT EXISTS facts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    fact_term_id INTEGER NOT NULL REFERENCES fact_terms(id),
    value_identifier_id INTEGER REFERENCES identifiers(id),
    content_key TEXT NOT NULL UNIQUE
) STRICT;

CREATE TABLE IF NOT EXISTS fact_value_links (
    fact_id INTEGER NOT NULL REFERENCES facts(id),
    position INTEGER NOT NULL,
    fact_value_id INTEGER NOT NULL REFERENCES fact_values(id),
    PRIMARY KEY (fact_id, position)
) STRICT;

CREATE TABLE IF NOT EXISTS node_ids (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
) STRICT;

CREATE TABLE IF NOT EXISTS iobject_facts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    iobject_id INTEGER NOT NULL REFERENCES info_objects(id) ON DELETE CASCADE,
    fact_id INTEGER NOT NULL REFERENCES facts(id),
    node_id INTEGER NOT NULL REFERENCES node_ids(id),
    UNIQUE(iobject_id, node_id)
) STRICT;

CREATE INDEX IF NOT EXISTS idx_iobject_facts_fact
    ON iobject_facts(fact_id);

-- Marking objects attached to marked objects.
CREATE TABLE IF NOT EXISTS markings (
    iobject_id INTEGER NOT NULL REFERENCES info_objects(id) ON DELETE CASCADE,
    marking_iobject_id INTEGER NOT NULL REFERENCES info_objects(id),
    PRIMARY KEY (iobject_id, marking_iobject_id)
) STRICT;
"#;
