//! V002: naming schemas and import history.

pub const MIGRATION_SQL: &str = r#"
-- Ordered name templates per object type; position 0 is tried first.
CREATE TABLE IF NOT EXISTS naming_schemas (
    iobject_type_id INTEGER NOT NULL REFERENCES iobject_types(id),
    position INTEGER NOT NULL,
    template TEXT NOT NULL,
    PRIMARY KEY (iobject_type_id, position)
) STRICT;

-- Import history: append-only log of import runs.
CREATE TABLE IF NOT EXISTS import_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at INTEGER NOT NULL,
    completed_at INTEGER,
    source TEXT NOT NULL,
    content_hash INTEGER,
    created_objects INTEGER,
    unchanged_objects INTEGER,
    replaced_objects INTEGER,
    skipped_objects INTEGER,
    status TEXT NOT NULL DEFAULT 'running',
    error TEXT
) STRICT;

CREATE INDEX IF NOT EXISTS idx_import_history_time
    ON import_history(started_at DESC);
"#;
