//! Schema versions, tracked in `PRAGMA user_version`.

pub mod v001_initial;
pub mod v002_naming_history;

use mantis_core::errors::StorageError;
use rusqlite::Connection;

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "info objects and facts",
        sql: v001_initial::MIGRATION_SQL,
    },
    Migration {
        version: 2,
        name: "naming schemas and import history",
        sql: v002_naming_history::MIGRATION_SQL,
    },
];

/// Schema version after all migrations have run.
pub const LATEST_VERSION: u32 = 2;

/// Bring the schema up to [`LATEST_VERSION`]. Already applied versions are
/// skipped, so this runs on every open.
pub fn run_migrations(conn: &Connection) -> Result<(), StorageError> {
    let from = current_version(conn)?;
    for migration in MIGRATIONS.iter().filter(|m| m.version > from) {
        let failed = |e: rusqlite::Error| StorageError::MigrationFailed {
            version: migration.version,
            message: e.to_string(),
        };
        conn.execute_batch(migration.sql).map_err(failed)?;
        conn.pragma_update(None, "user_version", migration.version)
            .map_err(failed)?;
        tracing::info!(
            version = migration.version,
            name = migration.name,
            "applied schema migration"
        );
    }
    Ok(())
}

pub fn current_version(conn: &Connection) -> Result<u32, StorageError> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(StorageError::sqlite)
}
