//! DatabaseManager tests: file and in-memory databases, migrations, pool.

use mantis_core::errors::StorageError;
use mantis_storage::connection::pragmas::verify_wal_mode;
use mantis_storage::migrations::{current_version, LATEST_VERSION};
use mantis_storage::queries::identifiers::{find_identifier, get_or_create_identifier};
use mantis_storage::{with_immediate_transaction, DatabaseManager};
use mantis_core::types::IdentifierKey;

#[test]
fn open_file_database_runs_migrations_and_enables_wal() {
    let dir = tempfile::tempdir().unwrap();
    let db = DatabaseManager::open(&dir.path().join("mantis.db")).unwrap();

    let version = db.with_reader(current_version).unwrap();
    assert_eq!(version, LATEST_VERSION);

    let wal = db.with_writer(|conn| verify_wal_mode(conn)).unwrap();
    assert!(wal);
    assert!(db.path().is_some());
}

#[test]
fn reopen_keeps_data_and_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mantis.db");
    let key = IdentifierKey::new("csirt.example.com", "189493");

    {
        let db = DatabaseManager::open(&path).unwrap();
        db.with_writer(|conn| get_or_create_identifier(conn, &key))
            .unwrap();
        db.checkpoint().unwrap();
    }

    let db = DatabaseManager::open(&path).unwrap();
    assert_eq!(db.with_reader(current_version).unwrap(), LATEST_VERSION);
    let found = db.with_reader(|conn| find_identifier(conn, &key)).unwrap();
    assert!(found.is_some());
}

#[test]
fn in_memory_reads_see_writes() {
    let db = DatabaseManager::open_in_memory().unwrap();
    let key = IdentifierKey::new("csirt.example.com", "1");

    let id = db
        .with_writer(|conn| get_or_create_identifier(conn, &key))
        .unwrap();
    let found = db.with_reader(|conn| find_identifier(conn, &key)).unwrap();
    assert_eq!(found, Some(id));
    assert!(db.path().is_none());
    db.checkpoint().unwrap();
}

#[test]
fn pooled_readers_see_committed_writes() {
    let dir = tempfile::tempdir().unwrap();
    let db = DatabaseManager::open_with_pool_size(&dir.path().join("pool.db"), 2).unwrap();

    for i in 0..4 {
        let key = IdentifierKey::new("ns", format!("uid-{i}"));
        db.with_writer(|conn| get_or_create_identifier(conn, &key))
            .unwrap();
    }
    // Round-robin over both readers.
    for i in 0..4 {
        let key = IdentifierKey::new("ns", format!("uid-{i}"));
        let found = db.with_reader(|conn| find_identifier(conn, &key)).unwrap();
        assert!(found.is_some(), "uid-{i} not visible");
    }
}

#[test]
fn immediate_transaction_rolls_back_on_error() {
    let db = DatabaseManager::open_in_memory().unwrap();
    let key = IdentifierKey::new("ns", "rolled-back");

    let result: Result<(), StorageError> = db.with_writer(|conn| {
        with_immediate_transaction(conn, |tx| {
            get_or_create_identifier(tx, &key)?;
            Err(StorageError::NotFound {
                entity: "test",
                key: "abort".to_string(),
            })
        })
    });
    assert!(result.is_err());

    let found = db.with_reader(|conn| find_identifier(conn, &key)).unwrap();
    assert!(found.is_none());
}

#[test]
fn immediate_transaction_commits() {
    let db = DatabaseManager::open_in_memory().unwrap();
    let key = IdentifierKey::new("ns", "committed");

    db.with_writer(|conn| {
        with_immediate_transaction(conn, |tx| get_or_create_identifier(tx, &key))
    })
    .unwrap();

    let found = db.with_reader(|conn| find_identifier(conn, &key)).unwrap();
    assert!(found.is_some());
}

#[test]
fn migrations_are_idempotent() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    mantis_storage::migrations::run_migrations(&conn).unwrap();
    mantis_storage::migrations::run_migrations(&conn).unwrap();
    assert_eq!(current_version(&conn).unwrap(), LATEST_VERSION);
}

#[test]
fn pooled_readers_are_read_only() {
    let dir = tempfile::tempdir().unwrap();
    let db = DatabaseManager::open_with_pool_size(&dir.path().join("ro.db"), 1).unwrap();

    let result = db.with_reader(|conn| {
        conn.execute("INSERT INTO node_ids (name) VALUES ('N000')", [])
            .map_err(StorageError::sqlite)
    });
    assert!(result.is_err());
    assert!(db.with_writer(|conn| verify_wal_mode(conn)).unwrap());
}

#[test]
fn in_memory_database_is_not_wal() {
    let db = DatabaseManager::open_in_memory().unwrap();
    assert!(!db.with_writer(|conn| verify_wal_mode(conn)).unwrap());
}
