//! mantis-storage: SQLite persistence layer for the Mantis fact model.
//!
//! One serialized write connection, a round-robin read pool, schema
//! migrations keyed on `PRAGMA user_version`, and plain query functions
//! that take a `&Connection`.

pub mod connection;
pub mod counts;
pub mod migrations;
pub mod queries;

pub use connection::writer::with_immediate_transaction;
pub use connection::DatabaseManager;
