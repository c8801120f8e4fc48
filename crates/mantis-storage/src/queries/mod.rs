//! Query modules, one per group of tables.
//!
//! Dimension tables (namespaces, terms, values, ...) use get-or-create:
//! `INSERT .. ON CONFLICT DO NOTHING` followed by a lookup on the natural key.

pub mod facts;
pub mod identifiers;
pub mod import_history;
pub mod iobjects;
pub mod markings;
pub mod naming;
pub mod types;
