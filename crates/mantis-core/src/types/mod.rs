//! Shared types of the information-object / fact model.

pub mod identifiers;
pub mod model;
pub mod time;

pub use identifiers::*;
pub use model::{DatatypeKey, FactDataKind, FactRecord, IdentifierKey, IobjectTypeKey};
