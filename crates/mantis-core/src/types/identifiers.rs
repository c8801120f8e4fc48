//! Row-id newtypes for type-safe references between tables.
//!
//! Each ID wraps the SQLite rowid so an `IobjectId` cannot be passed where
//! a `FactId` is expected.

use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl $name {
            pub fn new(rowid: i64) -> Self {
                Self(rowid)
            }

            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                self.0.to_sql()
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                i64::column_result(value).map(Self)
            }
        }
    };
}

define_id!(
    /// One revision of an information object.
    IobjectId
);

define_id!(IdentifierId);

define_id!(IdentifierNamespaceId);

define_id!(
    /// Information object type (name, namespace, family).
    IobjectTypeId
);

define_id!(IobjectFamilyId);

define_id!(
    /// Revision name shared by families and types.
    RevisionId
);

define_id!(DatatypeNamespaceId);

define_id!(DatatypeId);

define_id!(FactTermId);

define_id!(FactValueId);

define_id!(
    /// A fact: term plus values or a reference. Shared between objects.
    FactId
);

define_id!(NodeIdId);
