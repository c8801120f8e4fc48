//! Keys and records of the information-object / fact model.
//!
//! These are the natural keys the importer works with; the storage layer
//! maps each of them onto a row id with get-or-create semantics.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_DATATYPE_NAME, DEFAULT_DATATYPE_NAMESPACE_NAME, DEFAULT_DATATYPE_NAMESPACE_URI,
    REFERENCE_DATATYPE_NAME,
};

/// Natural key of an identifier: the owner namespace plus a uid within it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentifierKey {
    pub namespace_uri: String,
    pub uid: String,
}

impl IdentifierKey {
    pub fn new(namespace_uri: impl Into<String>, uid: impl Into<String>) -> Self {
        Self {
            namespace_uri: namespace_uri.into(),
            uid: uid.into(),
        }
    }
}

impl fmt::Display for IdentifierKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace_uri, self.uid)
    }
}

/// Natural key of an information object type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IobjectTypeKey {
    pub name: String,
    pub namespace_uri: String,
    pub family: String,
}

/// How the values of a datatype are constrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i64)]
pub enum FactDataKind {
    Unknown = 0,
    NoVocab = 1,
    VocabSingle = 2,
    VocabMultiple = 3,
    Reference = 4,
}

impl FactDataKind {
    pub fn as_i64(self) -> i64 {
        self as i64
    }

    pub fn from_i64(v: i64) -> Self {
        match v {
            1 => Self::NoVocab,
            2 => Self::VocabSingle,
            3 => Self::VocabMultiple,
            4 => Self::Reference,
            _ => Self::Unknown,
        }
    }
}

/// Natural key of a fact datatype. `namespace_name` is a display label
/// stored with the namespace; the URI is the defining part.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatatypeKey {
    pub name: String,
    pub namespace_uri: String,
    pub namespace_name: Option<String>,
    pub kind: FactDataKind,
}

impl DatatypeKey {
    /// Plain text in the built-in namespace.
    pub fn string() -> Self {
        Self {
            name: DEFAULT_DATATYPE_NAME.to_string(),
            namespace_uri: DEFAULT_DATATYPE_NAMESPACE_URI.to_string(),
            namespace_name: Some(DEFAULT_DATATYPE_NAMESPACE_NAME.to_string()),
            kind: FactDataKind::NoVocab,
        }
    }

    pub fn reference() -> Self {
        Self {
            name: REFERENCE_DATATYPE_NAME.to_string(),
            namespace_uri: DEFAULT_DATATYPE_NAMESPACE_URI.to_string(),
            namespace_name: Some(DEFAULT_DATATYPE_NAMESPACE_NAME.to_string()),
            kind: FactDataKind::Reference,
        }
    }
}

/// A fact ready to be persisted for one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactRecord {
    /// Position within the object, e.g. `N003:L001:A000`.
    pub node_id: String,
    /// `/`-joined element path below the object root.
    pub term: String,
    /// Attribute name for attribute facts.
    pub attribute: Option<String>,
    pub values: Vec<String>,
    pub datatype: DatatypeKey,
    /// Target of a reference fact.
    pub reference: Option<IdentifierKey>,
}
