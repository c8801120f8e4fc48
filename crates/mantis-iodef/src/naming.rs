//! Default naming schemas for IODEF objects.

use mantis_core::errors::StorageError;
use mantis_core::types::IobjectTypeKey;
use mantis_import::naming::install_schemas;
use mantis_storage::DatabaseManager;

/// A type and its name templates, most specific first.
#[derive(Debug, Clone, Copy)]
pub struct SchemaEntry {
    pub type_name: &'static str,
    pub family: &'static str,
    pub namespace_uri: &'static str,
    pub templates: &'static [&'static str],
}

impl SchemaEntry {
    pub fn type_key(&self) -> IobjectTypeKey {
        IobjectTypeKey {
            name: self.type_name.to_string(),
            namespace_uri: self.namespace_uri.to_string(),
            family: self.family.to_string(),
        }
    }
}

pub const IODEF_SCHEMAS: &[SchemaEntry] = &[SchemaEntry {
    type_name: "Incident",
    family: "iodef",
    namespace_uri: "urn:ietf:params:xml:ns:iodef",
    templates: &["[Description] ([@purpose])", "[Description]"],
}];

/// Install [`IODEF_SCHEMAS`] and rename stored objects. Safe to run
/// repeatedly; returns the number of renamed objects.
pub fn set_naming(db: &DatabaseManager) -> Result<usize, StorageError> {
    IODEF_SCHEMAS.iter().try_fold(0, |renamed, entry| {
        Ok(renamed + install_schemas(db, &entry.type_key(), entry.templates)?)
    })
}
