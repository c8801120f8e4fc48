//! IODEF document import.

use std::path::Path;

use mantis_core::config::ImportConfig;
use mantis_core::constants::DEFAULT_ID_NAMESPACE_URI;
use mantis_core::errors::{ImportError, ImportRun};
use mantis_import::{ImportOptions, ImportSource, ImportSummary, XmlImporter};
use mantis_storage::DatabaseManager;

use crate::hooks::IodefHooks;

/// Imports IODEF documents into one store.
///
/// Each call builds fresh hooks, so nothing carries over from one document
/// to the next: the creation timestamp is taken per document unless the
/// options fix it.
pub struct IodefImporter<'db> {
    db: &'db DatabaseManager,
    identifier_ns_uri: String,
}

impl<'db> IodefImporter<'db> {
    pub fn new(db: &'db DatabaseManager) -> Self {
        Self::with_identifier_ns_uri(db, DEFAULT_ID_NAMESPACE_URI)
    }

    /// `uri` names incidents whose `IncidentID` lacks a `name` attribute.
    pub fn with_identifier_ns_uri(db: &'db DatabaseManager, uri: impl Into<String>) -> Self {
        Self {
            db,
            identifier_ns_uri: uri.into(),
        }
    }

    pub fn from_config(db: &'db DatabaseManager, config: &ImportConfig) -> Self {
        Self::with_identifier_ns_uri(db, config.effective_identifier_ns_uri())
    }

    fn importer(&self) -> XmlImporter<'db, IodefHooks> {
        XmlImporter::new(self.db, IodefHooks::new(self.identifier_ns_uri.clone()))
    }

    pub fn xml_import(
        &self,
        source: ImportSource<'_>,
        options: &ImportOptions,
    ) -> Result<ImportSummary, ImportError> {
        self.importer().import(source, options)
    }

    pub fn import_file(
        &self,
        path: &Path,
        options: &ImportOptions,
    ) -> Result<ImportSummary, ImportError> {
        self.xml_import(ImportSource::File(path), options)
    }

    /// Import every file; failures are collected, not fatal.
    pub fn import_files<P: AsRef<Path>>(
        &self,
        paths: &[P],
        options: &ImportOptions,
    ) -> ImportRun<Vec<ImportSummary>> {
        let sources: Vec<ImportSource<'_>> = paths
            .iter()
            .map(|p| ImportSource::File(p.as_ref()))
            .collect();
        self.importer().import_all(&sources, options)
    }
}
