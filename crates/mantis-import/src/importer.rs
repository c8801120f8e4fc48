//! Import driver: source -> parse -> extract -> persist, one object at a time.
//!
//! Every document import is recorded in `import_history`, whether it
//! succeeds or fails. Objects are persisted each in their own transaction,
//! so an error aborts the rest of the document but keeps what was stored.

use std::path::Path;

use chrono::{DateTime, Utc};
use mantis_core::config::ImportConfig;
use mantis_core::errors::{ImportError, ImportRun, MantisErrorCode};
use mantis_core::types::time::to_micros;
use mantis_core::types::{IdentifierKey, IobjectId};
use mantis_storage::queries::import_history::{self, ImportCompletion};
use mantis_storage::DatabaseManager;
use xxhash_rust::xxh3::xxh3_64;

use crate::embed::extract_embedded;
use crate::hooks::ImportHooks;
use crate::persist::{create_iobject, NewIobject, PersistOutcome};
use crate::xml::XmlDocument;

/// Where a document comes from.
#[derive(Debug, Clone, Copy)]
pub enum ImportSource<'a> {
    File(&'a Path),
    /// In-memory content; `name` is only used for logging and history.
    Content { name: &'a str, content: &'a str },
}

impl ImportSource<'_> {
    pub fn label(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Content { name, .. } => (*name).to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Marking objects attached to every imported object.
    pub markings: Vec<IobjectId>,
    pub max_file_size: u64,
    /// Creation time recorded on stored revisions. Defaults to now.
    pub create_timestamp: Option<DateTime<Utc>>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self::from_config(&ImportConfig::default())
    }
}

impl ImportOptions {
    pub fn from_config(config: &ImportConfig) -> Self {
        Self {
            markings: config
                .default_markings
                .iter()
                .copied()
                .map(IobjectId::new)
                .collect(),
            max_file_size: config.effective_max_file_size(),
            create_timestamp: None,
        }
    }
}

/// What happened to one object of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectOutcome {
    pub identifier: IdentifierKey,
    pub elt_name: String,
    pub outcome: PersistOutcome,
}

#[derive(Debug, Clone, Default)]
pub struct ImportSummary {
    pub source: String,
    pub content_hash: i64,
    pub outcomes: Vec<ObjectOutcome>,
    /// Element names of objects skipped for lack of an identifier.
    pub skipped: Vec<String>,
}

impl ImportSummary {
    fn count(&self, pred: fn(&PersistOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.outcome)).count()
    }

    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, PersistOutcome::Created(_)))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|o| matches!(o, PersistOutcome::Unchanged(_)))
    }

    pub fn replaced(&self) -> usize {
        self.count(|o| matches!(o, PersistOutcome::Replaced(_)))
    }

    pub fn skipped(&self) -> usize {
        self.skipped.len()
    }

    /// Stored object of the first outcome, usually the document's top object.
    pub fn first_iobject(&self) -> Option<IobjectId> {
        self.outcomes.first().map(|o| o.outcome.iobject_id())
    }
}

/// Generic XML importer. Format behavior comes from `hooks`.
pub struct XmlImporter<'db, H> {
    db: &'db DatabaseManager,
    hooks: H,
}

impl<'db, H: ImportHooks> XmlImporter<'db, H> {
    pub fn new(db: &'db DatabaseManager, hooks: H) -> Self {
        Self { db, hooks }
    }

    /// Import one document and record the run in the import history.
    pub fn import(
        &self,
        source: ImportSource<'_>,
        options: &ImportOptions,
    ) -> Result<ImportSummary, ImportError> {
        let label = source.label();
        let started_at = to_micros(Utc::now());
        let history_id = self
            .db
            .with_writer(|conn| import_history::insert_import_start(conn, started_at, &label))?;

        let result = self.run(source, &label, options);

        let completed_at = to_micros(Utc::now());
        let error_text = result.as_ref().err().map(|e| e.coded_string());
        let completion = match &result {
            Ok(summary) => ImportCompletion {
                completed_at,
                content_hash: Some(summary.content_hash),
                created_objects: summary.created() as i64,
                unchanged_objects: summary.unchanged() as i64,
                replaced_objects: summary.replaced() as i64,
                skipped_objects: summary.skipped() as i64,
                status: "completed",
                error: None,
            },
            Err(_) => ImportCompletion {
                completed_at,
                status: "failed",
                error: error_text.as_deref(),
                ..Default::default()
            },
        };
        if let Err(e) = self
            .db
            .with_writer(|conn| import_history::update_import_complete(conn, history_id, &completion))
        {
            tracing::warn!(source = %label, error = %e, "failed to record import completion");
        }

        match &result {
            Ok(summary) => tracing::info!(
                source = %label,
                created = summary.created(),
                unchanged = summary.unchanged(),
                replaced = summary.replaced(),
                skipped = summary.skipped(),
                "import complete"
            ),
            Err(e) => tracing::error!(source = %label, error = %e.coded_string(), "import failed"),
        }
        result
    }

    /// Import several documents. A failing document does not stop the run.
    pub fn import_all(
        &self,
        sources: &[ImportSource<'_>],
        options: &ImportOptions,
    ) -> ImportRun<Vec<ImportSummary>> {
        let mut run = ImportRun::<Vec<ImportSummary>>::default();
        for source in sources {
            match self.import(*source, options) {
                Ok(summary) => run.data.push(summary),
                Err(e) => run.add_error(source.label(), e),
            }
        }
        if let Err(e) = self.db.checkpoint() {
            tracing::warn!(error = %e, "WAL checkpoint failed");
        }
        run
    }

    fn run(
        &self,
        source: ImportSource<'_>,
        label: &str,
        options: &ImportOptions,
    ) -> Result<ImportSummary, ImportError> {
        let content = read_source(source, options.max_file_size)?;
        let content_hash = xxh3_64(content.as_bytes()) as i64;
        let create_timestamp = options.create_timestamp.unwrap_or_else(Utc::now);

        let doc = XmlDocument::parse(&content)?;
        let root_namespace = doc.root_namespace().map(str::to_string);
        let extracted = extract_embedded(doc, &self.hooks);
        let namespaces = extracted.namespaces.clone();

        let mut summary = ImportSummary {
            source: label.to_string(),
            content_hash,
            ..Default::default()
        };

        for object in extracted.into_objects() {
            let object = self.hooks.transform(object);
            let Some(identifier) = object.id_and_rev.id.clone() else {
                tracing::error!(
                    source = %label,
                    element = %object.elt_name(),
                    "object has no identifier, skipping"
                );
                summary.skipped.push(object.elt_name().to_string());
                continue;
            };

            let type_info = self.hooks.type_info(&object, root_namespace.as_deref());
            let outcome = create_iobject(
                self.db,
                &NewIobject {
                    element: &object.element,
                    identifier: identifier.clone(),
                    type_info: &type_info,
                    timestamp: object.id_and_rev.timestamp.unwrap_or(create_timestamp),
                    create_timestamp,
                    markings: &options.markings,
                    namespaces: &namespaces,
                },
                &self.hooks,
            )?;
            summary.outcomes.push(ObjectOutcome {
                identifier,
                elt_name: object.elt_name().to_string(),
                outcome,
            });
        }
        Ok(summary)
    }
}

fn read_source(source: ImportSource<'_>, limit: u64) -> Result<String, ImportError> {
    match source {
        ImportSource::File(path) => {
            let unreadable = |e: std::io::Error| ImportError::SourceUnreadable {
                path: path.to_path_buf(),
                message: e.to_string(),
            };
            let size = std::fs::metadata(path).map_err(unreadable)?.len();
            if size > limit {
                return Err(ImportError::FileTooLarge {
                    path: path.to_path_buf(),
                    size,
                    limit,
                });
            }
            std::fs::read_to_string(path).map_err(unreadable)
        }
        ImportSource::Content { name, content } => {
            let size = content.len() as u64;
            if size > limit {
                return Err(ImportError::FileTooLarge {
                    path: name.into(),
                    size,
                    limit,
                });
            }
            Ok(content.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_follow_config() {
        let config = ImportConfig {
            max_file_size: Some(1024),
            default_markings: vec![3, 7],
            ..Default::default()
        };
        let options = ImportOptions::from_config(&config);
        assert_eq!(options.max_file_size, 1024);
        assert_eq!(options.markings, vec![IobjectId::new(3), IobjectId::new(7)]);
        assert!(options.create_timestamp.is_none());
    }

    #[test]
    fn content_over_limit_is_rejected() {
        let source = ImportSource::Content {
            name: "big.xml",
            content: "<a>0123456789</a>",
        };
        assert!(matches!(
            read_source(source, 4),
            Err(ImportError::FileTooLarge { size: 17, limit: 4, .. })
        ));
        assert!(read_source(source, 17).is_ok());
    }

    #[test]
    fn missing_file_is_unreadable() {
        let source = ImportSource::File(Path::new("/nonexistent/mantis/doc.xml"));
        assert!(matches!(
            read_source(source, 1024),
            Err(ImportError::SourceUnreadable { .. })
        ));
        assert_eq!(source.label(), "/nonexistent/mantis/doc.xml");
    }
}
