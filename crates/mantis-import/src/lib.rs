//! mantis-import: generic XML import into the information-object / fact model.
//!
//! The pipeline is `xml` (owned element tree) -> `embed` (split out embedded
//! objects) -> `flatten` (facts with node ids) -> `persist` (dedup against
//! stored revisions). Format-specific behavior plugs in through
//! [`hooks::ImportHooks`].

pub mod embed;
pub mod flatten;
pub mod hooks;
pub mod importer;
pub mod marking;
pub mod naming;
pub mod persist;
pub mod xml;

pub use embed::{ExtractedObject, ExtractionResult, IdAndRevision};
pub use hooks::{DefaultHooks, FactArgs, ImportHooks, TypeInfo};
pub use importer::{ImportOptions, ImportSource, ImportSummary, XmlImporter};
pub use persist::PersistOutcome;
pub use xml::{NamespaceMap, XmlDocument, XmlElement};
