//! mantis-iodef: IODEF v1.0 (RFC 5070) import.
//!
//! Every `Incident` of an `IODEF-Document` becomes one information object,
//! identified by its `IncidentID` and versioned by its `ReportTime`. The
//! rules live in [`hooks::IodefHooks`]; [`importer::IodefImporter`] drives
//! the generic XML import with them.

pub mod hooks;
pub mod importer;
pub mod naming;

pub use hooks::IodefHooks;
pub use importer::IodefImporter;
pub use naming::{set_naming, IODEF_SCHEMAS};
