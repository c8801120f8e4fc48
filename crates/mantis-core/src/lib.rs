//! mantis-core: shared foundation for the Mantis IODEF importer.
//!
//! - errors: one `thiserror` enum per subsystem, all carrying error codes
//! - config: TOML configuration with layered resolution
//! - tracing: `tracing-subscriber` setup driven by `MANTIS_LOG`
//! - types: row ids and the information-object / fact model keys
//! - constants: default namespaces and datatype names

pub mod config;
pub mod constants;
pub mod errors;
pub mod tracing;
pub mod types;

pub use config::MantisConfig;
pub use errors::{ConfigError, ImportError, ImportRun, MantisErrorCode, ParseError, StorageError};
