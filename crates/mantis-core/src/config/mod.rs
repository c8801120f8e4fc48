//! Configuration system for Mantis.
//! TOML-based, layered resolution: CLI > env > project > user > defaults.

pub mod import_config;
pub mod logging_config;
pub mod mantis_config;
pub mod storage_config;

pub use import_config::ImportConfig;
pub use logging_config::LoggingConfig;
pub use mantis_config::{CliOverrides, MantisConfig};
pub use storage_config::StorageConfig;
