//! Top-level Mantis configuration with layered resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{ImportConfig, LoggingConfig, StorageConfig};
use crate::errors::ConfigError;

/// Name of the project-level config file.
pub const PROJECT_CONFIG_FILE: &str = "mantis.toml";

const MAX_READ_POOL_SIZE: usize = 8;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. CLI flags (applied via `apply_cli_overrides`)
/// 2. Environment variables (`MANTIS_*`)
/// 3. Project config (`mantis.toml` in the project root)
/// 4. User config (`~/.mantis/config.toml`)
/// 5. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MantisConfig {
    pub storage: StorageConfig,
    pub import: ImportConfig,
    pub logging: LoggingConfig,
}

/// CLI override arguments that can be applied to a config.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub database_path: Option<String>,
    pub identifier_ns_uri: Option<String>,
    pub markings: Vec<i64>,
}

impl MantisConfig {
    /// Load configuration from all layers rooted at `root`.
    pub fn load(root: &Path, cli_overrides: Option<&CliOverrides>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Layer 4 (lowest priority): user config
        if let Some(user_config_path) = Self::user_config_path() {
            if user_config_path.exists() {
                match Self::merge_toml_file(&mut config, &user_config_path) {
                    Ok(()) => {}
                    Err(e @ ConfigError::ParseError { .. }) => return Err(e),
                    Err(e) => {
                        tracing::warn!(error = %e, "ignoring unreadable user config");
                    }
                }
            }
        }

        // Layer 3: project config
        let project_config_path = root.join(PROJECT_CONFIG_FILE);
        if project_config_path.exists() {
            Self::merge_toml_file(&mut config, &project_config_path)?;
        }

        // Layer 2: environment variables
        Self::apply_env_overrides(&mut config)?;

        // Layer 1 (highest priority): CLI flags
        if let Some(cli) = cli_overrides {
            Self::apply_cli_overrides(&mut config, cli);
        }

        Self::validate(&config)?;

        Ok(config)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Validate the configuration values.
    pub fn validate(config: &MantisConfig) -> Result<(), ConfigError> {
        if let Some(size) = config.storage.read_pool_size {
            if !(1..=MAX_READ_POOL_SIZE).contains(&size) {
                return Err(ConfigError::ValidationFailed {
                    field: "storage.read_pool_size".to_string(),
                    message: format!("must be between 1 and {MAX_READ_POOL_SIZE}"),
                });
            }
        }
        if let Some(max) = config.import.max_file_size {
            if max == 0 {
                return Err(ConfigError::ValidationFailed {
                    field: "import.max_file_size".to_string(),
                    message: "must be greater than 0".to_string(),
                });
            }
        }
        if let Some(ref uri) = config.import.identifier_ns_uri {
            if uri.trim().is_empty() {
                return Err(ConfigError::ValidationFailed {
                    field: "import.identifier_ns_uri".to_string(),
                    message: "must not be empty".to_string(),
                });
            }
        }
        if let Some(ref path) = config.storage.database_path {
            if path.trim().is_empty() {
                return Err(ConfigError::ValidationFailed {
                    field: "storage.database_path".to_string(),
                    message: "must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Returns the user config path: `~/.mantis/config.toml`.
    fn user_config_path() -> Option<PathBuf> {
        home_dir().map(|h| h.join(".mantis").join("config.toml"))
    }

    /// Merge a TOML file into the existing config.
    /// Unknown keys are silently ignored.
    fn merge_toml_file(config: &mut MantisConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let file_config: MantisConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`; `other` wins wherever it has a value.
    fn merge(base: &mut MantisConfig, other: &MantisConfig) {
        if other.storage.database_path.is_some() {
            base.storage.database_path = other.storage.database_path.clone();
        }
        if other.storage.read_pool_size.is_some() {
            base.storage.read_pool_size = other.storage.read_pool_size;
        }

        if other.import.identifier_ns_uri.is_some() {
            base.import.identifier_ns_uri = other.import.identifier_ns_uri.clone();
        }
        if other.import.max_file_size.is_some() {
            base.import.max_file_size = other.import.max_file_size;
        }
        if !other.import.default_markings.is_empty() {
            base.import.default_markings = other.import.default_markings.clone();
        }

        if other.logging.filter.is_some() {
            base.logging.filter = other.logging.filter.clone();
        }
    }

    /// Apply environment variable overrides.
    /// Unparsable numeric values are rejected rather than silently dropped.
    fn apply_env_overrides(config: &mut MantisConfig) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("MANTIS_DATABASE_PATH") {
            config.storage.database_path = Some(val);
        }
        if let Ok(val) = std::env::var("MANTIS_READ_POOL_SIZE") {
            let v = val.parse::<usize>().map_err(|e| ConfigError::InvalidValue {
                field: "MANTIS_READ_POOL_SIZE".to_string(),
                message: e.to_string(),
            })?;
            config.storage.read_pool_size = Some(v);
        }
        if let Ok(val) = std::env::var("MANTIS_IDENTIFIER_NS_URI") {
            config.import.identifier_ns_uri = Some(val);
        }
        if let Ok(val) = std::env::var("MANTIS_MAX_FILE_SIZE") {
            let v = val.parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                field: "MANTIS_MAX_FILE_SIZE".to_string(),
                message: e.to_string(),
            })?;
            config.import.max_file_size = Some(v);
        }
        Ok(())
    }

    /// Apply CLI overrides (highest priority).
    fn apply_cli_overrides(config: &mut MantisConfig, cli: &CliOverrides) {
        if let Some(ref v) = cli.database_path {
            config.storage.database_path = Some(v.clone());
        }
        if let Some(ref v) = cli.identifier_ns_uri {
            config.import.identifier_ns_uri = Some(v.clone());
        }
        // CLI markings add to the configured defaults.
        for marking in &cli.markings {
            if !config.import.default_markings.contains(marking) {
                config.import.default_markings.push(*marking);
            }
        }
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
