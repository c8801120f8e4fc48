//! Tests for the Mantis configuration system.

use std::sync::Mutex;

use mantis_core::config::{CliOverrides, MantisConfig};
use mantis_core::constants::DEFAULT_ID_NAMESPACE_URI;
use mantis_core::errors::ConfigError;

/// Serializes tests that modify environment variables.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn tempdir() -> tempfile::TempDir {
    tempfile::TempDir::new().unwrap()
}

fn clear_mantis_env_vars() {
    for key in [
        "MANTIS_DATABASE_PATH",
        "MANTIS_READ_POOL_SIZE",
        "MANTIS_IDENTIFIER_NS_URI",
        "MANTIS_MAX_FILE_SIZE",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn test_layered_resolution() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_mantis_env_vars();

    let dir = tempdir();
    std::fs::write(
        dir.path().join("mantis.toml"),
        r#"
[storage]
database_path = "project.db"
read_pool_size = 2

[import]
identifier_ns_uri = "urn:project"
max_file_size = 1_000
"#,
    )
    .unwrap();

    std::env::set_var("MANTIS_MAX_FILE_SIZE", "5000");

    let cli = CliOverrides {
        identifier_ns_uri: Some("urn:cli".to_string()),
        ..Default::default()
    };

    let config = MantisConfig::load(dir.path(), Some(&cli)).unwrap();

    // project layer
    assert_eq!(config.storage.effective_database_path(), "project.db");
    assert_eq!(config.storage.effective_read_pool_size(), 2);
    // env beats project
    assert_eq!(config.import.effective_max_file_size(), 5000);
    // CLI beats project
    assert_eq!(config.import.effective_identifier_ns_uri(), "urn:cli");

    clear_mantis_env_vars();
}

#[test]
fn test_defaults_without_files() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_mantis_env_vars();

    let dir = tempdir();
    let config = MantisConfig::load(dir.path(), None).unwrap();
    assert_eq!(config.storage.effective_database_path(), "mantis.db");
    assert_eq!(config.storage.effective_read_pool_size(), 4);
    assert_eq!(
        config.import.effective_identifier_ns_uri(),
        DEFAULT_ID_NAMESPACE_URI
    );
    assert_eq!(config.import.effective_max_file_size(), 64 * 1024 * 1024);
    assert!(config.import.default_markings.is_empty());
}

#[test]
fn test_invalid_env_number_is_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_mantis_env_vars();

    std::env::set_var("MANTIS_READ_POOL_SIZE", "many");
    let dir = tempdir();
    let result = MantisConfig::load(dir.path(), None);
    clear_mantis_env_vars();

    assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
}

#[test]
fn test_cli_markings_extend_configured_markings() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_mantis_env_vars();

    let dir = tempdir();
    std::fs::write(
        dir.path().join("mantis.toml"),
        "[import]\ndefault_markings = [1, 2]\n",
    )
    .unwrap();

    let config = MantisConfig::load(dir.path(), None).unwrap();
    assert_eq!(config.import.default_markings, vec![1, 2]);

    let cli = CliOverrides {
        markings: vec![9, 2],
        ..Default::default()
    };
    let config = MantisConfig::load(dir.path(), Some(&cli)).unwrap();
    assert_eq!(config.import.default_markings, vec![1, 2, 9]);
}

#[test]
fn test_invalid_project_toml_is_parse_error() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_mantis_env_vars();

    let dir = tempdir();
    std::fs::write(dir.path().join("mantis.toml"), "[storage\nbroken").unwrap();
    let result = MantisConfig::load(dir.path(), None);
    assert!(matches!(result, Err(ConfigError::ParseError { .. })));
}

#[test]
fn test_validation_rejects_bad_values() {
    let config = MantisConfig::from_toml("[storage]\nread_pool_size = 0\n").unwrap();
    assert!(matches!(
        MantisConfig::validate(&config),
        Err(ConfigError::ValidationFailed { ref field, .. }) if field == "storage.read_pool_size"
    ));

    let config = MantisConfig::from_toml("[import]\nmax_file_size = 0\n").unwrap();
    assert!(MantisConfig::validate(&config).is_err());

    let config = MantisConfig::from_toml("[import]\nidentifier_ns_uri = \"  \"\n").unwrap();
    assert!(MantisConfig::validate(&config).is_err());
}

#[test]
fn test_unknown_keys_are_ignored() {
    let config = MantisConfig::from_toml(
        r#"
[storage]
database_path = "x.db"
future_option = true

[telemetry]
enabled = false
"#,
    )
    .unwrap();
    assert_eq!(config.storage.effective_database_path(), "x.db");
}

#[test]
fn test_toml_roundtrip() {
    let config = MantisConfig::from_toml(
        "[import]\nidentifier_ns_uri = \"urn:x\"\n[logging]\nfilter = \"mantis_iodef=debug\"\n",
    )
    .unwrap();
    let text = config.to_toml().unwrap();
    let back = MantisConfig::from_toml(&text).unwrap();
    assert_eq!(back.import.effective_identifier_ns_uri(), "urn:x");
    assert_eq!(back.logging.effective_filter(), "mantis_iodef=debug");
}
