//! Tests for tracing setup.

use std::sync::Mutex;

use mantis_core::config::LoggingConfig;
use mantis_core::tracing::{init_tracing, DEFAULT_FILTER, LOG_ENV_VAR};

/// Serializes tests that touch `MANTIS_LOG`.
static TRACING_MUTEX: Mutex<()> = Mutex::new(());

#[test]
fn test_per_crate_directives_are_accepted() {
    let _lock = TRACING_MUTEX.lock().unwrap();
    std::env::set_var(LOG_ENV_VAR, "mantis_import=debug,mantis_storage=warn");
    init_tracing(DEFAULT_FILTER);
    std::env::remove_var(LOG_ENV_VAR);
}

#[test]
fn test_init_tracing_idempotent() {
    let _lock = TRACING_MUTEX.lock().unwrap();
    init_tracing(DEFAULT_FILTER);
    init_tracing("mantis_iodef=trace");
    tracing::info!(check = "idempotent", "tracing still usable");
}

#[test]
fn test_invalid_directive_falls_back() {
    let _lock = TRACING_MUTEX.lock().unwrap();
    std::env::set_var(LOG_ENV_VAR, "=not=a=filter=");
    init_tracing(DEFAULT_FILTER);
    std::env::remove_var(LOG_ENV_VAR);
}

#[test]
fn test_logging_config_default_filter() {
    let config = LoggingConfig::default();
    assert_eq!(config.effective_filter(), DEFAULT_FILTER);

    let config = LoggingConfig {
        filter: Some("mantis_iodef=debug".to_string()),
    };
    assert_eq!(config.effective_filter(), "mantis_iodef=debug");
}
