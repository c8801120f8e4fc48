//! Tracing initialization and configuration.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Environment variable holding per-crate log directives.
pub const LOG_ENV_VAR: &str = "MANTIS_LOG";

/// Directives used when neither `MANTIS_LOG` nor the config provide any.
pub const DEFAULT_FILTER: &str =
    "mantis_core=info,mantis_storage=info,mantis_import=info,mantis_iodef=info";

/// Initialize the tracing/logging system.
///
/// Reads `MANTIS_LOG` for per-crate log levels, e.g.
/// `MANTIS_LOG=mantis_import=debug,mantis_storage=warn`.
/// Falls back to `default_filter` if `MANTIS_LOG` is not set or is invalid.
///
/// Idempotent: only the first call installs a subscriber.
pub fn init_tracing(default_filter: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .unwrap_or_else(|_| EnvFilter::new(default_filter));

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(filter)
            .init();
    });
}
