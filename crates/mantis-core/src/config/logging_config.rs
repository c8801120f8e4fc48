//! Logging configuration.

use serde::{Deserialize, Serialize};

use crate::tracing::DEFAULT_FILTER;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives used when `MANTIS_LOG` is unset.
    pub filter: Option<String>,
}

impl LoggingConfig {
    pub fn effective_filter(&self) -> &str {
        self.filter.as_deref().unwrap_or(DEFAULT_FILTER)
    }
}
