//! Import configuration.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_ID_NAMESPACE_URI;

/// Configuration for document imports.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ImportConfig {
    /// Identifier namespace for objects whose document carries none.
    pub identifier_ns_uri: Option<String>,
    /// Largest accepted input file in bytes. Default: 64 MiB.
    pub max_file_size: Option<u64>,
    /// Marking objects attached to every imported object.
    #[serde(default)]
    pub default_markings: Vec<i64>,
}

impl ImportConfig {
    pub fn effective_identifier_ns_uri(&self) -> &str {
        self.identifier_ns_uri
            .as_deref()
            .unwrap_or(DEFAULT_ID_NAMESPACE_URI)
    }

    /// Returns the effective file size limit, defaulting to 64 MiB.
    pub fn effective_max_file_size(&self) -> u64 {
        self.max_file_size.unwrap_or(64 * 1024 * 1024)
    }
}
