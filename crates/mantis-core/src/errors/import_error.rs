//! Import errors and non-fatal error collection.

use std::path::PathBuf;

use super::error_code::{self, MantisErrorCode};
use super::{ConfigError, ParseError, StorageError};

/// Errors that can occur while importing a document.
/// Aggregates subsystem errors via `From` conversions.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cannot read import source {path}: {message}")]
    SourceUnreadable { path: PathBuf, message: String },

    #[error("{path} is {size} bytes, limit is {limit}")]
    FileTooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("Marking object {id} does not exist")]
    UnknownMarking { id: i64 },

    #[error("Invalid marking definition: {message}")]
    InvalidMarking { message: String },
}

impl MantisErrorCode for ImportError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Parse(e) => e.error_code(),
            Self::Storage(e) => e.error_code(),
            Self::Config(e) => e.error_code(),
            Self::SourceUnreadable { .. } => error_code::IO_ERROR,
            Self::FileTooLarge { .. } => error_code::FILE_TOO_LARGE,
            Self::UnknownMarking { .. } => error_code::UNKNOWN_MARKING,
            Self::InvalidMarking { .. } => error_code::INVALID_MARKING,
        }
    }
}

/// Result of a multi-source import run that accumulates non-fatal errors.
/// Allows partial results to be returned even when some sources fail.
#[derive(Debug, Default)]
pub struct ImportRun<T: Default = ()> {
    /// The successful result data.
    pub data: T,
    /// Non-fatal errors collected during the run, with the source they came from.
    pub errors: Vec<(String, ImportError)>,
}

impl<T: Default> ImportRun<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            errors: Vec::new(),
        }
    }

    /// Record a failed source.
    pub fn add_error(&mut self, source: impl Into<String>, error: ImportError) {
        self.errors.push((source.into(), error));
    }

    /// Returns true if no source failed.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}
