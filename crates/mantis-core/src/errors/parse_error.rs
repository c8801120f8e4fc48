//! XML parse errors.

use std::path::PathBuf;

use super::error_code::{self, MantisErrorCode};

/// Errors that can occur while reading an XML document.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Malformed XML at byte {position}: {message}")]
    Malformed { position: u64, message: String },

    #[error("Unbound namespace prefix '{prefix}' at byte {position}")]
    UnboundPrefix { prefix: String, position: u64 },

    #[error("Element nesting exceeds {limit} levels at byte {position}")]
    TooDeep { limit: usize, position: u64 },

    #[error("Document has no root element")]
    EmptyDocument,

    #[error("Cannot read {path}: {message}")]
    Io { path: PathBuf, message: String },
}

impl MantisErrorCode for ParseError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Io { .. } => error_code::IO_ERROR,
            _ => error_code::PARSE_ERROR,
        }
    }
}
