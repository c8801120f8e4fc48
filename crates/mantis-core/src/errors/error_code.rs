//! MantisErrorCode trait for structured error reporting.

/// Every error enum implements this to provide a stable code string
/// that the CLI prints and the import history records.
pub trait MantisErrorCode {
    /// Returns the error code string (e.g., "PARSE_ERROR").
    fn error_code(&self) -> &'static str;

    /// Returns the formatted string: `[ERROR_CODE] message`.
    fn coded_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const PARSE_ERROR: &str = "PARSE_ERROR";
pub const IO_ERROR: &str = "IO_ERROR";
pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
pub const DB_BUSY: &str = "DB_BUSY";
pub const MIGRATION_FAILED: &str = "MIGRATION_FAILED";
pub const NOT_FOUND: &str = "NOT_FOUND";
pub const IMPORT_ERROR: &str = "IMPORT_ERROR";
pub const UNKNOWN_MARKING: &str = "UNKNOWN_MARKING";
pub const INVALID_MARKING: &str = "INVALID_MARKING";
pub const FILE_TOO_LARGE: &str = "FILE_TOO_LARGE";
