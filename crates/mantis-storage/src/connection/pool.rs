//! Read-only connections for the query side of the store.
//!
//! Imports write through the single writer; the `stats`, `history` and
//! `objects` commands, object counts and naming lookups only read, and go
//! through these connections so they never queue behind an import.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use mantis_core::errors::StorageError;
use rusqlite::{Connection, OpenFlags};

use super::pragmas::apply_read_pragmas;

/// `storage.read_pool_size` when unset.
pub const DEFAULT_READERS: usize = 4;
const MAX_READERS: usize = 8;

pub struct ReadPool {
    readers: Vec<Mutex<Connection>>,
    cursor: AtomicUsize,
}

impl ReadPool {
    /// Open `size` read-only connections to `path`, clamped to `1..=8`.
    pub fn open(path: &Path, size: usize) -> Result<Self, StorageError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let readers = (0..size.clamp(1, MAX_READERS))
            .map(|_| {
                let conn = Connection::open_with_flags(path, flags).map_err(StorageError::sqlite)?;
                apply_read_pragmas(&conn)?;
                Ok(Mutex::new(conn))
            })
            .collect::<Result<Vec<_>, StorageError>>()?;
        Ok(Self {
            readers,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Run `f` on the next reader in turn.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Connection) -> Result<T, StorageError>,
    {
        let slot = self.cursor.fetch_add(1, Ordering::Relaxed) % self.readers.len();
        let conn = self.readers[slot]
            .lock()
            .map_err(|_| StorageError::SqliteError {
                message: format!("reader {slot} lock poisoned"),
            })?;
        f(&conn)
    }

    pub fn size(&self) -> usize {
        self.readers.len()
    }
}
