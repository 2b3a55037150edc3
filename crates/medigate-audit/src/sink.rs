//! Durable audit sinks.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::entry::AuditEntry;

/// Destination for a durable copy of each audit entry.
///
/// `write` must be atomic per entry: either the whole entry is persisted or
/// an error is returned and nothing is.
pub trait AuditSink: Send + Sync {
    /// Persists one entry.
    fn write(&self, entry: &AuditEntry) -> io::Result<()>;
}

/// Flat-file sink: one JSON line per entry, flushed per write.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileSink {
    /// Opens (or creates) the log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// The file this sink appends to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for FileSink {
    fn write(&self, entry: &AuditEntry) -> io::Result<()> {
        let line = entry.to_json_line().map_err(io::Error::other)?;
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(file, "{line}")?;
        file.flush()
    }
}

// ============================================================================
// Tests
// ============================================================================
