//! I/O boundary traits for testability
//!
//! These traits abstract persistence and audit storage, allowing services
//! to be tested with in-memory implementations.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::{Dataset, ObjectChange};

/// Uniform error type for persistence backends and audit sinks.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Someone else committed since the caller's snapshot was taken.
    #[error("revision conflict: expected {expected}, found {found}")]
    Conflict { expected: u64, found: u64 },

    #[error("constraint violated: {0}")]
    Constraint(String),

    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("malformed data in {path}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Create parent directories if needed.
    fn ensure_parent(&self, path: &Path) -> io::Result<()>;

    /// Replace the file's content in one step: readers see either the old
    /// or the new content.
    fn write_atomic(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Append to the file, creating it if missing.
    fn append(&self, path: &Path, content: &str) -> io::Result<()>;
}

/// Persistence collaborator: loads and saves the whole dataset.
pub trait DataStore: Send + Sync {
    fn load(&self) -> Result<Dataset, StoreError>;

    /// Persist `data` if the stored revision still equals
    /// `expected_revision`; otherwise fail with `Conflict`.
    fn save(&self, data: &Dataset, expected_revision: u64) -> Result<(), StoreError>;
}

/// Audit collaborator: receives the change events of committed transactions.
pub trait AuditSink: Send + Sync {
    fn record(&self, changes: &[ObjectChange]) -> Result<(), StoreError>;

    /// All recorded events, oldest first.
    fn entries(&self) -> Result<Vec<ObjectChange>, StoreError>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn ensure_parent(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }

    fn write_atomic(&self, path: &Path, content: &str) -> io::Result<()> {
        use std::io::Write;

        self.ensure_parent(path)?;
        // temp file in the target directory so the rename stays on one device
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    fn append(&self, path: &Path, content: &str) -> io::Result<()> {
        use std::io::Write;

        self.ensure_parent(path)?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        file.write_all(content.as_bytes())
    }
}
