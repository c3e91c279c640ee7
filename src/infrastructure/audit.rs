//! Audit sinks.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::domain::ObjectChange;
use crate::infrastructure::traits::{AuditSink, FileSystem, StoreError};

/// Keeps change events in process memory.
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    entries: Mutex<Vec<ObjectChange>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuditSink for MemoryAuditLog {
    fn record(&self, changes: &[ObjectChange]) -> Result<(), StoreError> {
        self.entries.lock().extend_from_slice(changes);
        Ok(())
    }

    fn entries(&self) -> Result<Vec<ObjectChange>, StoreError> {
        Ok(self.entries.lock().clone())
    }
}

/// Appends one JSON object per change event to a file.
pub struct JsonLinesAuditLog {
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl JsonLinesAuditLog {
    pub fn new(path: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            path: path.into(),
            fs,
        }
    }
}

impl AuditSink for JsonLinesAuditLog {
    fn record(&self, changes: &[ObjectChange]) -> Result<(), StoreError> {
        if changes.is_empty() {
            return Ok(());
        }
        let mut buf = String::new();
        for change in changes {
            let line = serde_json::to_string(change).map_err(|e| StoreError::Format {
                path: self.path.clone(),
                source: e,
            })?;
            buf.push_str(&line);
            buf.push('\n');
        }
        self.fs
            .append(&self.path, &buf)
            .map_err(|e| StoreError::io(format!("append {}", self.path.display()), e))?;
        debug!("recorded {} change(s) to {}", changes.len(), self.path.display());
        Ok(())
    }

    fn entries(&self) -> Result<Vec<ObjectChange>, StoreError> {
        if !self.fs.exists(&self.path) {
            return Ok(Vec::new());
        }
        let content = self
            .fs
            .read_to_string(&self.path)
            .map_err(|e| StoreError::io(format!("read {}", self.path.display()), e))?;
        let mut entries = Vec::new();
        for (n, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(change) => entries.push(change),
                Err(e) => warn!("skipping malformed audit line {}: {}", n + 1, e),
            }
        }
        Ok(entries)
    }
}
