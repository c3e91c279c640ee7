//! Dataset persistence backends.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, instrument};

use crate::domain::Dataset;
use crate::infrastructure::traits::{DataStore, FileSystem, StoreError};

/// Keeps the dataset in process memory. Used by tests and one-off runs.
#[derive(Debug, Default)]
pub struct MemoryDataStore {
    data: Mutex<Dataset>,
}

impl MemoryDataStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DataStore for MemoryDataStore {
    fn load(&self) -> Result<Dataset, StoreError> {
        Ok(self.data.lock().clone())
    }

    fn save(&self, data: &Dataset, expected_revision: u64) -> Result<(), StoreError> {
        let mut stored = self.data.lock();
        if stored.revision != expected_revision {
            return Err(StoreError::Conflict {
                expected: expected_revision,
                found: stored.revision,
            });
        }
        data.check_constraints().map_err(StoreError::Constraint)?;
        *stored = data.clone();
        Ok(())
    }
}

/// Stores the dataset as one pretty-printed JSON document.
///
/// Saves replace the file atomically; the revision check reads the file
/// first, so a second process that committed in between is detected.
pub struct JsonFileStore {
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            path: path.into(),
            fs,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Dataset, StoreError> {
        if !self.fs.exists(&self.path) {
            debug!("no data file at {}, starting empty", self.path.display());
            return Ok(Dataset::new());
        }
        let content = self
            .fs
            .read_to_string(&self.path)
            .map_err(|e| StoreError::io(format!("read {}", self.path.display()), e))?;
        if content.trim().is_empty() {
            return Ok(Dataset::new());
        }
        serde_json::from_str(&content).map_err(|e| StoreError::Format {
            path: self.path.clone(),
            source: e,
        })
    }
}

impl DataStore for JsonFileStore {
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    fn load(&self) -> Result<Dataset, StoreError> {
        let _guard = self.lock.lock();
        self.read()
    }

    #[instrument(level = "debug", skip(self, data), fields(path = %self.path.display()))]
    fn save(&self, data: &Dataset, expected_revision: u64) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        let found = self.read()?.revision;
        if found != expected_revision {
            return Err(StoreError::Conflict {
                expected: expected_revision,
                found,
            });
        }
        data.check_constraints().map_err(StoreError::Constraint)?;

        let content = serde_json::to_string_pretty(data).map_err(|e| StoreError::Format {
            path: self.path.clone(),
            source: e,
        })?;
        self.fs
            .write_atomic(&self.path, &content)
            .map_err(|e| StoreError::io(format!("write {}", self.path.display()), e))?;
        debug!("saved revision {}", data.revision);
        Ok(())
    }
}
