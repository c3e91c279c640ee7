//! Transactional unit of work over the tenancy dataset.
//!
//! Readers get an immutable snapshot. Writers are serialised by one lock,
//! mutate a private copy, and publish it only after the backend accepted it,
//! so a failed operation never leaves a partial change behind.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, instrument};

use crate::application::error_ext::StoreResultExt;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{ChangeAction, ChangeLogged, Dataset, ObjectChange};
use crate::infrastructure::traits::{AuditSink, DataStore};

/// Working state handed to a transaction body.
pub struct Transaction {
    pub data: Dataset,
    changes: Vec<ObjectChange>,
}

impl Transaction {
    /// Queue a change-log snapshot of `record` for this commit.
    pub fn record<T: ChangeLogged>(&mut self, record: &T, action: ChangeAction) {
        self.changes.push(record.to_object_change(action));
    }
}

pub struct Store {
    backend: Arc<dyn DataStore>,
    audit: Arc<dyn AuditSink>,
    current: RwLock<Arc<Dataset>>,
    writer: Mutex<()>,
}

impl Store {
    /// Load the current dataset from `backend`.
    pub fn open(backend: Arc<dyn DataStore>, audit: Arc<dyn AuditSink>) -> ApplicationResult<Self> {
        let data = backend.load().with_store_context("load dataset")?;
        debug!(
            "opened store at revision {} ({} groups, {} tenants, {} supervisors)",
            data.revision,
            data.groups.len(),
            data.tenants.len(),
            data.supervisors.len()
        );
        Ok(Self {
            backend,
            audit,
            current: RwLock::new(Arc::new(data)),
            writer: Mutex::new(()),
        })
    }

    /// Consistent view of the last committed state.
    pub fn snapshot(&self) -> Arc<Dataset> {
        self.current.read().clone()
    }

    /// Everything the audit sink has recorded, oldest first.
    pub fn audit_entries(&self) -> ApplicationResult<Vec<ObjectChange>> {
        self.audit.entries().with_store_context("read change log")
    }

    /// Run `body` against a private copy of the dataset and commit it.
    ///
    /// If `body` fails, or the backend rejects the result, nothing is
    /// published. Queued change events go to the audit sink after the
    /// commit succeeded; a sink failure then surfaces as `AuditFailed`,
    /// with the change already in place.
    #[instrument(level = "debug", skip(self, body))]
    pub fn transaction<R>(
        &self,
        operation: &str,
        body: impl FnOnce(&mut Transaction) -> ApplicationResult<R>,
    ) -> ApplicationResult<R> {
        let _writer = self.writer.lock();
        let base = self.snapshot();
        let mut tx = Transaction {
            data: (*base).clone(),
            changes: Vec::new(),
        };

        let result = body(&mut tx)?;

        tx.data.revision = base.revision + 1;
        self.backend
            .save(&tx.data, base.revision)
            .with_store_context(operation)?;
        let Transaction { data, changes } = tx;
        let revision = data.revision;
        *self.current.write() = Arc::new(data);
        info!("{}: committed revision {} ({} change(s))", operation, revision, changes.len());

        self.audit
            .record(&changes)
            .map_err(|source| ApplicationError::AuditFailed {
                operation: operation.to_string(),
                revision,
                source,
            })?;
        Ok(result)
    }

    /// Discard the published snapshot and load the backend's current state.
    pub fn reload(&self) -> ApplicationResult<()> {
        let _writer = self.writer.lock();
        let data = self.backend.load().with_store_context("reload dataset")?;
        *self.current.write() = Arc::new(data);
        Ok(())
    }
}
