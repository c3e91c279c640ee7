//! Service container for dependency injection
//!
//! Wires up the store and all services with their dependencies.

use std::sync::Arc;

use crate::application::services::{SupervisorService, TenantGroupService, TenantService};
use crate::application::Store;
use crate::config::Settings;
use crate::infrastructure::audit::{JsonLinesAuditLog, MemoryAuditLog};
use crate::infrastructure::error::InfraResult;
use crate::infrastructure::storage::{JsonFileStore, MemoryDataStore};
use crate::infrastructure::traits::{AuditSink, DataStore, FileSystem, RealFileSystem};

/// Container holding all application services.
///
/// All services share one store, so they observe the same snapshots
/// and their writes are serialised together.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    pub store: Arc<Store>,
    pub groups: TenantGroupService,
    pub tenants: TenantService,
    pub supervisors: SupervisorService,
}

impl ServiceContainer {
    /// Create a container backed by the files named in `settings`.
    pub fn new(settings: Settings) -> InfraResult<Self> {
        let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
        let backend = Arc::new(JsonFileStore::new(&settings.data_file, Arc::clone(&fs)));
        let audit = Arc::new(JsonLinesAuditLog::new(&settings.audit_log, fs));
        Self::with_deps(settings, backend, audit)
    }

    /// Create a container that keeps everything in process memory.
    pub fn in_memory(settings: Settings) -> InfraResult<Self> {
        Self::with_deps(
            settings,
            Arc::new(MemoryDataStore::new()),
            Arc::new(MemoryAuditLog::new()),
        )
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        backend: Arc<dyn DataStore>,
        audit: Arc<dyn AuditSink>,
    ) -> InfraResult<Self> {
        let settings = Arc::new(settings);
        let store = Arc::new(Store::open(backend, audit)?);

        Ok(Self {
            settings,
            groups: TenantGroupService::new(Arc::clone(&store)),
            tenants: TenantService::new(Arc::clone(&store)),
            supervisors: SupervisorService::new(Arc::clone(&store)),
            store,
        })
    }
}
