//! Supervisor service

use std::sync::Arc;

use tracing::instrument;

use crate::application::store::Store;
use crate::application::ApplicationResult;
use crate::domain::{
    csv_document, ChangeAction, DomainError, NewSupervisor, Supervisor, SupervisorChanges,
    SupervisorId, TenantId,
};

pub struct SupervisorService {
    store: Arc<Store>,
}

impl SupervisorService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    #[instrument(level = "debug", skip(self, new), fields(sid = %new.sid))]
    pub fn create(&self, new: NewSupervisor) -> ApplicationResult<Supervisor> {
        self.store.transaction("create supervisor", |tx| {
            let id = tx.data.supervisors.insert(new, &tx.data.tenants)?;
            let supervisor = tx.data.supervisors.require(id)?.clone();
            tx.record(&supervisor, ChangeAction::Create);
            Ok(supervisor)
        })
    }

    #[instrument(level = "debug", skip(self, changes))]
    pub fn update(&self, id: SupervisorId, changes: SupervisorChanges) -> ApplicationResult<Supervisor> {
        self.store.transaction("update supervisor", |tx| {
            let supervisor = tx.data.supervisors.update(id, changes)?.clone();
            tx.record(&supervisor, ChangeAction::Update);
            Ok(supervisor)
        })
    }

    /// Associate tenants with a supervisor. Already assigned tenants are ignored.
    #[instrument(level = "debug", skip(self))]
    pub fn assign(&self, id: SupervisorId, tenants: &[TenantId]) -> ApplicationResult<Supervisor> {
        self.store.transaction("assign tenants", |tx| {
            let changed = tx.data.supervisors.assign(id, tenants, &tx.data.tenants)?;
            let supervisor = tx.data.supervisors.require(id)?.clone();
            if changed {
                tx.record(&supervisor, ChangeAction::Update);
            }
            Ok(supervisor)
        })
    }

    #[instrument(level = "debug", skip(self))]
    pub fn unassign(&self, id: SupervisorId, tenants: &[TenantId]) -> ApplicationResult<Supervisor> {
        self.store.transaction("unassign tenants", |tx| {
            let changed = tx.data.supervisors.unassign(id, tenants)?;
            let supervisor = tx.data.supervisors.require(id)?.clone();
            if changed {
                tx.record(&supervisor, ChangeAction::Update);
            }
            Ok(supervisor)
        })
    }

    #[instrument(level = "debug", skip(self))]
    pub fn delete(&self, id: SupervisorId) -> ApplicationResult<Supervisor> {
        self.store.transaction("delete supervisor", |tx| {
            let supervisor = tx.data.supervisors.remove(id)?;
            tx.record(&supervisor, ChangeAction::Delete);
            Ok(supervisor)
        })
    }

    pub fn get(&self, id: SupervisorId) -> ApplicationResult<Supervisor> {
        Ok(self.store.snapshot().supervisors.require(id)?.clone())
    }

    pub fn get_by_slug(&self, slug: &str) -> ApplicationResult<Supervisor> {
        self.store
            .snapshot()
            .supervisors
            .get_by_slug(slug)
            .cloned()
            .ok_or_else(|| DomainError::not_found("supervisor", slug).into())
    }

    /// All supervisors ordered by full name.
    pub fn list(&self) -> Vec<Supervisor> {
        self.store
            .snapshot()
            .supervisors
            .ordered()
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn list_for_tenant(&self, tenant: TenantId) -> ApplicationResult<Vec<Supervisor>> {
        let data = self.store.snapshot();
        data.tenants.require(tenant)?;
        let mut supervisors: Vec<Supervisor> = data.supervisors.for_tenant(tenant).cloned().collect();
        supervisors.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(supervisors)
    }

    pub fn export_csv(&self) -> String {
        let data = self.store.snapshot();
        let supervisors = data.supervisors.ordered();
        csv_document(&supervisors, &data)
    }
}
