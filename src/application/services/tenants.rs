//! Tenant service

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::store::Store;
use crate::application::ApplicationResult;
use crate::domain::{
    csv_document, ChangeAction, DomainError, GroupId, NewTenant, Tenant, TenantChanges, TenantId,
};

pub struct TenantService {
    store: Arc<Store>,
}

impl TenantService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    #[instrument(level = "debug", skip(self, new), fields(name = %new.name))]
    pub fn create(&self, new: NewTenant) -> ApplicationResult<Tenant> {
        self.store.transaction("create tenant", |tx| {
            let id = tx.data.tenants.insert(new, &tx.data.groups)?;
            let tenant = tx.data.tenants.require(id)?.clone();
            tx.record(&tenant, ChangeAction::Create);
            Ok(tenant)
        })
    }

    /// Create a tenant carrying over group and description of `source`.
    #[instrument(level = "debug", skip(self, name, slug))]
    pub fn clone_from(
        &self,
        source: TenantId,
        name: impl Into<String>,
        slug: impl Into<String>,
    ) -> ApplicationResult<Tenant> {
        let template = self.get(source)?;
        self.create(NewTenant::cloned_from(&template, name, slug))
    }

    #[instrument(level = "debug", skip(self, changes))]
    pub fn update(&self, id: TenantId, changes: TenantChanges) -> ApplicationResult<Tenant> {
        self.store.transaction("update tenant", |tx| {
            let tenant = tx
                .data
                .tenants
                .update(id, changes, &tx.data.groups)?
                .clone();
            tx.record(&tenant, ChangeAction::Update);
            Ok(tenant)
        })
    }

    /// Delete a tenant and drop it from every supervisor it was assigned to.
    #[instrument(level = "debug", skip(self))]
    pub fn delete(&self, id: TenantId) -> ApplicationResult<Tenant> {
        self.store.transaction("delete tenant", |tx| {
            let tenant = tx.data.tenants.remove(id)?;
            let detached = tx.data.supervisors.detach_tenant(id);
            debug!("detached tenant {} from {} supervisor(s)", tenant.slug, detached.len());

            tx.record(&tenant, ChangeAction::Delete);
            for supervisor_id in detached {
                let supervisor = tx.data.supervisors.require(supervisor_id)?.clone();
                tx.record(&supervisor, ChangeAction::Update);
            }
            Ok(tenant)
        })
    }

    pub fn get(&self, id: TenantId) -> ApplicationResult<Tenant> {
        Ok(self.store.snapshot().tenants.require(id)?.clone())
    }

    pub fn get_by_slug(&self, slug: &str) -> ApplicationResult<Tenant> {
        self.store
            .snapshot()
            .tenants
            .get_by_slug(slug)
            .cloned()
            .ok_or_else(|| DomainError::not_found("tenant", slug).into())
    }

    /// All tenants, ordered by group name (ungrouped last) then name.
    pub fn list(&self) -> Vec<Tenant> {
        let data = self.store.snapshot();
        data.tenants
            .ordered(&data.groups)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Tenants of `group`, optionally including those of its descendants.
    pub fn list_in_group(&self, group: GroupId, include_descendants: bool) -> ApplicationResult<Vec<Tenant>> {
        let data = self.store.snapshot();
        let mut group_ids = vec![data.groups.require(group)?.id];
        if include_descendants {
            group_ids.extend(data.groups.descendants_of(group)?.map(|g| g.id));
        }
        Ok(data
            .tenants
            .ordered(&data.groups)
            .into_iter()
            .filter(|t| t.group.is_some_and(|g| group_ids.contains(&g)))
            .cloned()
            .collect())
    }

    pub fn export_csv(&self) -> String {
        let data = self.store.snapshot();
        let tenants = data.tenants.ordered(&data.groups);
        csv_document(&tenants, &data)
    }
}
