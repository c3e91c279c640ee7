//! Tenant group service
//!
//! Routes every hierarchy change through the group tree inside one store
//! transaction and emits the matching change-log events.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::store::Store;
use crate::application::ApplicationResult;
use crate::domain::{
    csv_document, ChangeAction, DomainError, GroupChanges, GroupId, NewTenantGroup, TenantGroup,
};

/// A group with the number of tenants in it or any of its descendants.
#[derive(Debug, Clone)]
pub struct GroupTenantCount {
    pub group: TenantGroup,
    pub tenants: usize,
}

/// Service for maintaining the tenant group forest.
pub struct TenantGroupService {
    store: Arc<Store>,
}

impl TenantGroupService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    #[instrument(level = "debug", skip(self, new), fields(name = %new.name))]
    pub fn create(&self, new: NewTenantGroup) -> ApplicationResult<TenantGroup> {
        self.store.transaction("create tenant group", |tx| {
            let id = tx.data.groups.insert(new)?;
            let group = tx.data.groups.require(id)?.clone();
            tx.record(&group, ChangeAction::Create);
            Ok(group)
        })
    }

    #[instrument(level = "debug", skip(self, changes))]
    pub fn update(&self, id: GroupId, changes: GroupChanges) -> ApplicationResult<TenantGroup> {
        self.store.transaction("update tenant group", |tx| {
            tx.data.groups.update(id, changes)?;
            let group = tx.data.groups.require(id)?.clone();
            tx.record(&group, ChangeAction::Update);
            Ok(group)
        })
    }

    #[instrument(level = "debug", skip(self))]
    pub fn move_to(&self, id: GroupId, new_parent: Option<GroupId>) -> ApplicationResult<TenantGroup> {
        self.store.transaction("move tenant group", |tx| {
            let before = tx.data.groups.require(id)?.parent();
            tx.data.groups.move_to(id, new_parent)?;
            let group = tx.data.groups.require(id)?.clone();
            if before != group.parent() {
                tx.record(&group, ChangeAction::Update);
            }
            Ok(group)
        })
    }

    /// Delete a group; see [`GroupTree::delete`](crate::domain::GroupTree::delete)
    /// for the cascade rule. Tenants of removed groups lose their group.
    #[instrument(level = "debug", skip(self))]
    pub fn delete(&self, id: GroupId, cascade: bool) -> ApplicationResult<Vec<TenantGroup>> {
        self.store.transaction("delete tenant group", |tx| {
            let removed = tx.data.groups.delete(id, cascade)?;
            let removed_ids: Vec<GroupId> = removed.iter().map(|g| g.id).collect();
            let orphaned = tx.data.tenants.clear_groups(&removed_ids);
            debug!(
                "removed {} group(s), cleared group on {} tenant(s)",
                removed.len(),
                orphaned.len()
            );

            for group in &removed {
                tx.record(group, ChangeAction::Delete);
            }
            for tenant_id in orphaned {
                let tenant = tx.data.tenants.require(tenant_id)?.clone();
                tx.record(&tenant, ChangeAction::Update);
            }
            Ok(removed)
        })
    }

    /// Recompute all tree bookkeeping from parent links.
    pub fn rebuild(&self) -> ApplicationResult<usize> {
        self.store.transaction("rebuild tenant group trees", |tx| {
            tx.data.groups.rebuild()?;
            Ok(tx.data.groups.len())
        })
    }

    /// Verify the stored bookkeeping without changing it.
    pub fn check(&self) -> ApplicationResult<()> {
        Ok(self.store.snapshot().groups.check_integrity()?)
    }

    pub fn get(&self, id: GroupId) -> ApplicationResult<TenantGroup> {
        Ok(self.store.snapshot().groups.require(id)?.clone())
    }

    pub fn get_by_slug(&self, slug: &str) -> ApplicationResult<TenantGroup> {
        self.store
            .snapshot()
            .groups
            .get_by_slug(slug)
            .cloned()
            .ok_or_else(|| DomainError::not_found("tenant group", slug).into())
    }

    /// Every group, roots by name, each tree in pre-order.
    pub fn list(&self) -> Vec<TenantGroup> {
        self.store.snapshot().groups.iter().cloned().collect()
    }

    pub fn children(&self, id: GroupId) -> ApplicationResult<Vec<TenantGroup>> {
        let data = self.store.snapshot();
        let children = data.groups.children_of(id)?.cloned().collect();
        Ok(children)
    }

    pub fn ancestors(&self, id: GroupId) -> ApplicationResult<Vec<TenantGroup>> {
        let data = self.store.snapshot();
        let ancestors = data.groups.ancestors_of(id)?.cloned().collect();
        Ok(ancestors)
    }

    pub fn descendants(&self, id: GroupId) -> ApplicationResult<Vec<TenantGroup>> {
        let data = self.store.snapshot();
        let descendants = data.groups.descendants_of(id)?.cloned().collect();
        Ok(descendants)
    }

    /// Tenant counts per group, including tenants of descendant groups.
    pub fn tenant_counts(&self) -> Vec<GroupTenantCount> {
        let data = self.store.snapshot();
        let mut counts: HashMap<GroupId, usize> = HashMap::new();
        for tenant in data.tenants.iter() {
            let Some(group_id) = tenant.group else {
                continue;
            };
            *counts.entry(group_id).or_default() += 1;
            if let Ok(ancestors) = data.groups.ancestors_of(group_id) {
                for ancestor in ancestors {
                    *counts.entry(ancestor.id).or_default() += 1;
                }
            }
        }
        data.groups
            .iter()
            .map(|g| GroupTenantCount {
                group: g.clone(),
                tenants: counts.get(&g.id).copied().unwrap_or(0),
            })
            .collect()
    }

    pub fn export_csv(&self) -> String {
        let data = self.store.snapshot();
        let groups: Vec<&TenantGroup> = data.groups.iter().collect();
        csv_document(&groups, &data)
    }
}
