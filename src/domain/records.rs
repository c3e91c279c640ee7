//! Record tables for the passive entities (tenants and supervisors).
//!
//! Each table owns its records and enforces its own uniqueness constraints.
//! Cross-table effects (set-null, association cleanup) are explicit methods
//! called by the dataset.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::arena::GroupTree;
use crate::domain::entities::{
    GroupId, NewSupervisor, NewTenant, Supervisor, SupervisorChanges, SupervisorId, Tenant,
    TenantChanges, TenantId,
};
use crate::domain::error::{DomainError, DomainResult, ValidationErrors};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Tenant>", into = "Vec<Tenant>")]
pub struct TenantTable {
    rows: BTreeMap<TenantId, Tenant>,
}

impl TenantTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: TenantId) -> Option<&Tenant> {
        self.rows.get(&id)
    }

    pub fn require(&self, id: TenantId) -> DomainResult<&Tenant> {
        self.get(id)
            .ok_or_else(|| DomainError::not_found("tenant", id))
    }

    pub fn get_by_slug(&self, slug: &str) -> Option<&Tenant> {
        self.rows.values().find(|t| t.slug == slug)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tenant> {
        self.rows.values()
    }

    /// Tenants ordered by group name (ungrouped last), then by name.
    pub fn ordered<'a>(&'a self, groups: &'a GroupTree) -> Vec<&'a Tenant> {
        let mut tenants: Vec<&Tenant> = self.rows.values().collect();
        tenants.sort_by(|a, b| {
            let ga = a.group.and_then(|g| groups.get(g)).map(|g| g.name.as_str());
            let gb = b.group.and_then(|g| groups.get(g)).map(|g| g.name.as_str());
            match (ga, gb) {
                (Some(x), Some(y)) => x.cmp(y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            }
            .then_with(|| a.name.cmp(&b.name))
        });
        tenants
    }

    pub fn insert(&mut self, new: NewTenant, groups: &GroupTree) -> DomainResult<TenantId> {
        let mut errors = new.validate();
        errors.extend(self.uniqueness_errors(&new.name, &new.slug, None));
        check_group(&mut errors, new.group, groups);
        errors.into_result()?;

        let id = TenantId::new();
        self.rows.insert(
            id,
            Tenant {
                id,
                name: new.name,
                slug: new.slug,
                group: new.group,
                description: new.description,
                comments: new.comments,
                tags: new.tags,
                custom_fields: new.custom_fields,
            },
        );
        Ok(id)
    }

    pub fn update(
        &mut self,
        id: TenantId,
        changes: TenantChanges,
        groups: &GroupTree,
    ) -> DomainResult<&Tenant> {
        let current = self.require(id)?;
        let mut errors = changes.validate();
        let name = changes.name.as_deref().unwrap_or(&current.name);
        let slug = changes.slug.as_deref().unwrap_or(&current.slug);
        errors.extend(self.uniqueness_errors(name, slug, Some(id)));
        if let Some(group) = changes.group {
            check_group(&mut errors, group, groups);
        }
        errors.into_result()?;

        let tenant = self
            .rows
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("tenant", id))?;
        if let Some(v) = changes.name {
            tenant.name = v;
        }
        if let Some(v) = changes.slug {
            tenant.slug = v;
        }
        if let Some(v) = changes.group {
            tenant.group = v;
        }
        if let Some(v) = changes.description {
            tenant.description = v;
        }
        if let Some(v) = changes.comments {
            tenant.comments = v;
        }
        if let Some(v) = changes.tags {
            tenant.tags = v;
        }
        if let Some(v) = changes.custom_fields {
            tenant.custom_fields = v;
        }
        Ok(tenant)
    }

    pub fn remove(&mut self, id: TenantId) -> DomainResult<Tenant> {
        self.rows
            .remove(&id)
            .ok_or_else(|| DomainError::not_found("tenant", id))
    }

    /// Clear the group of every tenant pointing at one of `removed`.
    /// Returns the ids of tenants that changed.
    pub fn clear_groups(&mut self, removed: &[GroupId]) -> Vec<TenantId> {
        let mut changed = Vec::new();
        for tenant in self.rows.values_mut() {
            if tenant.group.is_some_and(|g| removed.contains(&g)) {
                tenant.group = None;
                changed.push(tenant.id);
            }
        }
        changed
    }

    fn uniqueness_errors(&self, name: &str, slug: &str, exclude: Option<TenantId>) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        for t in self.rows.values().filter(|t| Some(t.id) != exclude) {
            if t.name == name {
                errors.push("name", "tenant with this name already exists");
            }
            if t.slug == slug {
                errors.push("slug", "tenant with this slug already exists");
            }
        }
        errors
    }
}

fn check_group(errors: &mut ValidationErrors, group: Option<GroupId>, groups: &GroupTree) {
    if let Some(g) = group {
        if !groups.contains(g) {
            errors.push("group", format!("unknown tenant group {g}"));
        }
    }
}

impl From<Vec<Tenant>> for TenantTable {
    fn from(rows: Vec<Tenant>) -> Self {
        Self {
            rows: rows.into_iter().map(|t| (t.id, t)).collect(),
        }
    }
}

impl From<TenantTable> for Vec<Tenant> {
    fn from(table: TenantTable) -> Self {
        table.rows.into_values().collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Supervisor>", into = "Vec<Supervisor>")]
pub struct SupervisorTable {
    rows: BTreeMap<SupervisorId, Supervisor>,
}

impl SupervisorTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: SupervisorId) -> Option<&Supervisor> {
        self.rows.get(&id)
    }

    pub fn require(&self, id: SupervisorId) -> DomainResult<&Supervisor> {
        self.get(id)
            .ok_or_else(|| DomainError::not_found("supervisor", id))
    }

    pub fn get_by_slug(&self, slug: &str) -> Option<&Supervisor> {
        self.rows.values().find(|s| s.slug == slug)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Supervisor> {
        self.rows.values()
    }

    /// Supervisors ordered by full name.
    pub fn ordered(&self) -> Vec<&Supervisor> {
        let mut supervisors: Vec<&Supervisor> = self.rows.values().collect();
        supervisors.sort_by(|a, b| a.full_name.cmp(&b.full_name).then(a.sid.cmp(&b.sid)));
        supervisors
    }

    pub fn for_tenant(&self, tenant: TenantId) -> impl Iterator<Item = &Supervisor> {
        self.rows.values().filter(move |s| s.tenants.contains(&tenant))
    }

    pub fn insert(&mut self, new: NewSupervisor, tenants: &TenantTable) -> DomainResult<SupervisorId> {
        let mut errors = new.validate();
        errors.extend(self.uniqueness_errors(&new.sid, &new.slug, None));
        for t in &new.tenants {
            if tenants.get(*t).is_none() {
                errors.push("tenants", format!("unknown tenant {t}"));
            }
        }
        errors.into_result()?;

        let id = SupervisorId::new();
        self.rows.insert(
            id,
            Supervisor {
                id,
                full_name: new.full_name,
                email: new.email,
                phone_number: new.phone_number,
                sid: new.sid,
                slug: new.slug,
                comments: new.comments,
                is_active: new.is_active,
                tenants: new.tenants,
            },
        );
        Ok(id)
    }

    pub fn update(&mut self, id: SupervisorId, changes: SupervisorChanges) -> DomainResult<&Supervisor> {
        let current = self.require(id)?;
        let mut errors = changes.validate();
        let sid = changes.sid.as_deref().unwrap_or(&current.sid);
        let slug = changes.slug.as_deref().unwrap_or(&current.slug);
        errors.extend(self.uniqueness_errors(sid, slug, Some(id)));
        errors.into_result()?;

        let supervisor = self.get_mut(id)?;
        if let Some(v) = changes.full_name {
            supervisor.full_name = v;
        }
        if let Some(v) = changes.email {
            supervisor.email = v;
        }
        if let Some(v) = changes.phone_number {
            supervisor.phone_number = v;
        }
        if let Some(v) = changes.sid {
            supervisor.sid = v;
        }
        if let Some(v) = changes.slug {
            supervisor.slug = v;
        }
        if let Some(v) = changes.comments {
            supervisor.comments = v;
        }
        if let Some(v) = changes.is_active {
            supervisor.is_active = v;
        }
        Ok(supervisor)
    }

    /// Add tenant associations. Returns whether anything changed.
    pub fn assign(
        &mut self,
        id: SupervisorId,
        tenant_ids: &[TenantId],
        tenants: &TenantTable,
    ) -> DomainResult<bool> {
        let mut errors = ValidationErrors::new();
        for t in tenant_ids {
            if tenants.get(*t).is_none() {
                errors.push("tenants", format!("unknown tenant {t}"));
            }
        }
        errors.into_result()?;
        let supervisor = self.get_mut(id)?;
        let before = supervisor.tenants.len();
        supervisor.tenants.extend(tenant_ids.iter().copied());
        Ok(supervisor.tenants.len() != before)
    }

    /// Remove tenant associations. Returns whether anything changed.
    pub fn unassign(&mut self, id: SupervisorId, tenant_ids: &[TenantId]) -> DomainResult<bool> {
        let supervisor = self.get_mut(id)?;
        let before = supervisor.tenants.len();
        supervisor.tenants.retain(|t| !tenant_ids.contains(t));
        Ok(supervisor.tenants.len() != before)
    }

    pub fn remove(&mut self, id: SupervisorId) -> DomainResult<Supervisor> {
        self.rows
            .remove(&id)
            .ok_or_else(|| DomainError::not_found("supervisor", id))
    }

    /// Drop association rows pointing at a deleted tenant.
    /// Returns the ids of supervisors that changed.
    pub fn detach_tenant(&mut self, tenant: TenantId) -> Vec<SupervisorId> {
        let mut changed = Vec::new();
        for supervisor in self.rows.values_mut() {
            if supervisor.tenants.remove(&tenant) {
                changed.push(supervisor.id);
            }
        }
        changed
    }

    fn get_mut(&mut self, id: SupervisorId) -> DomainResult<&mut Supervisor> {
        self.rows
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("supervisor", id))
    }

    fn uniqueness_errors(&self, sid: &str, slug: &str, exclude: Option<SupervisorId>) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        for s in self.rows.values().filter(|s| Some(s.id) != exclude) {
            if s.sid == sid {
                errors.push("sid", "supervisor with this sid already exists");
            }
            if s.slug == slug {
                errors.push("slug", "supervisor with this slug already exists");
            }
        }
        errors
    }
}

impl From<Vec<Supervisor>> for SupervisorTable {
    fn from(rows: Vec<Supervisor>) -> Self {
        Self {
            rows: rows.into_iter().map(|s| (s.id, s)).collect(),
        }
    }
}

impl From<SupervisorTable> for Vec<Supervisor> {
    fn from(table: SupervisorTable) -> Self {
        table.rows.into_values().collect()
    }
}
