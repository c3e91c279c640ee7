//! The persisted aggregate: every tenancy record plus a revision counter.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::arena::GroupTree;
use crate::domain::records::{SupervisorTable, TenantTable};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    /// Incremented by every committed transaction.
    #[serde(default)]
    pub revision: u64,
    #[serde(default)]
    pub groups: GroupTree,
    #[serde(default)]
    pub tenants: TenantTable,
    #[serde(default)]
    pub supervisors: SupervisorTable,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store-level constraint check run before anything is persisted:
    /// unique keys, resolvable references and tree bookkeeping.
    pub fn check_constraints(&self) -> Result<(), String> {
        unique("tenant group name", self.groups.iter().map(|g| g.name.as_str()))?;
        unique("tenant group slug", self.groups.iter().map(|g| g.slug.as_str()))?;
        unique("tenant name", self.tenants.iter().map(|t| t.name.as_str()))?;
        unique("tenant slug", self.tenants.iter().map(|t| t.slug.as_str()))?;
        unique("supervisor sid", self.supervisors.iter().map(|s| s.sid.as_str()))?;
        unique("supervisor slug", self.supervisors.iter().map(|s| s.slug.as_str()))?;

        for tenant in self.tenants.iter() {
            if let Some(g) = tenant.group {
                if !self.groups.contains(g) {
                    return Err(format!("tenant '{}' references missing group {g}", tenant.name));
                }
            }
        }
        for supervisor in self.supervisors.iter() {
            if let Some(t) = supervisor.tenants.iter().find(|t| self.tenants.get(**t).is_none()) {
                return Err(format!(
                    "supervisor '{}' references missing tenant {t}",
                    supervisor.full_name
                ));
            }
        }
        self.groups.check_integrity().map_err(|e| e.to_string())
    }
}

fn unique<'a>(what: &str, values: impl Iterator<Item = &'a str>) -> Result<(), String> {
    let mut seen = HashSet::new();
    for v in values {
        if !seen.insert(v) {
            return Err(format!("duplicate {what}: {v}"));
        }
    }
    Ok(())
}
