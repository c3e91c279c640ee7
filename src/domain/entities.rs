//! Domain entities: core data structures

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::ValidationErrors;
use crate::domain::validation::{
    check_max_len, check_present, check_required, check_slug, DESCRIPTION_MAX, EMAIL_MAX,
    FULL_NAME_MAX, NAME_MAX, PHONE_MAX, SID_MAX, SLUG_MAX, TAG_MAX,
};

/// Strongly-typed identifiers (avoid mixing record keys arbitrarily).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub Uuid);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(pub Uuid);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SupervisorId(pub Uuid);

impl GroupId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl TenantId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl SupervisorId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GroupId {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for TenantId {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for SupervisorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for SupervisorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================
// TENANT GROUP
// ============================================================

/// Materialized position of a group inside its tree.
///
/// `left_bound`/`right_bound` span the node's subtree under a pre-order,
/// depth-first numbering; `tree_id` identifies the root tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreePosition {
    #[serde(default)]
    pub depth: u32,
    #[serde(default)]
    pub left_bound: u32,
    #[serde(default)]
    pub right_bound: u32,
    #[serde(default)]
    pub tree_id: u32,
}

/// An arbitrary collection of Tenants, arranged in a forest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantGroup {
    pub id: GroupId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub(crate) parent: Option<GroupId>,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub(crate) position: TreePosition,
}

impl TenantGroup {
    pub fn parent(&self) -> Option<GroupId> {
        self.parent
    }

    pub fn depth(&self) -> u32 {
        self.position.depth
    }

    pub fn left_bound(&self) -> u32 {
        self.position.left_bound
    }

    pub fn right_bound(&self) -> u32 {
        self.position.right_bound
    }

    pub fn tree_id(&self) -> u32 {
        self.position.tree_id
    }

    pub fn position(&self) -> TreePosition {
        self.position
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.position.right_bound == self.position.left_bound + 1
    }
}

impl fmt::Display for TenantGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Fields required to create a new tenant group.
#[derive(Debug, Clone, Default)]
pub struct NewTenantGroup {
    pub name: String,
    pub slug: String,
    pub parent: Option<GroupId>,
    pub description: String,
}

impl NewTenantGroup {
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
            ..Self::default()
        }
    }

    pub fn with_parent(mut self, parent: GroupId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        check_required(&mut errors, "name", &self.name, NAME_MAX);
        check_slug(&mut errors, "slug", &self.slug);
        check_max_len(&mut errors, "description", &self.description, DESCRIPTION_MAX);
        errors
    }
}

/// Fields that can be updated on an existing tenant group.
/// Re-parenting goes through the tree's move operation instead.
#[derive(Debug, Clone, Default)]
pub struct GroupChanges {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
}

impl GroupChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.slug.is_none() && self.description.is_none()
    }

    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if let Some(name) = &self.name {
            check_required(&mut errors, "name", name, NAME_MAX);
        }
        if let Some(slug) = &self.slug {
            check_slug(&mut errors, "slug", slug);
        }
        if let Some(description) = &self.description {
            check_max_len(&mut errors, "description", description, DESCRIPTION_MAX);
        }
        errors
    }
}

// ============================================================
// TENANT
// ============================================================

/// An organization served by the owner of the installation,
/// typically a customer or an internal department.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub group: Option<GroupId>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Opaque extension attributes; never interpreted by the tenancy model.
    #[serde(default)]
    pub custom_fields: BTreeMap<String, serde_json::Value>,
}

impl fmt::Display for Tenant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Fields required to create a new tenant.
#[derive(Debug, Clone, Default)]
pub struct NewTenant {
    pub name: String,
    pub slug: String,
    pub group: Option<GroupId>,
    pub description: String,
    pub comments: String,
    pub tags: BTreeSet<String>,
    pub custom_fields: BTreeMap<String, serde_json::Value>,
}

impl NewTenant {
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
            ..Self::default()
        }
    }

    pub fn in_group(mut self, group: GroupId) -> Self {
        self.group = Some(group);
        self
    }

    /// Prefill a new tenant from the clonable fields of an existing one.
    pub fn cloned_from(source: &Tenant, name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
            group: source.group,
            description: source.description.clone(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        check_required(&mut errors, "name", &self.name, NAME_MAX);
        check_slug(&mut errors, "slug", &self.slug);
        check_max_len(&mut errors, "description", &self.description, DESCRIPTION_MAX);
        check_tags(&mut errors, &self.tags);
        errors
    }
}

/// Fields that can be updated on an existing tenant.
///
/// `group: Some(None)` clears the group membership.
#[derive(Debug, Clone, Default)]
pub struct TenantChanges {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub group: Option<Option<GroupId>>,
    pub description: Option<String>,
    pub comments: Option<String>,
    pub tags: Option<BTreeSet<String>>,
    pub custom_fields: Option<BTreeMap<String, serde_json::Value>>,
}

impl TenantChanges {
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if let Some(name) = &self.name {
            check_required(&mut errors, "name", name, NAME_MAX);
        }
        if let Some(slug) = &self.slug {
            check_slug(&mut errors, "slug", slug);
        }
        if let Some(description) = &self.description {
            check_max_len(&mut errors, "description", description, DESCRIPTION_MAX);
        }
        if let Some(tags) = &self.tags {
            check_tags(&mut errors, tags);
        }
        errors
    }
}

fn check_tags(errors: &mut ValidationErrors, tags: &BTreeSet<String>) {
    for tag in tags {
        check_required(errors, "tags", tag, TAG_MAX);
    }
}

// ============================================================
// SUPERVISOR
// ============================================================

/// A person responsible for one or more tenants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supervisor {
    pub id: SupervisorId,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub sid: String,
    pub slug: String,
    #[serde(default)]
    pub comments: String,
    pub is_active: bool,
    #[serde(default)]
    pub tenants: BTreeSet<TenantId>,
}

impl fmt::Display for Supervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name)
    }
}

/// Fields required to create a new supervisor.
#[derive(Debug, Clone)]
pub struct NewSupervisor {
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub sid: String,
    pub slug: String,
    pub comments: String,
    pub is_active: bool,
    pub tenants: BTreeSet<TenantId>,
}

impl NewSupervisor {
    pub fn new(full_name: impl Into<String>, sid: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            email: String::new(),
            phone_number: String::new(),
            sid: sid.into(),
            slug: slug.into(),
            comments: String::new(),
            is_active: true,
            tenants: BTreeSet::new(),
        }
    }

    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        check_required(&mut errors, "full_name", &self.full_name, FULL_NAME_MAX);
        check_required(&mut errors, "email", &self.email, EMAIL_MAX);
        check_required(&mut errors, "phone_number", &self.phone_number, PHONE_MAX);
        check_required(&mut errors, "sid", &self.sid, SID_MAX);
        check_required(&mut errors, "slug", &self.slug, SLUG_MAX);
        check_present(&mut errors, "comments", &self.comments);
        errors
    }
}

/// Fields that can be updated on an existing supervisor.
/// Tenant associations change through assign/unassign.
#[derive(Debug, Clone, Default)]
pub struct SupervisorChanges {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub sid: Option<String>,
    pub slug: Option<String>,
    pub comments: Option<String>,
    pub is_active: Option<bool>,
}

impl SupervisorChanges {
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if let Some(v) = &self.full_name {
            check_required(&mut errors, "full_name", v, FULL_NAME_MAX);
        }
        if let Some(v) = &self.email {
            check_required(&mut errors, "email", v, EMAIL_MAX);
        }
        if let Some(v) = &self.phone_number {
            check_required(&mut errors, "phone_number", v, PHONE_MAX);
        }
        if let Some(v) = &self.sid {
            check_required(&mut errors, "sid", v, SID_MAX);
        }
        if let Some(v) = &self.slug {
            check_required(&mut errors, "slug", v, SLUG_MAX);
        }
        if let Some(v) = &self.comments {
            check_present(&mut errors, "comments", v);
        }
        errors
    }
}
