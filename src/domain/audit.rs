//! Change-log snapshots of tenancy records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::{Supervisor, Tenant, TenantGroup};

/// Which record kind a change refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    TenantGroup,
    Tenant,
    Supervisor,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ObjectKind::TenantGroup => "tenancy.tenantgroup",
            ObjectKind::Tenant => "tenancy.tenant",
            ObjectKind::Supervisor => "tenancy.supervisor",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Create,
    Update,
    Delete,
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChangeAction::Create => "create",
            ChangeAction::Update => "update",
            ChangeAction::Delete => "delete",
        };
        write!(f, "{s}")
    }
}

/// One audit event: what changed, how, and the record as it looked afterwards
/// (or, for deletions, just before).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectChange {
    pub id: Uuid,
    pub time: DateTime<Utc>,
    pub kind: ObjectKind,
    pub object_id: Uuid,
    pub action: ChangeAction,
    pub object_repr: String,
    pub object_data: serde_json::Map<String, serde_json::Value>,
}

/// Records that are snapshotted into the change log.
pub trait ChangeLogged: Serialize + fmt::Display {
    const KIND: ObjectKind;

    fn object_id(&self) -> Uuid;

    /// Serialized attributes never written to the change log.
    fn excluded_fields(&self) -> &'static [&'static str] {
        &[]
    }

    /// Caller-visible attributes as a JSON object.
    fn serialize_object(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut data = match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };
        for field in self.excluded_fields() {
            data.remove(*field);
        }
        data
    }

    fn to_object_change(&self, action: ChangeAction) -> ObjectChange {
        ObjectChange {
            id: Uuid::new_v4(),
            time: Utc::now(),
            kind: Self::KIND,
            object_id: self.object_id(),
            action,
            object_repr: self.to_string(),
            object_data: self.serialize_object(),
        }
    }
}

/// Tree bookkeeping is derived state; `rebuild()` reconstructs it.
pub const TREE_FIELDS: [&str; 4] = ["depth", "left_bound", "right_bound", "tree_id"];

impl ChangeLogged for TenantGroup {
    const KIND: ObjectKind = ObjectKind::TenantGroup;

    fn object_id(&self) -> Uuid {
        self.id.0
    }

    fn excluded_fields(&self) -> &'static [&'static str] {
        &TREE_FIELDS
    }
}

impl ChangeLogged for Tenant {
    const KIND: ObjectKind = ObjectKind::Tenant;

    fn object_id(&self) -> Uuid {
        self.id.0
    }
}

impl ChangeLogged for Supervisor {
    const KIND: ObjectKind = ObjectKind::Supervisor;

    fn object_id(&self) -> Uuid {
        self.id.0
    }
}
