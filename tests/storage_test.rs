//! Tests for file-backed persistence, the change log and revision checks

use std::sync::Arc;

use tempfile::TempDir;

use tenancy::application::{ApplicationError, Store};
use tenancy::config::Settings;
use tenancy::domain::{ChangeAction, Dataset, NewTenant, NewTenantGroup, ObjectChange};
use tenancy::infrastructure::di::ServiceContainer;
use tenancy::infrastructure::traits::{
    AuditSink, DataStore, FileSystem, RealFileSystem, StoreError,
};
use tenancy::infrastructure::{JsonFileStore, JsonLinesAuditLog, MemoryAuditLog, MemoryDataStore};

fn settings_in(dir: &TempDir) -> Settings {
    Settings {
        data_file: dir.path().join("data").join("tenancy.json"),
        audit_log: dir.path().join("data").join("changes.jsonl"),
        cascade_delete: false,
    }
}

#[test]
fn given_missing_data_file_when_opening_then_starts_empty() {
    let temp = TempDir::new().unwrap();
    let container = ServiceContainer::new(settings_in(&temp)).unwrap();

    assert!(container.groups.list().is_empty());
    assert_eq!(container.store.snapshot().revision, 0);
    assert!(container.store.audit_entries().unwrap().is_empty());
}

#[test]
fn given_committed_changes_when_reopening_then_dataset_and_log_restored() {
    let temp = TempDir::new().unwrap();
    {
        let container = ServiceContainer::new(settings_in(&temp)).unwrap();
        let americas = container
            .groups
            .create(NewTenantGroup::new("Americas", "americas"))
            .unwrap();
        container
            .groups
            .create(NewTenantGroup::new("Canada", "canada").with_parent(americas.id))
            .unwrap();
        container
            .tenants
            .create(NewTenant::new("Acme", "acme").in_group(americas.id))
            .unwrap();
    }

    let container = ServiceContainer::new(settings_in(&temp)).unwrap();

    assert_eq!(container.store.snapshot().revision, 3);
    let americas = container.groups.get_by_slug("americas").unwrap();
    assert_eq!((americas.left_bound(), americas.right_bound()), (1, 4));
    container.groups.check().unwrap();
    assert_eq!(
        container.tenants.get_by_slug("acme").unwrap().group,
        Some(americas.id)
    );
    let entries = container.store.audit_entries().unwrap();
    assert_eq!(entries.len(), 3);
    assert!(entries.iter().all(|e| e.action == ChangeAction::Create));
}

#[test]
fn given_concurrent_writer_when_committing_stale_snapshot_then_integrity_error() {
    let temp = TempDir::new().unwrap();
    let first = ServiceContainer::new(settings_in(&temp)).unwrap();
    let second = ServiceContainer::new(settings_in(&temp)).unwrap();

    first
        .groups
        .create(NewTenantGroup::new("Americas", "americas"))
        .unwrap();
    let err = second
        .groups
        .create(NewTenantGroup::new("Europe", "europe"))
        .unwrap_err();

    assert!(matches!(err, ApplicationError::Integrity { .. }));
    // the failed writer did not publish its change
    assert!(second.groups.list().is_empty());

    second.store.reload().unwrap();
    second
        .groups
        .create(NewTenantGroup::new("Europe", "europe"))
        .unwrap();
    assert_eq!(second.groups.list().len(), 2);
}

#[test]
fn given_corrupt_data_file_when_opening_then_operation_failed() {
    let temp = TempDir::new().unwrap();
    let settings = settings_in(&temp);
    RealFileSystem
        .write_atomic(&settings.data_file, "{ not json")
        .unwrap();

    let err = ServiceContainer::new(settings).err().expect("open fails");

    assert!(err.to_string().contains("load dataset"));
}

#[test]
fn given_dataset_breaking_constraints_when_saving_then_constraint_error() {
    let store = MemoryDataStore::new();
    let mut data = Dataset::new();
    data.tenants
        .insert(NewTenant::new("Acme", "acme"), &data.groups)
        .unwrap();
    let mut broken = data.clone();
    // a second copy of the same row under a new id violates name uniqueness
    let json = serde_json::to_value(&broken.tenants).unwrap();
    let mut rows: Vec<serde_json::Value> = serde_json::from_value(json).unwrap();
    let mut dup = rows[0].clone();
    dup["id"] = serde_json::json!("00000000-0000-0000-0000-000000000009");
    rows.push(dup);
    broken.tenants = serde_json::from_value(serde_json::Value::Array(rows)).unwrap();

    store.save(&data, 0).unwrap();
    let err = store.save(&broken, 0).unwrap_err();

    assert!(err.to_string().contains("duplicate tenant name"));
}

#[test]
fn given_audit_sink_when_commit_fails_then_nothing_recorded() {
    let backend = Arc::new(MemoryDataStore::new());
    let audit = Arc::new(MemoryAuditLog::new());
    let store = Store::open(backend, audit.clone()).unwrap();

    let result: Result<(), ApplicationError> = store.transaction("failing", |tx| {
        let id = tx.data.groups.insert(NewTenantGroup::new("Americas", "americas"))?;
        let group = tx.data.groups.require(id)?.clone();
        tx.record(&group, ChangeAction::Create);
        Err(ApplicationError::Integrity {
            message: "forced".into(),
        })
    });

    assert!(result.is_err());
    assert!(audit.entries().unwrap().is_empty());
    assert!(store.snapshot().groups.is_empty());
}

#[test]
fn given_audit_file_with_garbage_line_when_reading_then_skips_it() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("changes.jsonl");
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let store = Store::open(
        Arc::new(MemoryDataStore::new()),
        Arc::new(JsonLinesAuditLog::new(&path, Arc::clone(&fs))),
    )
    .unwrap();
    store
        .transaction("create", |tx| {
            let id = tx.data.groups.insert(NewTenantGroup::new("Americas", "americas"))?;
            let group = tx.data.groups.require(id)?.clone();
            tx.record(&group, ChangeAction::Create);
            Ok(())
        })
        .unwrap();
    fs.append(&path, "not json\n").unwrap();

    let log = JsonLinesAuditLog::new(&path, fs);

    assert_eq!(log.entries().unwrap().len(), 1);
}

#[test]
fn given_json_file_store_when_saving_then_file_holds_pretty_json() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("tenancy.json");
    let store = JsonFileStore::new(&path, Arc::new(RealFileSystem));
    let mut data = Dataset::new();
    data.revision = 1;
    data.groups
        .insert(NewTenantGroup::new("Americas", "americas"))
        .unwrap();

    store.save(&data, 0).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("\"left_bound\": 1"));
    assert_eq!(store.load().unwrap().revision, 1);
    assert_eq!(store.path(), path.as_path());
}

/// Change log whose backing medium refuses every write.
struct FullDiskAuditLog;

impl AuditSink for FullDiskAuditLog {
    fn record(&self, _changes: &[ObjectChange]) -> Result<(), StoreError> {
        Err(StoreError::io(
            "append changes.jsonl",
            std::io::Error::other("no space left on device"),
        ))
    }

    fn entries(&self) -> Result<Vec<ObjectChange>, StoreError> {
        Ok(Vec::new())
    }
}

#[test]
fn given_failing_audit_sink_when_committing_then_audit_failed_and_change_kept() {
    let backend = Arc::new(MemoryDataStore::new());
    let container = ServiceContainer::with_deps(
        Settings::default(),
        backend.clone(),
        Arc::new(FullDiskAuditLog),
    )
    .unwrap();

    let err = container
        .groups
        .create(NewTenantGroup::new("Americas", "americas"))
        .unwrap_err();

    match &err {
        ApplicationError::AuditFailed {
            operation,
            revision,
            ..
        } => {
            assert_eq!(operation, "create tenant group");
            assert_eq!(*revision, 1);
        }
        other => panic!("expected audit failure, got {other:?}"),
    }
    assert!(err.is_committed());
    assert!(container.groups.get_by_slug("americas").is_ok());
    assert_eq!(backend.load().unwrap().groups.len(), 1);

    // retrying reports the record as a duplicate
    let retry = container
        .groups
        .create(NewTenantGroup::new("Americas", "americas"))
        .unwrap_err();
    assert!(!retry.is_committed());
}
