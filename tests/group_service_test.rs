//! Tests for TenantGroupService and the store transaction around it

use rstest::{fixture, rstest};

use tenancy::application::ApplicationError;
use tenancy::config::Settings;
use tenancy::domain::{
    ChangeAction, DomainError, GroupChanges, NewTenant, NewTenantGroup, ObjectKind, TenantGroup,
    TREE_FIELDS,
};
use tenancy::infrastructure::di::ServiceContainer;
use tenancy::util::testing;

#[fixture]
fn container() -> ServiceContainer {
    testing::init_test_setup();
    ServiceContainer::in_memory(Settings::default()).expect("in-memory container")
}

fn americas(c: &ServiceContainer) -> (TenantGroup, TenantGroup, TenantGroup) {
    let americas = c
        .groups
        .create(NewTenantGroup::new("Americas", "americas"))
        .unwrap();
    let mexico = c
        .groups
        .create(NewTenantGroup::new("Mexico", "mexico").with_parent(americas.id))
        .unwrap();
    let canada = c
        .groups
        .create(NewTenantGroup::new("Canada", "canada").with_parent(americas.id))
        .unwrap();
    (americas, canada, mexico)
}

#[rstest]
fn given_created_groups_when_listing_then_tree_order_with_fresh_bookkeeping(
    container: ServiceContainer,
) {
    let (americas, _, _) = americas(&container);

    let listed = container.groups.list();

    let names: Vec<&str> = listed.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["Americas", "Canada", "Mexico"]);
    // the returned record is a snapshot taken at creation time
    assert_eq!(americas.right_bound(), 2);
    assert_eq!(container.groups.get(americas.id).unwrap().right_bound(), 6);
    container.groups.check().unwrap();
}

#[rstest]
fn given_group_with_children_when_deleting_without_cascade_then_protected_and_nothing_changes(
    container: ServiceContainer,
) {
    let (americas, _, _) = americas(&container);
    let revision = container.store.snapshot().revision;
    let logged = container.store.audit_entries().unwrap().len();

    let err = container.groups.delete(americas.id, false).unwrap_err();

    assert!(matches!(
        err.as_domain(),
        Some(DomainError::Protected { dependents: 2, .. })
    ));
    assert_eq!(container.store.snapshot().revision, revision);
    assert_eq!(container.groups.list().len(), 3);
    assert_eq!(container.store.audit_entries().unwrap().len(), logged);
}

#[rstest]
fn given_grouped_tenants_when_cascade_deleting_then_tenants_lose_group(
    container: ServiceContainer,
) {
    let (americas, canada, _) = americas(&container);
    let acme = container
        .tenants
        .create(NewTenant::new("Acme", "acme").in_group(canada.id))
        .unwrap();

    let removed = container.groups.delete(americas.id, true).unwrap();

    assert_eq!(removed.len(), 3);
    assert!(container.groups.list().is_empty());
    assert_eq!(container.tenants.get(acme.id).unwrap().group, None);

    let entries = container.store.audit_entries().unwrap();
    let deletes = entries
        .iter()
        .filter(|e| e.kind == ObjectKind::TenantGroup && e.action == ChangeAction::Delete)
        .count();
    assert_eq!(deletes, 3);
    let tenant_update = entries
        .iter()
        .rev()
        .find(|e| e.kind == ObjectKind::Tenant)
        .expect("tenant change logged");
    assert_eq!(tenant_update.action, ChangeAction::Update);
    assert_eq!(tenant_update.object_data["group"], serde_json::Value::Null);
}

#[rstest]
fn given_group_change_when_logged_then_tree_fields_omitted(container: ServiceContainer) {
    let (americas, _, _) = americas(&container);
    container
        .groups
        .update(
            americas.id,
            GroupChanges {
                description: Some("North and South".into()),
                ..Default::default()
            },
        )
        .unwrap();

    let entries = container.store.audit_entries().unwrap();
    let groups: Vec<_> = entries
        .iter()
        .filter(|e| e.kind == ObjectKind::TenantGroup)
        .collect();
    assert_eq!(groups.len(), 4);
    for entry in groups {
        for field in TREE_FIELDS {
            assert!(
                !entry.object_data.contains_key(field),
                "{field} leaked into change log"
            );
        }
        assert!(entry.object_data.contains_key("name"));
        assert!(entry.object_data.contains_key("parent"));
    }
    let last = entries.last().unwrap();
    assert_eq!(last.action, ChangeAction::Update);
    assert_eq!(last.object_repr, "Americas");
    assert_eq!(last.object_data["description"], "North and South");
}

#[rstest]
fn given_group_when_moving_under_descendant_then_validation_error_on_parent(
    container: ServiceContainer,
) {
    let (americas, canada, _) = americas(&container);

    let err = container
        .groups
        .move_to(americas.id, Some(canada.id))
        .unwrap_err();

    match err {
        ApplicationError::Domain(e) => assert_eq!(e.fields(), vec!["parent"]),
        other => panic!("expected domain error, got {other:?}"),
    }
    container.groups.check().unwrap();
}

#[rstest]
fn given_group_when_moving_then_one_update_logged(container: ServiceContainer) {
    let (_, canada, mexico) = americas(&container);
    let logged = container.store.audit_entries().unwrap().len();

    let moved = container.groups.move_to(mexico.id, Some(canada.id)).unwrap();

    assert_eq!(moved.parent(), Some(canada.id));
    assert_eq!(moved.depth(), 2);
    let entries = container.store.audit_entries().unwrap();
    assert_eq!(entries.len(), logged + 1);
    assert_eq!(entries[logged].object_id, mexico.id.0);
}

#[rstest]
fn given_nested_tenants_when_counting_then_cumulative(container: ServiceContainer) {
    let (americas, canada, mexico) = americas(&container);
    for (name, group) in [("Acme", canada.id), ("Initech", canada.id), ("Globex", mexico.id)] {
        container
            .tenants
            .create(NewTenant::new(name, name.to_lowercase()).in_group(group))
            .unwrap();
    }
    container
        .tenants
        .create(NewTenant::new("Umbrella", "umbrella"))
        .unwrap();

    let counts = container.groups.tenant_counts();

    let lookup = |id| counts.iter().find(|c| c.group.id == id).unwrap().tenants;
    assert_eq!(lookup(americas.id), 3);
    assert_eq!(lookup(canada.id), 2);
    assert_eq!(lookup(mexico.id), 1);
}

#[rstest]
fn given_groups_when_querying_relatives_then_service_mirrors_tree(container: ServiceContainer) {
    let (americas, canada, mexico) = americas(&container);

    let children: Vec<_> = container
        .groups
        .children(americas.id)
        .unwrap()
        .into_iter()
        .map(|g| g.id)
        .collect();
    assert_eq!(children, vec![canada.id, mexico.id]);
    assert_eq!(container.groups.ancestors(mexico.id).unwrap()[0].id, americas.id);
    assert_eq!(container.groups.descendants(americas.id).unwrap().len(), 2);
    assert_eq!(container.groups.get_by_slug("canada").unwrap().id, canada.id);
    assert!(matches!(
        container.groups.get_by_slug("atlantis").unwrap_err().as_domain(),
        Some(DomainError::NotFound { .. })
    ));
}

#[rstest]
fn given_consistent_groups_when_rebuilding_then_bookkeeping_unchanged(
    container: ServiceContainer,
) {
    americas(&container);
    let before = container.groups.list();

    let count = container.groups.rebuild().unwrap();

    assert_eq!(count, 3);
    assert_eq!(container.groups.list(), before);
}
