//! Tests for CSV export, external keys and change-log snapshots of records

use rstest::{fixture, rstest};

use tenancy::config::Settings;
use tenancy::domain::{
    csv_document, ChangeAction, ChangeLogged, CsvExport, ExternalKey, NewSupervisor, NewTenant,
    NewTenantGroup, ObjectKind, Supervisor, Tenant, TenantGroup,
};
use tenancy::infrastructure::di::ServiceContainer;

fn supervisor(full_name: &str, sid: &str, slug: &str) -> NewSupervisor {
    let mut new = NewSupervisor::new(full_name, sid, slug);
    new.email = format!("{sid}@example.org");
    new.phone_number = "+1 555 0100".into();
    new.comments = "on call".into();
    new
}

#[fixture]
fn container() -> ServiceContainer {
    let c = ServiceContainer::in_memory(Settings::default()).expect("in-memory container");
    let americas = c
        .groups
        .create(NewTenantGroup::new("Americas", "americas"))
        .unwrap();
    let mut canada = NewTenantGroup::new("Canada", "canada").with_parent(americas.id);
    canada.description = "Great White North".into();
    let canada = c.groups.create(canada).unwrap();
    let acme = c
        .tenants
        .create(NewTenant::new("Acme", "acme").in_group(canada.id))
        .unwrap();
    let mut ada = supervisor("Ada Lovelace", "ada", "ada-lovelace");
    ada.tenants.insert(acme.id);
    c.supervisors.create(ada).unwrap();
    c
}

#[test]
fn given_record_types_when_reading_headers_then_fixed_order() {
    assert_eq!(TenantGroup::CSV_HEADERS, &["name", "slug", "parent", "description"]);
    assert_eq!(
        Tenant::CSV_HEADERS,
        &["name", "slug", "group", "description", "comments"]
    );
    assert_eq!(
        Supervisor::CSV_HEADERS,
        &["full_name", "email", "phone_number", "sid", "tenants", "comments", "slug"]
    );
}

#[rstest]
fn given_groups_when_exporting_then_parent_rendered_by_name(container: ServiceContainer) {
    let csv = container.groups.export_csv();

    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines,
        vec![
            "name,slug,parent,description",
            "Americas,americas,,",
            "Canada,canada,Americas,Great White North",
        ]
    );
}

#[test]
fn given_no_records_when_exporting_then_header_only() {
    let data = tenancy::domain::Dataset::new();

    let csv = csv_document::<Tenant>(&[], &data);

    assert_eq!(csv, "name,slug,group,description,comments");
}

#[rstest]
fn given_records_when_asking_external_key_then_slug_based_urls(container: ServiceContainer) {
    let canada = container.groups.get_by_slug("canada").unwrap();
    let acme = container.tenants.get_by_slug("acme").unwrap();
    let ada = container.supervisors.get_by_slug("ada-lovelace").unwrap();

    assert_eq!(ExternalKey::slug(&canada), "canada");
    assert_eq!(canada.absolute_url(), "/tenancy/tenants/?group=canada");
    assert_eq!(acme.absolute_url(), "/tenancy/tenants/acme/");
    assert_eq!(ada.absolute_url(), "/tenancy/supervisors/?slug=ada-lovelace");
}

#[rstest]
fn given_records_when_snapshotting_then_kind_and_repr_match(container: ServiceContainer) {
    let acme = container.tenants.get_by_slug("acme").unwrap();
    let ada = container.supervisors.get_by_slug("ada-lovelace").unwrap();

    let tenant_change = acme.to_object_change(ChangeAction::Update);
    let supervisor_change = ada.to_object_change(ChangeAction::Delete);

    assert_eq!(tenant_change.kind, ObjectKind::Tenant);
    assert_eq!(tenant_change.object_repr, "Acme");
    assert_eq!(tenant_change.object_data["slug"], "acme");
    assert_eq!(supervisor_change.kind, ObjectKind::Supervisor);
    assert_eq!(supervisor_change.object_repr, "Ada Lovelace");
    assert_eq!(supervisor_change.object_data["sid"], "ada");
    assert_eq!(
        supervisor_change.object_data["tenants"],
        serde_json::json!([acme.id.0])
    );
}
