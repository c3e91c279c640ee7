//! Bulk-export and external-reference capabilities.

use itertools::Itertools;

use crate::domain::dataset::Dataset;
use crate::domain::entities::{Supervisor, Tenant, TenantGroup};

/// Flat, fixed-order row export for bulk reporting.
pub trait CsvExport {
    const CSV_HEADERS: &'static [&'static str];

    /// One value per header, in header order. Related records are resolved
    /// against `data` and rendered by name; absent ones render empty.
    fn to_csv(&self, data: &Dataset) -> Vec<String>;
}

/// Stable key used by presentation layers to build links.
pub trait ExternalKey {
    fn slug(&self) -> &str;

    fn absolute_url(&self) -> String;
}

impl CsvExport for TenantGroup {
    const CSV_HEADERS: &'static [&'static str] = &["name", "slug", "parent", "description"];

    fn to_csv(&self, data: &Dataset) -> Vec<String> {
        let parent = self
            .parent()
            .and_then(|p| data.groups.get(p))
            .map(|p| p.name.clone())
            .unwrap_or_default();
        vec![
            self.name.clone(),
            self.slug.clone(),
            parent,
            self.description.clone(),
        ]
    }
}

impl CsvExport for Tenant {
    const CSV_HEADERS: &'static [&'static str] = &["name", "slug", "group", "description", "comments"];

    fn to_csv(&self, data: &Dataset) -> Vec<String> {
        let group = self
            .group
            .and_then(|g| data.groups.get(g))
            .map(|g| g.name.clone())
            .unwrap_or_default();
        vec![
            self.name.clone(),
            self.slug.clone(),
            group,
            self.description.clone(),
            self.comments.clone(),
        ]
    }
}

impl CsvExport for Supervisor {
    const CSV_HEADERS: &'static [&'static str] = &[
        "full_name",
        "email",
        "phone_number",
        "sid",
        "tenants",
        "comments",
        "slug",
    ];

    fn to_csv(&self, data: &Dataset) -> Vec<String> {
        let tenants = self
            .tenants
            .iter()
            .filter_map(|t| data.tenants.get(*t))
            .map(|t| t.name.as_str())
            .sorted()
            .join(",");
        vec![
            self.full_name.clone(),
            self.email.clone(),
            self.phone_number.clone(),
            self.sid.clone(),
            tenants,
            self.comments.clone(),
            self.slug.clone(),
        ]
    }
}

impl ExternalKey for TenantGroup {
    fn slug(&self) -> &str {
        &self.slug
    }

    fn absolute_url(&self) -> String {
        format!("/tenancy/tenants/?group={}", self.slug)
    }
}

impl ExternalKey for Tenant {
    fn slug(&self) -> &str {
        &self.slug
    }

    fn absolute_url(&self) -> String {
        format!("/tenancy/tenants/{}/", self.slug)
    }
}

impl ExternalKey for Supervisor {
    fn slug(&self) -> &str {
        &self.slug
    }

    fn absolute_url(&self) -> String {
        format!("/tenancy/supervisors/?slug={}", self.slug)
    }
}

/// Render one CSV line, quoting values that contain separators, quotes or
/// line breaks.
pub fn csv_line<S: AsRef<str>>(values: &[S]) -> String {
    values
        .iter()
        .map(|v| {
            let v = v.as_ref();
            if v.contains([',', '"', '\n', '\r']) {
                format!("\"{}\"", v.replace('"', "\"\""))
            } else {
                v.to_string()
            }
        })
        .join(",")
}

/// Header line followed by one line per record.
pub fn csv_document<T: CsvExport>(records: &[&T], data: &Dataset) -> String {
    let mut out = csv_line(T::CSV_HEADERS);
    for record in records {
        out.push('\n');
        out.push_str(&csv_line(&record.to_csv(data)));
    }
    out
}
