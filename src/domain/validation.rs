//! Field constraints shared by all record kinds.

use std::sync::OnceLock;

use regex::Regex;

use crate::domain::error::ValidationErrors;

pub const NAME_MAX: usize = 100;
pub const SLUG_MAX: usize = 100;
pub const DESCRIPTION_MAX: usize = 200;
pub const TAG_MAX: usize = 100;
pub const FULL_NAME_MAX: usize = 150;
pub const EMAIL_MAX: usize = 100;
pub const PHONE_MAX: usize = 20;
pub const SID_MAX: usize = 8;

fn slug_regex() -> &'static Regex {
    static SLUG: OnceLock<Regex> = OnceLock::new();
    SLUG.get_or_init(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("slug pattern is valid"))
}

fn non_slug_regex() -> &'static Regex {
    static NON_SLUG: OnceLock<Regex> = OnceLock::new();
    NON_SLUG.get_or_init(|| Regex::new(r"[^a-z0-9_]+").expect("slugify pattern is valid"))
}

/// Required string of at most `max` characters.
pub fn check_required(errors: &mut ValidationErrors, field: &str, value: &str, max: usize) {
    if value.trim().is_empty() {
        errors.push(field, "this field is required");
    } else {
        check_max_len(errors, field, value, max);
    }
}

/// Required free text without a length limit.
pub fn check_present(errors: &mut ValidationErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(field, "this field is required");
    }
}

/// Optional string of at most `max` characters.
pub fn check_max_len(errors: &mut ValidationErrors, field: &str, value: &str, max: usize) {
    let len = value.chars().count();
    if len > max {
        errors.push(
            field,
            format!("ensure this value has at most {max} characters (it has {len})"),
        );
    }
}

/// URL-safe slug: letters, numbers, underscores or hyphens.
pub fn check_slug(errors: &mut ValidationErrors, field: &str, value: &str) {
    if value.is_empty() {
        errors.push(field, "this field is required");
        return;
    }
    check_max_len(errors, field, value, SLUG_MAX);
    if !slug_regex().is_match(value) {
        errors.push(
            field,
            "enter a valid slug consisting of letters, numbers, underscores or hyphens",
        );
    }
}

/// Derive a slug from a display name: lowercase, runs of other characters
/// collapsed into a single hyphen, truncated to the slug limit.
pub fn slugify(value: &str) -> String {
    let lowered = value.trim().to_lowercase();
    let slug = non_slug_regex().replace_all(&lowered, "-");
    slug.trim_matches('-').chars().take(SLUG_MAX).collect()
}
