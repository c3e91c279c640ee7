//! Domain layer: entities and business logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod audit;
pub mod dataset;
pub mod entities;
pub mod error;
pub mod export;
pub mod records;
pub mod validation;

pub use arena::{Ancestors, Children, Descendants, GroupTree};
pub use audit::{ChangeAction, ChangeLogged, ObjectChange, ObjectKind, TREE_FIELDS};
pub use dataset::Dataset;
pub use entities::*;
pub use error::{DomainError, DomainResult, FieldError, ValidationErrors};
pub use export::{csv_document, csv_line, CsvExport, ExternalKey};
pub use records::{SupervisorTable, TenantTable};
pub use validation::slugify;
