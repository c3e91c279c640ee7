//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services share one [`Store`](crate::application::Store) and are
//! themselves concrete structs, not traits.

mod groups;
mod supervisors;
mod tenants;

pub use groups::{GroupTenantCount, TenantGroupService};
pub use supervisors::SupervisorService;
pub use tenants::TenantService;
