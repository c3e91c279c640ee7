//! Tenancy data model: tenants, hierarchical tenant groups and supervisors.
//!
//! Layers, innermost first:
//! - [`domain`]: entities, the nested-set [`GroupTree`](domain::GroupTree),
//!   record tables and capability traits
//! - [`application`]: the transactional [`Store`](application::Store) and services
//! - [`infrastructure`]: storage backends, audit sinks, DI container
//! - [`cli`]: the `tenancy` command line

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
