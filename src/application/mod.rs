//! Application layer: services and use cases
//!
//! This layer runs domain operations inside store transactions and depends
//! on the storage and audit boundary traits.

pub mod error;
pub mod error_ext;
pub mod services;
pub mod store;

pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::StoreResultExt;
pub use store::{Store, Transaction};
