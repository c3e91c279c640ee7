//! Infrastructure layer: storage backends, audit sinks and DI container
//!
//! This layer implements the boundary traits and wires up services.

pub mod audit;
pub mod di;
pub mod error;
pub mod storage;
pub mod traits;

pub use audit::{JsonLinesAuditLog, MemoryAuditLog};
pub use error::{InfraError, InfraResult};
pub use storage::{JsonFileStore, MemoryDataStore};
