//! Error conversion helpers for storage operations
//!
//! Provides an extension trait for cleaner error handling with context.

use crate::application::{ApplicationError, ApplicationResult};
use crate::infrastructure::traits::StoreError;

/// Extension trait for converting store results to `ApplicationResult` with context.
pub trait StoreResultExt<T> {
    /// Revision conflicts and constraint failures become `Integrity`;
    /// everything else is wrapped with the action that failed.
    ///
    /// # Example
    /// ```ignore
    /// backend.save(&data, base.revision)
    ///     .with_store_context("commit dataset")?;
    /// ```
    fn with_store_context(self, action: &str) -> ApplicationResult<T>;
}

impl<T> StoreResultExt<T> for Result<T, StoreError> {
    fn with_store_context(self, action: &str) -> ApplicationResult<T> {
        self.map_err(|e| match e {
            StoreError::Conflict { .. } | StoreError::Constraint(_) => {
                ApplicationError::Integrity {
                    message: format!("{action}: {e}"),
                }
            }
            other => ApplicationError::OperationFailed {
                context: action.to_string(),
                source: Box::new(other),
            },
        })
    }
}
