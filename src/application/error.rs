//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::domain::DomainError;
use crate::infrastructure::traits::StoreError;

/// Application errors wrap domain errors and add store-level failures.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    /// The store rejected a commit that passed application checks, e.g. a
    /// concurrent writer got there first. Retry the whole operation.
    #[error("integrity error: {message}")]
    Integrity { message: String },

    /// The change is committed and published, but the change log did not
    /// take its events. Retrying the operation would apply it twice.
    #[error("{operation}: committed revision {revision}, but recording the change log failed")]
    AuditFailed {
        operation: String,
        revision: u64,
        #[source]
        source: StoreError,
    },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ApplicationError {
    /// True if the operation's change was persisted despite the error.
    pub fn is_committed(&self) -> bool {
        matches!(self, ApplicationError::AuditFailed { .. })
    }

    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            ApplicationError::Domain(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
