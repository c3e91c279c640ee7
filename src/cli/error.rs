//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("{0}")]
    Usage(String),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) | CliError::Usage(_) => crate::exitcode::USAGE,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => crate::exitcode::IOERR,
                InfraError::Application(app) => match app {
                    ApplicationError::Domain(DomainError::NotFound { .. }) => {
                        crate::exitcode::NOINPUT
                    }
                    ApplicationError::Domain(DomainError::InconsistentTree(_)) => {
                        crate::exitcode::SOFTWARE
                    }
                    ApplicationError::Domain(_) => crate::exitcode::DATAERR,
                    ApplicationError::Integrity { .. } => crate::exitcode::TEMPFAIL,
                    ApplicationError::Config { .. } => crate::exitcode::CONFIG,
                    ApplicationError::OperationFailed { .. }
                    | ApplicationError::AuditFailed { .. } => crate::exitcode::IOERR,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(DomainError::validation("slug", "taken"), crate::exitcode::DATAERR)]
    #[case(DomainError::not_found("tenant", "acme"), crate::exitcode::NOINPUT)]
    #[case(
        DomainError::Protected { kind: "tenant group", repr: "Americas".into(), dependents: 2 },
        crate::exitcode::DATAERR
    )]
    fn given_domain_error_when_exit_code_then_maps_to_sysexits(
        #[case] error: DomainError,
        #[case] expected: i32,
    ) {
        let err = CliError::from(ApplicationError::from(error));
        assert_eq!(err.exit_code(), expected);
    }

    #[test]
    fn given_integrity_error_when_exit_code_then_tempfail() {
        let err = CliError::from(ApplicationError::Integrity {
            message: "revision 3 expected, found 4".into(),
        });
        assert_eq!(err.exit_code(), crate::exitcode::TEMPFAIL);
    }

    #[test]
    fn given_audit_failure_when_exit_code_then_ioerr() {
        let err = CliError::from(ApplicationError::AuditFailed {
            operation: "create tenant".into(),
            revision: 4,
            source: crate::infrastructure::traits::StoreError::io(
                "append changes.jsonl",
                std::io::Error::other("disk full"),
            ),
        });
        assert_eq!(err.exit_code(), crate::exitcode::IOERR);
    }

    #[test]
    fn given_usage_error_when_exit_code_then_usage() {
        assert_eq!(CliError::Usage("no command".into()).exit_code(), crate::exitcode::USAGE);
    }
}
