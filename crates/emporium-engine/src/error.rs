//! # Engine Error Types
//!
//! One error type for every workflow entry point, splitting domain failures
//! (business rules, policy, validation) from storage failures.

use thiserror::Error;

use emporium_core::error::{CoreError, ValidationError};
use emporium_db::DbError;

/// Workflow errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A business rule, policy or validation failure. The caller did
    /// something the domain forbids; nothing was persisted.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// A storage-layer failure. The enclosing transaction was rolled back.
    #[error(transparent)]
    Storage(#[from] DbError),
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Domain(CoreError::from(err))
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        EngineError::Storage(DbError::from(err))
    }
}

/// Result type for workflow operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_flows_into_domain() {
        let err: EngineError = ValidationError::Empty {
            field: "items".to_string(),
        }
        .into();

        assert!(matches!(
            err,
            EngineError::Domain(CoreError::Validation(ValidationError::Empty { .. }))
        ));
    }

    #[test]
    fn test_storage_preserves_db_error() {
        let err: EngineError = DbError::PoolExhausted.into();
        assert!(matches!(err, EngineError::Storage(DbError::PoolExhausted)));
    }
}
