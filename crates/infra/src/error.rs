use thiserror::Error;

use yamdb_core::{ConflictKind, DomainError};

use crate::store::StoreError;

/// Failure of a service operation, independent of transport.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("conflict: {0} already taken")]
    Conflict(ConflictKind),

    #[error("{0} not found")]
    NotFound(&'static str),

    /// Deliberately says nothing about which half of the pair was wrong.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("service unavailable: {0}")]
    Unavailable(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => ServiceError::Validation(msg),
            DomainError::Conflict(kind) => ServiceError::Conflict(kind),
            DomainError::NotFound(what) => ServiceError::NotFound(what),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::UniqueViolation(constraint) => {
                ServiceError::Conflict(constraint.conflict_kind())
            }
            StoreError::NotFound => ServiceError::NotFound("record"),
            StoreError::Unavailable(msg) => ServiceError::Unavailable(msg),
        }
    }
}
