//! Errors surfaced by workflow operations.

use thiserror::Error;

use wms_auth::{AuthzError, HashError};
use wms_core::DomainError;

use crate::event_store::EventStoreError;
use crate::projections::ProjectionError;

/// Everything a workflow call can fail with.
///
/// Every variant leaves committed state unchanged.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Forbidden(#[from] AuthzError),

    /// The caller's identity no longer matches a stored user.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("event store: {0}")]
    Store(#[from] EventStoreError),

    /// A stored payload did not deserialize into the aggregate's event type.
    #[error("failed to deserialize stored event: {0}")]
    Deserialize(String),

    #[error(transparent)]
    Hash(#[from] HashError),

    #[error("projection: {0}")]
    Projection(#[from] ProjectionError),
}

impl WorkflowError {
    /// Stable machine-readable code (the `error` field of API bodies).
    pub fn code(&self) -> &'static str {
        match self {
            WorkflowError::Domain(e) => e.code(),
            WorkflowError::Forbidden(_) => "forbidden",
            WorkflowError::Unauthenticated(_) => "unauthorized",
            WorkflowError::Store(EventStoreError::Concurrency(_)) => "conflict",
            WorkflowError::Store(_)
            | WorkflowError::Deserialize(_)
            | WorkflowError::Hash(_)
            | WorkflowError::Projection(_) => "internal",
        }
    }

    /// A lost compare-and-swap: the operation can be retried from a fresh load.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WorkflowError::Store(EventStoreError::Concurrency(_)))
    }
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

#[cfg(test)]
mod tests {
    use super::*;
    use wms_auth::{Permission, Role};

    #[test]
    fn codes_follow_the_domain_error() {
        let err = WorkflowError::from(DomainError::SelfDeletion);
        assert_eq!(err.code(), "self_deletion");

        let err = WorkflowError::from(AuthzError::Forbidden {
            role: Role::Picker,
            permission: Permission::OrdersPack,
        });
        assert_eq!(err.code(), "forbidden");

        let err = WorkflowError::Unauthenticated("gone".into());
        assert_eq!(err.code(), "unauthorized");
        assert!(!err.is_retryable());
    }

    #[test]
    fn only_concurrency_is_retryable() {
        assert!(WorkflowError::from(EventStoreError::Concurrency("x".into())).is_retryable());
        assert!(!WorkflowError::from(EventStoreError::InvalidAppend("x".into())).is_retryable());
        assert!(!WorkflowError::from(DomainError::conflict("x")).is_retryable());
    }
}
