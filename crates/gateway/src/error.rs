use thiserror::Error;

use forgetrack_auth::{AuthzError, RoleAssignmentError};
use forgetrack_core::{DomainError, StoreError};
use forgetrack_workflow::WorkflowError;

/// Error returned by [`crate::AuthorizationGateway::enforce`] and the
/// services built on it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error(transparent)]
    Authz(#[from] AuthzError),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error(transparent)]
    RoleAssignment(#[from] RoleAssignmentError),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl GatewayError {
    pub fn not_found() -> Self {
        Self::Authz(AuthzError::NotFound)
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<StoreError> for GatewayError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound => GatewayError::not_found(),
            StoreError::UniqueViolation(msg) => GatewayError::Conflict(msg),
            StoreError::ReferenceViolation(msg) => GatewayError::Validation(msg),
            StoreError::Unavailable(msg) => GatewayError::Storage(msg),
        }
    }
}

impl From<DomainError> for GatewayError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg)
            | DomainError::InvariantViolation(msg)
            | DomainError::InvalidId(msg) => GatewayError::Validation(msg),
            DomainError::NotFound => GatewayError::not_found(),
            DomainError::Conflict(msg) => GatewayError::Conflict(msg),
        }
    }
}
