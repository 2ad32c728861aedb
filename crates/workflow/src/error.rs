use thiserror::Error;

use forgetrack_core::{OrganizationId, StoreError};

use crate::StatusLabel;

/// Errors raised by workflow validation and the workflow registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    /// A requested ticket status is not defined by the governing workflow.
    #[error("invalid status '{status}'; allowed statuses: {}", join(.allowed))]
    InvalidStatus {
        status: String,
        allowed: Vec<StatusLabel>,
    },

    /// A ticket's current status does not exist in the destination workflow.
    #[error(
        "status '{status}' does not exist in the destination workflow ({}); change the ticket status first",
        join(.allowed)
    )]
    IncompatibleStatus {
        status: StatusLabel,
        allowed: Vec<StatusLabel>,
    },

    #[error("a default workflow already exists for organization {0}")]
    DefaultWorkflowExists(OrganizationId),

    /// Structural violation (empty list, duplicate or malformed label, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("workflow not found")]
    NotFound,

    #[error("storage error: {0}")]
    Storage(String),
}

impl WorkflowError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<StoreError> for WorkflowError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound => WorkflowError::NotFound,
            StoreError::UniqueViolation(msg) | StoreError::ReferenceViolation(msg) => {
                WorkflowError::Validation(msg)
            }
            StoreError::Unavailable(msg) => WorkflowError::Storage(msg),
        }
    }
}

fn join(labels: &[StatusLabel]) -> String {
    labels
        .iter()
        .map(StatusLabel::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
