use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use forgetrack_core::{DomainError, Entity, OrganizationId, ProjectId, Timestamps, WorkflowId};

/// A project; governs its tickets through `workflow_id`.
///
/// # Invariants
/// - The workflow belongs to the same organization as the project.
/// - Archival is a soft delete: `archived_at` is set once and the row stays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub workflow_id: WorkflowId,
    pub archived_at: Option<DateTime<Utc>>,
    pub timestamps: Timestamps,
}

impl Project {
    pub fn from_parts(new: NewProject, timestamps: Timestamps) -> Self {
        Self {
            id: new.id,
            organization_id: new.organization_id,
            name: new.name,
            workflow_id: new.workflow_id,
            archived_at: None,
            timestamps,
        }
    }

    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }

    pub fn ensure_active(&self) -> Result<(), DomainError> {
        if self.is_archived() {
            return Err(DomainError::validation("project is archived"));
        }
        Ok(())
    }
}

impl Entity for Project {
    type Id = ProjectId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    pub id: ProjectId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub workflow_id: WorkflowId,
}

impl NewProject {
    pub fn new(
        organization_id: OrganizationId,
        name: &str,
        workflow_id: WorkflowId,
    ) -> Result<Self, DomainError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("project name cannot be empty"));
        }
        Ok(Self {
            id: ProjectId::new(),
            organization_id,
            name: name.to_string(),
            workflow_id,
        })
    }
}
