use serde::{Deserialize, Serialize};

use forgetrack_core::{DomainError, Entity, EpicId, ProjectId, TicketId, Timestamps, UserId};
use forgetrack_workflow::StatusLabel;

/// A work item.
///
/// # Invariants
/// - `status` is a member of the governing project's workflow.
/// - `status` changes only through an explicit status change, and
///   `project_id` only through a move; both are re-validated by the gateway.
/// - `reporter_id` never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub project_id: ProjectId,
    pub title: String,
    pub status: StatusLabel,
    pub assignee_id: Option<UserId>,
    pub reporter_id: UserId,
    pub epic_id: Option<EpicId>,
    pub timestamps: Timestamps,
}

impl Ticket {
    pub fn from_parts(new: NewTicket, timestamps: Timestamps) -> Self {
        Self {
            id: new.id,
            project_id: new.project_id,
            title: new.title,
            status: new.status,
            assignee_id: new.assignee_id,
            reporter_id: new.reporter_id,
            epic_id: new.epic_id,
            timestamps,
        }
    }
}

impl Entity for Ticket {
    type Id = TicketId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// A ticket ready to be persisted; `status` has already been resolved against
/// the project's workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicket {
    pub id: TicketId,
    pub project_id: ProjectId,
    pub title: String,
    pub status: StatusLabel,
    pub assignee_id: Option<UserId>,
    pub reporter_id: UserId,
    pub epic_id: Option<EpicId>,
}

pub fn validate_title(title: &str) -> Result<String, DomainError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(DomainError::validation("ticket title cannot be empty"));
    }
    Ok(title.to_string())
}
