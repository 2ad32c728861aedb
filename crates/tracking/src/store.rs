//! Write port for tracking entities.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use forgetrack_auth::Role;
use forgetrack_core::{CommentId, EpicId, OrganizationId, ProjectId, StoreError, TicketId, UserId};
use forgetrack_workflow::StatusLabel;

use crate::{
    Comment, Epic, NewComment, NewEpic, NewOrganization, NewProject, NewTicket, NewUser,
    Organization, Project, Ticket, User,
};

/// Transactional persistence for tracking entities.
///
/// Each method is one atomic write that stamps `updated_at`. Decisions about
/// whether a write is allowed are made before calling in; implementations
/// only enforce storage-level rules (uniqueness, existence).
pub trait TrackingStore: Send + Sync {
    /// Fails with `UniqueViolation` when the name is taken.
    fn insert_organization(&self, new: NewOrganization) -> Result<Organization, StoreError>;
    fn set_organization_active(
        &self,
        id: OrganizationId,
        active: bool,
    ) -> Result<Organization, StoreError>;

    fn insert_user(&self, new: NewUser) -> Result<User, StoreError>;
    fn set_user_role(&self, id: UserId, role: Role) -> Result<User, StoreError>;
    fn set_user_active(&self, id: UserId, active: bool) -> Result<User, StoreError>;

    fn insert_project(&self, new: NewProject) -> Result<Project, StoreError>;
    fn archive_project(&self, id: ProjectId, at: DateTime<Utc>) -> Result<Project, StoreError>;

    fn insert_ticket(&self, new: NewTicket) -> Result<Ticket, StoreError>;
    fn set_ticket_title(&self, id: TicketId, title: String) -> Result<Ticket, StoreError>;
    fn set_ticket_status(&self, id: TicketId, status: StatusLabel) -> Result<Ticket, StoreError>;
    /// Re-parent a ticket, writing the status it holds under the new
    /// project in the same step.
    fn set_ticket_project(
        &self,
        id: TicketId,
        project_id: ProjectId,
        status: StatusLabel,
    ) -> Result<Ticket, StoreError>;
    fn set_ticket_assignee(
        &self,
        id: TicketId,
        assignee_id: Option<UserId>,
    ) -> Result<Ticket, StoreError>;
    /// Fails with `NotFound` when `epic_id` names a missing epic.
    fn set_ticket_epic(&self, id: TicketId, epic_id: Option<EpicId>) -> Result<Ticket, StoreError>;
    fn delete_ticket(&self, id: TicketId) -> Result<(), StoreError>;

    fn insert_epic(&self, new: NewEpic) -> Result<Epic, StoreError>;
    fn delete_epic(&self, id: EpicId) -> Result<(), StoreError>;

    fn insert_comment(&self, new: NewComment) -> Result<Comment, StoreError>;
    fn set_comment_body(&self, id: CommentId, body: String) -> Result<Comment, StoreError>;
    fn delete_comment(&self, id: CommentId) -> Result<(), StoreError>;
}

impl<S> TrackingStore for Arc<S>
where
    S: TrackingStore + ?Sized,
{
    fn insert_organization(&self, new: NewOrganization) -> Result<Organization, StoreError> {
        (**self).insert_organization(new)
    }

    fn set_organization_active(
        &self,
        id: OrganizationId,
        active: bool,
    ) -> Result<Organization, StoreError> {
        (**self).set_organization_active(id, active)
    }

    fn insert_user(&self, new: NewUser) -> Result<User, StoreError> {
        (**self).insert_user(new)
    }

    fn set_user_role(&self, id: UserId, role: Role) -> Result<User, StoreError> {
        (**self).set_user_role(id, role)
    }

    fn set_user_active(&self, id: UserId, active: bool) -> Result<User, StoreError> {
        (**self).set_user_active(id, active)
    }

    fn insert_project(&self, new: NewProject) -> Result<Project, StoreError> {
        (**self).insert_project(new)
    }

    fn archive_project(&self, id: ProjectId, at: DateTime<Utc>) -> Result<Project, StoreError> {
        (**self).archive_project(id, at)
    }

    fn insert_ticket(&self, new: NewTicket) -> Result<Ticket, StoreError> {
        (**self).insert_ticket(new)
    }

    fn set_ticket_title(&self, id: TicketId, title: String) -> Result<Ticket, StoreError> {
        (**self).set_ticket_title(id, title)
    }

    fn set_ticket_status(&self, id: TicketId, status: StatusLabel) -> Result<Ticket, StoreError> {
        (**self).set_ticket_status(id, status)
    }

    fn set_ticket_project(
        &self,
        id: TicketId,
        project_id: ProjectId,
        status: StatusLabel,
    ) -> Result<Ticket, StoreError> {
        (**self).set_ticket_project(id, project_id, status)
    }

    fn set_ticket_assignee(
        &self,
        id: TicketId,
        assignee_id: Option<UserId>,
    ) -> Result<Ticket, StoreError> {
        (**self).set_ticket_assignee(id, assignee_id)
    }

    fn set_ticket_epic(&self, id: TicketId, epic_id: Option<EpicId>) -> Result<Ticket, StoreError> {
        (**self).set_ticket_epic(id, epic_id)
    }

    fn delete_ticket(&self, id: TicketId) -> Result<(), StoreError> {
        (**self).delete_ticket(id)
    }

    fn insert_epic(&self, new: NewEpic) -> Result<Epic, StoreError> {
        (**self).insert_epic(new)
    }

    fn delete_epic(&self, id: EpicId) -> Result<(), StoreError> {
        (**self).delete_epic(id)
    }

    fn insert_comment(&self, new: NewComment) -> Result<Comment, StoreError> {
        (**self).insert_comment(new)
    }

    fn set_comment_body(&self, id: CommentId, body: String) -> Result<Comment, StoreError> {
        (**self).set_comment_body(id, body)
    }

    fn delete_comment(&self, id: CommentId) -> Result<(), StoreError> {
        (**self).delete_comment(id)
    }
}
