//! Read-only entity lookups.

use std::sync::Arc;

use forgetrack_core::{
    CommentId, EpicId, OrganizationId, ProjectId, StoreError, TicketId, UserId, WorkflowId,
};
use forgetrack_workflow::Workflow;

use crate::{Comment, Epic, Organization, Project, Ticket, User};

/// Read-only access to current entity state.
///
/// Every lookup reads current storage; implementations must not serve cached
/// copies. `Ok(None)` means the row does not exist.
pub trait Directory: Send + Sync {
    fn get_organization(&self, id: OrganizationId) -> Result<Option<Organization>, StoreError>;
    fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError>;
    fn get_project(&self, id: ProjectId) -> Result<Option<Project>, StoreError>;
    fn get_ticket(&self, id: TicketId) -> Result<Option<Ticket>, StoreError>;
    fn get_epic(&self, id: EpicId) -> Result<Option<Epic>, StoreError>;
    fn get_comment(&self, id: CommentId) -> Result<Option<Comment>, StoreError>;
    fn get_workflow(&self, id: WorkflowId) -> Result<Option<Workflow>, StoreError>;
    fn get_default_workflow(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Option<Workflow>, StoreError>;
}

impl<D> Directory for Arc<D>
where
    D: Directory + ?Sized,
{
    fn get_organization(&self, id: OrganizationId) -> Result<Option<Organization>, StoreError> {
        (**self).get_organization(id)
    }

    fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        (**self).get_user(id)
    }

    fn get_project(&self, id: ProjectId) -> Result<Option<Project>, StoreError> {
        (**self).get_project(id)
    }

    fn get_ticket(&self, id: TicketId) -> Result<Option<Ticket>, StoreError> {
        (**self).get_ticket(id)
    }

    fn get_epic(&self, id: EpicId) -> Result<Option<Epic>, StoreError> {
        (**self).get_epic(id)
    }

    fn get_comment(&self, id: CommentId) -> Result<Option<Comment>, StoreError> {
        (**self).get_comment(id)
    }

    fn get_workflow(&self, id: WorkflowId) -> Result<Option<Workflow>, StoreError> {
        (**self).get_workflow(id)
    }

    fn get_default_workflow(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Option<Workflow>, StoreError> {
        (**self).get_default_workflow(organization_id)
    }
}

/// Turn a missing row into `StoreError::NotFound`.
pub fn require<T>(found: Result<Option<T>, StoreError>) -> Result<T, StoreError> {
    found?.ok_or(StoreError::NotFound)
}
