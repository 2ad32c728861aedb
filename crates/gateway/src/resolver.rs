//! Owning-organization resolution.
//!
//! Tenant-scoped resources reach their organization through a reference
//! chain (comment → ticket → project → organization). Each link is read
//! fresh from the directory; a missing link anywhere answers `NotFound`.

use serde::Serialize;

use forgetrack_auth::{ResolvedResource, ResourceKind};
use forgetrack_core::{
    CommentId, EpicId, OrganizationId, ProjectId, TicketId, UserId, WorkflowId,
};
use forgetrack_tracking::{Directory, Project, Ticket, require};

use crate::GatewayError;

/// Reference to the target of an operation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ResourceRef {
    Platform,
    Organization(OrganizationId),
    User(UserId),
    Project(ProjectId),
    Workflow(WorkflowId),
    Ticket(TicketId),
    Epic(EpicId),
    Comment(CommentId),
    /// Activity logs are addressed by the organization they belong to.
    ActivityLog(OrganizationId),
}

impl ResourceRef {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceRef::Platform => ResourceKind::Platform,
            ResourceRef::Organization(_) => ResourceKind::Organization,
            ResourceRef::User(_) => ResourceKind::User,
            ResourceRef::Project(_) => ResourceKind::Project,
            ResourceRef::Workflow(_) => ResourceKind::Workflow,
            ResourceRef::Ticket(_) => ResourceKind::Ticket,
            ResourceRef::Epic(_) => ResourceKind::Epic,
            ResourceRef::Comment(_) => ResourceKind::Comment,
            ResourceRef::ActivityLog(_) => ResourceKind::ActivityLog,
        }
    }
}

/// Organization that owns `resource`, or `None` for platform-level targets
/// (the platform itself and super-admin accounts).
pub fn resolve_owning_organization<D>(
    directory: &D,
    resource: ResourceRef,
) -> Result<Option<OrganizationId>, GatewayError>
where
    D: Directory + ?Sized,
{
    Ok(resolve_resource(directory, resource)?.organization_id)
}

/// Resolve everything the evaluator needs to know about `resource`.
pub fn resolve_resource<D>(
    directory: &D,
    resource: ResourceRef,
) -> Result<ResolvedResource, GatewayError>
where
    D: Directory + ?Sized,
{
    let kind = resource.kind();
    let resolved = match resource {
        ResourceRef::Platform => ResolvedResource::platform(),
        ResourceRef::Organization(id) | ResourceRef::ActivityLog(id) => {
            ResolvedResource::owned_by(kind, organization(directory, id)?)
        }
        ResourceRef::User(id) => {
            let user = require(directory.get_user(id))?;
            match user.organization_id {
                Some(org) => ResolvedResource::owned_by(kind, organization(directory, org)?),
                None => ResolvedResource {
                    kind,
                    organization_id: None,
                    author_id: None,
                },
            }
        }
        ResourceRef::Project(id) => {
            let project = require(directory.get_project(id))?;
            ResolvedResource::owned_by(kind, organization(directory, project.organization_id)?)
        }
        ResourceRef::Workflow(id) => {
            let workflow = require(directory.get_workflow(id))?;
            ResolvedResource::owned_by(kind, organization(directory, workflow.organization_id)?)
        }
        ResourceRef::Epic(id) => {
            let epic = require(directory.get_epic(id))?;
            ResolvedResource::owned_by(kind, organization(directory, epic.organization_id)?)
        }
        ResourceRef::Ticket(id) => {
            let (_, project) = ticket_chain(directory, id)?;
            ResolvedResource::owned_by(kind, organization(directory, project.organization_id)?)
        }
        ResourceRef::Comment(id) => {
            let comment = require(directory.get_comment(id))?;
            let (_, project) = ticket_chain(directory, comment.ticket_id)?;
            ResolvedResource::owned_by(kind, organization(directory, project.organization_id)?)
                .with_author(comment.author_id)
        }
    };
    Ok(resolved)
}

/// Load a ticket together with the project that currently governs it.
pub(crate) fn ticket_chain<D>(directory: &D, id: TicketId) -> Result<(Ticket, Project), GatewayError>
where
    D: Directory + ?Sized,
{
    let ticket = require(directory.get_ticket(id))?;
    let project = require(directory.get_project(ticket.project_id))?;
    Ok((ticket, project))
}

fn organization<D>(directory: &D, id: OrganizationId) -> Result<OrganizationId, GatewayError>
where
    D: Directory + ?Sized,
{
    Ok(require(directory.get_organization(id))?.id)
}
