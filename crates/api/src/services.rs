//! Governed operations.
//!
//! Every method runs the same pipeline: the gateway decides, the store
//! commits, and the audit sink is told afterwards. Nothing is written when
//! the gateway refuses, and a failing audit sink never undoes a commit.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use forgetrack_auth::{
    AuthorizationExplanation, AuthzError, GrantTable, Operation, Principal, Role, check_grant,
    explain, explain_decision,
};
use forgetrack_core::{
    CommentId, EpicId, OrganizationId, ProjectId, TicketId, UserId, WorkflowId,
};
use forgetrack_gateway::{
    AuthorizationGateway, AuthorizedContext, GatewayError, ResourceRef, ResourceRefs,
    resolve_resource,
};
use forgetrack_infra::{AuditRecord, AuditSink, TrackerConfig};
use forgetrack_tracking::{
    Comment, Directory, Epic, NewComment, NewEpic, NewOrganization, NewProject, NewTicket,
    NewUser, Organization, Project, Ticket, TrackingStore, User, require, validate_body,
    validate_membership, validate_title,
};
use forgetrack_workflow::{
    StatusChange, StatusLabel, Workflow, WorkflowRegistry, WorkflowStore, WorkflowUpdate,
};

/// Input for [`TrackerServices::create_user`].
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub organization_id: OrganizationId,
    pub email: String,
    pub display_name: String,
    pub role: Role,
}

/// Input for [`TrackerServices::create_ticket`].
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTicket {
    pub project_id: ProjectId,
    pub title: String,
    /// Starting status; the workflow's first status when absent.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub assignee_id: Option<UserId>,
    #[serde(default)]
    pub epic_id: Option<EpicId>,
}

pub struct TrackerServices<S, A> {
    store: Arc<S>,
    gateway: AuthorizationGateway<Arc<S>>,
    workflows: WorkflowRegistry<Arc<S>>,
    audit: A,
    config: TrackerConfig,
}

impl<S, A> TrackerServices<S, A>
where
    S: Directory + TrackingStore + WorkflowStore + 'static,
    A: AuditSink,
{
    pub fn new(store: Arc<S>, audit: A, config: TrackerConfig) -> Self {
        Self {
            gateway: AuthorizationGateway::new(store.clone()),
            workflows: WorkflowRegistry::new(store.clone()),
            store,
            audit,
            config,
        }
    }

    pub fn gateway(&self) -> &AuthorizationGateway<Arc<S>> {
        &self.gateway
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    fn enforce(
        &self,
        principal: &Principal,
        operation: Operation,
        refs: impl Into<ResourceRefs>,
    ) -> Result<AuthorizedContext, GatewayError> {
        self.gateway.enforce(principal, operation, &refs.into())
    }

    /// Best-effort audit of a committed mutation.
    fn record<T: Serialize>(&self, ctx: &AuthorizedContext, entity_id: impl ToString, entity: &T) {
        let mut record = AuditRecord::new(
            ctx.operation,
            entity_id,
            ctx.principal_id,
            ctx.organization_id,
        );
        if self.config.audit_snapshots {
            record = record.with_snapshot(entity);
        }
        if let Err(err) = self.audit.record(record) {
            tracing::warn!(
                operation = %ctx.operation,
                principal_id = %ctx.principal_id,
                error = %err,
                "audit record dropped"
            );
        }
    }

    // ── Organizations ────────────────────────────────────────────────────

    pub fn create_organization(
        &self,
        principal: &Principal,
        name: &str,
    ) -> Result<Organization, GatewayError> {
        let mut ctx = self.enforce(principal, Operation::OrganizationCreate, ResourceRef::Platform)?;
        let organization = self.store.insert_organization(NewOrganization::new(name)?)?;
        ctx.organization_id = Some(organization.id);
        self.record(&ctx, organization.id, &organization);
        Ok(organization)
    }

    pub fn set_organization_active(
        &self,
        principal: &Principal,
        id: OrganizationId,
        active: bool,
    ) -> Result<Organization, GatewayError> {
        let ctx = self.enforce(principal, Operation::OrganizationUpdate, ResourceRef::Organization(id))?;
        let organization = self.store.set_organization_active(id, active)?;
        self.record(&ctx, id, &organization);
        Ok(organization)
    }

    pub fn get_organization(
        &self,
        principal: &Principal,
        id: OrganizationId,
    ) -> Result<Organization, GatewayError> {
        self.enforce(principal, Operation::OrganizationRead, ResourceRef::Organization(id))?;
        Ok(require(self.store.get_organization(id))?)
    }

    // ── Users ────────────────────────────────────────────────────────────

    pub fn create_user(&self, principal: &Principal, input: CreateUser) -> Result<User, GatewayError> {
        let refs = ResourceRefs::new(ResourceRef::Organization(input.organization_id)).role(input.role);
        let ctx = self.enforce(principal, Operation::UserCreate, refs)?;
        let new = NewUser::new(
            Some(input.organization_id),
            &input.email,
            &input.display_name,
            input.role,
        )?;
        let user = self.store.insert_user(new)?;
        self.record(&ctx, user.id, &user);
        Ok(user)
    }

    /// Takes effect on the user's next request.
    pub fn change_user_role(
        &self,
        principal: &Principal,
        id: UserId,
        role: Role,
    ) -> Result<User, GatewayError> {
        let refs = ResourceRefs::new(ResourceRef::User(id)).role(role);
        let ctx = self.enforce(principal, Operation::UserUpdate, refs)?;
        let current = require(self.store.get_user(id))?;
        validate_membership(current.organization_id, role)?;
        let user = self.store.set_user_role(id, role)?;
        self.record(&ctx, id, &user);
        Ok(user)
    }

    /// Soft delete: the account stays but can no longer authenticate.
    pub fn deactivate_user(&self, principal: &Principal, id: UserId) -> Result<User, GatewayError> {
        let ctx = self.enforce(principal, Operation::UserDelete, ResourceRef::User(id))?;
        let user = self.store.set_user_active(id, false)?;
        self.record(&ctx, id, &user);
        Ok(user)
    }

    pub fn get_user(&self, principal: &Principal, id: UserId) -> Result<User, GatewayError> {
        self.enforce(principal, Operation::UserRead, ResourceRef::User(id))?;
        Ok(require(self.store.get_user(id))?)
    }

    // ── Projects ─────────────────────────────────────────────────────────

    /// Create a project governed by `workflow_id`, or by the organization's
    /// default workflow when none is given.
    pub fn create_project(
        &self,
        principal: &Principal,
        organization_id: OrganizationId,
        name: &str,
        workflow_id: Option<WorkflowId>,
    ) -> Result<Project, GatewayError> {
        let mut refs = ResourceRefs::new(ResourceRef::Organization(organization_id));
        refs.workflow = workflow_id;
        let ctx = self.enforce(principal, Operation::ProjectCreate, refs)?;
        let workflow_id = ctx
            .workflow_id
            .ok_or_else(|| GatewayError::validation("project needs a workflow"))?;
        let project = self
            .store
            .insert_project(NewProject::new(organization_id, name, workflow_id)?)?;
        self.record(&ctx, project.id, &project);
        Ok(project)
    }

    pub fn archive_project(&self, principal: &Principal, id: ProjectId) -> Result<Project, GatewayError> {
        let ctx = self.enforce(principal, Operation::ProjectArchive, ResourceRef::Project(id))?;
        let project = self.store.archive_project(id, Utc::now())?;
        self.record(&ctx, id, &project);
        Ok(project)
    }

    pub fn get_project(&self, principal: &Principal, id: ProjectId) -> Result<Project, GatewayError> {
        self.enforce(principal, Operation::ProjectRead, ResourceRef::Project(id))?;
        Ok(require(self.store.get_project(id))?)
    }

    // ── Workflows ────────────────────────────────────────────────────────

    pub fn create_workflow<T: AsRef<str>>(
        &self,
        principal: &Principal,
        organization_id: OrganizationId,
        name: &str,
        statuses: &[T],
    ) -> Result<Workflow, GatewayError> {
        let ctx = self.enforce(
            principal,
            Operation::WorkflowCreate,
            ResourceRef::Organization(organization_id),
        )?;
        let workflow = self.workflows.create(organization_id, name, statuses)?;
        self.record(&ctx, workflow.id, &workflow);
        Ok(workflow)
    }

    /// Create the organization's default workflow, using the configured
    /// default statuses when `statuses` is `None`.
    pub fn create_default_workflow(
        &self,
        principal: &Principal,
        organization_id: OrganizationId,
        name: &str,
        statuses: Option<&[String]>,
    ) -> Result<Workflow, GatewayError> {
        let ctx = self.enforce(
            principal,
            Operation::WorkflowCreateDefault,
            ResourceRef::Organization(organization_id),
        )?;
        let workflow = match statuses {
            Some(statuses) => self.workflows.create_default(organization_id, name, statuses)?,
            None => {
                let defaults: Vec<&str> = self
                    .config
                    .default_statuses
                    .iter()
                    .map(StatusLabel::as_str)
                    .collect();
                self.workflows
                    .create_default(organization_id, name, defaults.as_slice())?
            }
        };
        self.record(&ctx, workflow.id, &workflow);
        Ok(workflow)
    }

    pub fn update_workflow(
        &self,
        principal: &Principal,
        id: WorkflowId,
        update: WorkflowUpdate,
    ) -> Result<Workflow, GatewayError> {
        let ctx = self.enforce(principal, Operation::WorkflowUpdate, ResourceRef::Workflow(id))?;
        let workflow = self.workflows.update(id, update)?;
        self.record(&ctx, id, &workflow);
        Ok(workflow)
    }

    pub fn delete_workflow(&self, principal: &Principal, id: WorkflowId) -> Result<(), GatewayError> {
        let ctx = self.enforce(principal, Operation::WorkflowDelete, ResourceRef::Workflow(id))?;
        let workflow = self.workflows.get(id)?;
        self.workflows.delete(id)?;
        self.record(&ctx, id, &workflow);
        Ok(())
    }

    pub fn get_workflow(&self, principal: &Principal, id: WorkflowId) -> Result<Workflow, GatewayError> {
        self.enforce(principal, Operation::WorkflowRead, ResourceRef::Workflow(id))?;
        Ok(self.workflows.get(id)?)
    }

    /// Workflows of an organization; visible to anyone who can read it.
    pub fn list_workflows(
        &self,
        principal: &Principal,
        organization_id: OrganizationId,
    ) -> Result<Vec<Workflow>, GatewayError> {
        self.enforce(
            principal,
            Operation::OrganizationRead,
            ResourceRef::Organization(organization_id),
        )?;
        Ok(self.workflows.get_by_organization(organization_id)?)
    }

    // ── Tickets ──────────────────────────────────────────────────────────

    pub fn create_ticket(&self, principal: &Principal, input: CreateTicket) -> Result<Ticket, GatewayError> {
        let mut refs = ResourceRefs::new(ResourceRef::Project(input.project_id));
        refs.status = input.status;
        refs.assignee = input.assignee_id;
        refs.epic = input.epic_id;
        let ctx = self.enforce(principal, Operation::TicketCreate, refs)?;

        let status = ctx
            .status
            .clone()
            .ok_or_else(|| GatewayError::validation("ticket needs a starting status"))?;
        let ticket = self.store.insert_ticket(NewTicket {
            id: TicketId::new(),
            project_id: input.project_id,
            title: validate_title(&input.title)?,
            status,
            assignee_id: input.assignee_id,
            reporter_id: principal.id,
            epic_id: input.epic_id,
        })?;
        self.record(&ctx, ticket.id, &ticket);
        Ok(ticket)
    }

    pub fn rename_ticket(
        &self,
        principal: &Principal,
        id: TicketId,
        title: &str,
    ) -> Result<Ticket, GatewayError> {
        let ctx = self.enforce(principal, Operation::TicketUpdate, ResourceRef::Ticket(id))?;
        let ticket = self.store.set_ticket_title(id, validate_title(title)?)?;
        self.record(&ctx, id, &ticket);
        Ok(ticket)
    }

    /// Set or clear the assignee.
    pub fn assign_ticket(
        &self,
        principal: &Principal,
        id: TicketId,
        assignee_id: Option<UserId>,
    ) -> Result<Ticket, GatewayError> {
        let mut refs = ResourceRefs::new(ResourceRef::Ticket(id));
        refs.assignee = assignee_id;
        let ctx = self.enforce(principal, Operation::TicketUpdate, refs)?;
        let ticket = self.store.set_ticket_assignee(id, assignee_id)?;
        self.record(&ctx, id, &ticket);
        Ok(ticket)
    }

    /// Link a ticket to an epic of its organization, or unlink it with `None`.
    pub fn link_ticket_epic(
        &self,
        principal: &Principal,
        id: TicketId,
        epic_id: Option<EpicId>,
    ) -> Result<Ticket, GatewayError> {
        let mut refs = ResourceRefs::new(ResourceRef::Ticket(id));
        refs.epic = epic_id;
        let ctx = self.enforce(principal, Operation::TicketUpdate, refs)?;
        let ticket = self.store.set_ticket_epic(id, epic_id)?;
        self.record(&ctx, id, &ticket);
        Ok(ticket)
    }

    /// Re-applying the current status succeeds without writing.
    pub fn change_ticket_status(
        &self,
        principal: &Principal,
        id: TicketId,
        status: &str,
    ) -> Result<Ticket, GatewayError> {
        let refs = ResourceRefs::new(ResourceRef::Ticket(id)).status(status);
        let ctx = self.enforce(principal, Operation::TicketChangeStatus, refs)?;
        match ctx.status_change.clone() {
            Some(StatusChange::Changed { to, .. }) => {
                let ticket = self.store.set_ticket_status(id, to)?;
                self.record(&ctx, id, &ticket);
                Ok(ticket)
            }
            Some(StatusChange::Unchanged) | None => Ok(require(self.store.get_ticket(id))?),
        }
    }

    /// Move a ticket to another project.
    ///
    /// The status is never rewritten implicitly: without `status` the move
    /// fails unless the current status exists in the destination workflow.
    /// With `status` the ticket lands in that status, checked against the
    /// destination workflow.
    pub fn move_ticket(
        &self,
        principal: &Principal,
        id: TicketId,
        destination: ProjectId,
        status: Option<&str>,
    ) -> Result<Ticket, GatewayError> {
        let mut refs = ResourceRefs::new(ResourceRef::Ticket(id)).destination(destination);
        refs.status = status.map(str::to_string);
        let ctx = self.enforce(principal, Operation::TicketMove, refs)?;
        let current = require(self.store.get_ticket(id))?;
        let status = ctx.status.clone().unwrap_or_else(|| current.status.clone());
        if current.project_id == destination && current.status == status {
            return Ok(current);
        }
        let ticket = self.store.set_ticket_project(id, destination, status)?;
        self.record(&ctx, id, &ticket);
        Ok(ticket)
    }

    pub fn delete_ticket(&self, principal: &Principal, id: TicketId) -> Result<(), GatewayError> {
        let ctx = self.enforce(principal, Operation::TicketDelete, ResourceRef::Ticket(id))?;
        let ticket = require(self.store.get_ticket(id))?;
        self.store.delete_ticket(id)?;
        self.record(&ctx, id, &ticket);
        Ok(())
    }

    pub fn get_ticket(&self, principal: &Principal, id: TicketId) -> Result<Ticket, GatewayError> {
        self.enforce(principal, Operation::TicketRead, ResourceRef::Ticket(id))?;
        Ok(require(self.store.get_ticket(id))?)
    }

    // ── Epics ────────────────────────────────────────────────────────────

    pub fn create_epic(
        &self,
        principal: &Principal,
        organization_id: OrganizationId,
        title: &str,
    ) -> Result<Epic, GatewayError> {
        let ctx = self.enforce(
            principal,
            Operation::EpicCreate,
            ResourceRef::Organization(organization_id),
        )?;
        let epic = self.store.insert_epic(NewEpic::new(organization_id, title)?)?;
        self.record(&ctx, epic.id, &epic);
        Ok(epic)
    }

    /// Tickets linked to the epic are unlinked, not deleted.
    pub fn delete_epic(&self, principal: &Principal, id: EpicId) -> Result<(), GatewayError> {
        let ctx = self.enforce(principal, Operation::EpicDelete, ResourceRef::Epic(id))?;
        let epic = require(self.store.get_epic(id))?;
        self.store.delete_epic(id)?;
        self.record(&ctx, id, &epic);
        Ok(())
    }

    // ── Comments ─────────────────────────────────────────────────────────

    pub fn add_comment(
        &self,
        principal: &Principal,
        ticket_id: TicketId,
        body: &str,
    ) -> Result<Comment, GatewayError> {
        let ctx = self.enforce(principal, Operation::CommentCreate, ResourceRef::Ticket(ticket_id))?;
        let comment = self
            .store
            .insert_comment(NewComment::new(ticket_id, principal.id, body)?)?;
        self.record(&ctx, comment.id, &comment);
        Ok(comment)
    }

    /// Only the author may edit.
    pub fn edit_comment(
        &self,
        principal: &Principal,
        id: CommentId,
        body: &str,
    ) -> Result<Comment, GatewayError> {
        let ctx = self.enforce(principal, Operation::CommentUpdate, ResourceRef::Comment(id))?;
        let comment = self.store.set_comment_body(id, validate_body(body)?)?;
        self.record(&ctx, id, &comment);
        Ok(comment)
    }

    /// The author or an admin may delete.
    pub fn delete_comment(&self, principal: &Principal, id: CommentId) -> Result<(), GatewayError> {
        let ctx = self.enforce(principal, Operation::CommentDelete, ResourceRef::Comment(id))?;
        let comment = require(self.store.get_comment(id))?;
        self.store.delete_comment(id)?;
        self.record(&ctx, id, &comment);
        Ok(())
    }

    pub fn get_comment(&self, principal: &Principal, id: CommentId) -> Result<Comment, GatewayError> {
        self.enforce(principal, Operation::CommentRead, ResourceRef::Comment(id))?;
        Ok(require(self.store.get_comment(id))?)
    }

    // ── Introspection ────────────────────────────────────────────────────

    /// Explain the authorization decision for `operation` on `target`
    /// without performing it. State checks (statuses, archival) are not
    /// part of the explanation. A target that does not exist is explained
    /// the same way as one hidden by tenant scope.
    pub fn explain(
        &self,
        principal: &Principal,
        operation: Operation,
        target: ResourceRef,
    ) -> Result<AuthorizationExplanation, GatewayError> {
        match resolve_resource(self.store.as_ref(), target) {
            Ok(resource) => Ok(explain(principal, operation, &resource)),
            Err(GatewayError::Authz(AuthzError::NotFound)) => {
                let decision = check_grant(GrantTable::standard(), principal, operation)
                    .and(Err(AuthzError::NotFound));
                Ok(explain_decision(principal, operation, decision))
            }
            Err(err) => Err(err),
        }
    }
}
