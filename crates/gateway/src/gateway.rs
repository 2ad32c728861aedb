use serde::Serialize;

use forgetrack_auth::{
    GrantTable, Operation, Principal, ResolvedResource, ResourceKind, Role, authorize_with,
    check_grant, check_scope, ensure_assignable,
};
use forgetrack_core::{EpicId, OrganizationId, ProjectId, TicketId, UserId, WorkflowId};
use forgetrack_tracking::{Directory, Project, require};
use forgetrack_workflow::{
    StatusChange, StatusLabel, Workflow, WorkflowError, resolve_create_status, validate_move,
    validate_status_change,
};

use crate::GatewayError;
use crate::resolver::{ResourceRef, resolve_resource, ticket_chain};

/// Everything an operation refers to besides its target.
///
/// Only the fields meaningful to the operation are read; the rest are
/// ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRefs {
    pub target: ResourceRef,
    /// Requested ticket status (create, change-status).
    pub status: Option<String>,
    /// Destination project of a ticket move.
    pub destination: Option<ProjectId>,
    /// Assignee being set on a ticket.
    pub assignee: Option<UserId>,
    /// Epic a ticket is being linked to.
    pub epic: Option<EpicId>,
    /// Workflow a new project should be governed by.
    pub workflow: Option<WorkflowId>,
    /// Role being given to a user (create, role change).
    pub role: Option<Role>,
}

impl ResourceRefs {
    pub fn new(target: ResourceRef) -> Self {
        Self {
            target,
            status: None,
            destination: None,
            assignee: None,
            epic: None,
            workflow: None,
            role: None,
        }
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn destination(mut self, project_id: ProjectId) -> Self {
        self.destination = Some(project_id);
        self
    }

    pub fn assignee(mut self, user_id: UserId) -> Self {
        self.assignee = Some(user_id);
        self
    }

    pub fn epic(mut self, epic_id: EpicId) -> Self {
        self.epic = Some(epic_id);
        self
    }

    pub fn workflow(mut self, workflow_id: WorkflowId) -> Self {
        self.workflow = Some(workflow_id);
        self
    }

    pub fn role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }
}

impl From<ResourceRef> for ResourceRefs {
    fn from(target: ResourceRef) -> Self {
        Self::new(target)
    }
}

/// Result of a successful [`AuthorizationGateway::enforce`].
///
/// Persistence uses the resolved values here instead of re-deriving them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizedContext {
    pub principal_id: UserId,
    pub operation: Operation,
    /// Owning organization of the target; `None` for platform targets.
    pub organization_id: Option<OrganizationId>,
    /// Status a new ticket starts in, or the status a change lands on.
    pub status: Option<StatusLabel>,
    #[serde(skip)]
    pub status_change: Option<StatusChange>,
    /// Workflow governing the ticket (or the new project).
    pub workflow_id: Option<WorkflowId>,
}

impl AuthorizedContext {
    fn new(principal: &Principal, operation: Operation, organization_id: Option<OrganizationId>) -> Self {
        Self {
            principal_id: principal.id,
            operation,
            organization_id,
            status: None,
            status_change: None,
            workflow_id: None,
        }
    }
}

/// Mandatory decision point in front of every governed operation.
pub struct AuthorizationGateway<D> {
    directory: D,
    grants: GrantTable,
}

impl<D> AuthorizationGateway<D>
where
    D: Directory,
{
    pub fn new(directory: D) -> Self {
        Self::with_grants(directory, GrantTable::standard().clone())
    }

    pub fn with_grants(directory: D, grants: GrantTable) -> Self {
        Self { directory, grants }
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    /// Decide whether `principal` may perform `operation` on `refs`.
    ///
    /// The role grant is checked before the target is looked up, then scope
    /// and ownership; ticket and workflow state checks only run once the
    /// principal is known to be allowed.
    pub fn enforce(
        &self,
        principal: &Principal,
        operation: Operation,
        refs: &ResourceRefs,
    ) -> Result<AuthorizedContext, GatewayError> {
        let result = self.evaluate(principal, operation, refs);
        match &result {
            Ok(ctx) => tracing::debug!(
                principal_id = %principal.id,
                operation = %operation,
                organization_id = ?ctx.organization_id,
                "operation authorized"
            ),
            Err(err) => tracing::info!(
                principal_id = %principal.id,
                operation = %operation,
                error = %err,
                "operation denied"
            ),
        }
        result
    }

    fn evaluate(
        &self,
        principal: &Principal,
        operation: Operation,
        refs: &ResourceRefs,
    ) -> Result<AuthorizedContext, GatewayError> {
        let expected = operation.target_kind();
        if refs.target.kind() != expected {
            return Err(GatewayError::validation(format!(
                "'{operation}' expects a {} target, got {}",
                expected.as_str(),
                refs.target.kind().as_str()
            )));
        }

        check_grant(&self.grants, principal, operation)?;
        let resource = resolve_resource(&self.directory, refs.target)?;
        authorize_with(&self.grants, principal, operation, &resource)?;

        let mut ctx = AuthorizedContext::new(principal, operation, resource.organization_id);

        match (operation, refs.target) {
            (Operation::TicketCreate, ResourceRef::Project(project_id)) => {
                let project = require(self.directory.get_project(project_id))?;
                project.ensure_active()?;
                let workflow = self.governing_workflow(&project)?;
                let status = resolve_create_status(workflow.statuses(), refs.status.as_deref())?;
                self.check_links(principal, refs, project.organization_id)?;
                ctx.status = Some(status);
                ctx.workflow_id = Some(workflow.id);
            }
            (Operation::TicketUpdate, ResourceRef::Ticket(ticket_id)) => {
                if refs.assignee.is_some() || refs.epic.is_some() {
                    let (_, project) = ticket_chain(&self.directory, ticket_id)?;
                    self.check_links(principal, refs, project.organization_id)?;
                }
            }
            (Operation::TicketChangeStatus, ResourceRef::Ticket(ticket_id)) => {
                let requested = refs
                    .status
                    .as_deref()
                    .ok_or_else(|| GatewayError::validation("a target status is required"))?;
                let (ticket, project) = ticket_chain(&self.directory, ticket_id)?;
                let workflow = self.governing_workflow(&project)?;
                let change = validate_status_change(workflow.statuses(), &ticket.status, requested)?;
                ctx.status = Some(match &change {
                    StatusChange::Unchanged => ticket.status,
                    StatusChange::Changed { to, .. } => to.clone(),
                });
                ctx.status_change = Some(change);
                ctx.workflow_id = Some(workflow.id);
            }
            (Operation::TicketMove, ResourceRef::Ticket(ticket_id)) => {
                let destination = refs
                    .destination
                    .ok_or_else(|| GatewayError::validation("a destination project is required"))?;
                let (workflow, status) =
                    self.check_move(principal, ticket_id, destination, refs.status.as_deref())?;
                ctx.status = Some(status);
                ctx.workflow_id = Some(workflow.id);
            }
            (Operation::ProjectCreate, ResourceRef::Organization(organization_id)) => {
                let workflow = match refs.workflow {
                    Some(id) => self.check_workflow_reference(principal, id, organization_id)?,
                    None => self
                        .directory
                        .get_default_workflow(organization_id)?
                        .ok_or_else(|| {
                            GatewayError::validation(
                                "organization has no default workflow; create one first",
                            )
                        })?,
                };
                ctx.workflow_id = Some(workflow.id);
            }
            (Operation::WorkflowCreateDefault, ResourceRef::Organization(organization_id)) => {
                if self.directory.get_default_workflow(organization_id)?.is_some() {
                    return Err(WorkflowError::DefaultWorkflowExists(organization_id).into());
                }
            }
            (Operation::UserCreate | Operation::UserUpdate, _) => {
                if let Some(role) = refs.role {
                    ensure_assignable(principal.role, role)?;
                }
            }
            _ => {}
        }

        Ok(ctx)
    }

    /// Status a ticket created in `project_id` would start in.
    pub fn resolve_create_status(
        &self,
        project_id: ProjectId,
        requested: Option<&str>,
    ) -> Result<StatusLabel, GatewayError> {
        let project = require(self.directory.get_project(project_id))?;
        let workflow = self.governing_workflow(&project)?;
        Ok(resolve_create_status(workflow.statuses(), requested)?)
    }

    /// Check that a ticket may move to `destination` without a status change.
    pub fn validate_move(&self, ticket_id: TicketId, destination: ProjectId) -> Result<(), GatewayError> {
        let (ticket, _) = ticket_chain(&self.directory, ticket_id)?;
        let project = require(self.directory.get_project(destination))?;
        let workflow = self.governing_workflow(&project)?;
        Ok(validate_move(&ticket.status, workflow.statuses())?)
    }

    /// Destination checks for a move. Returns the destination workflow and
    /// the status the ticket will hold there.
    ///
    /// Without `requested` the current status must exist in the destination
    /// workflow. With it, the ticket's status is set explicitly as part of
    /// the move and `requested` is checked against the destination instead.
    fn check_move(
        &self,
        principal: &Principal,
        ticket_id: TicketId,
        destination: ProjectId,
        requested: Option<&str>,
    ) -> Result<(Workflow, StatusLabel), GatewayError> {
        let (ticket, source) = ticket_chain(&self.directory, ticket_id)?;
        let target = require(self.directory.get_project(destination))?;
        check_scope(
            principal,
            &ResolvedResource::owned_by(ResourceKind::Project, target.organization_id),
        )?;
        if target.organization_id != source.organization_id {
            return Err(GatewayError::validation(
                "tickets cannot move between organizations",
            ));
        }
        if target.id != source.id {
            target.ensure_active()?;
        }
        let workflow = self.governing_workflow(&target)?;
        let status = match requested {
            Some(status) => resolve_create_status(workflow.statuses(), Some(status))?,
            None => {
                validate_move(&ticket.status, workflow.statuses())?;
                ticket.status
            }
        };
        Ok((workflow, status))
    }

    fn governing_workflow(&self, project: &Project) -> Result<Workflow, GatewayError> {
        self.directory.get_workflow(project.workflow_id)?.ok_or_else(|| {
            GatewayError::Storage(format!(
                "workflow {} governing project {} is missing",
                project.workflow_id, project.id
            ))
        })
    }

    /// Assignee and epic references on a ticket.
    ///
    /// An assignee must be a member of the ticket's organization; naming a
    /// user from elsewhere reads as if the user did not exist, except for
    /// super-admins. An epic must always share the ticket's organization.
    fn check_links(
        &self,
        principal: &Principal,
        refs: &ResourceRefs,
        organization_id: OrganizationId,
    ) -> Result<(), GatewayError> {
        if let Some(assignee) = refs.assignee {
            let user = require(self.directory.get_user(assignee))?;
            if user.organization_id != Some(organization_id) && !principal.is_super_admin() {
                return Err(GatewayError::not_found());
            }
        }
        if let Some(epic_id) = refs.epic {
            let epic = require(self.directory.get_epic(epic_id))?;
            if epic.organization_id != organization_id {
                if principal.is_super_admin() {
                    return Err(GatewayError::validation(
                        "epic belongs to a different organization than the ticket",
                    ));
                }
                return Err(GatewayError::not_found());
            }
        }
        Ok(())
    }

    fn check_workflow_reference(
        &self,
        principal: &Principal,
        workflow_id: WorkflowId,
        organization_id: OrganizationId,
    ) -> Result<Workflow, GatewayError> {
        let workflow = require(self.directory.get_workflow(workflow_id))?;
        if workflow.organization_id == organization_id {
            return Ok(workflow);
        }
        if principal.is_super_admin() {
            return Err(GatewayError::validation(
                "workflow belongs to a different organization than the project",
            ));
        }
        Err(GatewayError::not_found())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forgetrack_auth::{AuthzError, DenialKind};
    use forgetrack_infra::InMemoryStore;
    use forgetrack_infra::fixtures::Seeded;
    use forgetrack_tracking::TrackingStore;

    fn setup() -> (AuthorizationGateway<InMemoryStore>, Seeded) {
        let store = InMemoryStore::new();
        let seeded = Seeded::organization(&store, "Acme");
        (AuthorizationGateway::new(store), seeded)
    }

    #[test]
    fn create_defaults_to_first_status() {
        let (gateway, acme) = setup();
        let store = gateway.directory();
        let writer = acme.user(store, Role::WriteAccess).to_principal();
        let project = acme.project(store, "Core");

        let ctx = gateway
            .enforce(&writer, Operation::TicketCreate, &ResourceRef::Project(project.id).into())
            .unwrap();
        assert_eq!(ctx.status.unwrap().as_str(), "TODO");
        assert_eq!(ctx.organization_id, Some(acme.organization.id));
        assert_eq!(ctx.workflow_id, Some(project.workflow_id));
    }

    #[test]
    fn create_with_unknown_status_lists_allowed() {
        let (gateway, acme) = setup();
        let store = gateway.directory();
        let writer = acme.user(store, Role::WriteAccess).to_principal();
        let project = acme.project(store, "Core");

        let err = gateway
            .enforce(
                &writer,
                Operation::TicketCreate,
                &ResourceRefs::new(ResourceRef::Project(project.id)).status("BLOCKED"),
            )
            .unwrap_err();
        let GatewayError::Workflow(WorkflowError::InvalidStatus { status, allowed }) = err else {
            panic!("unexpected error: {err:?}");
        };
        assert_eq!(status, "BLOCKED");
        assert_eq!(allowed.len(), 3);
    }

    #[test]
    fn read_access_cannot_create_tickets() {
        let (gateway, acme) = setup();
        let store = gateway.directory();
        let reader = acme.user(store, Role::ReadAccess).to_principal();
        let project = acme.project(store, "Core");

        let err = gateway
            .enforce(&reader, Operation::TicketCreate, &ResourceRef::Project(project.id).into())
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Authz(AuthzError::InsufficientRole { .. })
        ));
    }

    #[test]
    fn role_is_checked_before_status() {
        let (gateway, acme) = setup();
        let store = gateway.directory();
        let reader = acme.user(store, Role::ReadAccess).to_principal();
        let project = acme.project(store, "Core");

        let err = gateway
            .enforce(
                &reader,
                Operation::TicketCreate,
                &ResourceRefs::new(ResourceRef::Project(project.id)).status("NOPE"),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Authz(AuthzError::InsufficientRole { .. })
        ));
    }

    #[test]
    fn foreign_ticket_is_forbidden_foreign_workflow_is_not_found() {
        let (gateway, acme) = setup();
        let store = gateway.directory();
        let globex = Seeded::organization(store, "Globex");
        let reporter = globex.user(store, Role::WriteAccess);
        let project = globex.project(store, "Rockets");
        let ticket = globex.ticket(store, project.id, reporter.id);

        let outsider = acme.user(store, Role::Admin).to_principal();

        let err = gateway
            .enforce(&outsider, Operation::TicketRead, &ResourceRef::Ticket(ticket.id).into())
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Authz(AuthzError::Forbidden {
                reason: DenialKind::TenantMismatch,
                ..
            })
        ));

        let err = gateway
            .enforce(
                &outsider,
                Operation::WorkflowRead,
                &ResourceRef::Workflow(globex.workflow.id).into(),
            )
            .unwrap_err();
        assert_eq!(err, GatewayError::not_found());
    }

    #[test]
    fn role_is_checked_before_the_target_is_looked_up() {
        let (gateway, acme) = setup();
        let store = gateway.directory();
        let globex = Seeded::organization(store, "Globex");
        let reader = acme.user(store, Role::ReadAccess).to_principal();

        let foreign = gateway
            .enforce(
                &reader,
                Operation::WorkflowDelete,
                &ResourceRef::Workflow(globex.workflow.id).into(),
            )
            .unwrap_err();
        let missing = gateway
            .enforce(
                &reader,
                Operation::WorkflowDelete,
                &ResourceRef::Workflow(WorkflowId::new()).into(),
            )
            .unwrap_err();
        assert_eq!(foreign, missing);
        assert!(matches!(
            missing,
            GatewayError::Authz(AuthzError::InsufficientRole { .. })
        ));
    }

    #[test]
    fn change_status_to_current_is_noop() {
        let (gateway, acme) = setup();
        let store = gateway.directory();
        let writer = acme.user(store, Role::WriteAccess);
        let project = acme.project(store, "Core");
        let ticket = acme.ticket(store, project.id, writer.id);

        let ctx = gateway
            .enforce(
                &writer.to_principal(),
                Operation::TicketChangeStatus,
                &ResourceRefs::new(ResourceRef::Ticket(ticket.id)).status("TODO"),
            )
            .unwrap();
        assert_eq!(ctx.status_change, Some(StatusChange::Unchanged));

        let ctx = gateway
            .enforce(
                &writer.to_principal(),
                Operation::TicketChangeStatus,
                &ResourceRefs::new(ResourceRef::Ticket(ticket.id)).status("DONE"),
            )
            .unwrap();
        assert!(matches!(ctx.status_change, Some(StatusChange::Changed { .. })));
    }

    #[test]
    fn change_status_requires_a_status() {
        let (gateway, acme) = setup();
        let store = gateway.directory();
        let writer = acme.user(store, Role::WriteAccess);
        let project = acme.project(store, "Core");
        let ticket = acme.ticket(store, project.id, writer.id);

        let err = gateway
            .enforce(
                &writer.to_principal(),
                Operation::TicketChangeStatus,
                &ResourceRef::Ticket(ticket.id).into(),
            )
            .unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
    }

    #[test]
    fn move_requires_status_in_destination() {
        let (gateway, acme) = setup();
        let store = gateway.directory();
        let manager = acme.user(store, Role::ProjectManager);
        let source = acme.project(store, "Core");
        let (destination, _) = acme.project_with_workflow(store, "Ops", &["OPEN", "CLOSED"]);
        let ticket = acme.ticket(store, source.id, manager.id);

        let err = gateway
            .enforce(
                &manager.to_principal(),
                Operation::TicketMove,
                &ResourceRefs::new(ResourceRef::Ticket(ticket.id)).destination(destination.id),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Workflow(WorkflowError::IncompatibleStatus { .. })
        ));
        assert!(gateway.validate_move(ticket.id, destination.id).is_err());

        let (compatible, _) = acme.project_with_workflow(store, "Support", &["NEW", "TODO"]);
        assert!(gateway.validate_move(ticket.id, compatible.id).is_ok());

        let ctx = gateway
            .enforce(
                &manager.to_principal(),
                Operation::TicketMove,
                &ResourceRefs::new(ResourceRef::Ticket(ticket.id))
                    .destination(destination.id)
                    .status("OPEN"),
            )
            .unwrap();
        assert_eq!(ctx.status.unwrap().as_str(), "OPEN");
    }

    #[test]
    fn archived_project_rejects_new_tickets() {
        let (gateway, acme) = setup();
        let store = gateway.directory();
        let writer = acme.user(store, Role::WriteAccess).to_principal();
        let project = acme.project(store, "Core");
        store.archive_project(project.id, chrono::Utc::now()).unwrap();

        let err = gateway
            .enforce(&writer, Operation::TicketCreate, &ResourceRef::Project(project.id).into())
            .unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
    }

    #[test]
    fn foreign_assignee_reads_as_missing() {
        let (gateway, acme) = setup();
        let store = gateway.directory();
        let globex = Seeded::organization(store, "Globex");
        let stranger = globex.user(store, Role::WriteAccess);
        let writer = acme.user(store, Role::WriteAccess).to_principal();
        let project = acme.project(store, "Core");

        let err = gateway
            .enforce(
                &writer,
                Operation::TicketCreate,
                &ResourceRefs::new(ResourceRef::Project(project.id)).assignee(stranger.id),
            )
            .unwrap_err();
        assert_eq!(err, GatewayError::not_found());

        let super_admin = Seeded::super_admin(store).to_principal();
        assert!(
            gateway
                .enforce(
                    &super_admin,
                    Operation::TicketCreate,
                    &ResourceRefs::new(ResourceRef::Project(project.id)).assignee(stranger.id),
                )
                .is_ok()
        );
    }

    #[test]
    fn project_workflow_must_share_organization() {
        let (gateway, acme) = setup();
        let store = gateway.directory();
        let globex = Seeded::organization(store, "Globex");
        let admin = acme.user(store, Role::Admin).to_principal();
        let refs = ResourceRefs::new(ResourceRef::Organization(acme.organization.id))
            .workflow(globex.workflow.id);

        let err = gateway.enforce(&admin, Operation::ProjectCreate, &refs).unwrap_err();
        assert_eq!(err, GatewayError::not_found());

        let super_admin = Seeded::super_admin(store).to_principal();
        let err = gateway
            .enforce(&super_admin, Operation::ProjectCreate, &refs)
            .unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
    }

    #[test]
    fn second_default_workflow_is_rejected() {
        let (gateway, acme) = setup();
        let store = gateway.directory();
        let admin = acme.user(store, Role::Admin).to_principal();

        let err = gateway
            .enforce(
                &admin,
                Operation::WorkflowCreateDefault,
                &ResourceRef::Organization(acme.organization.id).into(),
            )
            .unwrap_err();
        assert_eq!(
            err,
            GatewayError::Workflow(WorkflowError::DefaultWorkflowExists(acme.organization.id))
        );
    }

    #[test]
    fn admins_cannot_hand_out_super_admin() {
        let (gateway, acme) = setup();
        let store = gateway.directory();
        let admin = acme.user(store, Role::Admin).to_principal();

        let err = gateway
            .enforce(
                &admin,
                Operation::UserCreate,
                &ResourceRefs::new(ResourceRef::Organization(acme.organization.id))
                    .role(Role::SuperAdmin),
            )
            .unwrap_err();
        assert!(matches!(err, GatewayError::RoleAssignment(_)));
    }

    #[test]
    fn mismatched_target_kind_is_rejected() {
        let (gateway, acme) = setup();
        let store = gateway.directory();
        let admin = acme.user(store, Role::Admin).to_principal();

        let err = gateway
            .enforce(
                &admin,
                Operation::TicketRead,
                &ResourceRef::Organization(acme.organization.id).into(),
            )
            .unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
    }
}
