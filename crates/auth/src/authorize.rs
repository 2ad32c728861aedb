use serde::Serialize;
use thiserror::Error;

use forgetrack_core::{OrganizationId, UserId};

use crate::scope::{ResolvedResource, check_scope};
use crate::{GrantTable, Operation, Principal, Role};

/// Why an in-scope or visible request was refused.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    /// The resource sits in another organization's project hierarchy.
    TenantMismatch,
    /// An ownership rule restricts the operation to the resource's author.
    NotOwner,
    /// The principal has been deactivated.
    Inactive,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("not found")]
    NotFound,

    #[error("forbidden: {message}")]
    Forbidden { reason: DenialKind, message: String },

    #[error("role '{role}' may not perform '{operation}'")]
    InsufficientRole { role: Role, operation: Operation },
}

impl AuthzError {
    /// Short machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            AuthzError::NotFound => "not_found",
            AuthzError::Forbidden {
                reason: DenialKind::TenantMismatch,
                ..
            } => "tenant_mismatch",
            AuthzError::Forbidden {
                reason: DenialKind::NotOwner,
                ..
            } => "not_owner",
            AuthzError::Forbidden {
                reason: DenialKind::Inactive,
                ..
            } => "inactive",
            AuthzError::InsufficientRole { .. } => "insufficient_role",
        }
    }
}

/// Ownership restriction layered on top of a role grant.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnershipRule {
    /// Only the author may act.
    AuthorOnly,
    /// The author, or an admin/super-admin, may act.
    AuthorOrAdmin,
}

impl OwnershipRule {
    pub fn for_operation(operation: Operation) -> Option<Self> {
        match operation {
            Operation::CommentUpdate => Some(OwnershipRule::AuthorOnly),
            Operation::CommentDelete => Some(OwnershipRule::AuthorOrAdmin),
            _ => None,
        }
    }

    pub fn permits(&self, principal: &Principal, author_id: Option<UserId>) -> bool {
        let is_author = author_id == Some(principal.id);
        match self {
            OwnershipRule::AuthorOnly => is_author,
            OwnershipRule::AuthorOrAdmin => {
                is_author || matches!(principal.role, Role::Admin | Role::SuperAdmin)
            }
        }
    }
}

/// Authorize `operation` on `resource` with the standard grant table.
///
/// Checks run in a fixed order and stop at the first failure: role grant,
/// tenant scope, ownership.
pub fn authorize(
    principal: &Principal,
    operation: Operation,
    resource: &ResolvedResource,
) -> Result<(), AuthzError> {
    authorize_with(GrantTable::standard(), principal, operation, resource)
}

pub fn authorize_with(
    table: &GrantTable,
    principal: &Principal,
    operation: Operation,
    resource: &ResolvedResource,
) -> Result<(), AuthzError> {
    check_grant(table, principal, operation)?;
    check_scope(principal, resource)?;

    if let Some(rule) = OwnershipRule::for_operation(operation) {
        if !rule.permits(principal, resource.author_id) {
            let message = match rule {
                OwnershipRule::AuthorOnly => {
                    format!("only the author may perform '{operation}'")
                }
                OwnershipRule::AuthorOrAdmin => {
                    format!("only the author or an admin may perform '{operation}'")
                }
            };
            return Err(AuthzError::Forbidden {
                reason: DenialKind::NotOwner,
                message,
            });
        }
    }

    Ok(())
}

/// The resource-independent half of [`authorize_with`]: the principal is
/// active and its role is granted `operation`.
///
/// Callers that must look the target up run this first, so the answer for
/// an unauthorized role never depends on whether the target exists.
pub fn check_grant(
    table: &GrantTable,
    principal: &Principal,
    operation: Operation,
) -> Result<(), AuthzError> {
    if !principal.active {
        return Err(AuthzError::Forbidden {
            reason: DenialKind::Inactive,
            message: "user is deactivated".to_string(),
        });
    }

    if !table.is_allowed(principal.role, operation) {
        return Err(AuthzError::InsufficientRole {
            role: principal.role,
            operation,
        });
    }

    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Detailed explanation of an authorization decision.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationExplanation {
    pub operation: Operation,
    pub granted: bool,
    pub reason: String,
    pub principal: PrincipalState,
    /// Roles the grant table allows for this operation.
    pub granting_roles: Vec<Role>,
    pub ownership_rule: Option<OwnershipRule>,
    pub denial_reason: Option<DenialReason>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrincipalState {
    pub principal_id: UserId,
    pub organization_id: Option<OrganizationId>,
    pub role: Role,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DenialReason {
    pub code: &'static str,
    pub message: String,
    pub suggestions: Vec<String>,
}

/// Explain why `authorize` would allow or deny this request.
///
/// A concealed cross-tenant lookup is explained as not-found, exactly as the
/// caller would see it.
pub fn explain(
    principal: &Principal,
    operation: Operation,
    resource: &ResolvedResource,
) -> AuthorizationExplanation {
    let decision = authorize_with(GrantTable::standard(), principal, operation, resource);
    explain_decision(principal, operation, decision)
}

/// Explanation for a decision the caller has already made, e.g. a target
/// that could not be resolved and is reported as not found.
pub fn explain_decision(
    principal: &Principal,
    operation: Operation,
    decision: Result<(), AuthzError>,
) -> AuthorizationExplanation {
    let granting_roles = GrantTable::standard().roles_for(operation).to_vec();

    let state = PrincipalState {
        principal_id: principal.id,
        organization_id: principal.organization_id,
        role: principal.role,
        active: principal.active,
    };

    let (granted, reason, denial_reason) = match decision {
        Ok(()) => (
            true,
            format!("role '{}' is granted '{operation}'", principal.role),
            None,
        ),
        Err(err) => {
            let suggestions = suggestions_for(&err, &granting_roles);
            (
                false,
                err.to_string(),
                Some(DenialReason {
                    code: err.code(),
                    message: err.to_string(),
                    suggestions,
                }),
            )
        }
    };

    AuthorizationExplanation {
        operation,
        granted,
        reason,
        principal: state,
        granting_roles,
        ownership_rule: OwnershipRule::for_operation(operation),
        denial_reason,
    }
}

fn suggestions_for(err: &AuthzError, granting_roles: &[Role]) -> Vec<String> {
    match err {
        AuthzError::InsufficientRole { operation, .. } if granting_roles.is_empty() => {
            vec![format!("'{operation}' is not granted to any role")]
        }
        AuthzError::InsufficientRole { .. } => {
            let roles: Vec<&str> = granting_roles.iter().map(Role::as_str).collect();
            vec![format!("assign one of: {}", roles.join(", "))]
        }
        AuthzError::Forbidden {
            reason: DenialKind::NotOwner,
            ..
        } => vec!["ask the author to perform this change".to_string()],
        AuthzError::Forbidden {
            reason: DenialKind::Inactive,
            ..
        } => vec!["reactivate the user".to_string()],
        AuthzError::Forbidden { .. } | AuthzError::NotFound => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResourceKind;

    fn member(role: Role, org: OrganizationId) -> Principal {
        Principal {
            id: UserId::new(),
            organization_id: Some(org),
            role,
            active: true,
        }
    }

    fn comment(org: OrganizationId, author: UserId) -> ResolvedResource {
        ResolvedResource::owned_by(ResourceKind::Comment, org).with_author(author)
    }

    #[test]
    fn writer_cannot_delete_someone_elses_comment() {
        let org = OrganizationId::new();
        let writer = member(Role::WriteAccess, org);
        let err = authorize(&writer, Operation::CommentDelete, &comment(org, UserId::new()))
            .unwrap_err();
        assert!(matches!(
            err,
            AuthzError::Forbidden {
                reason: DenialKind::NotOwner,
                ..
            }
        ));
    }

    #[test]
    fn writer_can_delete_own_comment() {
        let org = OrganizationId::new();
        let writer = member(Role::WriteAccess, org);
        authorize(&writer, Operation::CommentDelete, &comment(org, writer.id)).unwrap();
    }

    #[test]
    fn admin_can_delete_but_not_edit_others_comments() {
        let org = OrganizationId::new();
        let admin = member(Role::Admin, org);
        let c = comment(org, UserId::new());
        authorize(&admin, Operation::CommentDelete, &c).unwrap();
        assert!(matches!(
            authorize(&admin, Operation::CommentUpdate, &c),
            Err(AuthzError::Forbidden {
                reason: DenialKind::NotOwner,
                ..
            })
        ));
    }

    #[test]
    fn project_manager_cannot_delete_others_comments() {
        let org = OrganizationId::new();
        let pm = member(Role::ProjectManager, org);
        assert!(authorize(&pm, Operation::CommentDelete, &comment(org, UserId::new())).is_err());
    }

    #[test]
    fn role_check_runs_before_scope_check() {
        let reader = member(Role::ReadAccess, OrganizationId::new());
        let foreign = ResolvedResource::owned_by(ResourceKind::Ticket, OrganizationId::new());
        assert_eq!(
            authorize(&reader, Operation::TicketDelete, &foreign),
            Err(AuthzError::InsufficientRole {
                role: Role::ReadAccess,
                operation: Operation::TicketDelete,
            })
        );
    }

    #[test]
    fn scope_check_runs_before_ownership_check() {
        let writer = member(Role::WriteAccess, OrganizationId::new());
        let foreign = comment(OrganizationId::new(), writer.id);
        assert!(matches!(
            authorize(&writer, Operation::CommentUpdate, &foreign),
            Err(AuthzError::Forbidden {
                reason: DenialKind::TenantMismatch,
                ..
            })
        ));
    }

    #[test]
    fn inactive_principal_is_refused() {
        let org = OrganizationId::new();
        let mut admin = member(Role::Admin, org);
        admin.active = false;
        let res = ResolvedResource::owned_by(ResourceKind::Project, org);
        assert_eq!(
            authorize(&admin, Operation::ProjectRead, &res).unwrap_err().code(),
            "inactive"
        );
    }

    #[test]
    fn grant_check_agrees_with_full_check_on_role_denials() {
        let org = OrganizationId::new();
        let reader = member(Role::ReadAccess, org);
        let foreign = ResolvedResource::owned_by(ResourceKind::Workflow, OrganizationId::new());

        let grant = check_grant(GrantTable::standard(), &reader, Operation::WorkflowDelete);
        assert_eq!(grant, authorize(&reader, Operation::WorkflowDelete, &foreign));
        assert!(check_grant(GrantTable::standard(), &reader, Operation::WorkflowRead).is_ok());
    }

    #[test]
    fn platform_operations_are_super_admin_only() {
        let sa = Principal {
            id: UserId::new(),
            organization_id: None,
            role: Role::SuperAdmin,
            active: true,
        };
        authorize(&sa, Operation::OrganizationCreate, &ResolvedResource::platform()).unwrap();

        let admin = member(Role::Admin, OrganizationId::new());
        assert!(matches!(
            authorize(&admin, Operation::OrganizationCreate, &ResolvedResource::platform()),
            Err(AuthzError::InsufficientRole { .. })
        ));
    }

    #[test]
    fn explanation_lists_granting_roles_on_denial() {
        let org = OrganizationId::new();
        let pm = member(Role::ProjectManager, org);
        let ticket = ResolvedResource::owned_by(ResourceKind::Ticket, org);
        let explanation = explain(&pm, Operation::TicketDelete, &ticket);

        assert!(!explanation.granted);
        assert_eq!(explanation.granting_roles, vec![Role::SuperAdmin, Role::Admin]);
        let denial = explanation.denial_reason.unwrap();
        assert_eq!(denial.code, "insufficient_role");
        assert_eq!(denial.suggestions, vec!["assign one of: super_admin, admin"]);
    }

    #[test]
    fn explanation_serializes() {
        let org = OrganizationId::new();
        let writer = member(Role::WriteAccess, org);
        let explanation = explain(&writer, Operation::CommentUpdate, &comment(org, writer.id));
        let json = serde_json::to_value(&explanation).unwrap();
        assert_eq!(json["granted"], true);
        assert_eq!(json["operation"], "comment.update");
        assert_eq!(json["ownership_rule"], "author_only");
    }
}
