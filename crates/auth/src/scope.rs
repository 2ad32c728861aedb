//! Tenant scope checks.
//!
//! Walking reference chains to find the owning organization needs storage and
//! lives in the gateway; this module only decides visibility once the owner
//! is known.

use serde::Serialize;

use forgetrack_core::{OrganizationId, UserId};

use crate::{AuthzError, DenialKind, Principal, ResourceKind};

/// Facts about a target resource needed for an authorization decision.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedResource {
    pub kind: ResourceKind,
    /// Owning organization; `None` for platform-level targets.
    pub organization_id: Option<OrganizationId>,
    /// Author of the resource, for kinds that carry one (comments).
    pub author_id: Option<UserId>,
}

impl ResolvedResource {
    pub fn platform() -> Self {
        Self {
            kind: ResourceKind::Platform,
            organization_id: None,
            author_id: None,
        }
    }

    pub fn owned_by(kind: ResourceKind, organization_id: OrganizationId) -> Self {
        Self {
            kind,
            organization_id: Some(organization_id),
            author_id: None,
        }
    }

    pub fn with_author(mut self, author_id: UserId) -> Self {
        self.author_id = Some(author_id);
        self
    }
}

/// Super-admins see everything; everyone else only their own organization.
pub fn in_scope(principal: &Principal, owning_organization: Option<OrganizationId>) -> bool {
    if principal.is_super_admin() {
        return true;
    }
    match (principal.organization_id, owning_organization) {
        (Some(own), Some(owner)) => own == owner,
        _ => false,
    }
}

/// Scope check with the denial shape applied.
///
/// Identity-sensitive kinds (and platform targets) answer `NotFound`; kinds
/// reached through a project hierarchy answer `Forbidden` with a message.
pub fn check_scope(principal: &Principal, resource: &ResolvedResource) -> Result<(), AuthzError> {
    if in_scope(principal, resource.organization_id) {
        return Ok(());
    }
    if resource.kind.is_identity_sensitive() || resource.organization_id.is_none() {
        return Err(AuthzError::NotFound);
    }
    Err(AuthzError::Forbidden {
        reason: DenialKind::TenantMismatch,
        message: format!(
            "this {} belongs to another organization",
            resource.kind.as_str()
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;

    fn principal(role: Role, org: Option<OrganizationId>) -> Principal {
        Principal {
            id: UserId::new(),
            organization_id: org,
            role,
            active: true,
        }
    }

    #[test]
    fn super_admin_is_always_in_scope() {
        let sa = principal(Role::SuperAdmin, None);
        assert!(in_scope(&sa, Some(OrganizationId::new())));
        assert!(in_scope(&sa, None));
    }

    #[test]
    fn members_see_only_their_organization() {
        let org = OrganizationId::new();
        let p = principal(Role::Admin, Some(org));
        assert!(in_scope(&p, Some(org)));
        assert!(!in_scope(&p, Some(OrganizationId::new())));
        assert!(!in_scope(&p, None));
    }

    #[test]
    fn cross_tenant_workflow_is_not_found() {
        let p = principal(Role::Admin, Some(OrganizationId::new()));
        let wf = ResolvedResource::owned_by(ResourceKind::Workflow, OrganizationId::new());
        assert_eq!(check_scope(&p, &wf), Err(AuthzError::NotFound));
    }

    #[test]
    fn cross_tenant_ticket_is_forbidden() {
        let p = principal(Role::Admin, Some(OrganizationId::new()));
        let ticket = ResolvedResource::owned_by(ResourceKind::Ticket, OrganizationId::new());
        match check_scope(&p, &ticket) {
            Err(AuthzError::Forbidden { reason, message }) => {
                assert_eq!(reason, DenialKind::TenantMismatch);
                assert!(message.contains("ticket"));
            }
            other => panic!("expected Forbidden, got {other:?}"),
        }
    }
}
