//! `forgetrack-auth` — pure authorization boundary.
//!
//! Roles, the per-operation grant table, tenant scope checks and the
//! permission evaluator. This crate is intentionally decoupled from HTTP and
//! storage: callers hand it an already-resolved principal and resource facts.

pub mod authorize;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod scope;

pub use authorize::{
    AuthorizationExplanation, AuthzError, DenialKind, OwnershipRule, authorize, authorize_with,
    check_grant, explain, explain_decision,
};
pub use permissions::{GrantTable, Operation, ResourceKind, STANDARD_GRANTS, is_allowed};
pub use principal::{AuthError, Principal, PrincipalResolver};
pub use roles::{Role, RoleAssignmentError, UnknownRole, ensure_assignable};
pub use scope::{ResolvedResource, check_scope, in_scope};
