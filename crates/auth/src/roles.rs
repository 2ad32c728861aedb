use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of principal roles.
///
/// Authority between roles is not a single ranking: which roles may perform
/// an operation is decided per operation by the grant table in
/// [`crate::permissions`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    ProjectManager,
    WriteAccess,
    ReadAccess,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::SuperAdmin,
        Role::Admin,
        Role::ProjectManager,
        Role::WriteAccess,
        Role::ReadAccess,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::ProjectManager => "project_manager",
            Role::WriteAccess => "write_access",
            Role::ReadAccess => "read_access",
        }
    }

    pub fn is_super_admin(&self) -> bool {
        matches!(self, Role::SuperAdmin)
    }

    /// Seniority used only to stop privilege escalation on role assignment.
    fn seniority(&self) -> u8 {
        match self {
            Role::SuperAdmin => 4,
            Role::Admin => 3,
            Role::ProjectManager => 2,
            Role::WriteAccess => 1,
            Role::ReadAccess => 0,
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoleAssignmentError {
    #[error("the super_admin role cannot be assigned")]
    SuperAdminNotAssignable,

    #[error("role '{actor}' cannot grant the more privileged role '{target}'")]
    Escalation { actor: Role, target: Role },
}

/// Check that `actor` may give a user the `target` role.
///
/// Super-admin is never assignable through ordinary mutations, whoever the
/// actor is. Otherwise an actor cannot hand out more authority than it holds.
pub fn ensure_assignable(actor: Role, target: Role) -> Result<(), RoleAssignmentError> {
    if target.is_super_admin() {
        return Err(RoleAssignmentError::SuperAdminNotAssignable);
    }
    if target.seniority() > actor.seniority() {
        return Err(RoleAssignmentError::Escalation { actor, target });
    }
    Ok(())
}
