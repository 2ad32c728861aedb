use serde::{Deserialize, Serialize};
use thiserror::Error;

use forgetrack_core::{OrganizationId, UserId};

use crate::Role;

/// A resolved, authenticated actor.
///
/// Role and active flag are read from storage whenever a credential is
/// resolved, so role changes and deactivation apply to the very next request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    /// `None` only for super-admins.
    pub organization_id: Option<OrganizationId>,
    pub role: Role,
    pub active: bool,
}

impl Principal {
    pub fn is_super_admin(&self) -> bool {
        self.role.is_super_admin()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid or unknown credential")]
    InvalidCredential,

    #[error("user is deactivated")]
    Inactive,

    #[error("organization is deactivated")]
    OrganizationInactive,

    #[error("principal lookup failed: {0}")]
    Storage(String),
}

/// Turns a bearer credential into a [`Principal`].
///
/// Verification and token issuance are the implementor's business; this
/// crate only relies on the freshness contract above.
pub trait PrincipalResolver: Send + Sync {
    fn resolve_principal(&self, credential: &str) -> Result<Principal, AuthError>;
}

impl<R> PrincipalResolver for std::sync::Arc<R>
where
    R: PrincipalResolver + ?Sized,
{
    fn resolve_principal(&self, credential: &str) -> Result<Principal, AuthError> {
        (**self).resolve_principal(credential)
    }
}
