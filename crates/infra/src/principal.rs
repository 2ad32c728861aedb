//! Credential → principal resolution backed by the directory.

use std::collections::HashMap;
use std::sync::RwLock;

use uuid::Uuid;

use forgetrack_auth::{AuthError, Principal, PrincipalResolver};
use forgetrack_core::UserId;
use forgetrack_tracking::Directory;

/// Resolves opaque bearer tokens issued by [`TokenPrincipalResolver::issue`].
///
/// The token only identifies a user. Role, active flag and organization
/// status are read from the directory on every call, so role changes and
/// deactivation take effect on the next request.
pub struct TokenPrincipalResolver<D> {
    directory: D,
    tokens: RwLock<HashMap<String, UserId>>,
}

impl<D> TokenPrincipalResolver<D>
where
    D: Directory,
{
    pub fn new(directory: D) -> Self {
        Self {
            directory,
            tokens: RwLock::new(HashMap::new()),
        }
    }

    /// Issue a fresh token for `user_id`.
    pub fn issue(&self, user_id: UserId) -> Result<String, AuthError> {
        let token = Uuid::now_v7().simple().to_string();
        self.tokens
            .write()
            .map_err(|_| AuthError::Storage("token table poisoned".to_string()))?
            .insert(token.clone(), user_id);
        Ok(token)
    }

    pub fn revoke(&self, token: &str) -> Result<(), AuthError> {
        self.tokens
            .write()
            .map_err(|_| AuthError::Storage("token table poisoned".to_string()))?
            .remove(token);
        Ok(())
    }

    fn lookup(&self, token: &str) -> Result<Option<UserId>, AuthError> {
        let tokens = self
            .tokens
            .read()
            .map_err(|_| AuthError::Storage("token table poisoned".to_string()))?;
        Ok(tokens.get(token).copied())
    }
}

impl<D> PrincipalResolver for TokenPrincipalResolver<D>
where
    D: Directory,
{
    fn resolve_principal(&self, credential: &str) -> Result<Principal, AuthError> {
        let user_id = self
            .lookup(credential.trim())?
            .ok_or(AuthError::InvalidCredential)?;

        let user = self
            .directory
            .get_user(user_id)
            .map_err(|e| AuthError::Storage(e.to_string()))?
            .ok_or(AuthError::InvalidCredential)?;
        if !user.active {
            return Err(AuthError::Inactive);
        }

        if let Some(organization_id) = user.organization_id {
            let organization = self
                .directory
                .get_organization(organization_id)
                .map_err(|e| AuthError::Storage(e.to_string()))?
                .ok_or(AuthError::InvalidCredential)?;
            if !organization.active {
                return Err(AuthError::OrganizationInactive);
            }
        }

        Ok(user.to_principal())
    }
}
