use serde::{Deserialize, Serialize};

use forgetrack_auth::{Principal, Role};
use forgetrack_core::{DomainError, Entity, OrganizationId, Timestamps, UserId};

/// A user account; the persisted form of a principal.
///
/// # Invariants
/// - `organization_id` is `None` exactly when `role` is super-admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub organization_id: Option<OrganizationId>,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub active: bool,
    pub timestamps: Timestamps,
}

impl User {
    pub fn from_parts(new: NewUser, timestamps: Timestamps) -> Self {
        Self {
            id: new.id,
            organization_id: new.organization_id,
            email: new.email,
            display_name: new.display_name,
            role: new.role,
            active: true,
            timestamps,
        }
    }

    /// Current authorization view of this user.
    pub fn to_principal(&self) -> Principal {
        Principal {
            id: self.id,
            organization_id: self.organization_id,
            role: self.role,
            active: self.active,
        }
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub id: UserId,
    pub organization_id: Option<OrganizationId>,
    pub email: String,
    pub display_name: String,
    pub role: Role,
}

impl NewUser {
    pub fn new(
        organization_id: Option<OrganizationId>,
        email: &str,
        display_name: &str,
        role: Role,
    ) -> Result<Self, DomainError> {
        validate_membership(organization_id, role)?;

        let email = email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(DomainError::validation("invalid email format"));
        }
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(DomainError::validation("display name cannot be empty"));
        }

        Ok(Self {
            id: UserId::new(),
            organization_id,
            email,
            display_name: display_name.to_string(),
            role,
        })
    }
}

/// Organization membership must be present for every role but super-admin,
/// and absent for super-admin.
pub fn validate_membership(
    organization_id: Option<OrganizationId>,
    role: Role,
) -> Result<(), DomainError> {
    match (organization_id, role.is_super_admin()) {
        (None, false) => Err(DomainError::invariant(
            "users other than super-admins must belong to an organization",
        )),
        (Some(_), true) => Err(DomainError::invariant(
            "super-admins cannot belong to an organization",
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_rules() {
        assert!(validate_membership(None, Role::SuperAdmin).is_ok());
        assert!(validate_membership(Some(OrganizationId::new()), Role::Admin).is_ok());
        assert!(validate_membership(None, Role::Admin).is_err());
        assert!(validate_membership(Some(OrganizationId::new()), Role::SuperAdmin).is_err());
    }

    #[test]
    fn new_user_normalizes_email() {
        let user = NewUser::new(
            Some(OrganizationId::new()),
            "  Alice@Example.com ",
            "Alice",
            Role::WriteAccess,
        )
        .unwrap();
        assert_eq!(user.email, "alice@example.com");
    }

    #[test]
    fn new_user_rejects_bad_email() {
        assert!(NewUser::new(Some(OrganizationId::new()), "nope", "Bob", Role::ReadAccess).is_err());
    }
}
