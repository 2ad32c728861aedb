use serde::{Deserialize, Serialize};

use forgetrack_core::{DomainError, Entity, OrganizationId, Timestamps};

/// Tenant: root of the isolation hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrganizationId,
    /// Unique across the platform.
    pub name: String,
    pub active: bool,
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrganization {
    pub id: OrganizationId,
    pub name: String,
}

impl NewOrganization {
    pub fn new(name: &str) -> Result<Self, DomainError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("organization name cannot be empty"));
        }
        Ok(Self {
            id: OrganizationId::new(),
            name: name.to_string(),
        })
    }
}

impl Organization {
    pub fn from_parts(new: NewOrganization, timestamps: Timestamps) -> Self {
        Self {
            id: new.id,
            name: new.name,
            active: true,
            timestamps,
        }
    }
}

impl Entity for Organization {
    type Id = OrganizationId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
