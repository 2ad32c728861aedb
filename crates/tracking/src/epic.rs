use serde::{Deserialize, Serialize};

use forgetrack_core::{DomainError, Entity, EpicId, OrganizationId, Timestamps};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Epic {
    pub id: EpicId,
    pub organization_id: OrganizationId,
    pub title: String,
    pub timestamps: Timestamps,
}

impl Epic {
    pub fn from_parts(new: NewEpic, timestamps: Timestamps) -> Self {
        Self {
            id: new.id,
            organization_id: new.organization_id,
            title: new.title,
            timestamps,
        }
    }
}

impl Entity for Epic {
    type Id = EpicId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEpic {
    pub id: EpicId,
    pub organization_id: OrganizationId,
    pub title: String,
}

impl NewEpic {
    pub fn new(organization_id: OrganizationId, title: &str) -> Result<Self, DomainError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(DomainError::validation("epic title cannot be empty"));
        }
        Ok(Self {
            id: EpicId::new(),
            organization_id,
            title: title.to_string(),
        })
    }
}
