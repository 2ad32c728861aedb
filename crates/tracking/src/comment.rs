use serde::{Deserialize, Serialize};

use forgetrack_core::{CommentId, DomainError, Entity, TicketId, Timestamps, UserId};

/// A comment on a ticket. `author_id` is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub ticket_id: TicketId,
    pub author_id: UserId,
    pub body: String,
    pub timestamps: Timestamps,
}

impl Comment {
    pub fn from_parts(new: NewComment, timestamps: Timestamps) -> Self {
        Self {
            id: new.id,
            ticket_id: new.ticket_id,
            author_id: new.author_id,
            body: new.body,
            timestamps,
        }
    }
}

impl Entity for Comment {
    type Id = CommentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub id: CommentId,
    pub ticket_id: TicketId,
    pub author_id: UserId,
    pub body: String,
}

impl NewComment {
    pub fn new(ticket_id: TicketId, author_id: UserId, body: &str) -> Result<Self, DomainError> {
        Ok(Self {
            id: CommentId::new(),
            ticket_id,
            author_id,
            body: validate_body(body)?,
        })
    }
}

pub fn validate_body(body: &str) -> Result<String, DomainError> {
    let body = body.trim();
    if body.is_empty() {
        return Err(DomainError::validation("comment body cannot be empty"));
    }
    Ok(body.to_string())
}
