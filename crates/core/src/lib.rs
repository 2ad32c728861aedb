//! `forgetrack-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! typed identifiers, the domain error model and the entity/value-object traits
//! shared by every other crate.

pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use entity::{Entity, Timestamps};
pub use error::{DomainError, StoreError};
pub use id::{CommentId, EpicId, OrganizationId, ProjectId, TicketId, UserId, WorkflowId};
pub use value_object::ValueObject;
