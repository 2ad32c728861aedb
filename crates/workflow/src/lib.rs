//! Workflow domain module.
//!
//! Per-organization workflows are ordered, deduplicated lists of ticket status
//! labels. This crate owns their structural rules, the ticket status checks
//! made against them, and the registry service that keeps at most one default
//! workflow per organization. Persistence is reached only through the
//! [`WorkflowStore`] port.

pub mod error;
pub mod registry;
pub mod state;
pub mod status;
pub mod workflow;

pub use error::WorkflowError;
pub use registry::{WorkflowRegistry, WorkflowStore, WorkflowUpdate};
pub use state::{StatusChange, resolve_create_status, validate_move, validate_status_change};
pub use status::StatusLabel;
pub use workflow::{NewWorkflow, Workflow, WorkflowChanges, validate_name, validate_statuses};
