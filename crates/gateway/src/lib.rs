//! Authorization gateway: the single decision point for governed operations.
//!
//! For each inbound operation the gateway resolves the target's owning
//! organization, evaluates the principal's permission, and (for ticket and
//! workflow operations) validates ticket state. It performs no writes; all
//! reads go through the injected [`Directory`](forgetrack_tracking::Directory).

pub mod error;
pub mod gateway;
pub mod resolver;

pub use error::GatewayError;
pub use gateway::{AuthorizationGateway, AuthorizedContext, ResourceRefs};
pub use resolver::{ResourceRef, resolve_owning_organization, resolve_resource};
