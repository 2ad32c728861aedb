//! Project-tracking data model.
//!
//! Entities reference each other by id; nothing here caches a related entity.
//! Reads go through the [`Directory`] port and writes through
//! [`TrackingStore`], both implemented by the infrastructure layer.

pub mod comment;
pub mod directory;
pub mod epic;
pub mod organization;
pub mod project;
pub mod store;
pub mod ticket;
pub mod user;

pub use comment::{Comment, NewComment, validate_body};
pub use directory::{Directory, require};
pub use epic::{Epic, NewEpic};
pub use organization::{NewOrganization, Organization};
pub use project::{NewProject, Project};
pub use store::TrackingStore;
pub use ticket::{NewTicket, Ticket, validate_title};
pub use user::{NewUser, User, validate_membership};
