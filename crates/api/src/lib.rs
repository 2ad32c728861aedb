//! Boundary layer: governed operations and their response mapping.
//!
//! A transport calls [`RequestContext::from_headers`] to get a principal,
//! runs the matching [`TrackerServices`] method, and turns any error into a
//! response with [`errors::gateway_error_to_response`].

pub mod context;
pub mod errors;
pub mod services;

pub use context::RequestContext;
pub use services::{CreateTicket, CreateUser, TrackerServices};
