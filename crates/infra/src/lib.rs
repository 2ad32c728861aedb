//! Infrastructure layer: storage, credential resolution, audit, config.

pub mod audit;
pub mod config;
pub mod memory;
pub mod principal;

#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;

pub use audit::{AuditError, AuditRecord, AuditSink, InMemoryAuditSink, TracingAuditSink};
pub use config::TrackerConfig;
pub use memory::InMemoryStore;
pub use principal::TokenPrincipalResolver;
