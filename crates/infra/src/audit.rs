//! Audit trail for successful mutations.
//!
//! Recording is best-effort: callers log a failed append and carry on. The
//! mutation it describes has already been committed.

use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use forgetrack_auth::Operation;
use forgetrack_core::{OrganizationId, UserId};

/// One audited mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditRecord {
    pub record_id: Uuid,
    pub command: Operation,
    /// Id of the entity the mutation produced or changed.
    pub entity_id: String,
    pub actor_id: UserId,
    pub organization_id: Option<OrganizationId>,
    /// State of the entity after the mutation, when snapshots are enabled.
    pub snapshot: Option<serde_json::Value>,
    pub recorded_at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(
        command: Operation,
        entity_id: impl ToString,
        actor_id: UserId,
        organization_id: Option<OrganizationId>,
    ) -> Self {
        Self {
            record_id: Uuid::now_v7(),
            command,
            entity_id: entity_id.to_string(),
            actor_id,
            organization_id,
            snapshot: None,
            recorded_at: Utc::now(),
        }
    }

    /// Attach a snapshot of `entity`. Serialization failures leave the
    /// record without one.
    pub fn with_snapshot<T: Serialize>(mut self, entity: &T) -> Self {
        self.snapshot = serde_json::to_value(entity).ok();
        self
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuditError {
    #[error("audit sink unavailable: {0}")]
    Unavailable(String),
}

/// Destination for audit records.
pub trait AuditSink: Send + Sync {
    fn record(&self, record: AuditRecord) -> Result<(), AuditError>;
}

impl<S> AuditSink for std::sync::Arc<S>
where
    S: AuditSink + ?Sized,
{
    fn record(&self, record: AuditRecord) -> Result<(), AuditError> {
        (**self).record(record)
    }
}

/// Keeps records in memory; for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryAuditSink {
    records: RwLock<Vec<AuditRecord>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.read().map(|r| r.clone()).unwrap_or_default()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, record: AuditRecord) -> Result<(), AuditError> {
        self.records
            .write()
            .map_err(|_| AuditError::Unavailable("lock poisoned".to_string()))?
            .push(record);
        Ok(())
    }
}

/// Emits each record as a structured event on the `forgetrack::audit` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, record: AuditRecord) -> Result<(), AuditError> {
        let snapshot = record
            .snapshot
            .as_ref()
            .map(|s| s.to_string())
            .unwrap_or_default();
        tracing::info!(
            target: "forgetrack::audit",
            record_id = %record.record_id,
            command = %record.command,
            entity_id = %record.entity_id,
            actor_id = %record.actor_id,
            organization_id = ?record.organization_id,
            snapshot = %snapshot,
            recorded_at = %record.recorded_at,
            "audit"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forgetrack_core::TicketId;

    #[test]
    fn in_memory_sink_keeps_order() {
        let sink = InMemoryAuditSink::new();
        let actor = UserId::new();
        sink.record(AuditRecord::new(Operation::TicketCreate, TicketId::new(), actor, None))
            .unwrap();
        sink.record(AuditRecord::new(Operation::TicketDelete, TicketId::new(), actor, None))
            .unwrap();

        let commands: Vec<_> = sink.records().iter().map(|r| r.command).collect();
        assert_eq!(commands, vec![Operation::TicketCreate, Operation::TicketDelete]);
    }

    #[test]
    fn snapshot_is_serialized_entity() {
        #[derive(Serialize)]
        struct Row {
            title: &'static str,
        }

        let record = AuditRecord::new(Operation::TicketUpdate, "t-1", UserId::new(), None)
            .with_snapshot(&Row { title: "Fix login" });
        assert_eq!(record.snapshot, Some(serde_json::json!({ "title": "Fix login" })));
    }
}
