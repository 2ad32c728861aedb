//! Workflow entity and its structural rules.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use forgetrack_core::{Entity, OrganizationId, Timestamps, WorkflowId};

use crate::{StatusLabel, WorkflowError};

/// An ordered list of valid ticket statuses owned by one organization.
///
/// # Invariants
/// - `statuses` is non-empty and contains no duplicates.
/// - `organization_id` never changes.
/// - `is_default` is set only when the workflow is created as the default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WorkflowRecord")]
pub struct Workflow {
    pub id: WorkflowId,
    pub organization_id: OrganizationId,
    pub name: String,
    statuses: Vec<StatusLabel>,
    pub is_default: bool,
    pub timestamps: Timestamps,
}

impl Workflow {
    /// Rebuild a persisted workflow. Used by stores after validating input
    /// through [`NewWorkflow`] / [`WorkflowChanges`].
    pub fn from_parts(new: NewWorkflow, timestamps: Timestamps) -> Self {
        Self {
            id: new.id,
            organization_id: new.organization_id,
            name: new.name,
            statuses: new.statuses,
            is_default: new.is_default,
            timestamps,
        }
    }

    pub fn statuses(&self) -> &[StatusLabel] {
        &self.statuses
    }

    /// First status in the list; the status new tickets start in.
    pub fn initial_status(&self) -> Option<&StatusLabel> {
        self.statuses.first()
    }

    /// Case-sensitive membership check.
    pub fn contains(&self, status: &str) -> bool {
        self.statuses.iter().any(|s| s == status)
    }

    /// Apply already-validated changes. Never touches `is_default`.
    pub fn apply(&mut self, changes: WorkflowChanges) {
        if let Some(name) = changes.name {
            self.name = name;
        }
        if let Some(statuses) = changes.statuses {
            self.statuses = statuses;
        }
    }
}

/// Wire shape of a stored workflow, checked before it becomes a [`Workflow`].
#[derive(Deserialize)]
struct WorkflowRecord {
    id: WorkflowId,
    organization_id: OrganizationId,
    name: String,
    statuses: Vec<StatusLabel>,
    is_default: bool,
    timestamps: Timestamps,
}

impl TryFrom<WorkflowRecord> for Workflow {
    type Error = WorkflowError;

    fn try_from(record: WorkflowRecord) -> Result<Self, Self::Error> {
        let labels: Vec<&str> = record.statuses.iter().map(StatusLabel::as_str).collect();
        let new = NewWorkflow {
            id: record.id,
            organization_id: record.organization_id,
            name: validate_name(&record.name)?,
            statuses: validate_statuses(&labels)?,
            is_default: record.is_default,
        };
        Ok(Workflow::from_parts(new, record.timestamps))
    }
}

impl Entity for Workflow {
    type Id = WorkflowId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// A validated workflow ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWorkflow {
    pub id: WorkflowId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub statuses: Vec<StatusLabel>,
    pub is_default: bool,
}

/// Validated partial update of a workflow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowChanges {
    pub name: Option<String>,
    pub statuses: Option<Vec<StatusLabel>>,
}

impl WorkflowChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.statuses.is_none()
    }
}

pub fn validate_name(name: &str) -> Result<String, WorkflowError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(WorkflowError::validation("workflow name cannot be empty"));
    }
    Ok(name.to_string())
}

/// Parse and check a raw status list: non-empty, every label well-formed,
/// no duplicates. Order is preserved.
pub fn validate_statuses<S: AsRef<str>>(raw: &[S]) -> Result<Vec<StatusLabel>, WorkflowError> {
    if raw.is_empty() {
        return Err(WorkflowError::validation(
            "workflow must define at least one status",
        ));
    }

    let mut seen = HashSet::with_capacity(raw.len());
    let mut labels = Vec::with_capacity(raw.len());
    for s in raw {
        let label = StatusLabel::parse(s.as_ref())?;
        if !seen.insert(label.clone()) {
            return Err(WorkflowError::validation(format!(
                "duplicate status '{label}'"
            )));
        }
        labels.push(label);
    }
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn workflow(statuses: &[&str]) -> Workflow {
        Workflow::from_parts(
            NewWorkflow {
                id: WorkflowId::new(),
                organization_id: OrganizationId::new(),
                name: "Delivery".to_string(),
                statuses: validate_statuses(statuses).unwrap(),
                is_default: false,
            },
            Timestamps::at(Utc::now()),
        )
    }

    #[test]
    fn empty_status_list_is_rejected() {
        let err = validate_statuses::<&str>(&[]).unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));
    }

    #[test]
    fn duplicates_are_rejected() {
        let err = validate_statuses(&["TODO", "DONE", "TODO"]).unwrap_err();
        assert_eq!(err.to_string(), "validation failed: duplicate status 'TODO'");
    }

    #[test]
    fn order_is_preserved() {
        let wf = workflow(&["BACKLOG", "IN_DEV", "DONE"]);
        let names: Vec<&str> = wf.statuses().iter().map(StatusLabel::as_str).collect();
        assert_eq!(names, vec!["BACKLOG", "IN_DEV", "DONE"]);
        assert_eq!(wf.initial_status().unwrap().as_str(), "BACKLOG");
    }

    #[test]
    fn single_status_workflow_is_legal() {
        let wf = workflow(&["OPEN"]);
        assert_eq!(wf.statuses().len(), 1);
    }

    #[test]
    fn apply_keeps_default_flag() {
        let mut wf = workflow(&["TODO", "DONE"]);
        wf.is_default = true;
        wf.apply(WorkflowChanges {
            name: Some("Renamed".to_string()),
            statuses: Some(validate_statuses(&["A", "B"]).unwrap()),
        });
        assert!(wf.is_default);
        assert_eq!(wf.name, "Renamed");
        assert!(wf.contains("A"));
        assert!(!wf.contains("TODO"));
    }

    #[test]
    fn blank_name_is_rejected() {
        assert!(validate_name("   ").is_err());
        assert_eq!(validate_name("  Support ").unwrap(), "Support");
    }

    #[test]
    fn stored_rows_are_checked_on_read() {
        let wf = workflow(&["TODO", "DONE"]);
        let mut json = serde_json::to_value(&wf).unwrap();
        assert_eq!(serde_json::from_value::<Workflow>(json.clone()).unwrap(), wf);

        json["statuses"] = serde_json::json!(["TODO", "TODO"]);
        assert!(serde_json::from_value::<Workflow>(json.clone()).is_err());

        json["statuses"] = serde_json::json!([]);
        assert!(serde_json::from_value::<Workflow>(json).is_err());
    }
}
