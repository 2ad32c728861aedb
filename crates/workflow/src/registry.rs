//! Workflow registry: CRUD over per-organization workflows.
//!
//! The registry holds no state of its own. Every call reads and writes
//! through the injected [`WorkflowStore`], so it is safe to share across
//! request handlers without locking.

use std::sync::Arc;

use forgetrack_core::{OrganizationId, StoreError, WorkflowId};

use crate::{
    NewWorkflow, StatusLabel, Workflow, WorkflowChanges, WorkflowError, validate_name,
    validate_statuses,
};

/// Transactional persistence for workflows.
///
/// Implementations must:
/// - assign timestamps on insert/update
/// - reject a second default workflow for the same organization with
///   `StoreError::UniqueViolation`, atomically with the insert
/// - never change `is_default` on update
/// - reject, atomically with the write, a status list that drops a status a
///   ticket still holds and the deletion of a workflow a project still
///   points at, both with `StoreError::ReferenceViolation`
pub trait WorkflowStore: Send + Sync {
    fn fetch_workflow(&self, id: WorkflowId) -> Result<Option<Workflow>, StoreError>;

    fn list_workflows(&self, organization_id: OrganizationId) -> Result<Vec<Workflow>, StoreError>;

    fn fetch_default_workflow(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Option<Workflow>, StoreError>;

    fn insert_workflow(&self, workflow: NewWorkflow) -> Result<Workflow, StoreError>;

    fn update_workflow(
        &self,
        id: WorkflowId,
        changes: WorkflowChanges,
    ) -> Result<Workflow, StoreError>;

    fn delete_workflow(&self, id: WorkflowId) -> Result<(), StoreError>;

    /// Whether any project still points at this workflow.
    fn workflow_in_use(&self, id: WorkflowId) -> Result<bool, StoreError>;

    /// Distinct statuses held by tickets of projects governed by this
    /// workflow.
    fn statuses_in_use(&self, id: WorkflowId) -> Result<Vec<StatusLabel>, StoreError>;
}

impl<S> WorkflowStore for Arc<S>
where
    S: WorkflowStore + ?Sized,
{
    fn fetch_workflow(&self, id: WorkflowId) -> Result<Option<Workflow>, StoreError> {
        (**self).fetch_workflow(id)
    }

    fn list_workflows(&self, organization_id: OrganizationId) -> Result<Vec<Workflow>, StoreError> {
        (**self).list_workflows(organization_id)
    }

    fn fetch_default_workflow(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Option<Workflow>, StoreError> {
        (**self).fetch_default_workflow(organization_id)
    }

    fn insert_workflow(&self, workflow: NewWorkflow) -> Result<Workflow, StoreError> {
        (**self).insert_workflow(workflow)
    }

    fn update_workflow(
        &self,
        id: WorkflowId,
        changes: WorkflowChanges,
    ) -> Result<Workflow, StoreError> {
        (**self).update_workflow(id, changes)
    }

    fn delete_workflow(&self, id: WorkflowId) -> Result<(), StoreError> {
        (**self).delete_workflow(id)
    }

    fn workflow_in_use(&self, id: WorkflowId) -> Result<bool, StoreError> {
        (**self).workflow_in_use(id)
    }

    fn statuses_in_use(&self, id: WorkflowId) -> Result<Vec<StatusLabel>, StoreError> {
        (**self).statuses_in_use(id)
    }
}

/// Raw update request; validated by [`WorkflowRegistry::update`].
#[derive(Debug, Clone, Default)]
pub struct WorkflowUpdate {
    pub name: Option<String>,
    pub statuses: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct WorkflowRegistry<S> {
    store: S,
}

impl<S> WorkflowRegistry<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S> WorkflowRegistry<S>
where
    S: WorkflowStore,
{
    /// Create an ordinary (non-default) workflow.
    pub fn create<T: AsRef<str>>(
        &self,
        organization_id: OrganizationId,
        name: &str,
        statuses: &[T],
    ) -> Result<Workflow, WorkflowError> {
        let new = NewWorkflow {
            id: WorkflowId::new(),
            organization_id,
            name: validate_name(name)?,
            statuses: validate_statuses(statuses)?,
            is_default: false,
        };
        let workflow = self.store.insert_workflow(new)?;
        tracing::debug!(workflow_id = %workflow.id, %organization_id, "workflow created");
        Ok(workflow)
    }

    /// Create the organization's default workflow. Succeeds at most once per
    /// organization; a repeat call fails with `DefaultWorkflowExists`.
    ///
    /// The existence check below is not atomic with the insert. Concurrent
    /// callers are arbitrated by the store's uniqueness rule, whose violation
    /// is reported the same way.
    pub fn create_default<T: AsRef<str>>(
        &self,
        organization_id: OrganizationId,
        name: &str,
        statuses: &[T],
    ) -> Result<Workflow, WorkflowError> {
        if self.store.fetch_default_workflow(organization_id)?.is_some() {
            return Err(WorkflowError::DefaultWorkflowExists(organization_id));
        }

        let new = NewWorkflow {
            id: WorkflowId::new(),
            organization_id,
            name: validate_name(name)?,
            statuses: validate_statuses(statuses)?,
            is_default: true,
        };
        let workflow = self.store.insert_workflow(new).map_err(|e| match e {
            StoreError::UniqueViolation(_) => WorkflowError::DefaultWorkflowExists(organization_id),
            other => WorkflowError::from(other),
        })?;
        tracing::info!(workflow_id = %workflow.id, %organization_id, "default workflow created");
        Ok(workflow)
    }

    /// Rename a workflow or replace its status list.
    ///
    /// A new status list must keep every status that a ticket governed by
    /// this workflow currently holds. The store enforces the same rule
    /// atomically; the check here names the offending statuses.
    pub fn update(&self, id: WorkflowId, update: WorkflowUpdate) -> Result<Workflow, WorkflowError> {
        let changes = WorkflowChanges {
            name: update.name.as_deref().map(validate_name).transpose()?,
            statuses: update
                .statuses
                .as_deref()
                .map(validate_statuses)
                .transpose()?,
        };
        if changes.is_empty() {
            return self.get(id);
        }
        if let Some(statuses) = &changes.statuses {
            let mut dropped: Vec<StatusLabel> = self
                .store
                .statuses_in_use(id)?
                .into_iter()
                .filter(|held| !statuses.contains(held))
                .collect();
            if !dropped.is_empty() {
                dropped.sort();
                let names: Vec<&str> = dropped.iter().map(StatusLabel::as_str).collect();
                return Err(WorkflowError::validation(format!(
                    "statuses still held by tickets cannot be removed: {}",
                    names.join(", ")
                )));
            }
        }
        Ok(self.store.update_workflow(id, changes)?)
    }

    /// Delete a workflow. The default workflow and workflows still referenced
    /// by a project cannot be deleted; the store re-checks the reference
    /// under the same write.
    pub fn delete(&self, id: WorkflowId) -> Result<(), WorkflowError> {
        let workflow = self.get(id)?;
        if workflow.is_default {
            return Err(WorkflowError::validation(
                "the default workflow cannot be deleted",
            ));
        }
        if self.store.workflow_in_use(id)? {
            return Err(WorkflowError::validation(
                "workflow is still used by at least one project",
            ));
        }
        Ok(self.store.delete_workflow(id)?)
    }

    pub fn get(&self, id: WorkflowId) -> Result<Workflow, WorkflowError> {
        self.store.fetch_workflow(id)?.ok_or(WorkflowError::NotFound)
    }

    pub fn get_by_organization(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<Workflow>, WorkflowError> {
        Ok(self.store.list_workflows(organization_id)?)
    }

    pub fn get_default(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Option<Workflow>, WorkflowError> {
        Ok(self.store.fetch_default_workflow(organization_id)?)
    }
}
