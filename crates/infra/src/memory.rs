//! In-memory implementation of the storage ports.
//!
//! One lock guards every table so uniqueness checks and the writes they
//! protect happen atomically. Intended for tests and local development.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use forgetrack_auth::Role;
use forgetrack_core::{
    CommentId, EpicId, OrganizationId, ProjectId, StoreError, TicketId, Timestamps, UserId,
    WorkflowId,
};
use forgetrack_tracking::{
    Comment, Directory, Epic, NewComment, NewEpic, NewOrganization, NewProject, NewTicket,
    NewUser, Organization, Project, Ticket, TrackingStore, User,
};
use forgetrack_workflow::{NewWorkflow, StatusLabel, Workflow, WorkflowChanges, WorkflowStore};

#[derive(Debug, Default)]
struct Tables {
    organizations: HashMap<OrganizationId, Organization>,
    users: HashMap<UserId, User>,
    projects: HashMap<ProjectId, Project>,
    workflows: HashMap<WorkflowId, Workflow>,
    tickets: HashMap<TicketId, Ticket>,
    epics: HashMap<EpicId, Epic>,
    comments: HashMap<CommentId, Comment>,
}

impl Tables {
    fn statuses_held(&self, workflow_id: WorkflowId) -> Vec<StatusLabel> {
        let mut held: Vec<StatusLabel> = self
            .tickets
            .values()
            .filter(|t| {
                self.projects
                    .get(&t.project_id)
                    .is_some_and(|p| p.workflow_id == workflow_id)
            })
            .map(|t| t.status.clone())
            .collect();
        held.sort();
        held.dedup();
        held
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }
}

fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Apply `f` to the row under `id` and stamp `updated_at`.
fn modify<K, V>(
    table: &mut HashMap<K, V>,
    id: &K,
    touch: impl FnOnce(&mut V) -> &mut Timestamps,
    f: impl FnOnce(&mut V),
) -> Result<V, StoreError>
where
    K: std::hash::Hash + Eq,
    V: Clone,
{
    let row = table.get_mut(id).ok_or(StoreError::NotFound)?;
    f(row);
    touch(row).touch(now());
    Ok(row.clone())
}

impl Directory for InMemoryStore {
    fn get_organization(&self, id: OrganizationId) -> Result<Option<Organization>, StoreError> {
        Ok(self.read()?.organizations.get(&id).cloned())
    }

    fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    fn get_project(&self, id: ProjectId) -> Result<Option<Project>, StoreError> {
        Ok(self.read()?.projects.get(&id).cloned())
    }

    fn get_ticket(&self, id: TicketId) -> Result<Option<Ticket>, StoreError> {
        Ok(self.read()?.tickets.get(&id).cloned())
    }

    fn get_epic(&self, id: EpicId) -> Result<Option<Epic>, StoreError> {
        Ok(self.read()?.epics.get(&id).cloned())
    }

    fn get_comment(&self, id: CommentId) -> Result<Option<Comment>, StoreError> {
        Ok(self.read()?.comments.get(&id).cloned())
    }

    fn get_workflow(&self, id: WorkflowId) -> Result<Option<Workflow>, StoreError> {
        self.fetch_workflow(id)
    }

    fn get_default_workflow(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Option<Workflow>, StoreError> {
        self.fetch_default_workflow(organization_id)
    }
}

impl WorkflowStore for InMemoryStore {
    fn fetch_workflow(&self, id: WorkflowId) -> Result<Option<Workflow>, StoreError> {
        Ok(self.read()?.workflows.get(&id).cloned())
    }

    fn list_workflows(&self, organization_id: OrganizationId) -> Result<Vec<Workflow>, StoreError> {
        let tables = self.read()?;
        let mut found: Vec<Workflow> = tables
            .workflows
            .values()
            .filter(|w| w.organization_id == organization_id)
            .cloned()
            .collect();
        found.sort_by_key(|w| w.id);
        Ok(found)
    }

    fn fetch_default_workflow(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Option<Workflow>, StoreError> {
        Ok(self
            .read()?
            .workflows
            .values()
            .find(|w| w.organization_id == organization_id && w.is_default)
            .cloned())
    }

    fn insert_workflow(&self, workflow: NewWorkflow) -> Result<Workflow, StoreError> {
        let mut tables = self.write()?;
        if !tables.organizations.contains_key(&workflow.organization_id) {
            return Err(StoreError::NotFound);
        }
        if workflow.is_default
            && tables
                .workflows
                .values()
                .any(|w| w.organization_id == workflow.organization_id && w.is_default)
        {
            return Err(StoreError::UniqueViolation(format!(
                "organization {} already has a default workflow",
                workflow.organization_id
            )));
        }
        let workflow = Workflow::from_parts(workflow, Timestamps::at(now()));
        tables.workflows.insert(workflow.id, workflow.clone());
        Ok(workflow)
    }

    fn update_workflow(
        &self,
        id: WorkflowId,
        changes: WorkflowChanges,
    ) -> Result<Workflow, StoreError> {
        let mut tables = self.write()?;
        if let Some(statuses) = &changes.statuses {
            if let Some(held) = tables
                .statuses_held(id)
                .into_iter()
                .find(|held| !statuses.contains(held))
            {
                return Err(StoreError::ReferenceViolation(format!(
                    "status '{held}' is still held by a ticket"
                )));
            }
        }
        modify(&mut tables.workflows, &id, |w| &mut w.timestamps, |w| w.apply(changes))
    }

    fn delete_workflow(&self, id: WorkflowId) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if tables.projects.values().any(|p| p.workflow_id == id) {
            return Err(StoreError::ReferenceViolation(format!(
                "workflow {id} is still used by a project"
            )));
        }
        tables.workflows.remove(&id).map(|_| ()).ok_or(StoreError::NotFound)
    }

    fn workflow_in_use(&self, id: WorkflowId) -> Result<bool, StoreError> {
        Ok(self.read()?.projects.values().any(|p| p.workflow_id == id))
    }

    fn statuses_in_use(&self, id: WorkflowId) -> Result<Vec<StatusLabel>, StoreError> {
        Ok(self.read()?.statuses_held(id))
    }
}

impl TrackingStore for InMemoryStore {
    fn insert_organization(&self, new: NewOrganization) -> Result<Organization, StoreError> {
        let mut tables = self.write()?;
        if tables
            .organizations
            .values()
            .any(|o| o.name.eq_ignore_ascii_case(&new.name))
        {
            return Err(StoreError::UniqueViolation(format!(
                "organization name '{}' is taken",
                new.name
            )));
        }
        let organization = Organization::from_parts(new, Timestamps::at(now()));
        tables.organizations.insert(organization.id, organization.clone());
        Ok(organization)
    }

    fn set_organization_active(
        &self,
        id: OrganizationId,
        active: bool,
    ) -> Result<Organization, StoreError> {
        let mut tables = self.write()?;
        modify(&mut tables.organizations, &id, |o| &mut o.timestamps, |o| o.active = active)
    }

    fn insert_user(&self, new: NewUser) -> Result<User, StoreError> {
        let mut tables = self.write()?;
        if let Some(org) = new.organization_id {
            if !tables.organizations.contains_key(&org) {
                return Err(StoreError::NotFound);
            }
        }
        if tables.users.values().any(|u| u.email == new.email) {
            return Err(StoreError::UniqueViolation(format!(
                "email '{}' is already registered",
                new.email
            )));
        }
        let user = User::from_parts(new, Timestamps::at(now()));
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn set_user_role(&self, id: UserId, role: Role) -> Result<User, StoreError> {
        let mut tables = self.write()?;
        modify(&mut tables.users, &id, |u| &mut u.timestamps, |u| u.role = role)
    }

    fn set_user_active(&self, id: UserId, active: bool) -> Result<User, StoreError> {
        let mut tables = self.write()?;
        modify(&mut tables.users, &id, |u| &mut u.timestamps, |u| u.active = active)
    }

    fn insert_project(&self, new: NewProject) -> Result<Project, StoreError> {
        let mut tables = self.write()?;
        if !tables.organizations.contains_key(&new.organization_id)
            || !tables.workflows.contains_key(&new.workflow_id)
        {
            return Err(StoreError::NotFound);
        }
        let project = Project::from_parts(new, Timestamps::at(now()));
        tables.projects.insert(project.id, project.clone());
        Ok(project)
    }

    fn archive_project(&self, id: ProjectId, at: DateTime<Utc>) -> Result<Project, StoreError> {
        let mut tables = self.write()?;
        modify(&mut tables.projects, &id, |p| &mut p.timestamps, |p| {
            p.archived_at.get_or_insert(at);
        })
    }

    fn insert_ticket(&self, new: NewTicket) -> Result<Ticket, StoreError> {
        let mut tables = self.write()?;
        if !tables.projects.contains_key(&new.project_id) {
            return Err(StoreError::NotFound);
        }
        let ticket = Ticket::from_parts(new, Timestamps::at(now()));
        tables.tickets.insert(ticket.id, ticket.clone());
        Ok(ticket)
    }

    fn set_ticket_title(&self, id: TicketId, title: String) -> Result<Ticket, StoreError> {
        let mut tables = self.write()?;
        modify(&mut tables.tickets, &id, |t| &mut t.timestamps, |t| t.title = title)
    }

    fn set_ticket_status(&self, id: TicketId, status: StatusLabel) -> Result<Ticket, StoreError> {
        let mut tables = self.write()?;
        modify(&mut tables.tickets, &id, |t| &mut t.timestamps, |t| t.status = status)
    }

    fn set_ticket_project(
        &self,
        id: TicketId,
        project_id: ProjectId,
        status: StatusLabel,
    ) -> Result<Ticket, StoreError> {
        let mut tables = self.write()?;
        if !tables.projects.contains_key(&project_id) {
            return Err(StoreError::NotFound);
        }
        modify(&mut tables.tickets, &id, |t| &mut t.timestamps, |t| {
            t.project_id = project_id;
            t.status = status;
        })
    }

    fn set_ticket_assignee(
        &self,
        id: TicketId,
        assignee_id: Option<UserId>,
    ) -> Result<Ticket, StoreError> {
        let mut tables = self.write()?;
        modify(&mut tables.tickets, &id, |t| &mut t.timestamps, |t| t.assignee_id = assignee_id)
    }

    fn set_ticket_epic(&self, id: TicketId, epic_id: Option<EpicId>) -> Result<Ticket, StoreError> {
        let mut tables = self.write()?;
        if epic_id.is_some_and(|epic| !tables.epics.contains_key(&epic)) {
            return Err(StoreError::NotFound);
        }
        modify(&mut tables.tickets, &id, |t| &mut t.timestamps, |t| t.epic_id = epic_id)
    }

    fn delete_ticket(&self, id: TicketId) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        tables.tickets.remove(&id).ok_or(StoreError::NotFound)?;
        tables.comments.retain(|_, c| c.ticket_id != id);
        Ok(())
    }

    fn insert_epic(&self, new: NewEpic) -> Result<Epic, StoreError> {
        let mut tables = self.write()?;
        if !tables.organizations.contains_key(&new.organization_id) {
            return Err(StoreError::NotFound);
        }
        let epic = Epic::from_parts(new, Timestamps::at(now()));
        tables.epics.insert(epic.id, epic.clone());
        Ok(epic)
    }

    fn delete_epic(&self, id: EpicId) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        tables.epics.remove(&id).ok_or(StoreError::NotFound)?;
        for ticket in tables.tickets.values_mut() {
            if ticket.epic_id == Some(id) {
                ticket.epic_id = None;
            }
        }
        Ok(())
    }

    fn insert_comment(&self, new: NewComment) -> Result<Comment, StoreError> {
        let mut tables = self.write()?;
        if !tables.tickets.contains_key(&new.ticket_id) {
            return Err(StoreError::NotFound);
        }
        let comment = Comment::from_parts(new, Timestamps::at(now()));
        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    fn set_comment_body(&self, id: CommentId, body: String) -> Result<Comment, StoreError> {
        let mut tables = self.write()?;
        modify(&mut tables.comments, &id, |c| &mut c.timestamps, |c| c.body = body)
    }

    fn delete_comment(&self, id: CommentId) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        tables.comments.remove(&id).map(|_| ()).ok_or(StoreError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forgetrack_workflow::validate_statuses;

    fn new_default(organization_id: OrganizationId) -> NewWorkflow {
        NewWorkflow {
            id: WorkflowId::new(),
            organization_id,
            name: "Default".to_string(),
            statuses: validate_statuses(&["TODO", "DONE"]).unwrap(),
            is_default: true,
        }
    }

    #[test]
    fn second_default_workflow_violates_uniqueness() {
        let store = InMemoryStore::new();
        let org = store
            .insert_organization(NewOrganization::new("Acme").unwrap())
            .unwrap();

        store.insert_workflow(new_default(org.id)).unwrap();
        let err = store.insert_workflow(new_default(org.id)).unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));
    }

    #[test]
    fn organization_names_are_unique() {
        let store = InMemoryStore::new();
        store
            .insert_organization(NewOrganization::new("Acme").unwrap())
            .unwrap();
        let err = store
            .insert_organization(NewOrganization::new("acme").unwrap())
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));
    }

    #[test]
    fn updates_stamp_updated_at() {
        let store = InMemoryStore::new();
        let org = store
            .insert_organization(NewOrganization::new("Acme").unwrap())
            .unwrap();
        let updated = store.set_organization_active(org.id, false).unwrap();
        assert!(!updated.active);
        assert!(updated.timestamps.updated_at >= org.timestamps.updated_at);
        assert_eq!(updated.timestamps.created_at, org.timestamps.created_at);
    }

    #[test]
    fn archiving_twice_keeps_first_timestamp() {
        let store = InMemoryStore::new();
        let org = store
            .insert_organization(NewOrganization::new("Acme").unwrap())
            .unwrap();
        let workflow = store.insert_workflow(new_default(org.id)).unwrap();
        let project = store
            .insert_project(NewProject::new(org.id, "Core", workflow.id).unwrap())
            .unwrap();

        let first = Utc::now();
        store.archive_project(project.id, first).unwrap();
        let again = store
            .archive_project(project.id, first + chrono::Duration::hours(1))
            .unwrap();
        assert_eq!(again.archived_at, Some(first));
        assert!(store.workflow_in_use(workflow.id).unwrap());
    }

    #[test]
    fn missing_rows_are_not_found() {
        let store = InMemoryStore::new();
        assert_eq!(store.get_ticket(TicketId::new()).unwrap(), None);
        assert_eq!(
            store.set_ticket_assignee(TicketId::new(), None).unwrap_err(),
            StoreError::NotFound
        );
    }

    #[test]
    fn workflow_writes_respect_references() {
        let store = InMemoryStore::new();
        let org = store
            .insert_organization(NewOrganization::new("Acme").unwrap())
            .unwrap();
        let workflow = store.insert_workflow(new_default(org.id)).unwrap();
        let project = store
            .insert_project(NewProject::new(org.id, "Core", workflow.id).unwrap())
            .unwrap();
        store
            .insert_ticket(NewTicket {
                id: TicketId::new(),
                project_id: project.id,
                title: "Ship it".to_string(),
                status: StatusLabel::parse("DONE").unwrap(),
                assignee_id: None,
                reporter_id: UserId::new(),
                epic_id: None,
            })
            .unwrap();

        assert_eq!(
            store.statuses_in_use(workflow.id).unwrap(),
            vec![StatusLabel::parse("DONE").unwrap()]
        );
        let err = store
            .update_workflow(
                workflow.id,
                WorkflowChanges {
                    name: None,
                    statuses: Some(validate_statuses(&["TODO"]).unwrap()),
                },
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::ReferenceViolation(_)));

        let err = store.delete_workflow(workflow.id).unwrap_err();
        assert!(matches!(err, StoreError::ReferenceViolation(_)));
        assert!(store.get_workflow(workflow.id).unwrap().is_some());
    }

    #[test]
    fn linking_a_missing_epic_is_not_found() {
        let store = InMemoryStore::new();
        let org = store
            .insert_organization(NewOrganization::new("Acme").unwrap())
            .unwrap();
        let workflow = store.insert_workflow(new_default(org.id)).unwrap();
        let project = store
            .insert_project(NewProject::new(org.id, "Core", workflow.id).unwrap())
            .unwrap();
        let ticket = store
            .insert_ticket(NewTicket {
                id: TicketId::new(),
                project_id: project.id,
                title: "Ship it".to_string(),
                status: StatusLabel::parse("TODO").unwrap(),
                assignee_id: None,
                reporter_id: UserId::new(),
                epic_id: None,
            })
            .unwrap();

        assert_eq!(
            store.set_ticket_epic(ticket.id, Some(EpicId::new())).unwrap_err(),
            StoreError::NotFound
        );
        assert_eq!(store.set_ticket_epic(ticket.id, None).unwrap().epic_id, None);
    }
}
