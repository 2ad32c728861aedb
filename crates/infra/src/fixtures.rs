//! Seed helpers for tests.
//!
//! Every helper panics on failure; these run only against a fresh
//! [`InMemoryStore`].

use forgetrack_auth::Role;
use forgetrack_core::{ProjectId, TicketId, UserId, WorkflowId};
use forgetrack_tracking::{
    Comment, Directory, NewComment, NewOrganization, NewProject, NewTicket, NewUser, Organization, Project,
    Ticket, TrackingStore, User,
};
use forgetrack_workflow::{NewWorkflow, Workflow, WorkflowStore, validate_statuses};

use crate::InMemoryStore;

pub const DEFAULT_STATUSES: [&str; 3] = ["TODO", "IN_PROGRESS", "DONE"];

/// An organization with its default workflow.
#[derive(Debug, Clone)]
pub struct Seeded {
    pub organization: Organization,
    pub workflow: Workflow,
}

impl Seeded {
    pub fn organization(store: &InMemoryStore, name: &str) -> Self {
        let organization = store
            .insert_organization(NewOrganization::new(name).expect("organization name"))
            .expect("insert organization");
        let workflow = insert_workflow(store, &organization, "Default", &DEFAULT_STATUSES, true);
        Self {
            organization,
            workflow,
        }
    }

    pub fn super_admin(store: &InMemoryStore) -> User {
        let tag = UserId::new();
        let new = NewUser::new(None, &format!("root-{tag}@platform.test"), "Root", Role::SuperAdmin)
            .expect("super-admin");
        store.insert_user(new).expect("insert super-admin")
    }

    pub fn user(&self, store: &InMemoryStore, role: Role) -> User {
        let tag = UserId::new();
        let new = NewUser::new(
            Some(self.organization.id),
            &format!("{}-{tag}@example.test", role.as_str()),
            role.as_str(),
            role,
        )
        .expect("user");
        store.insert_user(new).expect("insert user")
    }

    /// A project governed by the default workflow.
    pub fn project(&self, store: &InMemoryStore, name: &str) -> Project {
        self.project_governed_by(store, name, self.workflow.id)
    }

    /// A project governed by a fresh, non-default workflow.
    pub fn project_with_workflow(
        &self,
        store: &InMemoryStore,
        name: &str,
        statuses: &[&str],
    ) -> (Project, Workflow) {
        let workflow = insert_workflow(store, &self.organization, name, statuses, false);
        (self.project_governed_by(store, name, workflow.id), workflow)
    }

    fn project_governed_by(&self, store: &InMemoryStore, name: &str, workflow_id: WorkflowId) -> Project {
        let new = NewProject::new(self.organization.id, name, workflow_id).expect("project");
        store.insert_project(new).expect("insert project")
    }

    /// A ticket in the first status of the project's workflow.
    pub fn ticket(&self, store: &InMemoryStore, project_id: ProjectId, reporter_id: UserId) -> Ticket {
        let project = store
            .get_project(project_id)
            .expect("read project")
            .expect("project exists");
        let workflow = store
            .fetch_workflow(project.workflow_id)
            .expect("read workflow")
            .expect("workflow exists");
        let status = workflow.initial_status().cloned().expect("initial status");
        store
            .insert_ticket(NewTicket {
                id: TicketId::new(),
                project_id,
                title: "Seeded ticket".to_string(),
                status,
                assignee_id: None,
                reporter_id,
                epic_id: None,
            })
            .expect("insert ticket")
    }

    pub fn comment(&self, store: &InMemoryStore, ticket_id: TicketId, author_id: UserId) -> Comment {
        let new = NewComment::new(ticket_id, author_id, "Looks good").expect("comment");
        store.insert_comment(new).expect("insert comment")
    }
}

fn insert_workflow(
    store: &InMemoryStore,
    organization: &Organization,
    name: &str,
    statuses: &[&str],
    is_default: bool,
) -> Workflow {
    store
        .insert_workflow(NewWorkflow {
            id: WorkflowId::new(),
            organization_id: organization.id,
            name: name.to_string(),
            statuses: validate_statuses(statuses).expect("statuses"),
            is_default,
        })
        .expect("insert workflow")
}
