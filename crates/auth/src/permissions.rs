//! Operation catalogue and the role grant table.
//!
//! Grants are an explicit allow-set per operation. Anything not listed is
//! denied, including operations a custom table simply leaves out.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::{Serialize, Serializer};

use crate::Role;

/// Kind of resource an operation is checked against.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// No owning tenant (platform-level operations such as creating an organization).
    Platform,
    Organization,
    User,
    Project,
    Workflow,
    Ticket,
    Epic,
    Comment,
    ActivityLog,
}

impl ResourceKind {
    /// Cross-tenant denial on these kinds is reported as not-found so that
    /// a sibling tenant's resources cannot be probed for existence.
    pub fn is_identity_sensitive(&self) -> bool {
        matches!(
            self,
            ResourceKind::Organization
                | ResourceKind::User
                | ResourceKind::Workflow
                | ResourceKind::ActivityLog
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Platform => "platform",
            ResourceKind::Organization => "organization",
            ResourceKind::User => "user",
            ResourceKind::Project => "project",
            ResourceKind::Workflow => "workflow",
            ResourceKind::Ticket => "ticket",
            ResourceKind::Epic => "epic",
            ResourceKind::Comment => "comment",
            ResourceKind::ActivityLog => "activity log",
        }
    }
}

macro_rules! operations {
    ($($variant:ident => ($name:literal, $target:ident)),+ $(,)?) => {
        /// Every governed operation.
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Operation {
            $($variant),+
        }

        impl Operation {
            pub const ALL: &'static [Operation] = &[$(Operation::$variant),+];

            /// Stable dotted name, e.g. `ticket.delete`.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Operation::$variant => $name),+
                }
            }

            /// Kind of the resource the operation is authorized against.
            /// Creation is checked against the parent the new entity lands in.
            pub fn target_kind(&self) -> ResourceKind {
                match self {
                    $(Operation::$variant => ResourceKind::$target),+
                }
            }
        }
    };
}

operations! {
    OrganizationCreate => ("organization.create", Platform),
    OrganizationRead => ("organization.read", Organization),
    OrganizationUpdate => ("organization.update", Organization),
    OrganizationDelete => ("organization.delete", Organization),

    UserCreate => ("user.create", Organization),
    UserRead => ("user.read", User),
    UserUpdate => ("user.update", User),
    UserDelete => ("user.delete", User),

    ProjectCreate => ("project.create", Organization),
    ProjectRead => ("project.read", Project),
    ProjectUpdate => ("project.update", Project),
    ProjectArchive => ("project.archive", Project),

    WorkflowCreate => ("workflow.create", Organization),
    WorkflowCreateDefault => ("workflow.create_default", Organization),
    WorkflowRead => ("workflow.read", Workflow),
    WorkflowUpdate => ("workflow.update", Workflow),
    WorkflowDelete => ("workflow.delete", Workflow),

    TicketCreate => ("ticket.create", Project),
    TicketRead => ("ticket.read", Ticket),
    TicketUpdate => ("ticket.update", Ticket),
    TicketChangeStatus => ("ticket.change_status", Ticket),
    TicketMove => ("ticket.move", Ticket),
    TicketDelete => ("ticket.delete", Ticket),

    EpicCreate => ("epic.create", Organization),
    EpicRead => ("epic.read", Epic),
    EpicUpdate => ("epic.update", Epic),
    EpicDelete => ("epic.delete", Epic),

    CommentCreate => ("comment.create", Ticket),
    CommentRead => ("comment.read", Comment),
    CommentUpdate => ("comment.update", Comment),
    CommentDelete => ("comment.delete", Comment),

    ActivityLogRead => ("activity_log.read", ActivityLog),
}

impl core::fmt::Display for Operation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Operation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

const SA: Role = Role::SuperAdmin;
const ADM: Role = Role::Admin;
const PM: Role = Role::ProjectManager;
const WR: Role = Role::WriteAccess;
const RD: Role = Role::ReadAccess;

const EVERYONE: &[Role] = &[SA, ADM, PM, WR, RD];
const WRITERS: &[Role] = &[SA, ADM, PM, WR];
const MANAGERS: &[Role] = &[SA, ADM, PM];
const ADMINS: &[Role] = &[SA, ADM];
const PLATFORM: &[Role] = &[SA];

/// The standard grant table.
///
/// Note the places where authority is not a simple ladder: ticket deletion
/// excludes project managers while project/workflow updates include them.
pub const STANDARD_GRANTS: &[(Operation, &[Role])] = &[
    (Operation::OrganizationCreate, PLATFORM),
    (Operation::OrganizationRead, EVERYONE),
    (Operation::OrganizationUpdate, ADMINS),
    (Operation::OrganizationDelete, PLATFORM),
    (Operation::UserCreate, ADMINS),
    (Operation::UserRead, EVERYONE),
    (Operation::UserUpdate, ADMINS),
    (Operation::UserDelete, ADMINS),
    (Operation::ProjectCreate, MANAGERS),
    (Operation::ProjectRead, EVERYONE),
    (Operation::ProjectUpdate, MANAGERS),
    (Operation::ProjectArchive, ADMINS),
    (Operation::WorkflowCreate, ADMINS),
    (Operation::WorkflowCreateDefault, ADMINS),
    (Operation::WorkflowRead, EVERYONE),
    (Operation::WorkflowUpdate, MANAGERS),
    (Operation::WorkflowDelete, ADMINS),
    (Operation::TicketCreate, WRITERS),
    (Operation::TicketRead, EVERYONE),
    (Operation::TicketUpdate, WRITERS),
    (Operation::TicketChangeStatus, WRITERS),
    (Operation::TicketMove, WRITERS),
    (Operation::TicketDelete, ADMINS),
    (Operation::EpicCreate, WRITERS),
    (Operation::EpicRead, EVERYONE),
    (Operation::EpicUpdate, WRITERS),
    (Operation::EpicDelete, MANAGERS),
    (Operation::CommentCreate, WRITERS),
    (Operation::CommentRead, EVERYONE),
    (Operation::CommentUpdate, WRITERS),
    (Operation::CommentDelete, WRITERS),
    (Operation::ActivityLogRead, MANAGERS),
];

static STANDARD: LazyLock<GrantTable> = LazyLock::new(|| GrantTable::from_grants(STANDARD_GRANTS));

/// Lookup form of a grant list.
#[derive(Debug, Clone, Default)]
pub struct GrantTable {
    grants: HashMap<Operation, Vec<Role>>,
}

impl GrantTable {
    pub fn standard() -> &'static GrantTable {
        &STANDARD
    }

    pub fn from_grants(grants: &[(Operation, &[Role])]) -> Self {
        let mut map: HashMap<Operation, Vec<Role>> = HashMap::new();
        for (op, roles) in grants {
            let entry = map.entry(*op).or_default();
            for role in *roles {
                if !entry.contains(role) {
                    entry.push(*role);
                }
            }
        }
        Self { grants: map }
    }

    /// `true` only when `operation` lists `role`; unknown operations deny.
    pub fn is_allowed(&self, role: Role, operation: Operation) -> bool {
        self.grants
            .get(&operation)
            .is_some_and(|roles| roles.contains(&role))
    }

    /// Roles granted `operation` (empty when the operation is not listed).
    pub fn roles_for(&self, operation: Operation) -> &[Role] {
        self.grants.get(&operation).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Standard-table check: pure and total over `Role × Operation`.
pub fn is_allowed(role: Role, operation: Operation) -> bool {
    GrantTable::standard().is_allowed(role, operation)
}
