//! Declarative per-action authorization policies.
//!
//! Each project/task operation maps to one record naming the roles allowed
//! to perform it, whether project membership is demanded, and whether the
//! task assignee may act without a role match. The guard evaluates these
//! records with a single engine instead of per-endpoint checks.

use fusionboard_domain::Role;

/// Project and task operations gated by role/ownership policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Rename a project.
    ProjectUpdate,
    /// Delete a project together with its memberships and tasks.
    ProjectDelete,
    /// Enroll a tenant user into a project.
    ProjectInviteMember,
    /// Change an existing project member's role.
    ProjectChangeMemberRole,
    /// Create a task within a project.
    TaskCreate,
    /// List the tasks of a project.
    TaskList,
    /// Edit a task's title, description or assignee.
    TaskUpdate,
    /// Delete a task.
    TaskDelete,
    /// Move a task to another lifecycle state.
    TaskChangeStatus,
}

/// Whether an action demands project membership from the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum MembershipRule {
    /// Membership is demanded from every caller.
    Required,
    /// Tenant administrators act tenant-wide without enrollment.
    RequiredUnlessTenantAdmin,
}

/// Authorization rules for one action.
#[derive(Debug, Clone, Copy)]
pub(super) struct ActionPolicy {
    pub allowed_roles: &'static [Role],
    pub membership: MembershipRule,
    pub assignee_override: bool,
}

impl Action {
    /// Returns the policy record for this action.
    pub(super) fn policy(self) -> ActionPolicy {
        match self {
            Self::ProjectUpdate => ActionPolicy {
                allowed_roles: &[Role::Pm],
                membership: MembershipRule::Required,
                assignee_override: false,
            },
            Self::ProjectDelete => ActionPolicy {
                allowed_roles: &[Role::Pm, Role::TenantAdmin],
                membership: MembershipRule::Required,
                assignee_override: false,
            },
            Self::ProjectInviteMember | Self::ProjectChangeMemberRole => ActionPolicy {
                allowed_roles: &[Role::Pm, Role::TenantAdmin],
                membership: MembershipRule::RequiredUnlessTenantAdmin,
                assignee_override: false,
            },
            Self::TaskCreate => ActionPolicy {
                allowed_roles: &[Role::Pm, Role::Ba, Role::Support, Role::TenantAdmin],
                membership: MembershipRule::Required,
                assignee_override: false,
            },
            Self::TaskList => ActionPolicy {
                allowed_roles: &[
                    Role::TenantAdmin,
                    Role::Pm,
                    Role::Ba,
                    Role::Support,
                    Role::Dev,
                    Role::Qa,
                    Role::Customer,
                ],
                membership: MembershipRule::RequiredUnlessTenantAdmin,
                assignee_override: false,
            },
            Self::TaskUpdate => ActionPolicy {
                allowed_roles: &[Role::Pm],
                membership: MembershipRule::Required,
                assignee_override: true,
            },
            Self::TaskDelete => ActionPolicy {
                allowed_roles: &[Role::Pm],
                membership: MembershipRule::Required,
                assignee_override: false,
            },
            Self::TaskChangeStatus => ActionPolicy {
                allowed_roles: &[Role::Pm, Role::Ba, Role::Support, Role::TenantAdmin],
                membership: MembershipRule::RequiredUnlessTenantAdmin,
                assignee_override: true,
            },
        }
    }

    /// Returns a stable name for denial messages and logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProjectUpdate => "project.update",
            Self::ProjectDelete => "project.delete",
            Self::ProjectInviteMember => "project.invite_member",
            Self::ProjectChangeMemberRole => "project.change_member_role",
            Self::TaskCreate => "task.create",
            Self::TaskList => "task.list",
            Self::TaskUpdate => "task.update",
            Self::TaskDelete => "task.delete",
            Self::TaskChangeStatus => "task.change_status",
        }
    }

    /// Returns the resource kind used in existence-masking messages.
    ///
    /// Matches what the caller addressed: project-scoped actions mask the
    /// project, task-addressed actions mask the task.
    pub(super) fn resource_kind(self) -> &'static str {
        match self {
            Self::ProjectUpdate
            | Self::ProjectDelete
            | Self::ProjectInviteMember
            | Self::ProjectChangeMemberRole
            | Self::TaskCreate
            | Self::TaskList => "project",
            Self::TaskUpdate | Self::TaskDelete | Self::TaskChangeStatus => "task",
        }
    }
}
