//! Roles, permission codes and the static role-to-permission grant table.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use fusionboard_core::AppError;
use serde::{Deserialize, Serialize};

/// Roles recognized by authorization policy.
///
/// The universe is fixed at compile time; membership rows and identity
/// snapshots never carry a role outside this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Platform operator outside every tenant boundary.
    SystemAdmin,
    /// Administrator of a single tenant.
    TenantAdmin,
    /// Project manager.
    Pm,
    /// Business analyst.
    Ba,
    /// Support staff.
    Support,
    /// Developer.
    Dev,
    /// Quality assurance.
    Qa,
    /// External customer contact.
    Customer,
}

impl Role {
    /// Returns a stable storage value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SystemAdmin => "SYSTEM_ADMIN",
            Self::TenantAdmin => "TENANT_ADMIN",
            Self::Pm => "PM",
            Self::Ba => "BA",
            Self::Support => "SUPPORT",
            Self::Dev => "DEV",
            Self::Qa => "QA",
            Self::Customer => "CUSTOMER",
        }
    }

    /// Returns all known roles.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Role] = &[
            Role::SystemAdmin,
            Role::TenantAdmin,
            Role::Pm,
            Role::Ba,
            Role::Support,
            Role::Dev,
            Role::Qa,
            Role::Customer,
        ];

        ALL
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "SYSTEM_ADMIN" => Ok(Self::SystemAdmin),
            "TENANT_ADMIN" => Ok(Self::TenantAdmin),
            "PM" => Ok(Self::Pm),
            "BA" => Ok(Self::Ba),
            "SUPPORT" => Ok(Self::Support),
            "DEV" => Ok(Self::Dev),
            "QA" => Ok(Self::Qa),
            "CUSTOMER" => Ok(Self::Customer),
            _ => Err(AppError::Validation(format!("unknown role value '{value}'"))),
        }
    }
}

/// Permissions enforced by scoped authorization checks.
///
/// Codes are opaque action-on-resource names compared by exact equality; the
/// same code means the same capability in every scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Allows provisioning users into a tenant.
    TenantUserInvite,
    /// Allows removing users from a tenant.
    TenantUserRemove,
    /// Allows creating projects within a tenant.
    TenantProjectCreate,
    /// Allows viewing everything within a tenant.
    TenantViewAll,
    /// Allows viewing a project.
    ProjectView,
    /// Allows viewing tasks in a project.
    ProjectTaskView,
    /// Allows creating tasks in a project.
    ProjectTaskCreate,
    /// Allows updating tasks in a project.
    ProjectTaskUpdate,
    /// Allows deleting tasks in a project.
    ProjectTaskDelete,
    /// Allows assigning tasks to project members.
    ProjectTaskAssign,
    /// Allows commenting on behalf of a customer.
    ProjectCustomerComment,
}

impl Permission {
    /// Returns a stable storage value for this permission.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TenantUserInvite => "tenant.user.invite",
            Self::TenantUserRemove => "tenant.user.remove",
            Self::TenantProjectCreate => "tenant.project.create",
            Self::TenantViewAll => "tenant.view_all",
            Self::ProjectView => "project.view",
            Self::ProjectTaskView => "project.task.view",
            Self::ProjectTaskCreate => "project.task.create",
            Self::ProjectTaskUpdate => "project.task.update",
            Self::ProjectTaskDelete => "project.task.delete",
            Self::ProjectTaskAssign => "project.task.assign",
            Self::ProjectCustomerComment => "project.customer.comment",
        }
    }

    /// Returns all known permissions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Permission] = &[
            Permission::TenantUserInvite,
            Permission::TenantUserRemove,
            Permission::TenantProjectCreate,
            Permission::TenantViewAll,
            Permission::ProjectView,
            Permission::ProjectTaskView,
            Permission::ProjectTaskCreate,
            Permission::ProjectTaskUpdate,
            Permission::ProjectTaskDelete,
            Permission::ProjectTaskAssign,
            Permission::ProjectCustomerComment,
        ];

        ALL
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "tenant.user.invite" => Ok(Self::TenantUserInvite),
            "tenant.user.remove" => Ok(Self::TenantUserRemove),
            "tenant.project.create" => Ok(Self::TenantProjectCreate),
            "tenant.view_all" => Ok(Self::TenantViewAll),
            "project.view" => Ok(Self::ProjectView),
            "project.task.view" => Ok(Self::ProjectTaskView),
            "project.task.create" => Ok(Self::ProjectTaskCreate),
            "project.task.update" => Ok(Self::ProjectTaskUpdate),
            "project.task.delete" => Ok(Self::ProjectTaskDelete),
            "project.task.assign" => Ok(Self::ProjectTaskAssign),
            "project.customer.comment" => Ok(Self::ProjectCustomerComment),
            _ => Err(AppError::Validation(format!(
                "unknown permission value '{value}'"
            ))),
        }
    }
}

static EMPTY_GRANTS: BTreeSet<Permission> = BTreeSet::new();

/// Immutable role-to-permission grant table.
///
/// Built once at process start and shared by reference; never mutated at
/// runtime. Grants are flat sets, so unioning them across scopes is
/// commutative and order-independent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleGrants {
    grants: BTreeMap<Role, BTreeSet<Permission>>,
}

impl RoleGrants {
    /// Returns the standard grant table.
    ///
    /// Only roles that participate in scoped authorization have an entry.
    /// `SYSTEM_ADMIN`, `SUPPORT` and `QA` are deliberately absent and resolve
    /// to the empty set; system administrators are handled by the guard's
    /// bypass rule instead.
    #[must_use]
    pub fn standard() -> Self {
        let grants = BTreeMap::from([
            (
                Role::TenantAdmin,
                BTreeSet::from([
                    Permission::TenantUserInvite,
                    Permission::TenantUserRemove,
                    Permission::TenantProjectCreate,
                    Permission::TenantViewAll,
                    Permission::ProjectView,
                    Permission::ProjectTaskView,
                    Permission::ProjectTaskCreate,
                    Permission::ProjectTaskUpdate,
                    Permission::ProjectTaskDelete,
                    Permission::ProjectTaskAssign,
                ]),
            ),
            (
                Role::Pm,
                BTreeSet::from([
                    Permission::TenantProjectCreate,
                    Permission::ProjectView,
                    Permission::ProjectTaskView,
                    Permission::ProjectTaskCreate,
                    Permission::ProjectTaskUpdate,
                    Permission::ProjectTaskDelete,
                    Permission::ProjectTaskAssign,
                ]),
            ),
            (
                Role::Ba,
                BTreeSet::from([
                    Permission::ProjectView,
                    Permission::ProjectTaskView,
                    Permission::ProjectTaskCreate,
                    Permission::ProjectTaskUpdate,
                    Permission::ProjectCustomerComment,
                ]),
            ),
            (
                Role::Dev,
                BTreeSet::from([
                    Permission::ProjectView,
                    Permission::ProjectTaskView,
                    Permission::ProjectTaskUpdate,
                ]),
            ),
            (
                Role::Customer,
                BTreeSet::from([
                    Permission::ProjectView,
                    Permission::ProjectTaskView,
                    Permission::ProjectCustomerComment,
                ]),
            ),
        ]);

        Self { grants }
    }

    /// Returns the permission set granted to a role.
    ///
    /// Total over the role universe: roles without an entry yield the empty
    /// set, never an error.
    #[must_use]
    pub fn grants(&self, role: Role) -> &BTreeSet<Permission> {
        self.grants.get(&role).unwrap_or(&EMPTY_GRANTS)
    }
}
