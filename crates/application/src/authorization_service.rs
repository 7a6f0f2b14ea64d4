//! The authorization guard.
//!
//! One enforcement point backs every protected operation. Scoped checks
//! resolve an effective permission set by unioning role grants across the
//! tenant and project memberships named by the request; policy checks
//! evaluate declarative per-action role/membership/ownership rules. Every
//! decision is recomputed from the store on every call, so role changes and
//! account locks apply on the next request.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use fusionboard_core::{AppError, AppResult, TenantId};
use fusionboard_domain::{CallerIdentity, Permission, ProjectId, Role, RoleGrants, UserId};

mod policy;

pub use policy::Action;
use policy::MembershipRule;

/// Repository port for membership lookups.
///
/// Pure read-throughs with no caching; freshness wins over performance so a
/// role change takes effect on the next request.
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// Returns the user's role within a tenant, if provisioned there.
    async fn tenant_role(&self, user_id: UserId, tenant_id: TenantId) -> AppResult<Option<Role>>;

    /// Returns the user's role within a project, if enrolled there.
    async fn project_role(&self, user_id: UserId, project_id: ProjectId)
    -> AppResult<Option<Role>>;
}

/// Optional tenant/project context supplied with a scoped permission check.
///
/// An absent id is a distinguishable branch, not an error: that scope simply
/// contributes nothing to the effective permission set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Scope {
    /// Tenant named by the request, if any.
    pub tenant_id: Option<TenantId>,
    /// Project named by the request, if any.
    pub project_id: Option<ProjectId>,
}

impl Scope {
    /// Returns a scope naming neither tenant nor project.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Returns a tenant-only scope.
    #[must_use]
    pub fn tenant(tenant_id: TenantId) -> Self {
        Self {
            tenant_id: Some(tenant_id),
            project_id: None,
        }
    }

    /// Returns a project-only scope.
    #[must_use]
    pub fn project(project_id: ProjectId) -> Self {
        Self {
            tenant_id: None,
            project_id: Some(project_id),
        }
    }

    /// Returns a scope naming both a tenant and a project.
    #[must_use]
    pub fn tenant_and_project(tenant_id: TenantId, project_id: ProjectId) -> Self {
        Self {
            tenant_id: Some(tenant_id),
            project_id: Some(project_id),
        }
    }
}

/// Snapshot of the resource a policy-gated action is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionTarget {
    tenant_id: TenantId,
    project_id: Option<ProjectId>,
    assignee_id: Option<UserId>,
}

impl ActionTarget {
    /// Creates a target for a project-scoped resource.
    #[must_use]
    pub fn project(tenant_id: TenantId, project_id: ProjectId) -> Self {
        Self {
            tenant_id,
            project_id: Some(project_id),
            assignee_id: None,
        }
    }

    /// Attaches the task assignee considered by ownership overrides.
    #[must_use]
    pub fn with_assignee(mut self, assignee_id: Option<UserId>) -> Self {
        self.assignee_id = assignee_id;
        self
    }
}

/// Application service enforcing authorization for every protected operation.
#[derive(Clone)]
pub struct AuthorizationService {
    role_grants: Arc<RoleGrants>,
    membership_repository: Arc<dyn MembershipRepository>,
}

impl AuthorizationService {
    /// Creates a new authorization service.
    #[must_use]
    pub fn new(
        role_grants: Arc<RoleGrants>,
        membership_repository: Arc<dyn MembershipRepository>,
    ) -> Self {
        Self {
            role_grants,
            membership_repository,
        }
    }

    /// Resolves the user's effective permission set over the supplied scope.
    ///
    /// Unions the grants of the tenant-scope role and the project-scope role,
    /// each included only when the matching membership row exists. Absent
    /// scope ids short-circuit without touching the store; an empty scope
    /// resolves to the empty set. Monotonic: naming an extra scope can only
    /// add permissions, never remove them.
    pub async fn resolve_permissions(
        &self,
        user_id: UserId,
        scope: Scope,
    ) -> AppResult<BTreeSet<Permission>> {
        let mut permissions = BTreeSet::new();

        if let Some(tenant_id) = scope.tenant_id
            && let Some(role) = self
                .membership_repository
                .tenant_role(user_id, tenant_id)
                .await?
        {
            permissions.extend(self.role_grants.grants(role).iter().copied());
        }

        if let Some(project_id) = scope.project_id
            && let Some(role) = self
                .membership_repository
                .project_role(user_id, project_id)
                .await?
        {
            permissions.extend(self.role_grants.grants(role).iter().copied());
        }

        Ok(permissions)
    }

    /// Ensures the caller holds a permission within the supplied scope.
    ///
    /// Locked identities are rejected before any permission logic runs.
    /// System administrators bypass scoped resolution entirely; everyone else
    /// must hold the code in their effective permission set or is denied with
    /// `Forbidden`.
    pub async fn require_permission(
        &self,
        identity: &CallerIdentity,
        permission: Permission,
        scope: Scope,
    ) -> AppResult<()> {
        reject_locked(identity)?;

        if identity.is_system_admin() {
            return Ok(());
        }

        let permissions = self.resolve_permissions(identity.user_id(), scope).await?;
        if permissions.contains(&permission) {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "missing permission '{}'",
            permission.as_str()
        )))
    }

    /// Ensures the caller may perform a policy-gated action on a target.
    ///
    /// Evaluation order: locked rejection, tenant isolation, project
    /// membership per the action's rule, then the role allow-list or the
    /// assignee override. Cross-tenant targets are reported as missing so the
    /// response does not reveal that the resource exists.
    pub async fn authorize(
        &self,
        identity: &CallerIdentity,
        action: Action,
        target: ActionTarget,
    ) -> AppResult<()> {
        reject_locked(identity)?;

        let policy = action.policy();

        if target.tenant_id != identity.tenant_id() {
            return Err(AppError::NotFound(format!(
                "{} not found",
                action.resource_kind()
            )));
        }

        let membership_waived = policy.membership == MembershipRule::RequiredUnlessTenantAdmin
            && identity.role() == Role::TenantAdmin;

        if !membership_waived {
            let Some(project_id) = target.project_id else {
                return Err(AppError::Internal(format!(
                    "action '{}' requires a project-scoped target",
                    action.as_str()
                )));
            };

            let member = self
                .membership_repository
                .project_role(identity.user_id(), project_id)
                .await?;

            if member.is_none() {
                return Err(AppError::Forbidden(
                    "not a member of this project".to_owned(),
                ));
            }
        }

        let role_allowed = policy.allowed_roles.contains(&identity.role());
        let owner_allowed =
            policy.assignee_override && target.assignee_id == Some(identity.user_id());

        if role_allowed || owner_allowed {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "not allowed to perform '{}'",
            action.as_str()
        )))
    }
}

fn reject_locked(identity: &CallerIdentity) -> AppResult<()> {
    if identity.is_locked() {
        return Err(AppError::Unauthorized("account is locked".to_owned()));
    }

    Ok(())
}
