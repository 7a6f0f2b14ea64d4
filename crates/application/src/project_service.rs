//! Project lifecycle ports and application service.
//!
//! Project visibility and every mutation go through the authorization
//! guard; tenant-wide roles see all projects of their tenant while
//! member-scoped roles see only projects they are enrolled in.

use std::sync::Arc;

use async_trait::async_trait;
use fusionboard_core::{AppError, AppResult, NonEmptyString, TenantId};
use fusionboard_domain::{CallerIdentity, Permission, ProjectId, Role, UserId};

use crate::authorization_service::{Action, ActionTarget, AuthorizationService, Scope};
use crate::user_service::UserRepository;

#[cfg(test)]
mod tests;

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Project row returned by repository queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRecord {
    /// Unique project identifier.
    pub id: ProjectId,
    /// Project name.
    pub name: String,
    /// Tenant owning the project.
    pub tenant_id: TenantId,
    /// Creator, cleared when that user is deleted.
    pub created_by: Option<UserId>,
}

/// Repository port for project and project membership persistence.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Finds a project by its unique identifier.
    async fn find_by_id(&self, project_id: ProjectId) -> AppResult<Option<ProjectRecord>>;

    /// Lists every project of a tenant.
    async fn list_by_tenant(&self, tenant_id: TenantId) -> AppResult<Vec<ProjectRecord>>;

    /// Lists the tenant's projects where the user holds a membership.
    async fn list_for_member(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<Vec<ProjectRecord>>;

    /// Creates a project and enrolls the creator as its project manager.
    async fn create(
        &self,
        name: &str,
        tenant_id: TenantId,
        created_by: UserId,
    ) -> AppResult<ProjectRecord>;

    /// Renames a project.
    async fn rename(&self, project_id: ProjectId, name: &str) -> AppResult<()>;

    /// Deletes a project together with its memberships and tasks.
    async fn delete(&self, project_id: ProjectId) -> AppResult<()>;

    /// Returns a user's membership role in a project, if enrolled.
    async fn member_role(&self, project_id: ProjectId, user_id: UserId)
    -> AppResult<Option<Role>>;

    /// Enrolls a user into a project with the given role.
    async fn add_member(&self, project_id: ProjectId, user_id: UserId, role: Role)
    -> AppResult<()>;

    /// Changes an existing member's role.
    async fn update_member_role(
        &self,
        project_id: ProjectId,
        user_id: UserId,
        role: Role,
    ) -> AppResult<()>;
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Application service for project lifecycle and membership management.
#[derive(Clone)]
pub struct ProjectService {
    authorization_service: AuthorizationService,
    project_repository: Arc<dyn ProjectRepository>,
    user_repository: Arc<dyn UserRepository>,
}

impl ProjectService {
    /// Creates a new project service.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        project_repository: Arc<dyn ProjectRepository>,
        user_repository: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            authorization_service,
            project_repository,
            user_repository,
        }
    }

    /// Lists projects visible to the caller.
    ///
    /// Tenant-wide roles see every project in their tenant; member-scoped
    /// roles see only projects they are enrolled in. System administrators
    /// hold no project scope at all.
    pub async fn list_projects(&self, identity: &CallerIdentity) -> AppResult<Vec<ProjectRecord>> {
        if identity.is_locked() {
            return Err(AppError::Unauthorized("account is locked".to_owned()));
        }

        match identity.role() {
            Role::SystemAdmin => Err(AppError::Forbidden(
                "system administrators hold no project scope".to_owned(),
            )),
            Role::TenantAdmin | Role::Pm | Role::Ba | Role::Support => {
                self.project_repository
                    .list_by_tenant(identity.tenant_id())
                    .await
            }
            Role::Dev | Role::Qa | Role::Customer => {
                self.project_repository
                    .list_for_member(identity.tenant_id(), identity.user_id())
                    .await
            }
        }
    }

    /// Creates a project in the caller's tenant.
    ///
    /// The creator is auto-enrolled as the project's manager.
    pub async fn create_project(
        &self,
        identity: &CallerIdentity,
        name: &str,
    ) -> AppResult<ProjectRecord> {
        self.authorization_service
            .require_permission(
                identity,
                Permission::TenantProjectCreate,
                Scope::tenant(identity.tenant_id()),
            )
            .await?;

        let name = NonEmptyString::new(name)?;
        self.project_repository
            .create(name.as_str(), identity.tenant_id(), identity.user_id())
            .await
    }

    /// Renames a project.
    pub async fn update_project(
        &self,
        identity: &CallerIdentity,
        project_id: ProjectId,
        name: &str,
    ) -> AppResult<ProjectRecord> {
        let project = self.load_project(project_id).await?;
        self.authorization_service
            .authorize(
                identity,
                Action::ProjectUpdate,
                ActionTarget::project(project.tenant_id, project.id),
            )
            .await?;

        let name = NonEmptyString::new(name)?;
        self.project_repository
            .rename(project.id, name.as_str())
            .await?;

        Ok(ProjectRecord {
            name: name.into(),
            ..project
        })
    }

    /// Deletes a project together with its memberships and tasks.
    pub async fn delete_project(
        &self,
        identity: &CallerIdentity,
        project_id: ProjectId,
    ) -> AppResult<()> {
        let project = self.load_project(project_id).await?;
        self.authorization_service
            .authorize(
                identity,
                Action::ProjectDelete,
                ActionTarget::project(project.tenant_id, project.id),
            )
            .await?;

        self.project_repository.delete(project.id).await
    }

    /// Enrolls a tenant user into a project.
    ///
    /// The invited user must belong to the project's tenant; users outside
    /// it read as missing. Inviting an existing member is a conflict.
    pub async fn invite_member(
        &self,
        identity: &CallerIdentity,
        project_id: ProjectId,
        user_id: UserId,
        role: Role,
    ) -> AppResult<()> {
        let project = self.load_project(project_id).await?;
        self.authorization_service
            .authorize(
                identity,
                Action::ProjectInviteMember,
                ActionTarget::project(project.tenant_id, project.id),
            )
            .await?;

        if role == Role::SystemAdmin {
            return Err(AppError::Validation(
                "role cannot be held within a project".to_owned(),
            ));
        }

        let Some(target) = self.user_repository.find_by_id(user_id).await? else {
            return Err(AppError::NotFound("user not found".to_owned()));
        };

        if target.tenant_id != project.tenant_id {
            return Err(AppError::NotFound("user not found".to_owned()));
        }

        if self
            .project_repository
            .member_role(project.id, target.id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "user is already a member of this project".to_owned(),
            ));
        }

        self.project_repository
            .add_member(project.id, target.id, role)
            .await
    }

    /// Changes an existing project member's role.
    pub async fn change_member_role(
        &self,
        identity: &CallerIdentity,
        project_id: ProjectId,
        user_id: UserId,
        role: Role,
    ) -> AppResult<()> {
        let project = self.load_project(project_id).await?;
        self.authorization_service
            .authorize(
                identity,
                Action::ProjectChangeMemberRole,
                ActionTarget::project(project.tenant_id, project.id),
            )
            .await?;

        if role == Role::SystemAdmin {
            return Err(AppError::Validation(
                "role cannot be held within a project".to_owned(),
            ));
        }

        if self
            .project_repository
            .member_role(project.id, user_id)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound("project member not found".to_owned()));
        }

        self.project_repository
            .update_member_role(project.id, user_id, role)
            .await
    }

    async fn load_project(&self, project_id: ProjectId) -> AppResult<ProjectRecord> {
        self.project_repository
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| AppError::NotFound("project not found".to_owned()))
    }
}
