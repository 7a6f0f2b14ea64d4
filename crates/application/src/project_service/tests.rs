use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use fusionboard_core::{AppError, AppResult, TenantId};
use fusionboard_domain::{CallerIdentity, ProjectId, Role, RoleGrants, UserId};
use tokio::sync::Mutex;

use crate::authorization_service::{AuthorizationService, MembershipRepository};
use crate::user_service::{NewUser, UserRecord, UserRepository};

use super::{ProjectRecord, ProjectRepository, ProjectService};

#[derive(Default)]
struct WorkspaceState {
    users: Vec<UserRecord>,
    projects: Vec<ProjectRecord>,
    tenant_roles: HashMap<(UserId, TenantId), Role>,
    project_roles: HashMap<(UserId, ProjectId), Role>,
}

/// Shared in-memory store backing the project repository, the user
/// repository and the membership resolver for guard-integration tests.
#[derive(Default)]
struct FakeWorkspace {
    state: Mutex<WorkspaceState>,
}

impl FakeWorkspace {
    async fn seed_user(&self, role: Role, tenant_id: TenantId) -> UserRecord {
        let user = UserRecord {
            id: UserId::new(),
            name: format!("{} user", role.as_str()),
            email: format!("{}@{tenant_id}.test", UserId::new()),
            password_hash: "hash:seeded".to_owned(),
            role,
            tenant_id,
            is_locked: false,
        };

        let mut state = self.state.lock().await;
        state.tenant_roles.insert((user.id, tenant_id), role);
        state.users.push(user.clone());
        user
    }

    async fn seed_project(&self, tenant_id: TenantId) -> ProjectRecord {
        let project = ProjectRecord {
            id: ProjectId::new(),
            name: "Seeded Project".to_owned(),
            tenant_id,
            created_by: None,
        };

        self.state.lock().await.projects.push(project.clone());
        project
    }

    async fn enroll(&self, user_id: UserId, project_id: ProjectId, role: Role) {
        self.state
            .lock()
            .await
            .project_roles
            .insert((user_id, project_id), role);
    }
}

#[async_trait]
impl ProjectRepository for FakeWorkspace {
    async fn find_by_id(&self, project_id: ProjectId) -> AppResult<Option<ProjectRecord>> {
        Ok(self
            .state
            .lock()
            .await
            .projects
            .iter()
            .find(|project| project.id == project_id)
            .cloned())
    }

    async fn list_by_tenant(&self, tenant_id: TenantId) -> AppResult<Vec<ProjectRecord>> {
        Ok(self
            .state
            .lock()
            .await
            .projects
            .iter()
            .filter(|project| project.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    async fn list_for_member(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<Vec<ProjectRecord>> {
        let state = self.state.lock().await;
        Ok(state
            .projects
            .iter()
            .filter(|project| {
                project.tenant_id == tenant_id
                    && state.project_roles.contains_key(&(user_id, project.id))
            })
            .cloned()
            .collect())
    }

    async fn create(
        &self,
        name: &str,
        tenant_id: TenantId,
        created_by: UserId,
    ) -> AppResult<ProjectRecord> {
        let project = ProjectRecord {
            id: ProjectId::new(),
            name: name.to_owned(),
            tenant_id,
            created_by: Some(created_by),
        };

        let mut state = self.state.lock().await;
        state
            .project_roles
            .insert((created_by, project.id), Role::Pm);
        state.projects.push(project.clone());
        Ok(project)
    }

    async fn rename(&self, project_id: ProjectId, name: &str) -> AppResult<()> {
        let mut state = self.state.lock().await;
        for project in &mut state.projects {
            if project.id == project_id {
                project.name = name.to_owned();
            }
        }
        Ok(())
    }

    async fn delete(&self, project_id: ProjectId) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.projects.retain(|project| project.id != project_id);
        state
            .project_roles
            .retain(|(_, member_project), _| *member_project != project_id);
        Ok(())
    }

    async fn member_role(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> AppResult<Option<Role>> {
        Ok(self
            .state
            .lock()
            .await
            .project_roles
            .get(&(user_id, project_id))
            .copied())
    }

    async fn add_member(
        &self,
        project_id: ProjectId,
        user_id: UserId,
        role: Role,
    ) -> AppResult<()> {
        self.state
            .lock()
            .await
            .project_roles
            .insert((user_id, project_id), role);
        Ok(())
    }

    async fn update_member_role(
        &self,
        project_id: ProjectId,
        user_id: UserId,
        role: Role,
    ) -> AppResult<()> {
        self.state
            .lock()
            .await
            .project_roles
            .insert((user_id, project_id), role);
        Ok(())
    }
}

#[async_trait]
impl MembershipRepository for FakeWorkspace {
    async fn tenant_role(&self, user_id: UserId, tenant_id: TenantId) -> AppResult<Option<Role>> {
        Ok(self
            .state
            .lock()
            .await
            .tenant_roles
            .get(&(user_id, tenant_id))
            .copied())
    }

    async fn project_role(
        &self,
        user_id: UserId,
        project_id: ProjectId,
    ) -> AppResult<Option<Role>> {
        Ok(self
            .state
            .lock()
            .await
            .project_roles
            .get(&(user_id, project_id))
            .copied())
    }
}

#[async_trait]
impl UserRepository for FakeWorkspace {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserRecord>> {
        Ok(self
            .state
            .lock()
            .await
            .users
            .iter()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserRecord>> {
        Ok(self
            .state
            .lock()
            .await
            .users
            .iter()
            .find(|user| user.id == user_id)
            .cloned())
    }

    async fn list_all(&self) -> AppResult<Vec<UserRecord>> {
        Ok(self.state.lock().await.users.clone())
    }

    async fn list_by_tenant(&self, tenant_id: TenantId) -> AppResult<Vec<UserRecord>> {
        Ok(self
            .state
            .lock()
            .await
            .users
            .iter()
            .filter(|user| user.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    async fn create(&self, user: NewUser) -> AppResult<UserRecord> {
        let record = UserRecord {
            id: UserId::new(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            tenant_id: user.tenant_id,
            is_locked: false,
        };

        self.state.lock().await.users.push(record.clone());
        Ok(record)
    }

    async fn delete(&self, user_id: UserId) -> AppResult<()> {
        self.state
            .lock()
            .await
            .users
            .retain(|user| user.id != user_id);
        Ok(())
    }
}

fn service(workspace: Arc<FakeWorkspace>) -> ProjectService {
    let authorization_service =
        AuthorizationService::new(Arc::new(RoleGrants::standard()), workspace.clone());

    ProjectService::new(authorization_service, workspace.clone(), workspace)
}

fn identity_of(user: &UserRecord) -> CallerIdentity {
    CallerIdentity::new(user.id, user.role, user.tenant_id, user.is_locked)
}

#[tokio::test]
async fn create_project_enrolls_creator_as_project_manager() {
    let workspace = Arc::new(FakeWorkspace::default());
    let projects = service(workspace.clone());

    let pm = workspace.seed_user(Role::Pm, TenantId::new()).await;

    let created = projects.create_project(&identity_of(&pm), "Apollo").await;
    let created = match created {
        Ok(project) => project,
        Err(error) => panic!("project creation failed: {error}"),
    };

    assert_eq!(created.created_by, Some(pm.id));

    let role = workspace.member_role(created.id, pm.id).await;
    assert_eq!(role.ok().flatten(), Some(Role::Pm));
}

#[tokio::test]
async fn dev_cannot_create_projects() {
    let workspace = Arc::new(FakeWorkspace::default());
    let projects = service(workspace.clone());

    let dev = workspace.seed_user(Role::Dev, TenantId::new()).await;

    let result = projects.create_project(&identity_of(&dev), "Apollo").await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn enrolled_pm_can_rename_a_project() {
    let workspace = Arc::new(FakeWorkspace::default());
    let projects = service(workspace.clone());

    let tenant_id = TenantId::new();
    let pm = workspace.seed_user(Role::Pm, tenant_id).await;
    let project = workspace.seed_project(tenant_id).await;
    workspace.enroll(pm.id, project.id, Role::Pm).await;

    let renamed = projects
        .update_project(&identity_of(&pm), project.id, "Apollo Reborn")
        .await;
    assert_eq!(renamed.ok().map(|project| project.name), Some("Apollo Reborn".to_owned()));
}

#[tokio::test]
async fn unenrolled_pm_cannot_rename_a_project() {
    let workspace = Arc::new(FakeWorkspace::default());
    let projects = service(workspace.clone());

    let tenant_id = TenantId::new();
    let pm = workspace.seed_user(Role::Pm, tenant_id).await;
    let project = workspace.seed_project(tenant_id).await;

    let result = projects
        .update_project(&identity_of(&pm), project.id, "Apollo Reborn")
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn cross_tenant_project_reads_as_missing() {
    let workspace = Arc::new(FakeWorkspace::default());
    let projects = service(workspace.clone());

    let pm = workspace.seed_user(Role::Pm, TenantId::new()).await;
    let foreign_project = workspace.seed_project(TenantId::new()).await;
    workspace.enroll(pm.id, foreign_project.id, Role::Pm).await;

    let result = projects
        .update_project(&identity_of(&pm), foreign_project.id, "Hijacked")
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn tenant_admin_must_be_enrolled_to_delete_a_project() {
    let workspace = Arc::new(FakeWorkspace::default());
    let projects = service(workspace.clone());

    let tenant_id = TenantId::new();
    let admin = workspace.seed_user(Role::TenantAdmin, tenant_id).await;
    let project = workspace.seed_project(tenant_id).await;

    let unenrolled = projects.delete_project(&identity_of(&admin), project.id).await;
    assert!(matches!(unenrolled, Err(AppError::Forbidden(_))));

    workspace.enroll(admin.id, project.id, Role::Pm).await;
    let enrolled = projects.delete_project(&identity_of(&admin), project.id).await;
    assert!(enrolled.is_ok());
}

#[tokio::test]
async fn tenant_admin_invites_without_enrollment() {
    let workspace = Arc::new(FakeWorkspace::default());
    let projects = service(workspace.clone());

    let tenant_id = TenantId::new();
    let admin = workspace.seed_user(Role::TenantAdmin, tenant_id).await;
    let dev = workspace.seed_user(Role::Dev, tenant_id).await;
    let project = workspace.seed_project(tenant_id).await;

    let result = projects
        .invite_member(&identity_of(&admin), project.id, dev.id, Role::Dev)
        .await;
    assert!(result.is_ok());

    let role = workspace.member_role(project.id, dev.id).await;
    assert_eq!(role.ok().flatten(), Some(Role::Dev));
}

#[tokio::test]
async fn inviting_a_cross_tenant_user_reads_as_missing() {
    let workspace = Arc::new(FakeWorkspace::default());
    let projects = service(workspace.clone());

    let tenant_id = TenantId::new();
    let admin = workspace.seed_user(Role::TenantAdmin, tenant_id).await;
    let outsider = workspace.seed_user(Role::Dev, TenantId::new()).await;
    let project = workspace.seed_project(tenant_id).await;

    let result = projects
        .invite_member(&identity_of(&admin), project.id, outsider.id, Role::Dev)
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn inviting_an_existing_member_conflicts() {
    let workspace = Arc::new(FakeWorkspace::default());
    let projects = service(workspace.clone());

    let tenant_id = TenantId::new();
    let admin = workspace.seed_user(Role::TenantAdmin, tenant_id).await;
    let dev = workspace.seed_user(Role::Dev, tenant_id).await;
    let project = workspace.seed_project(tenant_id).await;
    workspace.enroll(dev.id, project.id, Role::Dev).await;

    let result = projects
        .invite_member(&identity_of(&admin), project.id, dev.id, Role::Dev)
        .await;
    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn changing_the_role_of_a_non_member_reads_as_missing() {
    let workspace = Arc::new(FakeWorkspace::default());
    let projects = service(workspace.clone());

    let tenant_id = TenantId::new();
    let admin = workspace.seed_user(Role::TenantAdmin, tenant_id).await;
    let dev = workspace.seed_user(Role::Dev, tenant_id).await;
    let project = workspace.seed_project(tenant_id).await;

    let result = projects
        .change_member_role(&identity_of(&admin), project.id, dev.id, Role::Qa)
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn system_admin_cannot_list_projects() {
    let workspace = Arc::new(FakeWorkspace::default());
    let projects = service(workspace.clone());

    let admin = workspace.seed_user(Role::SystemAdmin, TenantId::system()).await;

    let result = projects.list_projects(&identity_of(&admin)).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn member_scoped_roles_see_only_enrolled_projects() {
    let workspace = Arc::new(FakeWorkspace::default());
    let projects = service(workspace.clone());

    let tenant_id = TenantId::new();
    let admin = workspace.seed_user(Role::TenantAdmin, tenant_id).await;
    let dev = workspace.seed_user(Role::Dev, tenant_id).await;
    let enrolled = workspace.seed_project(tenant_id).await;
    workspace.seed_project(tenant_id).await;
    workspace.enroll(dev.id, enrolled.id, Role::Dev).await;

    let dev_view = projects
        .list_projects(&identity_of(&dev))
        .await
        .unwrap_or_default();
    assert_eq!(dev_view.len(), 1);
    assert_eq!(dev_view.first().map(|project| project.id), Some(enrolled.id));

    let admin_view = projects
        .list_projects(&identity_of(&admin))
        .await
        .unwrap_or_default();
    assert_eq!(admin_view.len(), 2);
}
