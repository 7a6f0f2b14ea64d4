use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use fusionboard_core::{AppError, AppResult, TenantId};
use fusionboard_domain::{CallerIdentity, ProjectId, Role, RoleGrants, TaskId, TaskStatus, UserId};
use tokio::sync::Mutex;

use crate::authorization_service::{AuthorizationService, MembershipRepository};
use crate::project_service::{ProjectRecord, ProjectRepository};

use super::{CreateTaskInput, TaskRecord, TaskRepository, TaskService, UpdateTaskInput};

#[derive(Default)]
struct BoardState {
    projects: Vec<ProjectRecord>,
    tasks: Vec<TaskRecord>,
    tenant_roles: HashMap<(UserId, TenantId), Role>,
    project_roles: HashMap<(UserId, ProjectId), Role>,
}

/// Shared in-memory store backing the task repository, the project
/// repository and the membership resolver.
#[derive(Default)]
struct FakeBoard {
    state: Mutex<BoardState>,
}

impl FakeBoard {
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

    async fn seed_task(&self, project_id: ProjectId, assignee_id: Option<UserId>) -> TaskRecord {
        let task = TaskRecord {
            id: TaskId::new(),
            title: "Seeded task".to_owned(),
            description: None,
            status: TaskStatus::Open,
            project_id,
            assignee_id,
        };

        self.state.lock().await.tasks.push(task.clone());
        task
    }

    async fn enroll(&self, user_id: UserId, project_id: ProjectId, role: Role) {
        self.state
            .lock()
            .await
            .project_roles
            .insert((user_id, project_id), role);
    }

    async fn task(&self, task_id: TaskId) -> Option<TaskRecord> {
        self.state
            .lock()
            .await
            .tasks
            .iter()
            .find(|task| task.id == task_id)
            .cloned()
    }
}

#[async_trait]
impl TaskRepository for FakeBoard {
    async fn find_by_id(&self, task_id: TaskId) -> AppResult<Option<TaskRecord>> {
        Ok(self.task(task_id).await)
    }

    async fn list_by_project(&self, project_id: ProjectId) -> AppResult<Vec<TaskRecord>> {
        Ok(self
            .state
            .lock()
            .await
            .tasks
            .iter()
            .filter(|task| task.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn create(
        &self,
        project_id: ProjectId,
        input: &CreateTaskInput,
    ) -> AppResult<TaskRecord> {
        let task = TaskRecord {
            id: TaskId::new(),
            title: input.title.clone(),
            description: input.description.clone(),
            status: TaskStatus::Open,
            project_id,
            assignee_id: input.assignee_id,
        };

        self.state.lock().await.tasks.push(task.clone());
        Ok(task)
    }

    async fn update(&self, task_id: TaskId, input: &UpdateTaskInput) -> AppResult<()> {
        let mut state = self.state.lock().await;
        for task in &mut state.tasks {
            if task.id == task_id {
                task.title = input.title.clone();
                task.description = input.description.clone();
                task.assignee_id = input.assignee_id;
            }
        }
        Ok(())
    }

    async fn delete(&self, task_id: TaskId) -> AppResult<()> {
        self.state
            .lock()
            .await
            .tasks
            .retain(|task| task.id != task_id);
        Ok(())
    }

    async fn set_status(&self, task_id: TaskId, status: TaskStatus) -> AppResult<()> {
        let mut state = self.state.lock().await;
        for task in &mut state.tasks {
            if task.id == task_id {
                task.status = status;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ProjectRepository for FakeBoard {
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
        _tenant_id: TenantId,
        _user_id: UserId,
    ) -> AppResult<Vec<ProjectRecord>> {
        Ok(Vec::new())
    }

    async fn create(
        &self,
        _name: &str,
        _tenant_id: TenantId,
        _created_by: UserId,
    ) -> AppResult<ProjectRecord> {
        Err(AppError::Internal("not used in task tests".to_owned()))
    }

    async fn rename(&self, _project_id: ProjectId, _name: &str) -> AppResult<()> {
        Ok(())
    }

    async fn delete(&self, _project_id: ProjectId) -> AppResult<()> {
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
        self.enroll(user_id, project_id, role).await;
        Ok(())
    }

    async fn update_member_role(
        &self,
        project_id: ProjectId,
        user_id: UserId,
        role: Role,
    ) -> AppResult<()> {
        self.enroll(user_id, project_id, role).await;
        Ok(())
    }
}

#[async_trait]
impl MembershipRepository for FakeBoard {
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

fn service(board: Arc<FakeBoard>) -> TaskService {
    let authorization_service =
        AuthorizationService::new(Arc::new(RoleGrants::standard()), board.clone());

    TaskService::new(authorization_service, board.clone(), board)
}

fn identity(user_id: UserId, role: Role, tenant_id: TenantId) -> CallerIdentity {
    CallerIdentity::new(user_id, role, tenant_id, false)
}

fn update_input(title: &str) -> UpdateTaskInput {
    UpdateTaskInput {
        title: title.to_owned(),
        description: Some("updated".to_owned()),
        assignee_id: None,
    }
}

#[tokio::test]
async fn enrolled_ba_creates_a_task() {
    let board = Arc::new(FakeBoard::default());
    let tasks = service(board.clone());

    let tenant_id = TenantId::new();
    let ba = UserId::new();
    let project = board.seed_project(tenant_id).await;
    board.enroll(ba, project.id, Role::Ba).await;

    let created = tasks
        .create_task(
            &identity(ba, Role::Ba, tenant_id),
            project.id,
            CreateTaskInput {
                title: "Write acceptance criteria".to_owned(),
                description: None,
                assignee_id: None,
            },
        )
        .await;

    let created = match created {
        Ok(task) => task,
        Err(error) => panic!("task creation failed: {error}"),
    };
    assert_eq!(created.status, TaskStatus::Open);
}

#[tokio::test]
async fn tenant_admin_must_be_enrolled_to_create_tasks() {
    let board = Arc::new(FakeBoard::default());
    let tasks = service(board.clone());

    let tenant_id = TenantId::new();
    let admin = UserId::new();
    let project = board.seed_project(tenant_id).await;

    let result = tasks
        .create_task(
            &identity(admin, Role::TenantAdmin, tenant_id),
            project.id,
            CreateTaskInput {
                title: "Plan sprint".to_owned(),
                description: None,
                assignee_id: None,
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn tenant_admin_lists_tasks_without_enrollment() {
    let board = Arc::new(FakeBoard::default());
    let tasks = service(board.clone());

    let tenant_id = TenantId::new();
    let admin = UserId::new();
    let project = board.seed_project(tenant_id).await;
    board.seed_task(project.id, None).await;
    board.seed_task(project.id, None).await;

    let listed = tasks
        .list_tasks(&identity(admin, Role::TenantAdmin, tenant_id), project.id)
        .await
        .unwrap_or_default();
    assert_eq!(listed.len(), 2);
}

#[tokio::test]
async fn unenrolled_dev_cannot_list_tasks() {
    let board = Arc::new(FakeBoard::default());
    let tasks = service(board.clone());

    let tenant_id = TenantId::new();
    let dev = UserId::new();
    let project = board.seed_project(tenant_id).await;

    let result = tasks
        .list_tasks(&identity(dev, Role::Dev, tenant_id), project.id)
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn cross_tenant_task_reads_as_missing() {
    let board = Arc::new(FakeBoard::default());
    let tasks = service(board.clone());

    let pm = UserId::new();
    let foreign_project = board.seed_project(TenantId::new()).await;
    let task = board.seed_task(foreign_project.id, None).await;
    board.enroll(pm, foreign_project.id, Role::Pm).await;

    let result = tasks
        .update_task(
            &identity(pm, Role::Pm, TenantId::new()),
            task.id,
            update_input("Hijacked"),
        )
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn enrolled_pm_edits_any_task_in_the_project() {
    let board = Arc::new(FakeBoard::default());
    let tasks = service(board.clone());

    let tenant_id = TenantId::new();
    let pm = UserId::new();
    let project = board.seed_project(tenant_id).await;
    let task = board.seed_task(project.id, Some(UserId::new())).await;
    board.enroll(pm, project.id, Role::Pm).await;

    let updated = tasks
        .update_task(&identity(pm, Role::Pm, tenant_id), task.id, update_input("Refined"))
        .await;
    assert_eq!(updated.ok().map(|task| task.title), Some("Refined".to_owned()));
}

#[tokio::test]
async fn assignee_dev_edits_own_task_but_not_others() {
    let board = Arc::new(FakeBoard::default());
    let tasks = service(board.clone());

    let tenant_id = TenantId::new();
    let dev = UserId::new();
    let project = board.seed_project(tenant_id).await;
    let own_task = board.seed_task(project.id, Some(dev)).await;
    let other_task = board.seed_task(project.id, Some(UserId::new())).await;
    board.enroll(dev, project.id, Role::Dev).await;

    let own = tasks
        .update_task(&identity(dev, Role::Dev, tenant_id), own_task.id, update_input("Mine"))
        .await;
    assert!(own.is_ok());

    let other = tasks
        .update_task(
            &identity(dev, Role::Dev, tenant_id),
            other_task.id,
            update_input("Not mine"),
        )
        .await;
    assert!(matches!(other, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn assignee_dev_changes_own_task_status_but_not_others() {
    let board = Arc::new(FakeBoard::default());
    let tasks = service(board.clone());

    let tenant_id = TenantId::new();
    let dev = UserId::new();
    let project = board.seed_project(tenant_id).await;
    let own_task = board.seed_task(project.id, Some(dev)).await;
    let other_task = board.seed_task(project.id, Some(UserId::new())).await;
    board.enroll(dev, project.id, Role::Dev).await;

    let own = tasks
        .change_status(
            &identity(dev, Role::Dev, tenant_id),
            own_task.id,
            TaskStatus::InProgress,
        )
        .await;
    assert_eq!(own.ok().map(|task| task.status), Some(TaskStatus::InProgress));

    let persisted = board.task(own_task.id).await;
    assert_eq!(
        persisted.map(|task| task.status),
        Some(TaskStatus::InProgress)
    );

    let other = tasks
        .change_status(
            &identity(dev, Role::Dev, tenant_id),
            other_task.id,
            TaskStatus::Done,
        )
        .await;
    assert!(matches!(other, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn customer_cannot_change_task_status() {
    let board = Arc::new(FakeBoard::default());
    let tasks = service(board.clone());

    let tenant_id = TenantId::new();
    let customer = UserId::new();
    let project = board.seed_project(tenant_id).await;
    let task = board.seed_task(project.id, None).await;
    board.enroll(customer, project.id, Role::Customer).await;

    let result = tasks
        .change_status(
            &identity(customer, Role::Customer, tenant_id),
            task.id,
            TaskStatus::Done,
        )
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn only_enrolled_pm_deletes_tasks() {
    let board = Arc::new(FakeBoard::default());
    let tasks = service(board.clone());

    let tenant_id = TenantId::new();
    let pm = UserId::new();
    let dev = UserId::new();
    let project = board.seed_project(tenant_id).await;
    let task = board.seed_task(project.id, Some(dev)).await;
    board.enroll(pm, project.id, Role::Pm).await;
    board.enroll(dev, project.id, Role::Dev).await;

    let by_dev = tasks
        .delete_task(&identity(dev, Role::Dev, tenant_id), task.id)
        .await;
    assert!(matches!(by_dev, Err(AppError::Forbidden(_))));

    let by_pm = tasks
        .delete_task(&identity(pm, Role::Pm, tenant_id), task.id)
        .await;
    assert!(by_pm.is_ok());
    assert_eq!(board.task(task.id).await, None);
}

#[tokio::test]
async fn missing_task_reads_as_missing() {
    let board = Arc::new(FakeBoard::default());
    let tasks = service(board.clone());

    let result = tasks
        .delete_task(
            &identity(UserId::new(), Role::Pm, TenantId::new()),
            TaskId::new(),
        )
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}
