//! Task lifecycle ports and application service.
//!
//! Every operation first resolves the owning project so the guard can apply
//! tenant isolation and membership rules; task edits and status changes
//! additionally carry the assignee for the self-service override.

use std::sync::Arc;

use async_trait::async_trait;
use fusionboard_core::{AppError, AppResult, NonEmptyString};
use fusionboard_domain::{CallerIdentity, ProjectId, TaskId, TaskStatus, UserId};

use crate::authorization_service::{Action, ActionTarget, AuthorizationService};
use crate::project_service::{ProjectRecord, ProjectRepository};

#[cfg(test)]
mod tests;

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Task row returned by repository queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    /// Unique task identifier.
    pub id: TaskId,
    /// Short title.
    pub title: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Lifecycle state.
    pub status: TaskStatus,
    /// Project the task belongs to.
    pub project_id: ProjectId,
    /// Assigned user, cleared when that user is deleted.
    pub assignee_id: Option<UserId>,
}

/// Fields accepted when creating a task.
#[derive(Debug, Clone)]
pub struct CreateTaskInput {
    /// Short title.
    pub title: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Initial assignee, if any.
    pub assignee_id: Option<UserId>,
}

/// Fields accepted when editing a task.
#[derive(Debug, Clone)]
pub struct UpdateTaskInput {
    /// Short title.
    pub title: String,
    /// Free-form description.
    pub description: Option<String>,
    /// New assignee, if any.
    pub assignee_id: Option<UserId>,
}

/// Repository port for task persistence.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Finds a task by its unique identifier.
    async fn find_by_id(&self, task_id: TaskId) -> AppResult<Option<TaskRecord>>;

    /// Lists the tasks of a project.
    async fn list_by_project(&self, project_id: ProjectId) -> AppResult<Vec<TaskRecord>>;

    /// Inserts a task row with `OPEN` status.
    async fn create(&self, project_id: ProjectId, input: &CreateTaskInput)
    -> AppResult<TaskRecord>;

    /// Overwrites a task's title, description and assignee.
    async fn update(&self, task_id: TaskId, input: &UpdateTaskInput) -> AppResult<()>;

    /// Deletes a task.
    async fn delete(&self, task_id: TaskId) -> AppResult<()>;

    /// Moves a task to another lifecycle state.
    async fn set_status(&self, task_id: TaskId, status: TaskStatus) -> AppResult<()>;
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Application service for task lifecycle.
#[derive(Clone)]
pub struct TaskService {
    authorization_service: AuthorizationService,
    task_repository: Arc<dyn TaskRepository>,
    project_repository: Arc<dyn ProjectRepository>,
}

impl TaskService {
    /// Creates a new task service.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        task_repository: Arc<dyn TaskRepository>,
        project_repository: Arc<dyn ProjectRepository>,
    ) -> Self {
        Self {
            authorization_service,
            task_repository,
            project_repository,
        }
    }

    /// Creates a task in a project.
    pub async fn create_task(
        &self,
        identity: &CallerIdentity,
        project_id: ProjectId,
        input: CreateTaskInput,
    ) -> AppResult<TaskRecord> {
        let project = self.load_project(project_id).await?;
        self.authorization_service
            .authorize(
                identity,
                Action::TaskCreate,
                ActionTarget::project(project.tenant_id, project.id),
            )
            .await?;

        let title = NonEmptyString::new(input.title.as_str())?;
        self.task_repository
            .create(
                project.id,
                &CreateTaskInput {
                    title: title.into(),
                    ..input
                },
            )
            .await
    }

    /// Lists the tasks of a project.
    pub async fn list_tasks(
        &self,
        identity: &CallerIdentity,
        project_id: ProjectId,
    ) -> AppResult<Vec<TaskRecord>> {
        let project = self.load_project(project_id).await?;
        self.authorization_service
            .authorize(
                identity,
                Action::TaskList,
                ActionTarget::project(project.tenant_id, project.id),
            )
            .await?;

        self.task_repository.list_by_project(project.id).await
    }

    /// Edits a task's title, description and assignee.
    ///
    /// Project managers may edit any task in their project; the current
    /// assignee may edit their own.
    pub async fn update_task(
        &self,
        identity: &CallerIdentity,
        task_id: TaskId,
        input: UpdateTaskInput,
    ) -> AppResult<TaskRecord> {
        let (task, project) = self.load_task(task_id).await?;
        self.authorization_service
            .authorize(
                identity,
                Action::TaskUpdate,
                ActionTarget::project(project.tenant_id, project.id)
                    .with_assignee(task.assignee_id),
            )
            .await?;

        let title = NonEmptyString::new(input.title.as_str())?;
        let input = UpdateTaskInput {
            title: title.into(),
            ..input
        };
        self.task_repository.update(task.id, &input).await?;

        Ok(TaskRecord {
            title: input.title,
            description: input.description,
            assignee_id: input.assignee_id,
            ..task
        })
    }

    /// Deletes a task.
    pub async fn delete_task(&self, identity: &CallerIdentity, task_id: TaskId) -> AppResult<()> {
        let (task, project) = self.load_task(task_id).await?;
        self.authorization_service
            .authorize(
                identity,
                Action::TaskDelete,
                ActionTarget::project(project.tenant_id, project.id),
            )
            .await?;

        self.task_repository.delete(task.id).await
    }

    /// Moves a task to another lifecycle state.
    ///
    /// Coordinating roles act project-wide; developers and testers may move
    /// only tasks assigned to them.
    pub async fn change_status(
        &self,
        identity: &CallerIdentity,
        task_id: TaskId,
        status: TaskStatus,
    ) -> AppResult<TaskRecord> {
        let (task, project) = self.load_task(task_id).await?;
        self.authorization_service
            .authorize(
                identity,
                Action::TaskChangeStatus,
                ActionTarget::project(project.tenant_id, project.id)
                    .with_assignee(task.assignee_id),
            )
            .await?;

        self.task_repository.set_status(task.id, status).await?;

        Ok(TaskRecord { status, ..task })
    }

    async fn load_project(&self, project_id: ProjectId) -> AppResult<ProjectRecord> {
        self.project_repository
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| AppError::NotFound("project not found".to_owned()))
    }

    async fn load_task(&self, task_id: TaskId) -> AppResult<(TaskRecord, ProjectRecord)> {
        let task = self
            .task_repository
            .find_by_id(task_id)
            .await?
            .ok_or_else(|| AppError::NotFound("task not found".to_owned()))?;

        let project = self
            .project_repository
            .find_by_id(task.project_id)
            .await?
            .ok_or_else(|| AppError::NotFound("task not found".to_owned()))?;

        Ok((task, project))
    }
}
