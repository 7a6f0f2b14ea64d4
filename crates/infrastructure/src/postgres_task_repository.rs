//! PostgreSQL-backed task repository.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::PgPool;

use fusionboard_application::{CreateTaskInput, TaskRecord, TaskRepository, UpdateTaskInput};
use fusionboard_core::{AppError, AppResult};
use fusionboard_domain::{ProjectId, TaskId, TaskStatus, UserId};

/// PostgreSQL implementation of the task repository port.
#[derive(Clone)]
pub struct PostgresTaskRepository {
    pool: PgPool,
}

impl PostgresTaskRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TaskRow {
    id: uuid::Uuid,
    title: String,
    description: Option<String>,
    status: String,
    project_id: uuid::Uuid,
    assignee_id: Option<uuid::Uuid>,
}

impl TryFrom<TaskRow> for TaskRecord {
    type Error = AppError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let status = TaskStatus::from_str(&row.status).map_err(|_| {
            AppError::Internal(format!("stored task status '{}' is invalid", row.status))
        })?;

        Ok(Self {
            id: TaskId::from_uuid(row.id),
            title: row.title,
            description: row.description,
            status,
            project_id: ProjectId::from_uuid(row.project_id),
            assignee_id: row.assignee_id.map(UserId::from_uuid),
        })
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn find_by_id(&self, task_id: TaskId) -> AppResult<Option<TaskRecord>> {
        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT id, title, description, status, project_id, assignee_id
            FROM tasks
            WHERE id = $1
            LIMIT 1
            "#,
        )
        .bind(task_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find task: {error}")))?;

        row.map(TaskRecord::try_from).transpose()
    }

    async fn list_by_project(&self, project_id: ProjectId) -> AppResult<Vec<TaskRecord>> {
        let rows = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT id, title, description, status, project_id, assignee_id
            FROM tasks
            WHERE project_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(project_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list project tasks: {error}")))?;

        rows.into_iter().map(TaskRecord::try_from).collect()
    }

    async fn create(
        &self,
        project_id: ProjectId,
        input: &CreateTaskInput,
    ) -> AppResult<TaskRecord> {
        let task_id = TaskId::new();

        sqlx::query(
            r#"
            INSERT INTO tasks (id, title, description, status, project_id, assignee_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(task_id.as_uuid())
        .bind(&input.title)
        .bind(&input.description)
        .bind(TaskStatus::Open.as_str())
        .bind(project_id.as_uuid())
        .bind(input.assignee_id.map(|assignee| assignee.as_uuid()))
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to create task: {error}")))?;

        Ok(TaskRecord {
            id: task_id,
            title: input.title.clone(),
            description: input.description.clone(),
            status: TaskStatus::Open,
            project_id,
            assignee_id: input.assignee_id,
        })
    }

    async fn update(&self, task_id: TaskId, input: &UpdateTaskInput) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE tasks
            SET title = $2, description = $3, assignee_id = $4
            WHERE id = $1
            "#,
        )
        .bind(task_id.as_uuid())
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.assignee_id.map(|assignee| assignee.as_uuid()))
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update task: {error}")))?;

        Ok(())
    }

    async fn delete(&self, task_id: TaskId) -> AppResult<()> {
        sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(task_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to delete task: {error}")))?;

        Ok(())
    }

    async fn set_status(&self, task_id: TaskId, status: TaskStatus) -> AppResult<()> {
        sqlx::query("UPDATE tasks SET status = $2 WHERE id = $1")
            .bind(task_id.as_uuid())
            .bind(status.as_str())
            .execute(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to update task status: {error}")))?;

        Ok(())
    }
}
