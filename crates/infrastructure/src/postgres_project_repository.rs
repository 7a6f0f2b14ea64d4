//! PostgreSQL-backed project and project membership repository.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::PgPool;

use fusionboard_application::{ProjectRecord, ProjectRepository};
use fusionboard_core::{AppError, AppResult, TenantId};
use fusionboard_domain::{ProjectId, Role, UserId};

/// PostgreSQL implementation of the project repository port.
#[derive(Clone)]
pub struct PostgresProjectRepository {
    pool: PgPool,
}

impl PostgresProjectRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProjectRow {
    id: uuid::Uuid,
    name: String,
    tenant_id: uuid::Uuid,
    created_by: Option<uuid::Uuid>,
}

impl From<ProjectRow> for ProjectRecord {
    fn from(row: ProjectRow) -> Self {
        Self {
            id: ProjectId::from_uuid(row.id),
            name: row.name,
            tenant_id: TenantId::from_uuid(row.tenant_id),
            created_by: row.created_by.map(UserId::from_uuid),
        }
    }
}

#[async_trait]
impl ProjectRepository for PostgresProjectRepository {
    async fn find_by_id(&self, project_id: ProjectId) -> AppResult<Option<ProjectRecord>> {
        let row = sqlx::query_as::<_, ProjectRow>(
            r#"
            SELECT id, name, tenant_id, created_by
            FROM projects
            WHERE id = $1
            LIMIT 1
            "#,
        )
        .bind(project_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find project: {error}")))?;

        Ok(row.map(ProjectRecord::from))
    }

    async fn list_by_tenant(&self, tenant_id: TenantId) -> AppResult<Vec<ProjectRecord>> {
        let rows = sqlx::query_as::<_, ProjectRow>(
            r#"
            SELECT id, name, tenant_id, created_by
            FROM projects
            WHERE tenant_id = $1
            ORDER BY name
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list tenant projects: {error}")))?;

        Ok(rows.into_iter().map(ProjectRecord::from).collect())
    }

    async fn list_for_member(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<Vec<ProjectRecord>> {
        let rows = sqlx::query_as::<_, ProjectRow>(
            r#"
            SELECT p.id, p.name, p.tenant_id, p.created_by
            FROM projects p
            INNER JOIN project_memberships m ON m.project_id = p.id
            WHERE p.tenant_id = $1 AND m.user_id = $2
            ORDER BY p.name
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list member projects: {error}")))?;

        Ok(rows.into_iter().map(ProjectRecord::from).collect())
    }

    async fn create(
        &self,
        name: &str,
        tenant_id: TenantId,
        created_by: UserId,
    ) -> AppResult<ProjectRecord> {
        let project_id = ProjectId::new();

        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| AppError::Internal(format!("failed to begin transaction: {error}")))?;

        sqlx::query(
            r#"
            INSERT INTO projects (id, name, tenant_id, created_by)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(project_id.as_uuid())
        .bind(name)
        .bind(tenant_id.as_uuid())
        .bind(created_by.as_uuid())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to create project: {error}")))?;

        sqlx::query(
            r#"
            INSERT INTO project_memberships (user_id, project_id, role)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(created_by.as_uuid())
        .bind(project_id.as_uuid())
        .bind(Role::Pm.as_str())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to enroll creator: {error}")))?;

        transaction
            .commit()
            .await
            .map_err(|error| AppError::Internal(format!("failed to commit transaction: {error}")))?;

        Ok(ProjectRecord {
            id: project_id,
            name: name.to_owned(),
            tenant_id,
            created_by: Some(created_by),
        })
    }

    async fn rename(&self, project_id: ProjectId, name: &str) -> AppResult<()> {
        sqlx::query("UPDATE projects SET name = $2 WHERE id = $1")
            .bind(project_id.as_uuid())
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to rename project: {error}")))?;

        Ok(())
    }

    async fn delete(&self, project_id: ProjectId) -> AppResult<()> {
        // Memberships and tasks cascade via schema rules.
        sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(project_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to delete project: {error}")))?;

        Ok(())
    }

    async fn member_role(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> AppResult<Option<Role>> {
        let role = sqlx::query_scalar::<_, String>(
            r#"
            SELECT role
            FROM project_memberships
            WHERE project_id = $1 AND user_id = $2
            LIMIT 1
            "#,
        )
        .bind(project_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to look up member role: {error}")))?;

        role.map(|value| {
            Role::from_str(&value)
                .map_err(|_| AppError::Internal(format!("stored role '{value}' is invalid")))
        })
        .transpose()
    }

    async fn add_member(
        &self,
        project_id: ProjectId,
        user_id: UserId,
        role: Role,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO project_memberships (user_id, project_id, role)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(project_id.as_uuid())
        .bind(role.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to add project member: {error}")))?;

        Ok(())
    }

    async fn update_member_role(
        &self,
        project_id: ProjectId,
        user_id: UserId,
        role: Role,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE project_memberships
            SET role = $3
            WHERE project_id = $1 AND user_id = $2
            "#,
        )
        .bind(project_id.as_uuid())
        .bind(user_id.as_uuid())
        .bind(role.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update member role: {error}")))?;

        Ok(())
    }
}
