//! PostgreSQL-backed user repository.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::PgPool;

use fusionboard_application::{NewUser, UserRecord, UserRepository};
use fusionboard_core::{AppError, AppResult, TenantId};
use fusionboard_domain::{Role, UserId};

/// PostgreSQL implementation of the user repository port.
#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: uuid::Uuid,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    tenant_id: uuid::Uuid,
    is_locked: bool,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::from_str(&row.role)
            .map_err(|_| AppError::Internal(format!("stored role '{}' is invalid", row.role)))?;

        Ok(Self {
            id: UserId::from_uuid(row.id),
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            role,
            tenant_id: TenantId::from_uuid(row.tenant_id),
            is_locked: row.is_locked,
        })
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, password_hash, role, tenant_id, is_locked
            FROM users
            WHERE LOWER(email) = LOWER($1)
            LIMIT 1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find user by email: {error}")))?;

        row.map(UserRecord::try_from).transpose()
    }

    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, password_hash, role, tenant_id, is_locked
            FROM users
            WHERE id = $1
            LIMIT 1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find user by id: {error}")))?;

        row.map(UserRecord::try_from).transpose()
    }

    async fn list_all(&self) -> AppResult<Vec<UserRecord>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, password_hash, role, tenant_id, is_locked
            FROM users
            ORDER BY email
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list users: {error}")))?;

        rows.into_iter().map(UserRecord::try_from).collect()
    }

    async fn list_by_tenant(&self, tenant_id: TenantId) -> AppResult<Vec<UserRecord>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, password_hash, role, tenant_id, is_locked
            FROM users
            WHERE tenant_id = $1
            ORDER BY email
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list tenant users: {error}")))?;

        rows.into_iter().map(UserRecord::try_from).collect()
    }

    async fn create(&self, user: NewUser) -> AppResult<UserRecord> {
        let user_id = UserId::new();

        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| AppError::Internal(format!("failed to begin transaction: {error}")))?;

        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, tenant_id, is_locked)
            VALUES ($1, $2, $3, $4, $5, $6, FALSE)
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.tenant_id.as_uuid())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to create user: {error}")))?;

        sqlx::query(
            r#"
            INSERT INTO tenant_memberships (user_id, tenant_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, tenant_id) DO NOTHING
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(user.tenant_id.as_uuid())
        .bind(user.role.as_str())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to create tenant membership: {error}"))
        })?;

        transaction
            .commit()
            .await
            .map_err(|error| AppError::Internal(format!("failed to commit transaction: {error}")))?;

        Ok(UserRecord {
            id: user_id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            tenant_id: user.tenant_id,
            is_locked: false,
        })
    }

    async fn delete(&self, user_id: UserId) -> AppResult<()> {
        // Memberships cascade and task assignments clear via schema rules.
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to delete user: {error}")))?;

        Ok(())
    }
}
