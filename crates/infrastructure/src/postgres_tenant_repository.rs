//! PostgreSQL-backed tenant repository.

use async_trait::async_trait;
use sqlx::PgPool;

use fusionboard_application::TenantRepository;
use fusionboard_core::{AppError, AppResult, TenantId};

/// PostgreSQL implementation of the tenant repository port.
#[derive(Clone)]
pub struct PostgresTenantRepository {
    pool: PgPool,
}

impl PostgresTenantRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantRepository for PostgresTenantRepository {
    async fn create(&self, name: &str) -> AppResult<TenantId> {
        let tenant_id = TenantId::new();

        sqlx::query("INSERT INTO tenants (id, name) VALUES ($1, $2)")
            .bind(tenant_id.as_uuid())
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to create tenant: {error}")))?;

        Ok(tenant_id)
    }

    async fn ensure_system_tenant(&self) -> AppResult<TenantId> {
        let tenant_id = TenantId::system();

        sqlx::query(
            r#"
            INSERT INTO tenants (id, name)
            VALUES ($1, 'System')
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(tenant_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to ensure system tenant exists: {error}"))
        })?;

        Ok(tenant_id)
    }
}
