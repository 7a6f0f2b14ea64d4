//! PostgreSQL-backed membership lookups for the authorization guard.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::PgPool;

use fusionboard_application::MembershipRepository;
use fusionboard_core::{AppError, AppResult, TenantId};
use fusionboard_domain::{ProjectId, Role, UserId};

/// PostgreSQL implementation of the membership lookup port.
///
/// Read-only: membership rows are written by the user and project
/// repositories, which own the enclosing transactions.
#[derive(Clone)]
pub struct PostgresMembershipRepository {
    pool: PgPool,
}

impl PostgresMembershipRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn parse_role(value: Option<String>) -> AppResult<Option<Role>> {
    value
        .map(|role| {
            Role::from_str(&role)
                .map_err(|_| AppError::Internal(format!("stored role '{role}' is invalid")))
        })
        .transpose()
}

#[async_trait]
impl MembershipRepository for PostgresMembershipRepository {
    async fn tenant_role(&self, user_id: UserId, tenant_id: TenantId) -> AppResult<Option<Role>> {
        let role = sqlx::query_scalar::<_, String>(
            r#"
            SELECT role
            FROM tenant_memberships
            WHERE user_id = $1 AND tenant_id = $2
            LIMIT 1
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(tenant_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to look up tenant role: {error}")))?;

        parse_role(role)
    }

    async fn project_role(
        &self,
        user_id: UserId,
        project_id: ProjectId,
    ) -> AppResult<Option<Role>> {
        let role = sqlx::query_scalar::<_, String>(
            r#"
            SELECT role
            FROM project_memberships
            WHERE user_id = $1 AND project_id = $2
            LIMIT 1
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(project_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to look up project role: {error}")))?;

        parse_role(role)
    }
}
