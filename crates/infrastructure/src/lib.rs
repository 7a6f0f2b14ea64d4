//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod argon2_password_hasher;
mod postgres_membership_repository;
mod postgres_project_repository;
mod postgres_task_repository;
mod postgres_tenant_repository;
mod postgres_user_repository;

pub use argon2_password_hasher::Argon2PasswordHasher;
pub use postgres_membership_repository::PostgresMembershipRepository;
pub use postgres_project_repository::PostgresProjectRepository;
pub use postgres_task_repository::PostgresTaskRepository;
pub use postgres_tenant_repository::PostgresTenantRepository;
pub use postgres_user_repository::PostgresUserRepository;
