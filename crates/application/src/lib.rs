//! Application services and ports for Fusionboard.

#![forbid(unsafe_code)]

mod authorization_service;
mod project_service;
mod task_service;
mod user_service;

pub use authorization_service::{
    Action, ActionTarget, AuthorizationService, MembershipRepository, Scope,
};
pub use project_service::{ProjectRecord, ProjectRepository, ProjectService};
pub use task_service::{CreateTaskInput, TaskRecord, TaskRepository, TaskService, UpdateTaskInput};
pub use user_service::{
    CreateUserParams, NewUser, PasswordHasher, RegisterParams, TenantRepository, UserRecord,
    UserRepository, UserService,
};
