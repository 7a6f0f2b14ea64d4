//! Request and response payloads for the HTTP API.

use fusionboard_application::{ProjectRecord, TaskRecord, UserRecord};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Self-service registration payload.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Login payload.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Administrative user provisioning payload.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

/// Project creation payload.
#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
}

/// Project rename payload.
#[derive(Debug, Deserialize)]
pub struct UpdateProjectRequest {
    pub name: String,
}

/// Project member enrollment payload.
#[derive(Debug, Deserialize)]
pub struct InviteMemberRequest {
    pub user_id: Uuid,
    pub role: String,
}

/// Project member role change payload.
#[derive(Debug, Deserialize)]
pub struct UpdateMemberRoleRequest {
    pub role: String,
}

/// Task creation payload.
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub assignee_id: Option<Uuid>,
}

/// Task edit payload.
#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub assignee_id: Option<Uuid>,
}

/// Task status change payload.
#[derive(Debug, Deserialize)]
pub struct UpdateTaskStatusRequest {
    pub status: String,
}

/// User projection returned by the API.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub tenant_id: Uuid,
    pub is_locked: bool,
}

impl From<UserRecord> for UserResponse {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id.as_uuid(),
            name: user.name,
            email: user.email,
            role: user.role.as_str().to_owned(),
            tenant_id: user.tenant_id.as_uuid(),
            is_locked: user.is_locked,
        }
    }
}

/// Authenticated caller profile with effective tenant permissions.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserResponse,
    pub permissions: Vec<String>,
}

/// Project projection returned by the API.
#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub id: Uuid,
    pub name: String,
    pub tenant_id: Uuid,
    pub created_by: Option<Uuid>,
}

impl From<ProjectRecord> for ProjectResponse {
    fn from(project: ProjectRecord) -> Self {
        Self {
            id: project.id.as_uuid(),
            name: project.name,
            tenant_id: project.tenant_id.as_uuid(),
            created_by: project.created_by.map(|user| user.as_uuid()),
        }
    }
}

/// Task projection returned by the API.
#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub project_id: Uuid,
    pub assignee_id: Option<Uuid>,
}

impl From<TaskRecord> for TaskResponse {
    fn from(task: TaskRecord) -> Self {
        Self {
            id: task.id.as_uuid(),
            title: task.title,
            description: task.description,
            status: task.status.as_str().to_owned(),
            project_id: task.project_id.as_uuid(),
            assignee_id: task.assignee_id.map(|user| user.as_uuid()),
        }
    }
}
