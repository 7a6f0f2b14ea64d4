use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use fusionboard_application::{CreateTaskInput, UpdateTaskInput};
use fusionboard_domain::{CallerIdentity, ProjectId, TaskId, TaskStatus, UserId};
use uuid::Uuid;

use crate::dto::{CreateTaskRequest, TaskResponse, UpdateTaskRequest, UpdateTaskStatusRequest};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_tasks_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<CallerIdentity>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<TaskResponse>>> {
    let tasks = state
        .task_service
        .list_tasks(&identity, ProjectId::from_uuid(project_id))
        .await?
        .into_iter()
        .map(TaskResponse::from)
        .collect();

    Ok(Json(tasks))
}

pub async fn create_task_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<CallerIdentity>,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    let task = state
        .task_service
        .create_task(
            &identity,
            ProjectId::from_uuid(project_id),
            CreateTaskInput {
                title: payload.title,
                description: payload.description,
                assignee_id: payload.assignee_id.map(UserId::from_uuid),
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(TaskResponse::from(task))))
}

pub async fn update_task_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<CallerIdentity>,
    Path(task_id): Path<Uuid>,
    Json(payload): Json<UpdateTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    let task = state
        .task_service
        .update_task(
            &identity,
            TaskId::from_uuid(task_id),
            UpdateTaskInput {
                title: payload.title,
                description: payload.description,
                assignee_id: payload.assignee_id.map(UserId::from_uuid),
            },
        )
        .await?;

    Ok(Json(TaskResponse::from(task)))
}

pub async fn delete_task_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<CallerIdentity>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .task_service
        .delete_task(&identity, TaskId::from_uuid(task_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn change_task_status_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<CallerIdentity>,
    Path(task_id): Path<Uuid>,
    Json(payload): Json<UpdateTaskStatusRequest>,
) -> ApiResult<Json<TaskResponse>> {
    let status = TaskStatus::from_str(&payload.status)?;

    let task = state
        .task_service
        .change_status(&identity, TaskId::from_uuid(task_id), status)
        .await?;

    Ok(Json(TaskResponse::from(task)))
}
