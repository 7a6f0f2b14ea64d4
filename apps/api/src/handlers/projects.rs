use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use fusionboard_domain::{CallerIdentity, ProjectId, Role, UserId};
use uuid::Uuid;

use crate::dto::{
    CreateProjectRequest, InviteMemberRequest, ProjectResponse, UpdateMemberRoleRequest,
    UpdateProjectRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_projects_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<CallerIdentity>,
) -> ApiResult<Json<Vec<ProjectResponse>>> {
    let projects = state
        .project_service
        .list_projects(&identity)
        .await?
        .into_iter()
        .map(ProjectResponse::from)
        .collect();

    Ok(Json(projects))
}

pub async fn create_project_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<CallerIdentity>,
    Json(payload): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<ProjectResponse>)> {
    let project = state
        .project_service
        .create_project(&identity, &payload.name)
        .await?;

    Ok((StatusCode::CREATED, Json(ProjectResponse::from(project))))
}

pub async fn update_project_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<CallerIdentity>,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<UpdateProjectRequest>,
) -> ApiResult<Json<ProjectResponse>> {
    let project = state
        .project_service
        .update_project(&identity, ProjectId::from_uuid(project_id), &payload.name)
        .await?;

    Ok(Json(ProjectResponse::from(project)))
}

pub async fn delete_project_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<CallerIdentity>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .project_service
        .delete_project(&identity, ProjectId::from_uuid(project_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn invite_member_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<CallerIdentity>,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<InviteMemberRequest>,
) -> ApiResult<StatusCode> {
    let role = Role::from_str(&payload.role)?;

    state
        .project_service
        .invite_member(
            &identity,
            ProjectId::from_uuid(project_id),
            UserId::from_uuid(payload.user_id),
            role,
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn change_member_role_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<CallerIdentity>,
    Path((project_id, user_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateMemberRoleRequest>,
) -> ApiResult<StatusCode> {
    let role = Role::from_str(&payload.role)?;

    state
        .project_service
        .change_member_role(
            &identity,
            ProjectId::from_uuid(project_id),
            UserId::from_uuid(user_id),
            role,
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
