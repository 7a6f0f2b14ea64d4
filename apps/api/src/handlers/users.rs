use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use fusionboard_application::CreateUserParams;
use fusionboard_domain::{CallerIdentity, Role, UserId};
use uuid::Uuid;

use crate::dto::{CreateUserRequest, UserResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_users_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<CallerIdentity>,
) -> ApiResult<Json<Vec<UserResponse>>> {
    let users = state
        .user_service
        .list_users(&identity)
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(Json(users))
}

pub async fn create_user_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<CallerIdentity>,
    Json(payload): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let role = Role::from_str(&payload.role)?;

    let user = state
        .user_service
        .create_user(
            &identity,
            CreateUserParams {
                name: payload.name,
                email: payload.email,
                password: payload.password,
                role,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

pub async fn delete_user_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<CallerIdentity>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .user_service
        .delete_user(&identity, UserId::from_uuid(user_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
