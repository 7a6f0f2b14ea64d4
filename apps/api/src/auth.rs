//! Authentication handlers: register, login, logout and caller profile.

use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use fusionboard_application::{RegisterParams, Scope};
use fusionboard_core::AppError;
use fusionboard_domain::CallerIdentity;
use tower_sessions::Session;

use crate::dto::{LoginRequest, MeResponse, RegisterRequest, UserResponse};
use crate::error::ApiResult;
use crate::state::AppState;

/// Session key holding the authenticated user id.
pub const SESSION_USER_KEY: &str = "authenticated_user_id";

/// POST /auth/register - Create a new tenant with its first administrator.
pub async fn register_handler(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let user = state
        .user_service
        .register(RegisterParams {
            name: payload.name,
            email: payload.email,
            password: payload.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// POST /auth/login - Authenticate with email and password.
pub async fn login_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<UserResponse>> {
    let user = state
        .user_service
        .login(&payload.email, &payload.password)
        .await?;

    // Fresh session id on authentication.
    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;
    session
        .insert(SESSION_USER_KEY, user.id.as_uuid())
        .await
        .map_err(|error| AppError::Internal(format!("failed to persist session: {error}")))?;

    Ok(Json(UserResponse::from(user)))
}

/// POST /auth/logout - Destroy the current session.
pub async fn logout_handler(session: Session) -> ApiResult<StatusCode> {
    session
        .delete()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /auth/me - Return the caller's profile and effective tenant permissions.
pub async fn me_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<CallerIdentity>,
) -> ApiResult<Json<MeResponse>> {
    let user = state
        .user_service
        .find_by_id(identity.user_id())
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".to_owned()))?;

    let permissions = state
        .authorization_service
        .resolve_permissions(identity.user_id(), Scope::tenant(identity.tenant_id()))
        .await?
        .into_iter()
        .map(|permission| permission.as_str().to_owned())
        .collect();

    Ok(Json(MeResponse {
        user: UserResponse::from(user),
        permissions,
    }))
}
