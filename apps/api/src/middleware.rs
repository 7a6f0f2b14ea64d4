use axum::extract::{Request, State};
use axum::http::{HeaderValue, Method, header};
use axum::middleware::Next;
use axum::response::Response;
use fusionboard_core::AppError;
use fusionboard_domain::UserId;
use tower_sessions::Session;
use uuid::Uuid;

use crate::auth::SESSION_USER_KEY;
use crate::error::ApiResult;
use crate::state::AppState;

/// Resolves the caller identity for protected routes.
///
/// The session only carries the user id; the user row is re-read on every
/// request so role changes and account locks apply immediately. Locked
/// accounts are rejected here, before any handler or permission check runs.
pub async fn require_auth(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let user_id = session
        .get::<Uuid>(SESSION_USER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session: {error}")))?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    let identity = state
        .user_service
        .resolve_identity(UserId::from_uuid(user_id))
        .await?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    if identity.is_locked() {
        return Err(AppError::Unauthorized("account is locked".to_owned()).into());
    }

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

pub async fn require_same_origin_for_mutations(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    if is_state_changing_method(request.method()) {
        let headers = request.headers();

        if let Some(fetch_site) = headers.get("sec-fetch-site")
            && fetch_site == HeaderValue::from_static("cross-site")
        {
            return Err(AppError::Unauthorized("cross-site request blocked".to_owned()).into());
        }

        let origin = headers
            .get(header::ORIGIN)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        let referer = headers
            .get(header::REFERER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        let allowed_origin = state.frontend_url;
        let origin_is_allowed = origin == allowed_origin;
        let referer_is_allowed = referer.starts_with(&allowed_origin);

        if !origin_is_allowed && !referer_is_allowed {
            return Err(AppError::Unauthorized("origin validation failed".to_owned()).into());
        }
    }

    Ok(next.run(request).await)
}

fn is_state_changing_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}
