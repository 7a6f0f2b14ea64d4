use axum::Json;
use serde::Serialize;

/// Service liveness payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
}

/// GET /health - Liveness probe.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
