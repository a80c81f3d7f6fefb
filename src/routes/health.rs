use axum::{extract::State, http::StatusCode};

use crate::common::AppState;
use crate::error::{AppError, AppResult};

/// Health check endpoint
///
/// Returns 200 OK if the service is running and the database answers.
/// This endpoint is not concurrency-limited and suitable for Kubernetes probes.
#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 503, description = "Database unreachable"),
    ),
    tag = "health"
)]
pub async fn healthz(State(state): State<AppState>) -> AppResult<StatusCode> {
    state.db.ping().await.map_err(|e| {
        tracing::warn!(error = %e, "Health check failed");
        AppError::ServiceUnavailable("Database unreachable".to_string())
    })?;

    Ok(StatusCode::OK)
}
