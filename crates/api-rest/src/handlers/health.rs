use crate::state::AppState;
use api_shared::{HealthRes, HealthService};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Liveness check; never touches the record store.
pub async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/ready",
    tag = "health",
    responses(
        (status = 200, description = "Record store reachable", body = HealthRes),
        (status = 503, description = "Record store unreachable", body = HealthRes)
    )
)]
/// Readiness check: pings the record store.
#[axum::debug_handler]
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<HealthRes>) {
    let ping = state.store.ping().await;
    if let Err(e) = &ping {
        tracing::warn!(error = %e, "Readiness check failed");
    }
    let res = HealthService::readiness(ping);
    let status = if res.ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(res))
}
