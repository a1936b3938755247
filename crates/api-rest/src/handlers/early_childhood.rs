//! Early-childhood scale applications and statistics.

use crate::error::ApiResult;
use crate::state::AppState;
use api_shared::ErrorBody;
use axum::extract::{Path, Query, State};
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use ips_core::models::early_childhood::{
    Asq3Scores, EarlyChildhoodStats, EarlyChildhoodView, Ead3Scores,
};
use ips_core::models::EncounterDetail;
use ips_core::repositories::encounters::EncounterFilter;
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/early-childhood/{id}/ead3",
    tag = "early-childhood",
    params(("id" = Uuid, Path, description = "Record id")),
    request_body = Ead3Scores,
    responses(
        (status = 200, description = "EAD-3 recorded", body = EarlyChildhoodView),
        (status = 400, description = "Missing or out-of-range score", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
/// Record an EAD-3 application dated today. All four areas are required.
#[axum::debug_handler]
pub async fn apply_ead3(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(scores): Json<Ead3Scores>,
) -> ApiResult<Json<EarlyChildhoodView>> {
    let updated = state.early_childhood.apply_ead3(id, scores).await?;
    Ok(Json(updated.into_view()))
}

#[utoipa::path(
    post,
    path = "/early-childhood/{id}/asq3",
    tag = "early-childhood",
    params(("id" = Uuid, Path, description = "Record id")),
    request_body = Asq3Scores,
    responses(
        (status = 200, description = "ASQ-3 recorded", body = EarlyChildhoodView),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn apply_asq3(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(scores): Json<Asq3Scores>,
) -> ApiResult<Json<EarlyChildhoodView>> {
    let updated = state.early_childhood.apply_asq3(id, scores).await?;
    Ok(Json(updated.into_view()))
}

#[utoipa::path(
    get,
    path = "/early-childhood/stats",
    tag = "early-childhood",
    params(EncounterFilter),
    responses(
        (status = 200, description = "Scale and vaccination coverage", body = EarlyChildhoodStats)
    )
)]
/// Figures over every matching record; `limit` and `offset` are ignored.
pub async fn early_childhood_stats(
    State(state): State<AppState>,
    Query(filter): Query<EncounterFilter>,
) -> ApiResult<Json<EarlyChildhoodStats>> {
    Ok(Json(state.early_childhood.stats(&filter).await?))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/early-childhood/stats", get(early_childhood_stats))
        .route("/early-childhood/:id/ead3", post(apply_ead3))
        .route("/early-childhood/:id/asq3", post(apply_asq3))
}
