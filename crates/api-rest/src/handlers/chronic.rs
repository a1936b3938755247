//! Chronic-disease controls with their condition details.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use api_shared::ErrorBody;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use ips_core::models::chronic::{
    AdherenceReport, ChronicCondition, ChronicControlRecord, ChronicControlView, ChronicStats,
};
use ips_core::repositories::chronic::ChronicFilter;
use ips_core::repositories::Page;
use uuid::Uuid;

fn views(records: Vec<ChronicControlRecord>) -> Vec<ChronicControlView> {
    records.into_iter().map(ChronicControlView::from).collect()
}

#[utoipa::path(
    get,
    path = "/chronic-controls",
    tag = "chronic-control",
    params(ChronicFilter),
    responses(
        (status = 200, description = "One page of controls, most recent first", body = [ChronicControlView])
    )
)]
pub async fn list_controls(
    State(state): State<AppState>,
    Query(filter): Query<ChronicFilter>,
) -> ApiResult<Json<Vec<ChronicControlView>>> {
    Ok(Json(views(state.chronic.list(&filter).await?)))
}

#[utoipa::path(
    post,
    path = "/chronic-controls",
    tag = "chronic-control",
    request_body = ChronicControlRecord,
    responses(
        (status = 201, description = "Encounter, control and detail created", body = ChronicControlView),
        (status = 400, description = "Invalid values, mismatched detail block or unknown patient", body = ErrorBody),
        (status = 500, description = "Write failed", body = ErrorBody)
    )
)]
/// Create a control. The optional detail block must match `condition`.
#[axum::debug_handler]
pub async fn create_control(
    State(state): State<AppState>,
    Json(record): Json<ChronicControlRecord>,
) -> ApiResult<(StatusCode, Json<ChronicControlView>)> {
    let created = state.chronic.create(record).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

#[utoipa::path(
    get,
    path = "/chronic-controls/{id}",
    tag = "chronic-control",
    params(("id" = Uuid, Path, description = "Control id")),
    responses(
        (status = 200, description = "Control with detail and assessment", body = ChronicControlView),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn get_control(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ChronicControlView>> {
    Ok(Json(state.chronic.get(id).await?.into()))
}

#[utoipa::path(
    put,
    path = "/chronic-controls/{id}",
    tag = "chronic-control",
    params(("id" = Uuid, Path, description = "Control id")),
    request_body = ChronicControlRecord,
    responses(
        (status = 200, description = "Control replaced", body = ChronicControlView),
        (status = 400, description = "Invalid values or condition changed", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
/// Replace a control. Omitting the detail block keeps the stored detail.
pub async fn replace_control(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(record): Json<ChronicControlRecord>,
) -> ApiResult<Json<ChronicControlView>> {
    Ok(Json(state.chronic.replace(id, record).await?.into()))
}

#[utoipa::path(
    delete,
    path = "/chronic-controls/{id}",
    tag = "chronic-control",
    params(("id" = Uuid, Path, description = "Control id")),
    responses(
        (status = 204, description = "Details, control and encounter deleted"),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn delete_control(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.chronic.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/chronic-controls/patient/{patient_id}",
    tag = "chronic-control",
    params(("patient_id" = Uuid, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Every control for the patient, oldest first", body = [ChronicControlView])
    )
)]
pub async fn control_history(
    State(state): State<AppState>,
    Path(patient_id): Path<Uuid>,
) -> ApiResult<Json<Vec<ChronicControlView>>> {
    Ok(Json(views(state.chronic.history(patient_id).await?)))
}

#[utoipa::path(
    get,
    path = "/chronic-controls/condition/{condition}",
    tag = "chronic-control",
    params(
        ("condition" = ChronicCondition, Path, description = "HYPERTENSION, DIABETES, KIDNEY_DISEASE or DYSLIPIDEMIA"),
        Page
    ),
    responses(
        (status = 200, description = "One page of controls for the condition", body = [ChronicControlView])
    )
)]
pub async fn controls_by_condition(
    State(state): State<AppState>,
    Path(condition): Path<ChronicCondition>,
    Query(page): Query<Page>,
) -> ApiResult<Json<Vec<ChronicControlView>>> {
    Ok(Json(views(state.chronic.by_condition(condition, page).await?)))
}

#[utoipa::path(
    get,
    path = "/chronic-controls/stats",
    tag = "chronic-control",
    params(ChronicFilter),
    responses(
        (status = 200, description = "Totals per condition and control rates", body = ChronicStats)
    )
)]
/// Figures over every matching control; `limit` and `offset` are ignored.
pub async fn chronic_stats(
    State(state): State<AppState>,
    Query(filter): Query<ChronicFilter>,
) -> ApiResult<Json<ChronicStats>> {
    Ok(Json(state.chronic.stats(&filter).await?))
}

#[utoipa::path(
    get,
    path = "/chronic-controls/adherence-report",
    tag = "chronic-control",
    params(ChronicFilter),
    responses(
        (status = 200, description = "Adherence counts and percentages", body = AdherenceReport)
    )
)]
pub async fn adherence_report(
    State(state): State<AppState>,
    Query(filter): Query<ChronicFilter>,
) -> ApiResult<Json<AdherenceReport>> {
    Ok(Json(state.chronic.adherence_report(&filter).await?))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/chronic-controls", get(list_controls).post(create_control))
        .route("/chronic-controls/stats", get(chronic_stats))
        .route("/chronic-controls/adherence-report", get(adherence_report))
        .route("/chronic-controls/patient/:patient_id", get(control_history))
        .route("/chronic-controls/condition/:condition", get(controls_by_condition))
        .route(
            "/chronic-controls/:id",
            get(get_control)
                .put(replace_control)
                .delete(delete_control),
        )
}
