//! Cancer-screening listings by type and statistics.

use crate::error::ApiResult;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use chrono::NaiveDate;
use ips_core::models::cancer_screening::{
    CancerScreeningView, ScreeningAdherenceReport, ScreeningStats, ScreeningType,
};
use ips_core::models::EncounterDetail;
use ips_core::repositories::encounters::EncounterFilter;
use ips_core::repositories::Page;
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ScreeningStatsQuery {
    #[serde(default)]
    pub patient_id: Option<Uuid>,
    #[serde(default)]
    pub screening_type: Option<ScreeningType>,
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
}

impl ScreeningStatsQuery {
    fn filter(&self) -> EncounterFilter {
        EncounterFilter {
            patient_id: self.patient_id,
            date_from: self.date_from,
            date_to: self.date_to,
            ..EncounterFilter::default()
        }
    }
}

#[utoipa::path(
    get,
    path = "/cancer-screenings/type/{screening_type}",
    tag = "cancer-screening",
    params(
        ("screening_type" = ScreeningType, Path, description = "CERVICAL, BREAST, PROSTATE or COLORECTAL"),
        Page
    ),
    responses(
        (status = 200, description = "One page of screenings of this type", body = [CancerScreeningView])
    )
)]
pub async fn screenings_by_type(
    State(state): State<AppState>,
    Path(screening_type): Path<ScreeningType>,
    Query(page): Query<Page>,
) -> ApiResult<Json<Vec<CancerScreeningView>>> {
    let screenings = state.screening.by_type(screening_type, page).await?;
    Ok(Json(
        screenings
            .into_iter()
            .map(EncounterDetail::into_view)
            .collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/cancer-screenings/stats",
    tag = "cancer-screening",
    params(ScreeningStatsQuery),
    responses(
        (status = 200, description = "Counts per type and risk", body = ScreeningStats)
    )
)]
pub async fn screening_stats(
    State(state): State<AppState>,
    Query(query): Query<ScreeningStatsQuery>,
) -> ApiResult<Json<ScreeningStats>> {
    Ok(Json(
        state
            .screening
            .stats(&query.filter(), query.screening_type)
            .await?,
    ))
}

#[utoipa::path(
    get,
    path = "/cancer-screenings/adherence-report",
    tag = "cancer-screening",
    params(ScreeningStatsQuery),
    responses(
        (status = 200, description = "Screenings by adherence to their recommended interval", body = ScreeningAdherenceReport)
    )
)]
/// Adherence is measured against today's date.
pub async fn screening_adherence_report(
    State(state): State<AppState>,
    Query(query): Query<ScreeningStatsQuery>,
) -> ApiResult<Json<ScreeningAdherenceReport>> {
    Ok(Json(
        state
            .screening
            .adherence_report(&query.filter(), query.screening_type)
            .await?,
    ))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cancer-screenings/stats", get(screening_stats))
        .route(
            "/cancer-screenings/adherence-report",
            get(screening_adherence_report),
        )
        .route("/cancer-screenings/type/:screening_type", get(screenings_by_type))
}
