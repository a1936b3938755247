//! Listings, statistics and reports for the childhood, adolescence, adulthood and old-age
//! records. The record CRUD itself lives in [`super::encounters`].

use crate::error::ApiResult;
use crate::state::AppState;
use api_shared::ErrorBody;
use axum::extract::{Path, Query, State};
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use ips_core::models::adolescence::{
    AdolescenceStats, AdolescenceView, IntegralRisk, PsychosocialReport,
};
use ips_core::models::adulthood::{AdulthoodStats, AdulthoodView, CardiovascularRisk};
use ips_core::models::childhood::{
    ChildDevelopmentReport, ChildhoodStats, ChildhoodView, SchoolPerformance,
};
use ips_core::models::old_age::{
    Frailty, FunctionalStatus, GeriatricReport, OldAgeStats, OldAgeView,
};
use ips_core::models::EncounterDetail;
use ips_core::repositories::encounters::EncounterFilter;
use ips_core::repositories::life_stages::{ReportPeriod, SchoolGrade};
use ips_core::repositories::Page;

fn views<D: EncounterDetail>(records: Vec<D>) -> Vec<D::View> {
    records.into_iter().map(EncounterDetail::into_view).collect()
}

// ============================================================================
// CHILDHOOD
// ============================================================================

#[utoipa::path(
    get,
    path = "/childhood/school-performance/{performance}",
    tag = "childhood",
    params(
        ("performance" = SchoolPerformance, Path, description = "SUPERIOR, HIGH, BASIC, LOW or NOT_ENROLLED"),
        Page
    ),
    responses(
        (status = 200, description = "One page of visits, most recent first", body = [ChildhoodView])
    )
)]
pub async fn childhood_by_school_performance(
    State(state): State<AppState>,
    Path(performance): Path<SchoolPerformance>,
    Query(page): Query<Page>,
) -> ApiResult<Json<Vec<ChildhoodView>>> {
    let records = state
        .childhood
        .by_school_performance(performance, page)
        .await?;
    Ok(Json(views(records)))
}

#[utoipa::path(
    get,
    path = "/childhood/stats",
    tag = "childhood",
    params(EncounterFilter),
    responses(
        (status = 200, description = "School performance, nutrition and coverage", body = ChildhoodStats)
    )
)]
pub async fn childhood_stats(
    State(state): State<AppState>,
    Query(filter): Query<EncounterFilter>,
) -> ApiResult<Json<ChildhoodStats>> {
    Ok(Json(state.childhood.stats(&filter).await?))
}

#[utoipa::path(
    get,
    path = "/childhood/development-report",
    tag = "childhood",
    params(EncounterFilter, SchoolGrade),
    responses(
        (status = 200, description = "Development and screening problems", body = ChildDevelopmentReport)
    )
)]
pub async fn childhood_development_report(
    State(state): State<AppState>,
    Query(filter): Query<EncounterFilter>,
    Query(grade): Query<SchoolGrade>,
) -> ApiResult<Json<ChildDevelopmentReport>> {
    Ok(Json(
        state.childhood.development_report(&filter, &grade).await?,
    ))
}

// ============================================================================
// ADOLESCENCE AND YOUTH
// ============================================================================

#[utoipa::path(
    get,
    path = "/adolescence/age-range/{min_age}/{max_age}",
    tag = "adolescence",
    params(
        ("min_age" = i32, Path, description = "Youngest age in years, inclusive"),
        ("max_age" = i32, Path, description = "Oldest age in years, inclusive"),
        Page
    ),
    responses(
        (status = 200, description = "One page of visits, most recent first", body = [AdolescenceView]),
        (status = 400, description = "Minimum above maximum", body = ErrorBody)
    )
)]
pub async fn adolescence_by_age_range(
    State(state): State<AppState>,
    Path((min_age, max_age)): Path<(i32, i32)>,
    Query(page): Query<Page>,
) -> ApiResult<Json<Vec<AdolescenceView>>> {
    let records = state
        .adolescence
        .by_age_range(min_age, max_age, page)
        .await?;
    Ok(Json(views(records)))
}

#[utoipa::path(
    get,
    path = "/adolescence/risk/{level}",
    tag = "adolescence",
    params(
        ("level" = IntegralRisk, Path, description = "Integral risk level"),
        EncounterFilter
    ),
    responses(
        (status = 200, description = "One page of visits at this level", body = [AdolescenceView])
    )
)]
pub async fn adolescence_by_risk(
    State(state): State<AppState>,
    Path(level): Path<IntegralRisk>,
    Query(filter): Query<EncounterFilter>,
) -> ApiResult<Json<Vec<AdolescenceView>>> {
    let records = state.adolescence.by_integral_risk(level, &filter).await?;
    Ok(Json(views(records)))
}

#[utoipa::path(
    get,
    path = "/adolescence/alerts/high-risk",
    tag = "adolescence",
    params(EncounterFilter),
    responses(
        (status = 200, description = "Visits at HIGH integral risk or above", body = [AdolescenceView])
    )
)]
pub async fn adolescence_high_risk_alerts(
    State(state): State<AppState>,
    Query(filter): Query<EncounterFilter>,
) -> ApiResult<Json<Vec<AdolescenceView>>> {
    let records = state.adolescence.high_risk_alerts(&filter).await?;
    Ok(Json(views(records)))
}

#[utoipa::path(
    get,
    path = "/adolescence/stats",
    tag = "adolescence",
    params(EncounterFilter),
    responses(
        (status = 200, description = "Age groups, risk and nutrition", body = AdolescenceStats)
    )
)]
pub async fn adolescence_stats(
    State(state): State<AppState>,
    Query(filter): Query<EncounterFilter>,
) -> ApiResult<Json<AdolescenceStats>> {
    Ok(Json(state.adolescence.stats(&filter).await?))
}

#[utoipa::path(
    get,
    path = "/adolescence/psychosocial-report",
    tag = "adolescence",
    params(EncounterFilter),
    responses(
        (status = 200, description = "Psychosocial development and its risk findings", body = PsychosocialReport)
    )
)]
pub async fn adolescence_psychosocial_report(
    State(state): State<AppState>,
    Query(filter): Query<EncounterFilter>,
) -> ApiResult<Json<PsychosocialReport>> {
    Ok(Json(state.adolescence.psychosocial_report(&filter).await?))
}

// ============================================================================
// ADULTHOOD
// ============================================================================

#[utoipa::path(
    get,
    path = "/adulthood/cardiovascular-risk/{level}",
    tag = "adulthood",
    params(
        ("level" = CardiovascularRisk, Path, description = "LOW, INTERMEDIATE, HIGH or VERY_HIGH"),
        EncounterFilter
    ),
    responses(
        (status = 200, description = "One page of visits at this level", body = [AdulthoodView])
    )
)]
pub async fn adulthood_by_cardiovascular_risk(
    State(state): State<AppState>,
    Path(level): Path<CardiovascularRisk>,
    Query(filter): Query<EncounterFilter>,
) -> ApiResult<Json<Vec<AdulthoodView>>> {
    let records = state
        .adulthood
        .by_cardiovascular_risk(level, &filter)
        .await?;
    Ok(Json(views(records)))
}

#[utoipa::path(
    get,
    path = "/adulthood/stats",
    tag = "adulthood",
    params(EncounterFilter),
    responses(
        (status = 200, description = "Cardiovascular risk and weight", body = AdulthoodStats)
    )
)]
pub async fn adulthood_stats(
    State(state): State<AppState>,
    Query(filter): Query<EncounterFilter>,
) -> ApiResult<Json<AdulthoodStats>> {
    Ok(Json(state.adulthood.stats(&filter).await?))
}

// ============================================================================
// OLD AGE
// ============================================================================

#[utoipa::path(
    get,
    path = "/old-age/functional-status/{status}",
    tag = "old-age",
    params(
        ("status" = FunctionalStatus, Path, description = "Dependence level from the Barthel index"),
        EncounterFilter
    ),
    responses(
        (status = 200, description = "One page of visits with this status", body = [OldAgeView])
    )
)]
pub async fn old_age_by_functional_status(
    State(state): State<AppState>,
    Path(status): Path<FunctionalStatus>,
    Query(filter): Query<EncounterFilter>,
) -> ApiResult<Json<Vec<OldAgeView>>> {
    let records = state.old_age.by_functional_status(status, &filter).await?;
    Ok(Json(views(records)))
}

#[utoipa::path(
    get,
    path = "/old-age/frailty/{level}",
    tag = "old-age",
    params(
        ("level" = Frailty, Path, description = "ROBUST, PRE_FRAIL or FRAIL"),
        EncounterFilter
    ),
    responses(
        (status = 200, description = "One page of visits at this level", body = [OldAgeView])
    )
)]
pub async fn old_age_by_frailty(
    State(state): State<AppState>,
    Path(level): Path<Frailty>,
    Query(filter): Query<EncounterFilter>,
) -> ApiResult<Json<Vec<OldAgeView>>> {
    let records = state.old_age.by_frailty(level, &filter).await?;
    Ok(Json(views(records)))
}

#[utoipa::path(
    get,
    path = "/old-age/stats",
    tag = "old-age",
    params(EncounterFilter),
    responses(
        (status = 200, description = "Dependence, frailty and living situation", body = OldAgeStats)
    )
)]
pub async fn old_age_stats(
    State(state): State<AppState>,
    Query(filter): Query<EncounterFilter>,
) -> ApiResult<Json<OldAgeStats>> {
    Ok(Json(state.old_age.stats(&filter).await?))
}

#[utoipa::path(
    get,
    path = "/old-age/geriatric-report",
    tag = "old-age",
    params(ReportPeriod),
    responses(
        (status = 200, description = "Geriatric assessment over the period", body = GeriatricReport),
        (status = 400, description = "Period ends before it starts", body = ErrorBody)
    )
)]
pub async fn old_age_geriatric_report(
    State(state): State<AppState>,
    Query(period): Query<ReportPeriod>,
) -> ApiResult<Json<GeriatricReport>> {
    Ok(Json(state.old_age.geriatric_report(period).await?))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/childhood/school-performance/:performance",
            get(childhood_by_school_performance),
        )
        .route("/childhood/stats", get(childhood_stats))
        .route(
            "/childhood/development-report",
            get(childhood_development_report),
        )
        .route(
            "/adolescence/age-range/:min_age/:max_age",
            get(adolescence_by_age_range),
        )
        .route("/adolescence/risk/:level", get(adolescence_by_risk))
        .route(
            "/adolescence/alerts/high-risk",
            get(adolescence_high_risk_alerts),
        )
        .route("/adolescence/stats", get(adolescence_stats))
        .route(
            "/adolescence/psychosocial-report",
            get(adolescence_psychosocial_report),
        )
        .route(
            "/adulthood/cardiovascular-risk/:level",
            get(adulthood_by_cardiovascular_risk),
        )
        .route("/adulthood/stats", get(adulthood_stats))
        .route(
            "/old-age/functional-status/:status",
            get(old_age_by_functional_status),
        )
        .route("/old-age/frailty/:level", get(old_age_by_frailty))
        .route("/old-age/stats", get(old_age_stats))
        .route("/old-age/geriatric-report", get(old_age_geriatric_report))
}
