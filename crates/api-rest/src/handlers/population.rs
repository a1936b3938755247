//! Population-level records: collective interventions, public-health settings, family units
//! and integral care plans.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use api_shared::ErrorBody;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use ips_core::models::collective::CollectiveIntervention;
use ips_core::models::family::{FamilyStructureReport, FamilyUnit, LifeCycleReport};
use ips_core::models::integral_care::{
    ApproachReport, ComplexityReport, FinalizePlan, IntegralCarePlan,
};
use ips_core::models::public_health_setting::PublicHealthSetting;
use ips_core::repositories::population::{
    CarePlanFilter, CollectiveFilter, EvaluationWindow, FamilyFilter, SettingFilter,
};
use ips_core::repositories::records::RecordService;
use ips_core::repositories::Page;
use uuid::Uuid;

/// Generate create/get/replace/delete handlers over a [`RecordService`], in a module named
/// `$module` whose `routes()` also mounts the resource's own `$list` handler.
macro_rules! record_handlers {
    (
        $module:ident,
        tag = $tag:tt,
        docs = ($doc_collection:tt, $doc_item:tt),
        routes = ($collection:tt, $item:tt),
        record = $record:ident,
        list = $list:path,
        service = |$st:ident| $svc:expr $(,)?
    ) => {
        pub mod $module {
            use super::*;

            fn service($st: &AppState) -> &RecordService<$record> {
                $svc
            }

            #[utoipa::path(
                post,
                path = $doc_collection,
                tag = $tag,
                operation_id = concat!("create_", stringify!($module)),
                request_body = $record,
                responses(
                    (status = 201, description = "Created", body = $record),
                    (status = 400, description = "Bad request", body = ErrorBody),
                    (status = 409, description = "Code already in use", body = ErrorBody)
                )
            )]
            pub async fn create(
                State(state): State<AppState>,
                Json(record): Json<$record>,
            ) -> ApiResult<(StatusCode, Json<$record>)> {
                let created = service(&state).create(record).await?;
                Ok((StatusCode::CREATED, Json(created)))
            }

            #[utoipa::path(
                get,
                path = $doc_item,
                tag = $tag,
                operation_id = concat!("get_", stringify!($module)),
                params(("id" = Uuid, Path, description = "Record id")),
                responses(
                    (status = 200, description = "Record", body = $record),
                    (status = 404, description = "Not found", body = ErrorBody)
                )
            )]
            pub async fn fetch(
                State(state): State<AppState>,
                Path(id): Path<Uuid>,
            ) -> ApiResult<Json<$record>> {
                Ok(Json(service(&state).get(id).await?))
            }

            #[utoipa::path(
                put,
                path = $doc_item,
                tag = $tag,
                operation_id = concat!("replace_", stringify!($module)),
                params(("id" = Uuid, Path, description = "Record id")),
                request_body = $record,
                responses(
                    (status = 200, description = "Replaced", body = $record),
                    (status = 400, description = "Bad request", body = ErrorBody),
                    (status = 404, description = "Not found", body = ErrorBody),
                    (status = 409, description = "Code already in use", body = ErrorBody)
                )
            )]
            pub async fn replace(
                State(state): State<AppState>,
                Path(id): Path<Uuid>,
                Json(record): Json<$record>,
            ) -> ApiResult<Json<$record>> {
                Ok(Json(service(&state).replace(id, record).await?))
            }

            #[utoipa::path(
                delete,
                path = $doc_item,
                tag = $tag,
                operation_id = concat!("delete_", stringify!($module)),
                params(("id" = Uuid, Path, description = "Record id")),
                responses(
                    (status = 204, description = "Deleted"),
                    (status = 404, description = "Not found", body = ErrorBody)
                )
            )]
            pub async fn remove(
                State(state): State<AppState>,
                Path(id): Path<Uuid>,
            ) -> Result<StatusCode, ApiError> {
                service(&state).delete(id).await?;
                Ok(StatusCode::NO_CONTENT)
            }

            pub fn routes() -> Router<AppState> {
                Router::new()
                    .route($collection, get($list).post(create))
                    .route($item, get(fetch).put(replace).delete(remove))
            }
        }
    };
}

// ============================================================================
// COLLECTIVE INTERVENTIONS
// ============================================================================

#[utoipa::path(
    get,
    path = "/collective-interventions",
    tag = "collective-interventions",
    params(CollectiveFilter),
    responses(
        (status = 200, description = "One page of interventions", body = [CollectiveIntervention])
    )
)]
pub async fn list_collective_interventions(
    State(state): State<AppState>,
    Query(filter): Query<CollectiveFilter>,
) -> ApiResult<Json<Vec<CollectiveIntervention>>> {
    let found = state
        .collective
        .list(filter.filters(), filter.page())
        .await?;
    Ok(Json(found))
}

record_handlers!(
    collective,
    tag = "collective-interventions",
    docs = ("/collective-interventions", "/collective-interventions/{id}"),
    routes = ("/collective-interventions", "/collective-interventions/:id"),
    record = CollectiveIntervention,
    list = super::list_collective_interventions,
    service = |s| &s.collective,
);

// ============================================================================
// PUBLIC-HEALTH SETTINGS
// ============================================================================

#[utoipa::path(
    get,
    path = "/public-health-settings",
    tag = "public-health-settings",
    params(SettingFilter),
    responses(
        (status = 200, description = "One page of settings", body = [PublicHealthSetting])
    )
)]
pub async fn list_settings(
    State(state): State<AppState>,
    Query(filter): Query<SettingFilter>,
) -> ApiResult<Json<Vec<PublicHealthSetting>>> {
    Ok(Json(
        state.settings.list(filter.filters(), filter.page()).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/public-health-settings/code/{code}",
    tag = "public-health-settings",
    params(("code" = String, Path, description = "Setting code")),
    responses(
        (status = 200, description = "Setting", body = PublicHealthSetting),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn setting_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<Json<PublicHealthSetting>> {
    Ok(Json(state.settings.get_by("code", code.trim()).await?))
}

record_handlers!(
    settings,
    tag = "public-health-settings",
    docs = ("/public-health-settings", "/public-health-settings/{id}"),
    routes = ("/public-health-settings", "/public-health-settings/:id"),
    record = PublicHealthSetting,
    list = super::list_settings,
    service = |s| &s.settings,
);

// ============================================================================
// FAMILY UNITS
// ============================================================================

#[utoipa::path(
    get,
    path = "/family-units",
    tag = "family-units",
    params(FamilyFilter),
    responses(
        (status = 200, description = "One page of families", body = [FamilyUnit])
    )
)]
pub async fn list_families(
    State(state): State<AppState>,
    Query(filter): Query<FamilyFilter>,
) -> ApiResult<Json<Vec<FamilyUnit>>> {
    Ok(Json(state.families.list(&filter).await?))
}

#[utoipa::path(
    get,
    path = "/family-units/code/{family_code}",
    tag = "family-units",
    params(("family_code" = String, Path, description = "Family code")),
    responses(
        (status = 200, description = "Family", body = FamilyUnit),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn family_by_code(
    State(state): State<AppState>,
    Path(family_code): Path<String>,
) -> ApiResult<Json<FamilyUnit>> {
    Ok(Json(state.families.by_code(&family_code).await?))
}

#[utoipa::path(
    get,
    path = "/family-units/report",
    tag = "family-units",
    responses(
        (status = 200, description = "Families grouped by structure type", body = FamilyStructureReport)
    )
)]
pub async fn family_structure_report(
    State(state): State<AppState>,
) -> ApiResult<Json<FamilyStructureReport>> {
    Ok(Json(state.families.structure_report().await?))
}

#[utoipa::path(
    get,
    path = "/family-units/report/life-cycle",
    tag = "family-units",
    responses(
        (status = 200, description = "Families and members per life-cycle stage", body = LifeCycleReport)
    )
)]
pub async fn family_life_cycle_report(
    State(state): State<AppState>,
) -> ApiResult<Json<LifeCycleReport>> {
    Ok(Json(state.families.life_cycle_report().await?))
}

#[utoipa::path(
    get,
    path = "/public-health-settings/{id}/families",
    tag = "family-units",
    params(("id" = Uuid, Path, description = "Setting id"), Page),
    responses(
        (status = 200, description = "One page of families in the setting", body = [FamilyUnit])
    )
)]
pub async fn families_by_setting(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(page): Query<Page>,
) -> ApiResult<Json<Vec<FamilyUnit>>> {
    Ok(Json(state.families.by_setting(id, page).await?))
}

record_handlers!(
    families,
    tag = "family-units",
    docs = ("/family-units", "/family-units/{id}"),
    routes = ("/family-units", "/family-units/:id"),
    record = FamilyUnit,
    list = super::list_families,
    service = |s| s.families.records(),
);

// ============================================================================
// INTEGRAL CARE PLANS
// ============================================================================

#[utoipa::path(
    get,
    path = "/integral-care-plans",
    tag = "integral-care-plans",
    params(CarePlanFilter),
    responses(
        (status = 200, description = "One page of plans", body = [IntegralCarePlan])
    )
)]
pub async fn list_care_plans(
    State(state): State<AppState>,
    Query(filter): Query<CarePlanFilter>,
) -> ApiResult<Json<Vec<IntegralCarePlan>>> {
    Ok(Json(state.care_plans.list(&filter).await?))
}

#[utoipa::path(
    get,
    path = "/integral-care-plans/code/{code}",
    tag = "integral-care-plans",
    params(("code" = String, Path, description = "Plan code")),
    responses(
        (status = 200, description = "Plan", body = IntegralCarePlan),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn care_plan_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<Json<IntegralCarePlan>> {
    Ok(Json(state.care_plans.by_code(&code).await?))
}

#[utoipa::path(
    post,
    path = "/integral-care-plans/{id}/finalize",
    tag = "integral-care-plans",
    params(("id" = Uuid, Path, description = "Plan id")),
    request_body = FinalizePlan,
    responses(
        (status = 200, description = "Plan completed", body = IntegralCarePlan),
        (status = 400, description = "Plan cancelled or end before start", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
/// Mark a plan completed. The end time defaults to now.
#[axum::debug_handler]
pub async fn finalize_care_plan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<FinalizePlan>,
) -> ApiResult<Json<IntegralCarePlan>> {
    Ok(Json(state.care_plans.finalize(id, request).await?))
}

#[utoipa::path(
    get,
    path = "/integral-care-plans/report",
    tag = "integral-care-plans",
    responses(
        (status = 200, description = "Plans grouped by care approach", body = ApproachReport)
    )
)]
pub async fn care_plan_approach_report(
    State(state): State<AppState>,
) -> ApiResult<Json<ApproachReport>> {
    Ok(Json(state.care_plans.approach_report().await?))
}

#[utoipa::path(
    get,
    path = "/integral-care-plans/report/complexity",
    tag = "integral-care-plans",
    responses(
        (status = 200, description = "Plans grouped by care complexity", body = ComplexityReport)
    )
)]
pub async fn care_plan_complexity_report(
    State(state): State<AppState>,
) -> ApiResult<Json<ComplexityReport>> {
    Ok(Json(state.care_plans.complexity_report().await?))
}

#[utoipa::path(
    get,
    path = "/integral-care-plans/upcoming-evaluations",
    tag = "integral-care-plans",
    params(EvaluationWindow),
    responses(
        (status = 200, description = "Plans in progress with an evaluation due in the window, soonest first", body = [IntegralCarePlan]),
        (status = 400, description = "Window longer than a year", body = ErrorBody)
    )
)]
/// Overdue evaluations are included.
pub async fn upcoming_care_plan_evaluations(
    State(state): State<AppState>,
    Query(window): Query<EvaluationWindow>,
) -> ApiResult<Json<Vec<IntegralCarePlan>>> {
    Ok(Json(state.care_plans.upcoming_evaluations(&window).await?))
}

record_handlers!(
    care_plans,
    tag = "integral-care-plans",
    docs = ("/integral-care-plans", "/integral-care-plans/{id}"),
    routes = ("/integral-care-plans", "/integral-care-plans/:id"),
    record = IntegralCarePlan,
    list = super::list_care_plans,
    service = |s| s.care_plans.records(),
);

pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(collective::routes())
        .merge(settings::routes())
        .route("/public-health-settings/code/:code", get(setting_by_code))
        .route("/public-health-settings/:id/families", get(families_by_setting))
        .merge(families::routes())
        .route("/family-units/code/:family_code", get(family_by_code))
        .route("/family-units/report", get(family_structure_report))
        .route("/family-units/report/life-cycle", get(family_life_cycle_report))
        .merge(care_plans::routes())
        .route("/integral-care-plans/code/:code", get(care_plan_by_code))
        .route("/integral-care-plans/report", get(care_plan_approach_report))
        .route(
            "/integral-care-plans/report/complexity",
            get(care_plan_complexity_report),
        )
        .route(
            "/integral-care-plans/upcoming-evaluations",
            get(upcoming_care_plan_evaluations),
        )
        .route("/integral-care-plans/:id/finalize", post(finalize_care_plan))
}
