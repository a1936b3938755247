//! Generic encounters and the typed encounter-detail endpoints.
//!
//! Every typed detail exposes the same six operations, generated by
//! [`encounter_detail_handlers!`]. Responses carry the record together with its computed
//! assessment.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use api_shared::ErrorBody;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use ips_core::models::adolescence::{AdolescenceCare, AdolescenceView};
use ips_core::models::adulthood::{AdulthoodCare, AdulthoodView};
use ips_core::models::cancer_screening::{CancerScreening, CancerScreeningView};
use ips_core::models::childhood::{ChildhoodCare, ChildhoodView};
use ips_core::models::early_childhood::{EarlyChildhoodCare, EarlyChildhoodView};
use ips_core::models::encounter::Encounter;
use ips_core::models::maternal::{MaternalPerinatalCare, MaternalPerinatalView};
use ips_core::models::old_age::{OldAgeCare, OldAgeView};
use ips_core::models::EncounterDetail;
use ips_core::repositories::encounters::{
    EncounterFilter, EncounterService, GenericEncounterFilter,
};
use uuid::Uuid;

// ============================================================================
// GENERIC ENCOUNTERS
// ============================================================================

#[utoipa::path(
    get,
    path = "/encounters",
    tag = "encounters",
    params(GenericEncounterFilter),
    responses(
        (status = 200, description = "One page of encounters, most recent first", body = [Encounter])
    )
)]
pub async fn list_encounters(
    State(state): State<AppState>,
    Query(filter): Query<GenericEncounterFilter>,
) -> ApiResult<Json<Vec<Encounter>>> {
    Ok(Json(state.encounters.list(&filter).await?))
}

#[utoipa::path(
    post,
    path = "/encounters",
    tag = "encounters",
    request_body = Encounter,
    responses(
        (status = 201, description = "Encounter created", body = Encounter),
        (status = 400, description = "Kind needs a detail record, or unknown patient", body = ErrorBody)
    )
)]
/// Record a `GENERAL` encounter. Typed encounters are created through their detail
/// endpoint.
pub async fn create_encounter(
    State(state): State<AppState>,
    Json(encounter): Json<Encounter>,
) -> ApiResult<(StatusCode, Json<Encounter>)> {
    let created = state.encounters.create(encounter).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/encounters/{id}",
    tag = "encounters",
    params(("id" = Uuid, Path, description = "Encounter id")),
    responses(
        (status = 200, description = "Encounter", body = Encounter),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn get_encounter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Encounter>> {
    Ok(Json(state.encounters.get(id).await?))
}

#[utoipa::path(
    delete,
    path = "/encounters/{id}",
    tag = "encounters",
    params(("id" = Uuid, Path, description = "Encounter id")),
    responses(
        (status = 204, description = "Encounter deleted"),
        (status = 400, description = "A detail record still points at the encounter", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn delete_encounter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.encounters.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/encounters", get(list_encounters).post(create_encounter))
        .route("/encounters/:id", get(get_encounter).delete(delete_encounter))
}

// ============================================================================
// TYPED DETAILS
// ============================================================================

/// Generate the list/create/get/replace/delete/history handlers for one encounter-detail
/// type, in a module named `$module` with a `routes()` function.
///
/// Documented paths use `{param}` syntax; routes use axum's `:param` syntax.
macro_rules! encounter_detail_handlers {
    (
        $module:ident,
        tag = $tag:tt,
        docs = ($doc_collection:tt, $doc_item:tt, $doc_history:tt),
        routes = ($collection:tt, $item:tt, $history:tt),
        detail = $detail:ident,
        view = $view:ident,
        service = |$st:ident| $svc:expr $(,)?
    ) => {
        pub mod $module {
            use super::*;

            fn service($st: &AppState) -> &EncounterService<$detail> {
                $svc
            }

            #[utoipa::path(
                get,
                path = $doc_collection,
                tag = $tag,
                operation_id = concat!("list_", stringify!($module)),
                params(EncounterFilter),
                responses(
                    (status = 200, description = "One page of records, most recent first", body = [$view])
                )
            )]
            pub async fn list(
                State(state): State<AppState>,
                Query(filter): Query<EncounterFilter>,
            ) -> ApiResult<Json<Vec<$view>>> {
                let records = service(&state).list(&filter).await?;
                Ok(Json(records.into_iter().map(EncounterDetail::into_view).collect()))
            }

            #[utoipa::path(
                post,
                path = $doc_collection,
                tag = $tag,
                operation_id = concat!("create_", stringify!($module)),
                request_body = $detail,
                responses(
                    (status = 201, description = "Encounter and detail created", body = $view),
                    (status = 400, description = "Invalid values or unknown patient", body = ErrorBody),
                    (status = 500, description = "Write failed", body = ErrorBody)
                )
            )]
            pub async fn create(
                State(state): State<AppState>,
                Json(detail): Json<$detail>,
            ) -> ApiResult<(StatusCode, Json<$view>)> {
                let created = service(&state).create(detail).await?;
                Ok((StatusCode::CREATED, Json(created.into_view())))
            }

            #[utoipa::path(
                get,
                path = $doc_item,
                tag = $tag,
                operation_id = concat!("get_", stringify!($module)),
                params(("id" = Uuid, Path, description = "Record id")),
                responses(
                    (status = 200, description = "Record with assessment", body = $view),
                    (status = 404, description = "Not found", body = ErrorBody)
                )
            )]
            pub async fn fetch(
                State(state): State<AppState>,
                Path(id): Path<Uuid>,
            ) -> ApiResult<Json<$view>> {
                Ok(Json(service(&state).get(id).await?.into_view()))
            }

            #[utoipa::path(
                put,
                path = $doc_item,
                tag = $tag,
                operation_id = concat!("replace_", stringify!($module)),
                params(("id" = Uuid, Path, description = "Record id")),
                request_body = $detail,
                responses(
                    (status = 200, description = "Record replaced", body = $view),
                    (status = 400, description = "Invalid values or unknown patient", body = ErrorBody),
                    (status = 404, description = "Not found", body = ErrorBody)
                )
            )]
            pub async fn replace(
                State(state): State<AppState>,
                Path(id): Path<Uuid>,
                Json(detail): Json<$detail>,
            ) -> ApiResult<Json<$view>> {
                Ok(Json(service(&state).replace(id, detail).await?.into_view()))
            }

            #[utoipa::path(
                delete,
                path = $doc_item,
                tag = $tag,
                operation_id = concat!("delete_", stringify!($module)),
                params(("id" = Uuid, Path, description = "Record id")),
                responses(
                    (status = 204, description = "Record and its encounter deleted"),
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

            #[utoipa::path(
                get,
                path = $doc_history,
                tag = $tag,
                operation_id = concat!("history_", stringify!($module)),
                params(("patient_id" = Uuid, Path, description = "Patient id")),
                responses(
                    (status = 200, description = "Every record for the patient, oldest first", body = [$view])
                )
            )]
            pub async fn history(
                State(state): State<AppState>,
                Path(patient_id): Path<Uuid>,
            ) -> ApiResult<Json<Vec<$view>>> {
                let records = service(&state).history(patient_id).await?;
                Ok(Json(records.into_iter().map(EncounterDetail::into_view).collect()))
            }

            pub fn routes() -> Router<AppState> {
                Router::new()
                    .route($collection, get(list).post(create))
                    .route($item, get(fetch).put(replace).delete(remove))
                    .route($history, get(history))
            }
        }
    };
}

encounter_detail_handlers!(
    maternal,
    tag = "maternal-perinatal",
    docs = (
        "/maternal-perinatal",
        "/maternal-perinatal/{id}",
        "/maternal-perinatal/patient/{patient_id}"
    ),
    routes = (
        "/maternal-perinatal",
        "/maternal-perinatal/:id",
        "/maternal-perinatal/patient/:patient_id"
    ),
    detail = MaternalPerinatalCare,
    view = MaternalPerinatalView,
    service = |s| &s.maternal,
);

encounter_detail_handlers!(
    early_childhood,
    tag = "early-childhood",
    docs = (
        "/early-childhood",
        "/early-childhood/{id}",
        "/early-childhood/patient/{patient_id}"
    ),
    routes = (
        "/early-childhood",
        "/early-childhood/:id",
        "/early-childhood/patient/:patient_id"
    ),
    detail = EarlyChildhoodCare,
    view = EarlyChildhoodView,
    service = |s| s.early_childhood.records(),
);

encounter_detail_handlers!(
    childhood,
    tag = "childhood",
    docs = ("/childhood", "/childhood/{id}", "/childhood/patient/{patient_id}"),
    routes = ("/childhood", "/childhood/:id", "/childhood/patient/:patient_id"),
    detail = ChildhoodCare,
    view = ChildhoodView,
    service = |s| s.childhood.records(),
);

encounter_detail_handlers!(
    adolescence,
    tag = "adolescence",
    docs = ("/adolescence", "/adolescence/{id}", "/adolescence/patient/{patient_id}"),
    routes = ("/adolescence", "/adolescence/:id", "/adolescence/patient/:patient_id"),
    detail = AdolescenceCare,
    view = AdolescenceView,
    service = |s| s.adolescence.records(),
);

encounter_detail_handlers!(
    adulthood,
    tag = "adulthood",
    docs = ("/adulthood", "/adulthood/{id}", "/adulthood/patient/{patient_id}"),
    routes = ("/adulthood", "/adulthood/:id", "/adulthood/patient/:patient_id"),
    detail = AdulthoodCare,
    view = AdulthoodView,
    service = |s| s.adulthood.records(),
);

encounter_detail_handlers!(
    old_age,
    tag = "old-age",
    docs = ("/old-age", "/old-age/{id}", "/old-age/patient/{patient_id}"),
    routes = ("/old-age", "/old-age/:id", "/old-age/patient/:patient_id"),
    detail = OldAgeCare,
    view = OldAgeView,
    service = |s| s.old_age.records(),
);

encounter_detail_handlers!(
    cancer_screening,
    tag = "cancer-screening",
    docs = (
        "/cancer-screenings",
        "/cancer-screenings/{id}",
        "/cancer-screenings/patient/{patient_id}"
    ),
    routes = (
        "/cancer-screenings",
        "/cancer-screenings/:id",
        "/cancer-screenings/patient/:patient_id"
    ),
    detail = CancerScreening,
    view = CancerScreeningView,
    service = |s| s.screening.records(),
);
