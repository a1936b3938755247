//! Read-only DANE occupation catalogue.

use crate::error::ApiResult;
use crate::state::AppState;
use api_shared::ErrorBody;
use axum::extract::{Path, Query, State};
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use ips_core::models::occupation::{
    CatalogueStats, CodeValidation, Occupation, OccupationCategory,
};
use ips_core::repositories::catalogue::{CategoryListing, OccupationSearch};

#[utoipa::path(
    get,
    path = "/occupations",
    tag = "occupations",
    params(OccupationSearch),
    responses(
        (status = 200, description = "Active occupations ordered by code", body = [Occupation]),
        (status = 400, description = "Blank search term", body = ErrorBody)
    )
)]
pub async fn search_occupations(
    State(state): State<AppState>,
    Query(search): Query<OccupationSearch>,
) -> ApiResult<Json<Vec<Occupation>>> {
    Ok(Json(state.catalogue.search(&search).await?))
}

#[utoipa::path(
    get,
    path = "/occupations/{code}",
    tag = "occupations",
    params(("code" = String, Path, description = "DANE occupation code")),
    responses(
        (status = 200, description = "Occupation", body = Occupation),
        (status = 404, description = "Not in the catalogue", body = ErrorBody)
    )
)]
pub async fn occupation_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<Json<Occupation>> {
    Ok(Json(state.catalogue.by_code(&code).await?))
}

#[utoipa::path(
    get,
    path = "/occupations/stats",
    tag = "occupations",
    responses(
        (status = 200, description = "Catalogue size and group counts", body = CatalogueStats)
    )
)]
pub async fn catalogue_stats(State(state): State<AppState>) -> ApiResult<Json<CatalogueStats>> {
    Ok(Json(state.catalogue.stats().await?))
}

#[utoipa::path(
    get,
    path = "/occupations/categories",
    tag = "occupations",
    params(CategoryListing),
    responses(
        (status = 200, description = "Active occupations by major group", body = [OccupationCategory]),
        (status = 400, description = "per_category outside 1 to 20", body = ErrorBody)
    )
)]
pub async fn occupation_categories(
    State(state): State<AppState>,
    Query(listing): Query<CategoryListing>,
) -> ApiResult<Json<Vec<OccupationCategory>>> {
    Ok(Json(state.catalogue.categories(&listing).await?))
}

#[utoipa::path(
    get,
    path = "/occupations/validate/{code}",
    tag = "occupations",
    params(("code" = String, Path, description = "DANE occupation code")),
    responses(
        (status = 200, description = "Whether the code exists; unknown codes are not an error", body = CodeValidation)
    )
)]
pub async fn validate_occupation_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<Json<CodeValidation>> {
    Ok(Json(state.catalogue.validate_code(&code).await?))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/occupations", get(search_occupations))
        .route("/occupations/stats", get(catalogue_stats))
        .route("/occupations/categories", get(occupation_categories))
        .route("/occupations/validate/:code", get(validate_occupation_code))
        .route("/occupations/:code", get(occupation_by_code))
}
