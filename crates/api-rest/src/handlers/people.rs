//! Patients and doctors: plain CRUD over their tables.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use api_shared::ErrorBody;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use ips_core::models::doctor::Doctor;
use ips_core::models::patient::Patient;
use ips_core::repositories::Page;
use ips_core::store::Filter;
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PatientQuery {
    /// Exact identity document number.
    #[serde(default)]
    pub document_number: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
}

// ============================================================================
// PATIENTS
// ============================================================================

#[utoipa::path(
    get,
    path = "/patients",
    tag = "patients",
    params(PatientQuery),
    responses(
        (status = 200, description = "One page of patients", body = [Patient]),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn list_patients(
    State(state): State<AppState>,
    Query(query): Query<PatientQuery>,
) -> ApiResult<Json<Vec<Patient>>> {
    let filters = query
        .document_number
        .as_deref()
        .map(|n| Filter::eq("document_number", n.trim()))
        .into_iter()
        .collect();
    let page = Page::new(query.limit, query.offset);
    Ok(Json(state.patients.list(filters, page).await?))
}

#[utoipa::path(
    post,
    path = "/patients",
    tag = "patients",
    request_body = Patient,
    responses(
        (status = 201, description = "Patient created", body = Patient),
        (status = 400, description = "Bad request", body = ErrorBody),
        (status = 409, description = "Document number already registered", body = ErrorBody)
    )
)]
/// Register a patient. `document_number` must be unique.
#[axum::debug_handler]
pub async fn create_patient(
    State(state): State<AppState>,
    Json(patient): Json<Patient>,
) -> ApiResult<(StatusCode, Json<Patient>)> {
    let created = state.patients.create(patient).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/patients/{id}",
    tag = "patients",
    params(("id" = Uuid, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient", body = Patient),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn get_patient(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Patient>> {
    Ok(Json(state.patients.get(id).await?))
}

#[utoipa::path(
    put,
    path = "/patients/{id}",
    tag = "patients",
    params(("id" = Uuid, Path, description = "Patient id")),
    request_body = Patient,
    responses(
        (status = 200, description = "Patient replaced", body = Patient),
        (status = 400, description = "Bad request", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody),
        (status = 409, description = "Document number already registered", body = ErrorBody)
    )
)]
/// Replace every field of a patient.
pub async fn replace_patient(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patient): Json<Patient>,
) -> ApiResult<Json<Patient>> {
    Ok(Json(state.patients.replace(id, patient).await?))
}

#[utoipa::path(
    delete,
    path = "/patients/{id}",
    tag = "patients",
    params(("id" = Uuid, Path, description = "Patient id")),
    responses(
        (status = 204, description = "Patient deleted"),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn delete_patient(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.patients.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// DOCTORS
// ============================================================================

#[utoipa::path(
    get,
    path = "/doctors",
    tag = "doctors",
    params(Page),
    responses(
        (status = 200, description = "One page of doctors", body = [Doctor])
    )
)]
pub async fn list_doctors(
    State(state): State<AppState>,
    Query(page): Query<Page>,
) -> ApiResult<Json<Vec<Doctor>>> {
    Ok(Json(state.doctors.list(Vec::new(), page).await?))
}

#[utoipa::path(
    post,
    path = "/doctors",
    tag = "doctors",
    request_body = Doctor,
    responses(
        (status = 201, description = "Doctor created", body = Doctor),
        (status = 400, description = "Bad request", body = ErrorBody)
    )
)]
pub async fn create_doctor(
    State(state): State<AppState>,
    Json(doctor): Json<Doctor>,
) -> ApiResult<(StatusCode, Json<Doctor>)> {
    let created = state.doctors.create(doctor).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/doctors/{id}",
    tag = "doctors",
    params(("id" = Uuid, Path, description = "Doctor id")),
    responses(
        (status = 200, description = "Doctor", body = Doctor),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn get_doctor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Doctor>> {
    Ok(Json(state.doctors.get(id).await?))
}

#[utoipa::path(
    put,
    path = "/doctors/{id}",
    tag = "doctors",
    params(("id" = Uuid, Path, description = "Doctor id")),
    request_body = Doctor,
    responses(
        (status = 200, description = "Doctor replaced", body = Doctor),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn replace_doctor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(doctor): Json<Doctor>,
) -> ApiResult<Json<Doctor>> {
    Ok(Json(state.doctors.replace(id, doctor).await?))
}

#[utoipa::path(
    delete,
    path = "/doctors/{id}",
    tag = "doctors",
    params(("id" = Uuid, Path, description = "Doctor id")),
    responses(
        (status = 204, description = "Doctor deleted"),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn delete_doctor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.doctors.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/patients", get(list_patients).post(create_patient))
        .route(
            "/patients/:id",
            get(get_patient).put(replace_patient).delete(delete_patient),
        )
        .route("/doctors", get(list_doctors).post(create_doctor))
        .route(
            "/doctors/:id",
            get(get_doctor).put(replace_doctor).delete(delete_doctor),
        )
}
