//! Mapping from core errors to HTTP responses.

use api_shared::ErrorBody;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use ips_core::CoreError;

/// Error returned by every handler; renders as `{"detail": ...}`.
#[derive(Debug)]
pub struct ApiError(pub CoreError);

pub type ApiResult<T> = Result<T, ApiError>;

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            CoreError::InvalidInput(_) | CoreError::UnknownPatient(_) => StatusCode::BAD_REQUEST,
            CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            CoreError::Conflict { .. } => StatusCode::CONFLICT,
            CoreError::Store(_)
            | CoreError::Serialization(_)
            | CoreError::Deserialization(_)
            | CoreError::CompensationFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
            "Internal error".to_string()
        } else {
            self.0.to_string()
        };
        (status, Json(ErrorBody::new(detail))).into_response()
    }
}
