//! # API REST
//!
//! REST API for the IPS clinical record.
//!
//! Handles:
//! - HTTP endpoints with axum, one handler module per family of resources
//! - Mapping of core errors to status codes and `{"detail": ...}` bodies
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, request tracing)
//!
//! All business rules live in `ips-core`; handlers only extract, delegate and wrap.

#![warn(rust_2018_idioms)]

pub mod docs;
pub mod error;
pub mod handlers;
pub mod state;

pub use docs::ApiDoc;
pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::routing::get;
use axum::Router;
use ips_core::store;
use ips_core::CoreConfig;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Default listen address when `IPS_REST_ADDR` is unset.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

/// Build the full application router over `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .merge(handlers::people::routes())
        .merge(handlers::encounters::routes())
        .merge(handlers::encounters::maternal::routes())
        .merge(handlers::encounters::early_childhood::routes())
        .merge(handlers::early_childhood::routes())
        .merge(handlers::encounters::childhood::routes())
        .merge(handlers::encounters::adolescence::routes())
        .merge(handlers::encounters::adulthood::routes())
        .merge(handlers::encounters::old_age::routes())
        .merge(handlers::life_stages::routes())
        .merge(handlers::encounters::cancer_screening::routes())
        .merge(handlers::screening::routes())
        .merge(handlers::chronic::routes())
        .merge(handlers::population::routes())
        .merge(handlers::catalogue::routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Connect the configured store, build the router and serve it on `addr` until the
/// process stops.
///
/// # Errors
///
/// Returns an error if:
/// - the record store cannot be reached or migrated,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
pub async fn serve(addr: &str, cfg: CoreConfig) -> anyhow::Result<()> {
    let cfg = Arc::new(cfg);
    let store = store::connect(&cfg).await?;
    let app = router(AppState::new(store, cfg));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("++ IPS REST API listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests;
