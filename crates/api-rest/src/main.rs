//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own, with OpenAPI/Swagger UI.
//!
//! ## Intended use
//! Useful for development against the in-memory store (`IPS_STORE=memory`). The workspace's
//! main `ips-run` binary serves the same router.

use api_rest::DEFAULT_REST_ADDR;
use ips_core::CoreConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the IPS REST API server
///
/// # Environment Variables
/// - `IPS_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `IPS_STORE`, `DATABASE_URL`, `IPS_DB_MAX_CONNECTIONS`, `IPS_RUN_MIGRATIONS`,
///   `IPS_DEFAULT_PAGE_SIZE`, `IPS_MAX_PAGE_SIZE`: see [`CoreConfig::from_lookup`]
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid, or
/// - the server fails to start or while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("ips_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("IPS_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into());
    let cfg = CoreConfig::from_lookup(|name| std::env::var(name).ok())?;

    tracing::info!("-- Starting IPS REST API on {}", addr);
    api_rest::serve(&addr, cfg).await
}
