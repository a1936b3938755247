use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::DEFAULT_REST_ADDR;
use ips_core::CoreConfig;

/// Main entry point for the IPS application
///
/// Loads `.env`, resolves the core configuration once and serves the REST API.
///
/// # Environment Variables
/// - `IPS_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `IPS_STORE`: `postgres` (default) or `memory`
/// - `DATABASE_URL`: Postgres connection string, required for the postgres store
/// - `IPS_DB_MAX_CONNECTIONS`: pool size (default: 5)
/// - `IPS_RUN_MIGRATIONS`: apply embedded migrations at startup (default: true)
/// - `IPS_DEFAULT_PAGE_SIZE` / `IPS_MAX_PAGE_SIZE`: list paging (defaults: 50 / 500)
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, startup or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ips_run=info".parse()?)
                .add_directive("ips_core=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("IPS_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into());
    let cfg = CoreConfig::from_lookup(|name| std::env::var(name).ok())?;

    tracing::info!(
        store = ?cfg.store_backend(),
        "++ Starting IPS REST on {}",
        rest_addr
    );

    api_rest::serve(&rest_addr, cfg).await
}
