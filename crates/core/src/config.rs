//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services, so
//! request handling never reads process-wide environment variables.

use crate::constants::{
    DEFAULT_MAX_CONNECTIONS, DEFAULT_PAGE_SIZE, ENV_DATABASE_URL, ENV_DB_MAX_CONNECTIONS,
    ENV_DEFAULT_PAGE_SIZE, ENV_MAX_PAGE_SIZE, ENV_RUN_MIGRATIONS, ENV_STORE, MAX_PAGE_SIZE,
};
use crate::{CoreError, CoreResult};

/// Which [`RecordStore`](crate::store::RecordStore) implementation backs the services.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(CoreError::InvalidInput(format!(
                "unknown store backend '{other}' (expected 'postgres' or 'memory')"
            ))),
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    store_backend: StoreBackend,
    database_url: Option<String>,
    max_connections: u32,
    run_migrations: bool,
    default_page_size: u32,
    max_page_size: u32,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidInput` if:
    /// - the Postgres backend is selected without a database URL,
    /// - the pool size is zero, or
    /// - the page sizes are zero, inverted, or above [`MAX_PAGE_SIZE`].
    pub fn new(
        store_backend: StoreBackend,
        database_url: Option<String>,
        max_connections: u32,
        run_migrations: bool,
        default_page_size: u32,
        max_page_size: u32,
    ) -> CoreResult<Self> {
        let database_url = database_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(CoreError::InvalidInput(
                "DATABASE_URL is required for the postgres store".into(),
            ));
        }
        if max_connections == 0 {
            return Err(CoreError::InvalidInput(
                "max_connections must be greater than zero".into(),
            ));
        }
        if default_page_size == 0 || max_page_size == 0 {
            return Err(CoreError::InvalidInput(
                "page sizes must be greater than zero".into(),
            ));
        }
        if default_page_size > max_page_size || max_page_size > MAX_PAGE_SIZE {
            return Err(CoreError::InvalidInput(format!(
                "page sizes must satisfy default <= max <= {MAX_PAGE_SIZE}"
            )));
        }

        Ok(Self {
            store_backend,
            database_url,
            max_connections,
            run_migrations,
            default_page_size,
            max_page_size,
        })
    }

    /// Resolve a configuration from environment-style lookups.
    ///
    /// Binaries pass `|name| std::env::var(name).ok()`; tests pass a map.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidInput` if a value does not parse or the combination is
    /// rejected by [`CoreConfig::new`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CoreResult<Self> {
        Self::new(
            store_backend_from_env_value(lookup(ENV_STORE))?,
            lookup(ENV_DATABASE_URL),
            u32_from_env_value(
                ENV_DB_MAX_CONNECTIONS,
                lookup(ENV_DB_MAX_CONNECTIONS),
                DEFAULT_MAX_CONNECTIONS,
            )?,
            bool_from_env_value(ENV_RUN_MIGRATIONS, lookup(ENV_RUN_MIGRATIONS), true)?,
            u32_from_env_value(
                ENV_DEFAULT_PAGE_SIZE,
                lookup(ENV_DEFAULT_PAGE_SIZE),
                DEFAULT_PAGE_SIZE,
            )?,
            u32_from_env_value(ENV_MAX_PAGE_SIZE, lookup(ENV_MAX_PAGE_SIZE), MAX_PAGE_SIZE)?,
        )
    }

    /// In-memory configuration with default limits, used by tests and local demos.
    pub fn in_memory() -> Self {
        Self {
            store_backend: StoreBackend::Memory,
            database_url: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            run_migrations: false,
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }

    pub fn store_backend(&self) -> StoreBackend {
        self.store_backend
    }

    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref()
    }

    pub fn max_connections(&self) -> u32 {
        self.max_connections
    }

    pub fn run_migrations(&self) -> bool {
        self.run_migrations
    }

    /// Clamp a caller-supplied page size to the configured bounds.
    pub fn page_size(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size)
    }
}

/// Parse the store backend from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`StoreBackend::Postgres`].
pub fn store_backend_from_env_value(value: Option<String>) -> CoreResult<StoreBackend> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let parsed = value.map(|v| v.parse::<StoreBackend>()).transpose()?;

    Ok(parsed.unwrap_or(StoreBackend::Postgres))
}

/// Parse an optional numeric setting, falling back to `default` when unset.
pub fn u32_from_env_value(name: &str, value: Option<String>, default: u32) -> CoreResult<u32> {
    match value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(v) => v
            .parse::<u32>()
            .map_err(|_| CoreError::InvalidInput(format!("{name} must be a positive integer"))),
    }
}

/// Parse an optional boolean setting (`true/false/1/0/yes/no`), falling back to `default`.
pub fn bool_from_env_value(name: &str, value: Option<String>, default: bool) -> CoreResult<bool> {
    match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") => Ok(default),
        Some("true" | "1" | "yes") => Ok(true),
        Some("false" | "0" | "no") => Ok(false),
        Some(_) => Err(CoreError::InvalidInput(format!("{name} must be a boolean"))),
    }
}
