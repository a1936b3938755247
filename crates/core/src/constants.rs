//! Constants used throughout the IPS core crate.

/// Default number of rows returned by list operations when the caller gives no limit.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Hard ceiling for a single page, regardless of configuration.
pub const MAX_PAGE_SIZE: u32 = 500;

/// Default size of the Postgres connection pool.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Server-managed columns present on every table.
pub const ID_COLUMN: &str = "id";
pub const CREATED_AT_COLUMN: &str = "created_at";
pub const UPDATED_AT_COLUMN: &str = "updated_at";

/// Server-managed columns removed from client payloads before a write.
pub const MANAGED_COLUMNS: [&str; 3] = [ID_COLUMN, CREATED_AT_COLUMN, UPDATED_AT_COLUMN];

/// Days between early-childhood growth and development visits.
pub const EARLY_CHILDHOOD_VISIT_INTERVAL_DAYS: u32 = 180;

/// EAD-3 total above which development is considered appropriate for age.
pub const EAD3_APPROPRIATE_TOTAL: i32 = 200;

/// Default number of occupations returned by a catalogue search.
pub const DEFAULT_OCCUPATION_SEARCH_LIMIT: u32 = 20;

/// Environment variables read once at startup by the binaries.
pub const ENV_STORE: &str = "IPS_STORE";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_DB_MAX_CONNECTIONS: &str = "IPS_DB_MAX_CONNECTIONS";
pub const ENV_RUN_MIGRATIONS: &str = "IPS_RUN_MIGRATIONS";
pub const ENV_DEFAULT_PAGE_SIZE: &str = "IPS_DEFAULT_PAGE_SIZE";
pub const ENV_MAX_PAGE_SIZE: &str = "IPS_MAX_PAGE_SIZE";
