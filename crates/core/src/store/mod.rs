//! Table gateway over the relational store.
//!
//! Every service talks to storage through [`RecordStore`], a row-level API over named tables
//! with JSON-object rows. Two implementations exist:
//!
//! - [`PostgresStore`]: the production backend, one dynamic SQL path for every table
//! - [`MemoryStore`]: process-local tables for development and tests
//!
//! Rows are `serde_json::Map`s keyed by column name. The store generates `id`, `created_at`
//! and `updated_at`; everything else is whatever the caller wrote.

mod memory;
mod postgres;
#[cfg(test)]
pub(crate) mod testing;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use crate::config::{CoreConfig, StoreBackend};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// A stored row: column name to JSON value.
pub type Row = serde_json::Map<String, Value>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("duplicate value violates unique constraint {constraint} on {table}")]
    UniqueViolation {
        table: &'static str,
        constraint: String,
    },
    #[error("invalid column name: {0}")]
    InvalidColumn(String),
    #[error("row returned from {table} is not a JSON object")]
    MalformedRow { table: &'static str },
    #[error("refusing to {operation} {table} without a filter")]
    UnfilteredWrite {
        operation: &'static str,
        table: &'static str,
    },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

// ============================================================================
// TABLES
// ============================================================================

/// Every table the API reads or writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Table {
    Patients,
    Doctors,
    Encounters,
    MaternalPerinatalCare,
    EarlyChildhoodCare,
    ChildhoodCare,
    AdolescenceCare,
    AdulthoodCare,
    OldAgeCare,
    ChronicDiseaseControls,
    HypertensionDetails,
    DiabetesDetails,
    KidneyDiseaseDetails,
    DyslipidemiaDetails,
    CancerScreenings,
    CollectiveInterventions,
    PublicHealthSettings,
    FamilyUnits,
    IntegralCarePlans,
    Occupations,
}

impl Table {
    pub const fn name(self) -> &'static str {
        match self {
            Table::Patients => "patients",
            Table::Doctors => "doctors",
            Table::Encounters => "encounters",
            Table::MaternalPerinatalCare => "maternal_perinatal_care",
            Table::EarlyChildhoodCare => "early_childhood_care",
            Table::ChildhoodCare => "childhood_care",
            Table::AdolescenceCare => "adolescence_care",
            Table::AdulthoodCare => "adulthood_care",
            Table::OldAgeCare => "old_age_care",
            Table::ChronicDiseaseControls => "chronic_disease_controls",
            Table::HypertensionDetails => "hypertension_details",
            Table::DiabetesDetails => "diabetes_details",
            Table::KidneyDiseaseDetails => "kidney_disease_details",
            Table::DyslipidemiaDetails => "dyslipidemia_details",
            Table::CancerScreenings => "cancer_screenings",
            Table::CollectiveInterventions => "collective_interventions",
            Table::PublicHealthSettings => "public_health_settings",
            Table::FamilyUnits => "family_units",
            Table::IntegralCarePlans => "integral_care_plans",
            Table::Occupations => "occupations",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// QUERIES
// ============================================================================

/// A single column predicate. Predicates in a slice are AND-ed.
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    Eq(&'static str, Value),
    Gte(&'static str, Value),
    Lte(&'static str, Value),
    /// Case-insensitive substring match on the column's text form.
    ILike(&'static str, String),
    /// Case-sensitive prefix match on the column's text form.
    StartsWith(&'static str, String),
    /// The column holds a JSON array containing the value.
    Contains(&'static str, Value),
}

fn to_json(value: impl Serialize) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

impl Filter {
    pub fn eq(column: &'static str, value: impl Serialize) -> Self {
        Filter::Eq(column, to_json(value))
    }

    pub fn gte(column: &'static str, value: impl Serialize) -> Self {
        Filter::Gte(column, to_json(value))
    }

    pub fn lte(column: &'static str, value: impl Serialize) -> Self {
        Filter::Lte(column, to_json(value))
    }

    pub fn ilike(column: &'static str, term: impl Into<String>) -> Self {
        Filter::ILike(column, term.into())
    }

    pub fn starts_with(column: &'static str, prefix: impl Into<String>) -> Self {
        Filter::StartsWith(column, prefix.into())
    }

    pub fn contains(column: &'static str, value: impl Serialize) -> Self {
        Filter::Contains(column, to_json(value))
    }

    pub fn id(id: uuid::Uuid) -> Self {
        Filter::eq(crate::constants::ID_COLUMN, id)
    }

    pub fn column(&self) -> &'static str {
        match self {
            Filter::Eq(c, _)
            | Filter::Gte(c, _)
            | Filter::Lte(c, _)
            | Filter::ILike(c, _)
            | Filter::StartsWith(c, _)
            | Filter::Contains(c, _) => c,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Order {
    pub column: &'static str,
    pub descending: bool,
}

/// Select parameters: filters, one ordering column and paging.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Adds the filter only when `filter` is `Some`.
    pub fn filter_opt(self, filter: Option<Filter>) -> Self {
        match filter {
            Some(f) => self.filter(f),
            None => self,
        }
    }

    pub fn order_by(mut self, column: &'static str, descending: bool) -> Self {
        self.order = Some(Order { column, descending });
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }
}

// ============================================================================
// STORE TRAIT
// ============================================================================

/// Row-level operations on named tables.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert one row and return it as stored, including generated columns.
    async fn insert(&self, table: Table, row: Row) -> StoreResult<Row>;

    async fn select(&self, table: Table, query: &Query) -> StoreResult<Vec<Row>>;

    /// Apply `patch` to every row matching `filters`; returns the updated rows.
    async fn update(&self, table: Table, filters: &[Filter], patch: Row) -> StoreResult<Vec<Row>>;

    /// Delete every row matching `filters`; returns the deleted rows.
    async fn delete(&self, table: Table, filters: &[Filter]) -> StoreResult<Vec<Row>>;

    async fn count(&self, table: Table, filters: &[Filter]) -> StoreResult<u64>;

    async fn ping(&self) -> StoreResult<()>;
}

/// Build the store selected by `cfg`, running migrations first when configured.
///
/// # Errors
///
/// Returns `StoreError` if the Postgres pool cannot connect or migrations fail.
pub async fn connect(cfg: &CoreConfig) -> StoreResult<Arc<dyn RecordStore>> {
    match cfg.store_backend() {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Postgres => {
            let url = cfg.database_url().ok_or_else(|| {
                StoreError::Unavailable("DATABASE_URL is not configured".into())
            })?;
            let store = PostgresStore::connect(url, cfg.max_connections()).await?;
            if cfg.run_migrations() {
                store.migrate().await?;
            }
            Ok(Arc::new(store))
        }
    }
}
