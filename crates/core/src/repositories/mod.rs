//! Record services.
//!
//! Each service wraps the shared [`RecordStore`](crate::store::RecordStore) and the resolved
//! [`CoreConfig`](crate::config::CoreConfig), and owns the rules for one family of tables:
//!
//! - [`records`]: plain single-table CRUD for any [`TableRecord`](crate::models::TableRecord)
//! - [`encounters`]: typed encounter details written through a linked write, plus the generic
//!   encounter read API
//! - [`chronic`]: the three-level chronic-disease control write
//! - [`early_childhood`], [`life_stages`] and [`screening`]: per-type listings, statistics and
//!   reports over encounter details
//! - [`population`]: settings, family units, collective interventions and integral care plans
//! - [`catalogue`]: occupation lookups
//!
//! Services hold no request state and are cheap to clone.

pub mod catalogue;
pub mod chronic;
pub mod early_childhood;
pub mod encounters;
pub mod life_stages;
pub mod population;
pub mod records;
pub mod screening;

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

/// Caller-supplied paging. Limits are clamped to the configured bounds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct Page {
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
}

impl Page {
    pub fn new(limit: Option<u32>, offset: Option<u32>) -> Self {
        Self { limit, offset }
    }
}
