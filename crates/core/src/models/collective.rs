use super::{RecordMeta, TableRecord};
use crate::store::Table;
use chrono::NaiveDate;
use ips_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A group or population-level health activity, not tied to one patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CollectiveIntervention {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub intervention_date: NaiveDate,
    /// Setting where the activity happened, e.g. school, community, workplace.
    #[schema(value_type = String)]
    pub setting: NonEmptyText,
    #[schema(value_type = String)]
    pub topic: NonEmptyText,
    #[schema(value_type = String)]
    pub target_population: NonEmptyText,
    /// Professional in charge.
    #[serde(default)]
    pub lead_id: Option<Uuid>,
    #[serde(default)]
    pub participant_count: Option<i32>,
    #[serde(default)]
    pub summary: Option<String>,
}

impl TableRecord for CollectiveIntervention {
    const TABLE: Table = Table::CollectiveInterventions;
    const LABEL: &'static str = "Collective intervention";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn validate(&self) -> crate::CoreResult<()> {
        crate::validation::check_non_negative("participant_count", self.participant_count)
    }
}
