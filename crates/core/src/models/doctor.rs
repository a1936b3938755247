use super::{RecordMeta, TableRecord};
use crate::store::Table;
use ips_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A professional who attends encounters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Doctor {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[schema(value_type = String)]
    pub first_name: NonEmptyText,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[schema(value_type = String)]
    pub first_surname: NonEmptyText,
    #[serde(default)]
    pub second_surname: Option<String>,
    #[serde(default)]
    pub professional_registration: Option<String>,
    #[serde(default)]
    pub specialty: Option<String>,
}

impl TableRecord for Doctor {
    const TABLE: Table = Table::Doctors;
    const LABEL: &'static str = "Doctor";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }
}
