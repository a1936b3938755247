//! Record models, one module per clinical domain.
//!
//! Each model maps 1:1 onto a table. Models carry a flattened [`RecordMeta`] for the
//! server-managed columns, and encounter details additionally flatten an [`EncounterLink`].
//! Presence and type checks come from serde; value ranges are checked by
//! [`TableRecord::validate`].

pub mod adolescence;
pub mod adulthood;
pub mod cancer_screening;
pub mod childhood;
pub mod chronic;
pub mod collective;
pub mod doctor;
pub mod early_childhood;
pub mod encounter;
pub mod family;
pub mod integral_care;
pub mod maternal;
pub mod occupation;
pub mod old_age;
pub mod patient;
pub mod public_health_setting;

use crate::constants::MANAGED_COLUMNS;
use crate::store::{Row, Table};
use crate::{CoreError, CoreResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

pub use encounter::EncounterKind;

// ============================================================================
// SHARED COLUMNS
// ============================================================================

/// Server-managed columns. Ignored on create and replace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RecordMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Columns tying an encounter detail to its patient and generic encounter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EncounterLink {
    pub patient_id: Uuid,
    #[serde(default)]
    pub doctor_id: Option<Uuid>,
    /// Set by the server when the linked write creates the generic encounter.
    #[serde(default)]
    pub encounter_id: Option<Uuid>,
    pub encounter_date: NaiveDate,
    #[serde(default)]
    pub setting: Option<String>,
}

// ============================================================================
// RECORD TRAITS
// ============================================================================

/// A model stored as one row of [`TableRecord::TABLE`].
pub trait TableRecord: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const TABLE: Table;
    /// Human-readable entity name used in error messages.
    const LABEL: &'static str;

    fn meta(&self) -> &RecordMeta;

    /// Value-range and cross-field checks beyond what deserialisation enforces.
    fn validate(&self) -> CoreResult<()> {
        Ok(())
    }

    /// Fill derived columns before a write.
    fn normalize(&mut self) {}

    /// Column that must be unique across the table, with this record's value.
    fn unique_key(&self) -> Option<(&'static str, Value)> {
        None
    }

    fn id(&self) -> Option<Uuid> {
        self.meta().id
    }
}

/// A type-specific extension of a generic encounter.
pub trait EncounterDetail: TableRecord {
    /// Response shape: the record plus its computed assessment.
    type View: Serialize + Send;

    fn kind(&self) -> EncounterKind;
    fn link(&self) -> &EncounterLink;
    fn link_mut(&mut self) -> &mut EncounterLink;
    fn into_view(self) -> Self::View;
}

// ============================================================================
// ROW CONVERSION
// ============================================================================

fn to_object<T: Serialize>(record: &T) -> CoreResult<Row> {
    match serde_json::to_value(record).map_err(CoreError::Serialization)? {
        Value::Object(row) => Ok(row),
        _ => Err(CoreError::InvalidInput(
            "record did not serialise to an object".into(),
        )),
    }
}

fn strip_managed(row: &mut Row) {
    for column in MANAGED_COLUMNS {
        row.remove(column);
    }
}

/// Row for an insert: managed and null columns removed so table defaults apply.
pub(crate) fn to_insert_row<T: Serialize>(record: &T) -> CoreResult<Row> {
    let mut row = to_object(record)?;
    strip_managed(&mut row);
    row.retain(|_, v| !v.is_null());
    Ok(row)
}

/// Row for a full replacement: managed columns removed, nulls kept so they clear the column.
pub(crate) fn to_replace_row<T: Serialize>(record: &T) -> CoreResult<Row> {
    let mut row = to_object(record)?;
    strip_managed(&mut row);
    Ok(row)
}

pub(crate) fn from_row<T: DeserializeOwned>(row: Row) -> CoreResult<T> {
    serde_json::from_value(Value::Object(row)).map_err(CoreError::Deserialization)
}

pub(crate) fn row_id(row: &Row) -> CoreResult<Uuid> {
    row.get(crate::constants::ID_COLUMN)
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| CoreError::InvalidInput("stored row has no id".into()))
}

/// Build a patch row from column/value pairs.
pub(crate) fn patch<const N: usize>(pairs: [(&str, Value); N]) -> Row {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}
