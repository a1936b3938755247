//! Public-health settings: the places where collective and family interventions happen.

use super::{RecordMeta, TableRecord};
use crate::store::Table;
use crate::validation::check_non_negative;
use crate::CoreResult;
use chrono::NaiveDate;
use ips_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

/// The five normative setting types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettingType {
    FamilyHome,
    Educational,
    Community,
    Workplace,
    HealthServices,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterventionComplexity {
    BasicPromotion,
    EarlyIntervention,
    SpecialisedManagement,
    IntersectoralCoordination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivationState {
    Active,
    PartiallyActive,
    TemporarilyInactive,
    Deactivated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PublicHealthSetting {
    #[serde(flatten)]
    pub meta: RecordMeta,
    /// Unique setting code.
    #[schema(value_type = String)]
    pub code: NonEmptyText,
    #[schema(value_type = String)]
    pub name: NonEmptyText,
    pub setting_type: SettingType,
    #[serde(default)]
    pub complexity: Option<InterventionComplexity>,
    #[serde(default = "default_state")]
    pub activation_state: ActivationState,

    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub municipality: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,

    #[serde(default)]
    pub target_population: Option<String>,
    #[serde(default)]
    pub estimated_population: Option<i32>,

    /// Free-form characterisation blocks.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub demographic_profile: Option<Value>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub risk_factors: Option<Value>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub protective_factors: Option<Value>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub available_resources: Option<Value>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub intersectoral_partners: Option<Value>,

    #[serde(default)]
    pub coordinator_id: Option<Uuid>,
    #[serde(default)]
    pub characterised_on: Option<NaiveDate>,
    #[serde(default)]
    pub next_review_on: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_state() -> ActivationState {
    ActivationState::Active
}

impl TableRecord for PublicHealthSetting {
    const TABLE: Table = Table::PublicHealthSettings;
    const LABEL: &'static str = "Public-health setting";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn validate(&self) -> CoreResult<()> {
        crate::validation::check_range("latitude", self.latitude, -90.0, 90.0)?;
        crate::validation::check_range("longitude", self.longitude, -180.0, 180.0)?;
        check_non_negative("estimated_population", self.estimated_population)
    }

    fn unique_key(&self) -> Option<(&'static str, Value)> {
        Some(("code", Value::String(self.code.as_str().to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_and_unique_code() {
        let setting: PublicHealthSetting = serde_json::from_value(json!({
            "code": "ENT-001",
            "name": "Vereda El Carmen",
            "setting_type": "COMMUNITY",
            "risk_factors": {"water": "untreated"}
        }))
        .expect("deserialize should succeed");
        assert_eq!(setting.activation_state, ActivationState::Active);
        assert_eq!(setting.unique_key(), Some(("code", json!("ENT-001"))));
        assert!(setting.validate().is_ok());
    }

    #[test]
    fn test_unknown_setting_type_rejected() {
        let result = serde_json::from_value::<PublicHealthSetting>(json!({
            "code": "ENT-002",
            "name": "Colegio",
            "setting_type": "SCHOOLYARD"
        }));
        assert!(result.is_err());
    }
}
