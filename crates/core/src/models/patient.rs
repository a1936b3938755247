use super::{RecordMeta, TableRecord};
use crate::store::Table;
use crate::{CoreError, CoreResult};
use chrono::{NaiveDate, Utc};
use ips_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Identity document types accepted by the national registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum DocumentType {
    /// Cédula de ciudadanía
    CC,
    /// Tarjeta de identidad
    TI,
    /// Registro civil
    RC,
    /// Cédula de extranjería
    CE,
    /// Pasaporte
    PA,
    /// Permiso por protección temporal
    PPT,
    /// Adulto sin identificación
    AS,
    /// Menor sin identificación
    MS,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sex {
    Female,
    Male,
    Intersex,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Patient {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub document_type: DocumentType,
    #[schema(value_type = String)]
    pub document_number: NonEmptyText,
    #[schema(value_type = String)]
    pub first_name: NonEmptyText,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[schema(value_type = String)]
    pub first_surname: NonEmptyText,
    #[serde(default)]
    pub second_surname: Option<String>,
    pub birth_date: NaiveDate,
    pub sex: Sex,
    /// DANE occupation code from the occupations catalogue.
    #[serde(default)]
    pub occupation_code: Option<String>,
}

impl Patient {
    /// Age in completed years on `on`.
    pub fn age_on(&self, on: NaiveDate) -> u32 {
        on.years_since(self.birth_date).unwrap_or(0)
    }
}

impl TableRecord for Patient {
    const TABLE: Table = Table::Patients;
    const LABEL: &'static str = "Patient";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn validate(&self) -> CoreResult<()> {
        if self.birth_date > Utc::now().date_naive() {
            return Err(CoreError::InvalidInput(
                "birth_date cannot be in the future".into(),
            ));
        }
        if let Some(code) = &self.occupation_code {
            ips_types::OccupationCode::parse(code)
                .map_err(|e| CoreError::InvalidInput(e.to_string()))?;
        }
        Ok(())
    }

    fn unique_key(&self) -> Option<(&'static str, Value)> {
        Some((
            "document_number",
            Value::String(self.document_number.as_str().to_string()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn patient_json() -> Value {
        json!({
            "document_type": "CC",
            "document_number": " 1020304050 ",
            "first_name": "Ana",
            "first_surname": "Pérez",
            "birth_date": "1990-04-12",
            "sex": "FEMALE"
        })
    }

    #[test]
    fn test_patient_deserialize_trims_required_text() {
        let patient: Patient =
            serde_json::from_value(patient_json()).expect("deserialize should succeed");
        assert_eq!(patient.document_number.as_str(), "1020304050");
        assert!(patient.validate().is_ok());
        assert_eq!(
            patient.unique_key(),
            Some(("document_number", json!("1020304050")))
        );
    }

    #[test]
    fn test_patient_rejects_blank_name_and_bad_occupation() {
        let mut value = patient_json();
        value["first_name"] = json!("  ");
        assert!(serde_json::from_value::<Patient>(value).is_err());

        let mut patient: Patient =
            serde_json::from_value(patient_json()).expect("deserialize should succeed");
        patient.occupation_code = Some("ABC".into());
        assert!(patient.validate().is_err());
    }

    #[test]
    fn test_age_on() {
        let patient: Patient =
            serde_json::from_value(patient_json()).expect("deserialize should succeed");
        let on = NaiveDate::from_ymd_opt(2024, 4, 11).expect("valid date");
        assert_eq!(patient.age_on(on), 33);
    }
}
