//! Maternal and perinatal care: pregnancy follow-up, delivery, newborn and puerperium.

use super::{EncounterDetail, EncounterKind, EncounterLink, RecordMeta, TableRecord};
use crate::store::Table;
use crate::validation::{check_non_negative, check_range};
use crate::CoreResult;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LabResult {
    Positive,
    Negative,
    Pending,
    NotPerformed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryType {
    Vaginal,
    Instrumented,
    Cesarean,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedingType {
    ExclusiveBreastfeeding,
    Mixed,
    Formula,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MaternalPerinatalCare {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(flatten)]
    pub link: EncounterLink,

    // Gestation
    #[serde(default)]
    pub last_menstrual_period: Option<NaiveDate>,
    #[serde(default)]
    pub estimated_due_date: Option<NaiveDate>,
    #[serde(default)]
    pub gestational_age_weeks: Option<i32>,
    #[serde(default)]
    pub prenatal_visit_number: Option<i32>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub systolic_bp: Option<i32>,
    #[serde(default)]
    pub diastolic_bp: Option<i32>,
    #[serde(default)]
    pub fundal_height_cm: Option<f64>,
    #[serde(default)]
    pub fetal_heart_rate: Option<i32>,

    // Screening
    #[serde(default)]
    pub hiv_result: Option<LabResult>,
    #[serde(default)]
    pub syphilis_result: Option<LabResult>,
    #[serde(default)]
    pub hepatitis_b_result: Option<LabResult>,
    #[serde(default)]
    pub toxoplasmosis_result: Option<LabResult>,
    #[serde(default)]
    pub group_b_strep_result: Option<LabResult>,

    // Vaccination and supplementation
    #[serde(default)]
    pub tdap_vaccine: bool,
    #[serde(default)]
    pub influenza_vaccine: bool,
    #[serde(default)]
    pub iron_supplement: bool,
    #[serde(default)]
    pub folic_acid_supplement: bool,
    #[serde(default)]
    pub calcium_supplement: bool,

    // Pre-existing conditions
    #[serde(default)]
    pub preexisting_diabetes: bool,
    #[serde(default)]
    pub preexisting_hypertension: bool,
    #[serde(default)]
    pub thyroid_disease: bool,
    #[serde(default)]
    pub epilepsy: bool,

    // Obstetric history
    #[serde(default)]
    pub gravidity: Option<i32>,
    #[serde(default)]
    pub parity: Option<i32>,
    #[serde(default)]
    pub cesareans: Option<i32>,
    #[serde(default)]
    pub abortions: Option<i32>,
    #[serde(default)]
    pub perinatal_deaths: Option<i32>,
    #[serde(default)]
    pub previous_preeclampsia: bool,
    #[serde(default)]
    pub previous_postpartum_hemorrhage: bool,
    #[serde(default)]
    pub multiple_pregnancy: bool,

    // Alarm signs
    #[serde(default)]
    pub vaginal_bleeding: bool,
    #[serde(default)]
    pub severe_headache: bool,
    #[serde(default)]
    pub blurred_vision: bool,
    #[serde(default)]
    pub reduced_fetal_movements: bool,

    // Delivery
    #[serde(default)]
    pub delivery_date: Option<NaiveDate>,
    #[serde(default)]
    pub delivery_type: Option<DeliveryType>,
    #[serde(default)]
    pub delivery_gestational_weeks: Option<i32>,
    #[serde(default)]
    pub delivery_complications: Option<String>,

    // Newborn
    #[serde(default)]
    pub newborn_weight_g: Option<i32>,
    #[serde(default)]
    pub newborn_length_cm: Option<f64>,
    #[serde(default)]
    pub apgar_1_min: Option<i32>,
    #[serde(default)]
    pub apgar_5_min: Option<i32>,
    #[serde(default)]
    pub newborn_tsh_screening: bool,
    #[serde(default)]
    pub newborn_hearing_screening: bool,
    #[serde(default)]
    pub vitamin_k_given: bool,
    #[serde(default)]
    pub eye_prophylaxis: bool,
    #[serde(default)]
    pub newborn_bcg: bool,
    #[serde(default)]
    pub newborn_hepatitis_b: bool,
    #[serde(default)]
    pub feeding_type: Option<FeedingType>,

    // Puerperium
    #[serde(default)]
    pub puerperium_days: Option<i32>,
    #[serde(default)]
    pub uterine_involution_normal: Option<bool>,
    #[serde(default)]
    pub lochia_normal: Option<bool>,
    #[serde(default)]
    pub postpartum_depression_screening: Option<LabResult>,
    #[serde(default)]
    pub family_planning_method: Option<String>,

    #[serde(default)]
    pub notes: Option<String>,
}

impl MaternalPerinatalCare {
    fn screening_results(&self) -> [Option<LabResult>; 5] {
        [
            self.hiv_result,
            self.syphilis_result,
            self.hepatitis_b_result,
            self.toxoplasmosis_result,
            self.group_b_strep_result,
        ]
    }

    pub fn assess(&self) -> MaternalAssessment {
        let alarm_signs_active = self.vaginal_bleeding
            || self.severe_headache
            || self.blurred_vision
            || self.reduced_fetal_movements;
        let prior_obstetric_risk = self.previous_preeclampsia
            || self.previous_postpartum_hemorrhage
            || self.perinatal_deaths.is_some_and(|n| n > 0)
            || self.multiple_pregnancy;
        let positive_screenings = self
            .screening_results()
            .iter()
            .filter(|r| **r == Some(LabResult::Positive))
            .count() as u32;
        let hypertensive = self.systolic_bp.is_some_and(|s| s >= 140)
            || self.diastolic_bp.is_some_and(|d| d >= 90);

        let high_risk = alarm_signs_active
            || hypertensive
            || positive_screenings > 0
            || self.preexisting_diabetes
            || self.preexisting_hypertension
            || prior_obstetric_risk;

        MaternalAssessment {
            alarm_signs_active,
            prior_obstetric_risk,
            positive_screenings,
            hypertensive,
            high_risk,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MaternalAssessment {
    pub alarm_signs_active: bool,
    pub prior_obstetric_risk: bool,
    pub positive_screenings: u32,
    /// Systolic ≥ 140 or diastolic ≥ 90 at this visit.
    pub hypertensive: bool,
    pub high_risk: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MaternalPerinatalView {
    #[serde(flatten)]
    pub record: MaternalPerinatalCare,
    pub assessment: MaternalAssessment,
}

impl TableRecord for MaternalPerinatalCare {
    const TABLE: Table = Table::MaternalPerinatalCare;
    const LABEL: &'static str = "Maternal-perinatal care";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn validate(&self) -> CoreResult<()> {
        check_range("gestational_age_weeks", self.gestational_age_weeks, 0, 45)?;
        check_range("delivery_gestational_weeks", self.delivery_gestational_weeks, 20, 45)?;
        check_range("apgar_1_min", self.apgar_1_min, 0, 10)?;
        check_range("apgar_5_min", self.apgar_5_min, 0, 10)?;
        check_range("newborn_weight_g", self.newborn_weight_g, 300, 7000)?;
        check_range("newborn_length_cm", self.newborn_length_cm, 20.0, 65.0)?;
        check_range("fetal_heart_rate", self.fetal_heart_rate, 60, 220)?;
        for (field, value) in [
            ("gravidity", self.gravidity),
            ("parity", self.parity),
            ("cesareans", self.cesareans),
            ("abortions", self.abortions),
            ("perinatal_deaths", self.perinatal_deaths),
            ("puerperium_days", self.puerperium_days),
        ] {
            check_non_negative(field, value)?;
        }
        Ok(())
    }
}

impl EncounterDetail for MaternalPerinatalCare {
    type View = MaternalPerinatalView;

    fn kind(&self) -> EncounterKind {
        EncounterKind::MaternalPerinatal
    }

    fn link(&self) -> &EncounterLink {
        &self.link
    }

    fn link_mut(&mut self) -> &mut EncounterLink {
        &mut self.link
    }

    fn into_view(self) -> Self::View {
        let assessment = self.assess();
        MaternalPerinatalView {
            record: self,
            assessment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> MaternalPerinatalCare {
        serde_json::from_value(json!({
            "patient_id": "7d1c1a52-59a2-4e1b-9a4f-0d8f1f3c2b11",
            "encounter_date": "2024-06-01",
            "gestational_age_weeks": 28,
            "hiv_result": "NEGATIVE",
            "systolic_bp": 110,
            "diastolic_bp": 70
        }))
        .expect("deserialize should succeed")
    }

    #[test]
    fn test_low_risk_pregnancy() {
        let assessment = record().assess();
        assert!(!assessment.high_risk);
        assert_eq!(assessment.positive_screenings, 0);
    }

    #[test]
    fn test_alarm_sign_or_positive_screening_is_high_risk() {
        let mut r = record();
        r.severe_headache = true;
        assert!(r.assess().alarm_signs_active);
        assert!(r.assess().high_risk);

        let mut r = record();
        r.syphilis_result = Some(LabResult::Positive);
        assert_eq!(r.assess().positive_screenings, 1);
        assert!(r.assess().high_risk);

        let mut r = record();
        r.diastolic_bp = Some(95);
        assert!(r.assess().hypertensive);
    }

    #[test]
    fn test_apgar_out_of_range_rejected() {
        let mut r = record();
        r.apgar_5_min = Some(11);
        assert!(r.validate().is_err());
        r.apgar_5_min = Some(9);
        r.parity = Some(-1);
        assert!(r.validate().is_err());
    }
}
