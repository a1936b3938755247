//! Chronic-disease control and its per-condition detail tables.
//!
//! A control visit is stored across three levels: the generic encounter, the
//! `chronic_disease_controls` row, and one row in the detail table for the control's
//! condition. The detail row points back through `control_id`; the control points forward
//! through `condition_detail_id` once the write completes.

use super::{EncounterLink, RecordMeta, TableRecord};
use crate::store::Table;
use crate::validation::{body_mass_index, check_range, percentage};
use crate::{CoreError, CoreResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChronicCondition {
    Hypertension,
    Diabetes,
    KidneyDisease,
    Dyslipidemia,
}

impl ChronicCondition {
    pub const ALL: [ChronicCondition; 4] = [
        ChronicCondition::Hypertension,
        ChronicCondition::Diabetes,
        ChronicCondition::KidneyDisease,
        ChronicCondition::Dyslipidemia,
    ];

    pub fn detail_table(self) -> Table {
        match self {
            ChronicCondition::Hypertension => Table::HypertensionDetails,
            ChronicCondition::Diabetes => Table::DiabetesDetails,
            ChronicCondition::KidneyDisease => Table::KidneyDiseaseDetails,
            ChronicCondition::Dyslipidemia => Table::DyslipidemiaDetails,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlStatus {
    Controlled,
    NotControlled,
    InProgress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Adherence {
    Good,
    Regular,
    Poor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChronicRiskLevel {
    Low,
    Moderate,
    High,
}

// ============================================================================
// CONTROL
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChronicControl {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(flatten)]
    pub link: EncounterLink,

    pub condition: ChronicCondition,
    /// Row in the condition's detail table; set by the server.
    #[serde(default)]
    pub condition_detail_id: Option<Uuid>,
    pub control_status: ControlStatus,
    #[serde(default)]
    pub adherence: Option<Adherence>,

    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub height_cm: Option<f64>,
    #[serde(default)]
    pub bmi: Option<f64>,
    #[serde(default)]
    pub systolic_bp: Option<i32>,
    #[serde(default)]
    pub diastolic_bp: Option<i32>,
    #[serde(default)]
    pub complications: Option<String>,
    #[serde(default)]
    pub next_control_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl TableRecord for ChronicControl {
    const TABLE: Table = Table::ChronicDiseaseControls;
    const LABEL: &'static str = "Chronic-disease control";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn validate(&self) -> CoreResult<()> {
        check_range("weight_kg", self.weight_kg, 1.0, 400.0)?;
        check_range("height_cm", self.height_cm, 40.0, 250.0)?;
        check_range("systolic_bp", self.systolic_bp, 50, 300)?;
        check_range("diastolic_bp", self.diastolic_bp, 20, 200)?;
        Ok(())
    }

    fn normalize(&mut self) {
        if let Some(bmi) = body_mass_index(self.weight_kg, self.height_cm) {
            self.bmi = Some(bmi);
        }
    }
}

// ============================================================================
// CONDITION DETAILS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HypertensionDetail {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(default)]
    pub control_id: Option<Uuid>,
    /// 1 or 2.
    #[serde(default)]
    pub stage: Option<i32>,
    #[serde(default)]
    pub antihypertensive_count: Option<i32>,
    #[serde(default)]
    pub home_monitoring: bool,
    #[serde(default)]
    pub target_organ_damage: bool,
    #[serde(default)]
    pub low_sodium_diet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiabetesType {
    Type1,
    Type2,
    Gestational,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DiabetesDetail {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(default)]
    pub control_id: Option<Uuid>,
    #[serde(default)]
    pub diabetes_type: Option<DiabetesType>,
    #[serde(default)]
    pub hba1c_pct: Option<f64>,
    #[serde(default)]
    pub fasting_glucose_mg_dl: Option<f64>,
    #[serde(default)]
    pub uses_insulin: bool,
    #[serde(default)]
    pub foot_exam_done: bool,
    #[serde(default)]
    pub retinopathy_screening_done: bool,
    #[serde(default)]
    pub hypoglycemia_episodes: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct KidneyDiseaseDetail {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(default)]
    pub control_id: Option<Uuid>,
    /// KDIGO stage 1–5.
    #[serde(default)]
    pub stage: Option<i32>,
    #[serde(default)]
    pub egfr_ml_min: Option<f64>,
    #[serde(default)]
    pub creatinine_mg_dl: Option<f64>,
    #[serde(default)]
    pub albuminuria_mg_g: Option<f64>,
    #[serde(default)]
    pub on_dialysis: bool,
    #[serde(default)]
    pub nephrology_referral: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DyslipidemiaDetail {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(default)]
    pub control_id: Option<Uuid>,
    #[serde(default)]
    pub total_cholesterol_mg_dl: Option<f64>,
    #[serde(default)]
    pub ldl_mg_dl: Option<f64>,
    #[serde(default)]
    pub hdl_mg_dl: Option<f64>,
    #[serde(default)]
    pub triglycerides_mg_dl: Option<f64>,
    #[serde(default)]
    pub on_statin: bool,
}

macro_rules! condition_detail {
    ($ty:ty, $table:expr, $label:literal, |$d:ident| $validate:block) => {
        impl TableRecord for $ty {
            const TABLE: Table = $table;
            const LABEL: &'static str = $label;

            fn meta(&self) -> &RecordMeta {
                &self.meta
            }

            fn validate(&self) -> CoreResult<()> {
                let $d = self;
                $validate
            }
        }
    };
}

condition_detail!(HypertensionDetail, Table::HypertensionDetails, "Hypertension detail", |d| {
    check_range("stage", d.stage, 1, 2)?;
    crate::validation::check_non_negative("antihypertensive_count", d.antihypertensive_count)
});

condition_detail!(DiabetesDetail, Table::DiabetesDetails, "Diabetes detail", |d| {
    check_range("hba1c_pct", d.hba1c_pct, 3.0, 20.0)?;
    check_range("fasting_glucose_mg_dl", d.fasting_glucose_mg_dl, 20.0, 900.0)?;
    crate::validation::check_non_negative("hypoglycemia_episodes", d.hypoglycemia_episodes)
});

condition_detail!(KidneyDiseaseDetail, Table::KidneyDiseaseDetails, "Kidney-disease detail", |d| {
    check_range("stage", d.stage, 1, 5)?;
    check_range("egfr_ml_min", d.egfr_ml_min, 0.0, 200.0)
});

condition_detail!(DyslipidemiaDetail, Table::DyslipidemiaDetails, "Dyslipidemia detail", |d| {
    check_range("ldl_mg_dl", d.ldl_mg_dl, 0.0, 1000.0)?;
    check_range("triglycerides_mg_dl", d.triglycerides_mg_dl, 0.0, 5000.0)
});

// ============================================================================
// REQUEST / RESPONSE SHAPE
// ============================================================================

/// A control together with the detail block for its condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChronicControlRecord {
    #[serde(flatten)]
    pub control: ChronicControl,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hypertension: Option<HypertensionDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diabetes: Option<DiabetesDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kidney_disease: Option<KidneyDiseaseDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dyslipidemia: Option<DyslipidemiaDetail>,
}

impl ChronicControlRecord {
    pub fn new(control: ChronicControl) -> Self {
        Self {
            control,
            hypertension: None,
            diabetes: None,
            kidney_disease: None,
            dyslipidemia: None,
        }
    }

    /// Conditions for which a detail block is present.
    fn present_details(&self) -> Vec<ChronicCondition> {
        [
            (ChronicCondition::Hypertension, self.hypertension.is_some()),
            (ChronicCondition::Diabetes, self.diabetes.is_some()),
            (ChronicCondition::KidneyDisease, self.kidney_disease.is_some()),
            (ChronicCondition::Dyslipidemia, self.dyslipidemia.is_some()),
        ]
        .into_iter()
        .filter_map(|(c, present)| present.then_some(c))
        .collect()
    }

    /// Validate the control and its detail, which must match the control's condition.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidInput` for out-of-range values or a detail block for a
    /// different condition.
    pub fn validate(&self) -> CoreResult<()> {
        self.control.validate()?;
        if let Some(other) = self
            .present_details()
            .into_iter()
            .find(|c| *c != self.control.condition)
        {
            return Err(CoreError::InvalidInput(format!(
                "{other:?} details do not match condition {:?}",
                self.control.condition
            )));
        }
        if let Some(d) = &self.hypertension {
            d.validate()?;
        }
        if let Some(d) = &self.diabetes {
            d.validate()?;
        }
        if let Some(d) = &self.kidney_disease {
            d.validate()?;
        }
        if let Some(d) = &self.dyslipidemia {
            d.validate()?;
        }
        Ok(())
    }

    pub fn assess(&self) -> ChronicAssessment {
        let control = &self.control;
        let bmi = control
            .bmi
            .or_else(|| body_mass_index(control.weight_kg, control.height_cm));

        let mut points = 0;
        match bmi {
            Some(b) if b > 30.0 => points += 2,
            Some(b) if b > 25.0 => points += 1,
            _ => {}
        }
        if control.control_status == ControlStatus::NotControlled {
            points += 2;
        }
        if control.adherence == Some(Adherence::Poor) {
            points += 1;
        }
        let cardiovascular_risk = match points {
            ..=1 => ChronicRiskLevel::Low,
            2..=3 => ChronicRiskLevel::Moderate,
            _ => ChronicRiskLevel::High,
        };

        let adherence_score = match control.adherence {
            Some(Adherence::Good) => 85,
            Some(Adherence::Regular) => 60,
            Some(Adherence::Poor) => 30,
            None => 50,
        };

        let next_visit_days = match (control.control_status, control.condition) {
            (ControlStatus::NotControlled, _) => 30,
            (ControlStatus::InProgress, _) => 60,
            (_, ChronicCondition::Diabetes | ChronicCondition::Hypertension) => 90,
            _ => 120,
        };

        ChronicAssessment {
            control_adequate: control.control_status == ControlStatus::Controlled,
            bmi,
            cardiovascular_risk,
            adherence_score,
            next_visit_days,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ChronicAssessment {
    pub control_adequate: bool,
    pub bmi: Option<f64>,
    pub cardiovascular_risk: ChronicRiskLevel,
    pub adherence_score: u32,
    pub next_visit_days: u32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChronicControlView {
    #[serde(flatten)]
    pub record: ChronicControlRecord,
    pub assessment: ChronicAssessment,
}

impl From<ChronicControlRecord> for ChronicControlView {
    fn from(record: ChronicControlRecord) -> Self {
        let assessment = record.assess();
        Self { record, assessment }
    }
}

// ============================================================================
// AGGREGATES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ChronicStats {
    pub total: u64,
    pub hypertension: u64,
    pub diabetes: u64,
    pub kidney_disease: u64,
    pub dyslipidemia: u64,
    pub controlled_pct: f64,
    pub good_adherence_pct: f64,
}

impl ChronicStats {
    pub fn from_controls(controls: &[ChronicControl]) -> Self {
        let total = controls.len() as u64;
        let by = |condition| {
            controls
                .iter()
                .filter(|c| c.condition == condition)
                .count() as u64
        };
        let controlled = controls
            .iter()
            .filter(|c| c.control_status == ControlStatus::Controlled)
            .count() as u64;
        let good = controls
            .iter()
            .filter(|c| c.adherence == Some(Adherence::Good))
            .count() as u64;
        Self {
            total,
            hypertension: by(ChronicCondition::Hypertension),
            diabetes: by(ChronicCondition::Diabetes),
            kidney_disease: by(ChronicCondition::KidneyDisease),
            dyslipidemia: by(ChronicCondition::Dyslipidemia),
            controlled_pct: percentage(controlled, total),
            good_adherence_pct: percentage(good, total),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AdherenceReport {
    pub total: u64,
    pub good: u64,
    pub regular: u64,
    pub poor: u64,
    pub not_recorded: u64,
    pub good_pct: f64,
    pub regular_pct: f64,
    pub poor_pct: f64,
}

impl AdherenceReport {
    pub fn from_controls(controls: &[ChronicControl]) -> Self {
        let total = controls.len() as u64;
        let count = |level: Option<Adherence>| {
            controls.iter().filter(|c| c.adherence == level).count() as u64
        };
        let (good, regular, poor) = (
            count(Some(Adherence::Good)),
            count(Some(Adherence::Regular)),
            count(Some(Adherence::Poor)),
        );
        Self {
            total,
            good,
            regular,
            poor,
            not_recorded: count(None),
            good_pct: percentage(good, total),
            regular_pct: percentage(regular, total),
            poor_pct: percentage(poor, total),
        }
    }
}
