//! Early-childhood care (0–5 years): growth, EAD-3 / ASQ-3 development scales and vaccination.

use super::{EncounterDetail, EncounterKind, EncounterLink, RecordMeta, TableRecord};
use crate::constants::{EAD3_APPROPRIATE_TOTAL, EARLY_CHILDHOOD_VISIT_INTERVAL_DAYS};
use crate::store::Table;
use crate::validation::{check_range, percentage};
use crate::{CoreError, CoreResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NutritionalStatus {
    Normal,
    AcuteMalnutrition,
    ChronicMalnutrition,
    Overweight,
    Obesity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScreeningResult {
    Normal,
    Abnormal,
    NotPerformed,
}

/// Pentavalent doses that complete the primary series.
const PENTAVALENT_FULL_SERIES: i32 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EarlyChildhoodCare {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(flatten)]
    pub link: EncounterLink,

    #[serde(default)]
    pub age_months: Option<i32>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub height_cm: Option<f64>,
    #[serde(default)]
    pub head_circumference_cm: Option<f64>,
    #[serde(default)]
    pub nutritional_status: Option<NutritionalStatus>,

    // EAD-3
    #[serde(default)]
    pub ead3_applied: bool,
    #[serde(default)]
    pub ead3_gross_motor: Option<i32>,
    #[serde(default)]
    pub ead3_fine_motor: Option<i32>,
    #[serde(default)]
    pub ead3_hearing_language: Option<i32>,
    #[serde(default)]
    pub ead3_personal_social: Option<i32>,
    #[serde(default)]
    pub ead3_total: Option<i32>,
    #[serde(default)]
    pub ead3_applied_on: Option<NaiveDate>,

    // ASQ-3
    #[serde(default)]
    pub asq3_applied: bool,
    #[serde(default)]
    pub asq3_communication: Option<i32>,
    #[serde(default)]
    pub asq3_gross_motor: Option<i32>,
    #[serde(default)]
    pub asq3_fine_motor: Option<i32>,
    #[serde(default)]
    pub asq3_problem_solving: Option<i32>,
    #[serde(default)]
    pub asq3_personal_social: Option<i32>,
    #[serde(default)]
    pub asq3_applied_on: Option<NaiveDate>,

    // Vaccination
    #[serde(default)]
    pub bcg: bool,
    #[serde(default)]
    pub hepatitis_b_newborn: bool,
    #[serde(default)]
    pub pentavalent_doses: Option<i32>,
    #[serde(default)]
    pub mmr: bool,

    #[serde(default)]
    pub vision_screening: Option<ScreeningResult>,
    #[serde(default)]
    pub hearing_screening: Option<ScreeningResult>,
    #[serde(default)]
    pub dental_caries: bool,
    #[serde(default)]
    pub fluoride_varnish: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Scores for an EAD-3 application. Every area is required.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, ToSchema)]
pub struct Ead3Scores {
    pub gross_motor: Option<i32>,
    pub fine_motor: Option<i32>,
    pub hearing_language: Option<i32>,
    pub personal_social: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, ToSchema)]
pub struct Asq3Scores {
    #[serde(default)]
    pub communication: Option<i32>,
    #[serde(default)]
    pub gross_motor: Option<i32>,
    #[serde(default)]
    pub fine_motor: Option<i32>,
    #[serde(default)]
    pub problem_solving: Option<i32>,
    #[serde(default)]
    pub personal_social: Option<i32>,
}

impl EarlyChildhoodCare {
    /// Record an EAD-3 application on `today`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidInput` if any area is missing or outside 0–100.
    pub fn apply_ead3(&mut self, scores: Ead3Scores, today: NaiveDate) -> CoreResult<()> {
        let areas = [
            ("gross_motor", scores.gross_motor),
            ("fine_motor", scores.fine_motor),
            ("hearing_language", scores.hearing_language),
            ("personal_social", scores.personal_social),
        ];
        let mut total = 0;
        for (field, value) in areas {
            let value = value.ok_or_else(|| {
                CoreError::InvalidInput(format!("EAD-3 requires a {field} score"))
            })?;
            check_range(field, Some(value), 0, 100)?;
            total += value;
        }

        self.ead3_applied = true;
        self.ead3_gross_motor = scores.gross_motor;
        self.ead3_fine_motor = scores.fine_motor;
        self.ead3_hearing_language = scores.hearing_language;
        self.ead3_personal_social = scores.personal_social;
        self.ead3_total = Some(total);
        self.ead3_applied_on = Some(today);
        Ok(())
    }

    pub fn apply_asq3(&mut self, scores: Asq3Scores, today: NaiveDate) {
        self.asq3_applied = true;
        self.asq3_communication = scores.communication;
        self.asq3_gross_motor = scores.gross_motor;
        self.asq3_fine_motor = scores.fine_motor;
        self.asq3_problem_solving = scores.problem_solving;
        self.asq3_personal_social = scores.personal_social;
        self.asq3_applied_on = Some(today);
    }

    fn ead3_areas(&self) -> [Option<i32>; 4] {
        [
            self.ead3_gross_motor,
            self.ead3_fine_motor,
            self.ead3_hearing_language,
            self.ead3_personal_social,
        ]
    }

    pub fn vaccination_complete(&self) -> bool {
        self.bcg && self.hepatitis_b_newborn && self.pentavalent_complete() && self.mmr
    }

    fn pentavalent_complete(&self) -> bool {
        self.pentavalent_doses
            .is_some_and(|d| d >= PENTAVALENT_FULL_SERIES)
    }

    pub fn assess(&self) -> EarlyChildhoodAssessment {
        let development_appropriate = match (self.ead3_applied, self.ead3_total) {
            (true, Some(total)) => total > EAD3_APPROPRIATE_TOTAL,
            _ => true,
        };
        let applied = [
            self.bcg,
            self.hepatitis_b_newborn,
            self.pentavalent_complete(),
            self.mmr,
        ]
        .iter()
        .filter(|v| **v)
        .count() as u64;

        EarlyChildhoodAssessment {
            development_appropriate,
            vaccination_coverage_pct: percentage(applied, 4),
            next_visit_days: EARLY_CHILDHOOD_VISIT_INTERVAL_DAYS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EarlyChildhoodAssessment {
    pub development_appropriate: bool,
    pub vaccination_coverage_pct: f64,
    pub next_visit_days: u32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EarlyChildhoodView {
    #[serde(flatten)]
    pub record: EarlyChildhoodCare,
    pub assessment: EarlyChildhoodAssessment,
}

impl TableRecord for EarlyChildhoodCare {
    const TABLE: Table = Table::EarlyChildhoodCare;
    const LABEL: &'static str = "Early-childhood care";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn validate(&self) -> CoreResult<()> {
        check_range("age_months", self.age_months, 0, 71)?;
        check_range("weight_kg", self.weight_kg, 0.0, 50.0)?;
        check_range("height_cm", self.height_cm, 30.0, 150.0)?;
        check_range("head_circumference_cm", self.head_circumference_cm, 25.0, 65.0)?;
        for (field, value) in [
            ("ead3_gross_motor", self.ead3_gross_motor),
            ("ead3_fine_motor", self.ead3_fine_motor),
            ("ead3_hearing_language", self.ead3_hearing_language),
            ("ead3_personal_social", self.ead3_personal_social),
        ] {
            check_range(field, value, 0, 100)?;
        }
        check_range("pentavalent_doses", self.pentavalent_doses, 0, 3)?;
        Ok(())
    }

    /// Keep the EAD-3 total consistent with the area scores when all four are present.
    fn normalize(&mut self) {
        let areas = self.ead3_areas();
        if areas.iter().all(Option::is_some) {
            self.ead3_total = Some(areas.iter().flatten().sum());
        }
    }
}

impl EncounterDetail for EarlyChildhoodCare {
    type View = EarlyChildhoodView;

    fn kind(&self) -> EncounterKind {
        EncounterKind::EarlyChildhood
    }

    fn link(&self) -> &EncounterLink {
        &self.link
    }

    fn link_mut(&mut self) -> &mut EncounterLink {
        &mut self.link
    }

    fn into_view(self) -> Self::View {
        let assessment = self.assess();
        EarlyChildhoodView {
            record: self,
            assessment,
        }
    }
}

/// Aggregate figures over a set of early-childhood records.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EarlyChildhoodStats {
    pub total: u64,
    pub ead3_applied_pct: f64,
    pub asq3_applied_pct: f64,
    pub complete_vaccination_pct: f64,
}

impl EarlyChildhoodStats {
    pub fn from_records(records: &[EarlyChildhoodCare]) -> Self {
        let total = records.len() as u64;
        let count = |pred: fn(&EarlyChildhoodCare) -> bool| {
            records.iter().filter(|r| pred(r)).count() as u64
        };
        Self {
            total,
            ead3_applied_pct: percentage(count(|r| r.ead3_applied), total),
            asq3_applied_pct: percentage(count(|r| r.asq3_applied), total),
            complete_vaccination_pct: percentage(count(|r| r.vaccination_complete()), total),
        }
    }
}
