//! Old-age care (60+): functional, frailty, cognitive and fall-risk assessment.

use super::{EncounterDetail, EncounterKind, EncounterLink, RecordMeta, TableRecord};
use crate::store::Table;
use crate::validation::{check_non_negative, check_range, percentage, round_to};
use crate::CoreResult;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FunctionalStatus {
    Independent,
    MildDependence,
    ModerateDependence,
    SevereDependence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frailty {
    Robust,
    PreFrail,
    Frail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CognitiveStatus {
    Normal,
    MildImpairment,
    ModerateImpairment,
    SevereImpairment,
    NotEvaluated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FallRisk {
    Low,
    Moderate,
    High,
    VeryHigh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AbuseRisk {
    NoIndicators,
    Mild,
    Moderate,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OldAgeCare {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(flatten)]
    pub link: EncounterLink,

    #[serde(default)]
    pub age_years: Option<i32>,

    // Katz ADL: true means independent for the activity.
    #[serde(default)]
    pub katz_bathing: bool,
    #[serde(default)]
    pub katz_dressing: bool,
    #[serde(default)]
    pub katz_toileting: bool,
    #[serde(default)]
    pub katz_transferring: bool,
    #[serde(default)]
    pub katz_continence: bool,
    #[serde(default)]
    pub katz_feeding: bool,

    // Lawton-Brody IADL items, each 0 or 1.
    #[serde(default)]
    pub lawton_telephone: Option<i32>,
    #[serde(default)]
    pub lawton_shopping: Option<i32>,
    #[serde(default)]
    pub lawton_food_preparation: Option<i32>,
    #[serde(default)]
    pub lawton_housekeeping: Option<i32>,
    #[serde(default)]
    pub lawton_laundry: Option<i32>,
    #[serde(default)]
    pub lawton_transportation: Option<i32>,
    #[serde(default)]
    pub lawton_medication: Option<i32>,
    #[serde(default)]
    pub lawton_finances: Option<i32>,

    // Fried phenotype
    #[serde(default)]
    pub fried_weight_loss: bool,
    #[serde(default)]
    pub fried_exhaustion: bool,
    #[serde(default)]
    pub fried_low_activity: bool,
    #[serde(default)]
    pub fried_slow_gait: bool,
    #[serde(default)]
    pub fried_weak_grip: bool,

    /// Mini-Mental State Examination, 0–30.
    #[serde(default)]
    pub mmse_score: Option<i32>,

    // Falls
    #[serde(default)]
    pub falls_last_year: Option<i32>,
    #[serde(default)]
    pub orthostatic_hypotension: bool,
    #[serde(default)]
    pub visual_impairment: bool,
    #[serde(default)]
    pub uses_walking_aid: bool,
    /// Medications that raise fall risk (sedatives, antihypertensives, ...).
    #[serde(default)]
    pub fall_risk_medications: Option<i32>,

    // Abuse indicators
    #[serde(default)]
    pub unexplained_injuries: bool,
    #[serde(default)]
    pub caregiver_neglect: bool,
    #[serde(default)]
    pub financial_abuse: bool,
    #[serde(default)]
    pub social_isolation: bool,
    #[serde(default)]
    pub fear_of_caregiver: bool,

    #[serde(default)]
    pub lives_alone: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

const POLYPHARMACY_THRESHOLD: i32 = 4;

impl OldAgeCare {
    pub fn katz_index(&self) -> u32 {
        [
            self.katz_bathing,
            self.katz_dressing,
            self.katz_toileting,
            self.katz_transferring,
            self.katz_continence,
            self.katz_feeding,
        ]
        .iter()
        .filter(|v| **v)
        .count() as u32
    }

    pub fn lawton_score(&self) -> i32 {
        [
            self.lawton_telephone,
            self.lawton_shopping,
            self.lawton_food_preparation,
            self.lawton_housekeeping,
            self.lawton_laundry,
            self.lawton_transportation,
            self.lawton_medication,
            self.lawton_finances,
        ]
        .iter()
        .flatten()
        .sum()
    }

    fn functional_status(katz: u32, lawton: i32) -> FunctionalStatus {
        let by_katz = match katz {
            5.. => FunctionalStatus::Independent,
            4 => FunctionalStatus::MildDependence,
            2..=3 => FunctionalStatus::ModerateDependence,
            _ => FunctionalStatus::SevereDependence,
        };
        let by_lawton = match lawton {
            8.. => FunctionalStatus::Independent,
            6..=7 => FunctionalStatus::MildDependence,
            4..=5 => FunctionalStatus::ModerateDependence,
            _ => FunctionalStatus::SevereDependence,
        };
        by_katz.max(by_lawton)
    }

    fn frailty(&self) -> (u32, Frailty) {
        let criteria = [
            self.fried_weight_loss,
            self.fried_exhaustion,
            self.fried_low_activity,
            self.fried_slow_gait,
            self.fried_weak_grip,
        ]
        .iter()
        .filter(|v| **v)
        .count() as u32;
        let class = match criteria {
            0 => Frailty::Robust,
            1..=2 => Frailty::PreFrail,
            _ => Frailty::Frail,
        };
        (criteria, class)
    }

    fn cognitive_status(&self) -> CognitiveStatus {
        match self.mmse_score {
            None => CognitiveStatus::NotEvaluated,
            Some(s) if s > 24 => CognitiveStatus::Normal,
            Some(s) if s >= 18 => CognitiveStatus::MildImpairment,
            Some(s) if s >= 12 => CognitiveStatus::ModerateImpairment,
            Some(_) => CognitiveStatus::SevereImpairment,
        }
    }

    fn fall_risk(&self) -> (i32, FallRisk) {
        let mut score = self.falls_last_year.unwrap_or(0);
        if self.orthostatic_hypotension {
            score += 2;
        }
        if self.visual_impairment {
            score += 1;
        }
        if self.uses_walking_aid {
            score += 1;
        }
        if self
            .fall_risk_medications
            .is_some_and(|n| n >= POLYPHARMACY_THRESHOLD)
        {
            score += 2;
        }
        let level = match score {
            ..=1 => FallRisk::Low,
            2..=3 => FallRisk::Moderate,
            4..=5 => FallRisk::High,
            _ => FallRisk::VeryHigh,
        };
        (score, level)
    }

    fn abuse_risk(&self) -> AbuseRisk {
        let indicators = [
            self.unexplained_injuries,
            self.caregiver_neglect,
            self.financial_abuse,
            self.social_isolation,
            self.fear_of_caregiver,
        ]
        .iter()
        .filter(|v| **v)
        .count();
        match indicators {
            0 => AbuseRisk::NoIndicators,
            1 => AbuseRisk::Mild,
            2 => AbuseRisk::Moderate,
            _ => AbuseRisk::High,
        }
    }

    pub fn assess(&self) -> OldAgeAssessment {
        let katz_index = self.katz_index();
        let lawton_score = self.lawton_score();
        let functional_status = Self::functional_status(katz_index, lawton_score);
        let (frailty_criteria, frailty) = self.frailty();
        let cognitive_status = self.cognitive_status();
        let (fall_risk_score, fall_risk) = self.fall_risk();
        let abuse_risk = self.abuse_risk();

        let mut alerts = Vec::new();
        if functional_status == FunctionalStatus::SevereDependence {
            alerts.push("severe functional dependence".to_string());
        }
        if frailty == Frailty::Frail {
            alerts.push("frailty syndrome".to_string());
        }
        if matches!(
            cognitive_status,
            CognitiveStatus::ModerateImpairment | CognitiveStatus::SevereImpairment
        ) {
            alerts.push("cognitive impairment requires evaluation".to_string());
        }
        if matches!(fall_risk, FallRisk::High | FallRisk::VeryHigh) {
            alerts.push("high fall risk".to_string());
        }
        if matches!(abuse_risk, AbuseRisk::Moderate | AbuseRisk::High) {
            alerts.push("possible abuse or neglect".to_string());
        }
        if self.lives_alone && functional_status != FunctionalStatus::Independent {
            alerts.push("lives alone with functional dependence".to_string());
        }

        OldAgeAssessment {
            katz_index,
            lawton_score,
            functional_status,
            frailty_criteria,
            frailty,
            cognitive_status,
            fall_risk_score,
            fall_risk,
            abuse_risk,
            alerts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct OldAgeAssessment {
    pub katz_index: u32,
    pub lawton_score: i32,
    pub functional_status: FunctionalStatus,
    pub frailty_criteria: u32,
    pub frailty: Frailty,
    pub cognitive_status: CognitiveStatus,
    pub fall_risk_score: i32,
    pub fall_risk: FallRisk,
    pub abuse_risk: AbuseRisk,
    pub alerts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OldAgeView {
    #[serde(flatten)]
    pub record: OldAgeCare,
    pub assessment: OldAgeAssessment,
}

impl TableRecord for OldAgeCare {
    const TABLE: Table = Table::OldAgeCare;
    const LABEL: &'static str = "Old-age care";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn validate(&self) -> CoreResult<()> {
        check_range("age_years", self.age_years, 60, 130)?;
        for (field, value) in [
            ("lawton_telephone", self.lawton_telephone),
            ("lawton_shopping", self.lawton_shopping),
            ("lawton_food_preparation", self.lawton_food_preparation),
            ("lawton_housekeeping", self.lawton_housekeeping),
            ("lawton_laundry", self.lawton_laundry),
            ("lawton_transportation", self.lawton_transportation),
            ("lawton_medication", self.lawton_medication),
            ("lawton_finances", self.lawton_finances),
        ] {
            check_range(field, value, 0, 1)?;
        }
        check_range("mmse_score", self.mmse_score, 0, 30)?;
        check_non_negative("falls_last_year", self.falls_last_year)?;
        check_non_negative("fall_risk_medications", self.fall_risk_medications)?;
        Ok(())
    }
}

impl EncounterDetail for OldAgeCare {
    type View = OldAgeView;

    fn kind(&self) -> EncounterKind {
        EncounterKind::OldAge
    }

    fn link(&self) -> &EncounterLink {
        &self.link
    }

    fn link_mut(&mut self) -> &mut EncounterLink {
        &mut self.link
    }

    fn into_view(self) -> Self::View {
        let assessment = self.assess();
        OldAgeView {
            record: self,
            assessment,
        }
    }
}

// ============================================================================
// AGGREGATES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct OldAgeStats {
    pub total: u64,
    pub independent: u64,
    pub mild_dependence: u64,
    pub moderate_dependence: u64,
    pub severe_dependence: u64,
    pub robust: u64,
    pub pre_frail: u64,
    pub frail: u64,
    /// High or very high fall risk.
    pub high_fall_risk: u64,
    pub mmse_applied: u64,
    pub mmse_applied_pct: f64,
    pub lives_alone: u64,
    pub lives_alone_pct: f64,
    pub mean_katz_index: f64,
}

impl OldAgeStats {
    pub fn from_records(records: &[OldAgeCare]) -> Self {
        let total = records.len() as u64;
        let assessments: Vec<OldAgeAssessment> = records.iter().map(OldAgeCare::assess).collect();
        let functional = |status| {
            assessments
                .iter()
                .filter(|a| a.functional_status == status)
                .count() as u64
        };
        let frailty = |level| assessments.iter().filter(|a| a.frailty == level).count() as u64;
        let mmse_applied = records.iter().filter(|r| r.mmse_score.is_some()).count() as u64;
        let lives_alone = records.iter().filter(|r| r.lives_alone).count() as u64;
        let katz_sum: u32 = assessments.iter().map(|a| a.katz_index).sum();
        Self {
            total,
            independent: functional(FunctionalStatus::Independent),
            mild_dependence: functional(FunctionalStatus::MildDependence),
            moderate_dependence: functional(FunctionalStatus::ModerateDependence),
            severe_dependence: functional(FunctionalStatus::SevereDependence),
            robust: frailty(Frailty::Robust),
            pre_frail: frailty(Frailty::PreFrail),
            frail: frailty(Frailty::Frail),
            high_fall_risk: assessments
                .iter()
                .filter(|a| matches!(a.fall_risk, FallRisk::High | FallRisk::VeryHigh))
                .count() as u64,
            mmse_applied,
            mmse_applied_pct: percentage(mmse_applied, total),
            lives_alone,
            lives_alone_pct: percentage(lives_alone, total),
            mean_katz_index: if total == 0 {
                0.0
            } else {
                round_to(f64::from(katz_sum) / total as f64, 2)
            },
        }
    }
}

/// Comprehensive geriatric assessment over one period, by dimension.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct GeriatricReport {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub total: u64,
    pub independent: u64,
    pub mild_dependence: u64,
    pub moderate_dependence: u64,
    pub severe_dependence: u64,
    pub cognition_normal: u64,
    pub mild_impairment: u64,
    pub moderate_impairment: u64,
    pub severe_impairment: u64,
    pub cognition_not_evaluated: u64,
    pub robust: u64,
    pub pre_frail: u64,
    pub frail: u64,
    /// Assessments that raised at least one alert.
    pub with_alerts: u64,
    pub alert_count: u64,
}

impl GeriatricReport {
    pub fn from_records(date_from: NaiveDate, date_to: NaiveDate, records: &[OldAgeCare]) -> Self {
        let stats = OldAgeStats::from_records(records);
        let assessments: Vec<OldAgeAssessment> = records.iter().map(OldAgeCare::assess).collect();
        let cognition = |status| {
            assessments
                .iter()
                .filter(|a| a.cognitive_status == status)
                .count() as u64
        };
        Self {
            date_from,
            date_to,
            total: stats.total,
            independent: stats.independent,
            mild_dependence: stats.mild_dependence,
            moderate_dependence: stats.moderate_dependence,
            severe_dependence: stats.severe_dependence,
            cognition_normal: cognition(CognitiveStatus::Normal),
            mild_impairment: cognition(CognitiveStatus::MildImpairment),
            moderate_impairment: cognition(CognitiveStatus::ModerateImpairment),
            severe_impairment: cognition(CognitiveStatus::SevereImpairment),
            cognition_not_evaluated: cognition(CognitiveStatus::NotEvaluated),
            robust: stats.robust,
            pre_frail: stats.pre_frail,
            frail: stats.frail,
            with_alerts: assessments.iter().filter(|a| !a.alerts.is_empty()).count() as u64,
            alert_count: assessments.iter().map(|a| a.alerts.len() as u64).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn independent() -> OldAgeCare {
        serde_json::from_value(json!({
            "patient_id": "7d1c1a52-59a2-4e1b-9a4f-0d8f1f3c2b11",
            "encounter_date": "2024-06-01",
            "age_years": 72,
            "katz_bathing": true,
            "katz_dressing": true,
            "katz_toileting": true,
            "katz_transferring": true,
            "katz_continence": true,
            "katz_feeding": true,
            "lawton_telephone": 1,
            "lawton_shopping": 1,
            "lawton_food_preparation": 1,
            "lawton_housekeeping": 1,
            "lawton_laundry": 1,
            "lawton_transportation": 1,
            "lawton_medication": 1,
            "lawton_finances": 1,
            "mmse_score": 28
        }))
        .expect("deserialize should succeed")
    }

    #[test]
    fn test_independent_elder_has_no_alerts() {
        let a = independent().assess();
        assert_eq!(a.katz_index, 6);
        assert_eq!(a.lawton_score, 8);
        assert_eq!(a.functional_status, FunctionalStatus::Independent);
        assert_eq!(a.frailty, Frailty::Robust);
        assert_eq!(a.cognitive_status, CognitiveStatus::Normal);
        assert_eq!(a.fall_risk, FallRisk::Low);
        assert!(a.alerts.is_empty());
    }

    #[test]
    fn test_functional_status_takes_worse_scale() {
        let mut r = independent();
        r.lawton_finances = Some(0);
        r.lawton_shopping = Some(0);
        r.lawton_laundry = Some(0);
        // Katz 6 independent, Lawton 5 moderate
        assert_eq!(
            r.assess().functional_status,
            FunctionalStatus::ModerateDependence
        );
        r.katz_bathing = false;
        r.katz_dressing = false;
        r.katz_toileting = false;
        r.katz_transferring = false;
        r.katz_continence = false;
        assert_eq!(
            r.assess().functional_status,
            FunctionalStatus::SevereDependence
        );
    }

    #[test]
    fn test_frailty_and_cognition_bands() {
        let mut r = independent();
        r.fried_weak_grip = true;
        r.fried_slow_gait = true;
        assert_eq!(r.assess().frailty, Frailty::PreFrail);
        r.fried_exhaustion = true;
        assert_eq!(r.assess().frailty, Frailty::Frail);

        r.mmse_score = Some(24);
        assert_eq!(r.assess().cognitive_status, CognitiveStatus::MildImpairment);
        r.mmse_score = Some(12);
        assert_eq!(r.assess().cognitive_status, CognitiveStatus::ModerateImpairment);
        r.mmse_score = Some(11);
        assert_eq!(r.assess().cognitive_status, CognitiveStatus::SevereImpairment);
        r.mmse_score = None;
        assert_eq!(r.assess().cognitive_status, CognitiveStatus::NotEvaluated);
    }

    #[test]
    fn test_fall_risk_score() {
        let mut r = independent();
        r.falls_last_year = Some(1);
        r.orthostatic_hypotension = true;
        r.fall_risk_medications = Some(4);
        let a = r.assess();
        assert_eq!(a.fall_risk_score, 5);
        assert_eq!(a.fall_risk, FallRisk::High);
        assert!(a.alerts.iter().any(|m| m == "high fall risk"));
    }

    #[test]
    fn test_lawton_items_must_be_binary() {
        let mut r = independent();
        r.lawton_medication = Some(2);
        assert!(r.validate().is_err());
    }

    fn dependent() -> OldAgeCare {
        let mut r = independent();
        r.katz_bathing = false;
        r.katz_dressing = false;
        r.katz_toileting = false;
        r.katz_transferring = false;
        r.fried_exhaustion = true;
        r.fried_slow_gait = true;
        r.fried_weak_grip = true;
        r.mmse_score = Some(15);
        r.lives_alone = true;
        r
    }

    #[test]
    fn test_stats_by_dimension() {
        let stats = OldAgeStats::from_records(&[independent(), dependent()]);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.independent, 1);
        // Katz 2 of 6
        assert_eq!(stats.moderate_dependence, 1);
        assert_eq!(stats.frail, 1);
        assert_eq!(stats.robust, 1);
        assert_eq!(stats.mmse_applied_pct, 100.0);
        assert_eq!(stats.lives_alone, 1);
        assert_eq!(stats.mean_katz_index, 4.0);
        assert_eq!(OldAgeStats::from_records(&[]).mean_katz_index, 0.0);
    }

    #[test]
    fn test_geriatric_report_counts_alerts() {
        let from = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date");
        let to = NaiveDate::from_ymd_opt(2024, 12, 31).expect("valid date");
        let report = GeriatricReport::from_records(from, to, &[independent(), dependent()]);
        assert_eq!(report.total, 2);
        assert_eq!(report.cognition_normal, 1);
        assert_eq!(report.moderate_impairment, 1);
        assert_eq!(report.with_alerts, 1);
        // frailty, cognition, living alone while dependent
        assert_eq!(report.alert_count, 3);
    }
}
