//! Cancer screening: cervical, breast, prostate and colorectal.

use super::{EncounterDetail, EncounterKind, EncounterLink, RecordMeta, TableRecord};
use crate::store::Table;
use crate::validation::{check_range, percentage};
use crate::CoreResult;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScreeningType {
    Cervical,
    Breast,
    Prostate,
    Colorectal,
}

impl ScreeningType {
    /// Recommended days between screenings.
    pub fn interval_days(self) -> i64 {
        match self {
            ScreeningType::Cervical => 365,
            ScreeningType::Breast => 730,
            ScreeningType::Prostate => 365,
            ScreeningType::Colorectal => 1095,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CytologyResult {
    Normal,
    Ascus,
    AscH,
    Lsil,
    Hsil,
    Agc,
    Carcinoma,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestResult {
    Positive,
    Negative,
    Inconclusive,
    NotPerformed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExamFinding {
    Normal,
    Abnormal,
    NotPerformed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScreeningRisk {
    Low,
    Moderate,
    High,
    NotEvaluated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScreeningAdherence {
    Good,
    Regular,
    Poor,
}

/// `encounter_date` is the date the screening was performed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CancerScreening {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(flatten)]
    pub link: EncounterLink,

    pub screening_type: ScreeningType,
    #[serde(default)]
    pub overall_result: Option<TestResult>,
    #[serde(default)]
    pub next_screening_date: Option<NaiveDate>,
    #[serde(default)]
    pub next_control_date: Option<NaiveDate>,
    #[serde(default)]
    pub requires_specialist_follow_up: bool,
    #[serde(default)]
    pub recommendations: Option<String>,

    // Cervical
    #[serde(default)]
    pub cytology_result: Option<CytologyResult>,
    #[serde(default)]
    pub hpv_dna_result: Option<TestResult>,
    #[serde(default)]
    pub colposcopy_done: bool,
    #[serde(default)]
    pub cervical_biopsy_done: bool,

    // Breast
    /// BI-RADS category 0–6.
    #[serde(default)]
    pub mammography_birads: Option<i32>,
    #[serde(default)]
    pub clinical_breast_exam_findings: Option<String>,
    #[serde(default)]
    pub breast_biopsy_done: bool,

    // Prostate
    #[serde(default)]
    pub psa_ng_ml: Option<f64>,
    #[serde(default)]
    pub digital_rectal_exam: Option<ExamFinding>,
    #[serde(default)]
    pub prostate_biopsy_done: bool,

    // Colorectal
    #[serde(default)]
    pub fecal_occult_blood_result: Option<TestResult>,
    #[serde(default)]
    pub colonoscopy_done: bool,
    #[serde(default)]
    pub colon_biopsy_done: bool,

    #[serde(default)]
    pub notes: Option<String>,
}

impl CancerScreening {
    pub fn risk(&self) -> ScreeningRisk {
        match self.screening_type {
            ScreeningType::Cervical => match (self.cytology_result, self.hpv_dna_result) {
                (Some(CytologyResult::Hsil | CytologyResult::AscH), _) => ScreeningRisk::High,
                (Some(CytologyResult::Lsil), _) | (_, Some(TestResult::Positive)) => {
                    ScreeningRisk::Moderate
                }
                (Some(CytologyResult::Normal), Some(TestResult::Negative)) => ScreeningRisk::Low,
                _ => ScreeningRisk::NotEvaluated,
            },
            ScreeningType::Breast => match self.mammography_birads {
                Some(5 | 6) => ScreeningRisk::High,
                Some(4) => ScreeningRisk::Moderate,
                Some(1 | 2) => ScreeningRisk::Low,
                _ => ScreeningRisk::NotEvaluated,
            },
            ScreeningType::Prostate => {
                let psa = self.psa_ng_ml.unwrap_or(0.0);
                if psa > 10.0 || self.digital_rectal_exam == Some(ExamFinding::Abnormal) {
                    ScreeningRisk::High
                } else if psa > 4.0 {
                    ScreeningRisk::Moderate
                } else {
                    ScreeningRisk::Low
                }
            }
            ScreeningType::Colorectal => {
                if self.fecal_occult_blood_result == Some(TestResult::Positive) {
                    ScreeningRisk::Moderate
                } else {
                    ScreeningRisk::Low
                }
            }
        }
    }

    /// Adherence of the screening date to the recommended interval, measured on `today`.
    pub fn adherence_on(&self, today: NaiveDate) -> ScreeningAdherence {
        let interval = self.screening_type.interval_days();
        let elapsed = (today - self.link.encounter_date).num_days();
        if elapsed <= interval {
            ScreeningAdherence::Good
        } else if elapsed * 2 <= interval * 3 {
            ScreeningAdherence::Regular
        } else {
            ScreeningAdherence::Poor
        }
    }

    pub fn next_visit_days(&self, risk: ScreeningRisk) -> i64 {
        match risk {
            ScreeningRisk::High => 30,
            ScreeningRisk::Moderate => 90,
            _ => self.screening_type.interval_days(),
        }
    }

    /// Share of the fields expected for this screening type that were recorded.
    pub fn completeness_pct(&self) -> f64 {
        let expected: Vec<bool> = match self.screening_type {
            ScreeningType::Cervical => vec![
                self.cytology_result.is_some(),
                self.hpv_dna_result.is_some(),
            ],
            ScreeningType::Breast => vec![
                self.mammography_birads.is_some(),
                self.clinical_breast_exam_findings.is_some(),
            ],
            ScreeningType::Prostate => vec![
                self.psa_ng_ml.is_some(),
                self.digital_rectal_exam.is_some(),
            ],
            ScreeningType::Colorectal => vec![self.fecal_occult_blood_result.is_some()],
        };
        let done = expected.iter().filter(|v| **v).count() as u64;
        percentage(done, expected.len() as u64)
    }

    pub fn assess_on(&self, today: NaiveDate) -> ScreeningAssessment {
        let risk_level = self.risk();
        ScreeningAssessment {
            risk_level,
            adherence: self.adherence_on(today),
            next_visit_days: self.next_visit_days(risk_level),
            completeness_pct: self.completeness_pct(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ScreeningAssessment {
    pub risk_level: ScreeningRisk,
    pub adherence: ScreeningAdherence,
    pub next_visit_days: i64,
    pub completeness_pct: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CancerScreeningView {
    #[serde(flatten)]
    pub record: CancerScreening,
    pub assessment: ScreeningAssessment,
}

impl TableRecord for CancerScreening {
    const TABLE: Table = Table::CancerScreenings;
    const LABEL: &'static str = "Cancer screening";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn validate(&self) -> CoreResult<()> {
        check_range("psa_ng_ml", self.psa_ng_ml, 0.0, 100.0)?;
        check_range("mammography_birads", self.mammography_birads, 0, 6)?;
        Ok(())
    }
}

impl EncounterDetail for CancerScreening {
    type View = CancerScreeningView;

    fn kind(&self) -> EncounterKind {
        EncounterKind::CancerScreening
    }

    fn link(&self) -> &EncounterLink {
        &self.link
    }

    fn link_mut(&mut self) -> &mut EncounterLink {
        &mut self.link
    }

    fn into_view(self) -> Self::View {
        let assessment = self.assess_on(Utc::now().date_naive());
        CancerScreeningView {
            record: self,
            assessment,
        }
    }
}

/// Aggregate figures over a set of screenings.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ScreeningStats {
    pub total: u64,
    pub cervical: u64,
    pub breast: u64,
    pub prostate: u64,
    pub colorectal: u64,
    pub high_risk: u64,
    pub requiring_follow_up: u64,
    pub high_risk_pct: f64,
}

impl ScreeningStats {
    pub fn from_screenings(screenings: &[CancerScreening]) -> Self {
        let total = screenings.len() as u64;
        let of_type = |t| {
            screenings
                .iter()
                .filter(|s| s.screening_type == t)
                .count() as u64
        };
        let high_risk = screenings
            .iter()
            .filter(|s| s.risk() == ScreeningRisk::High)
            .count() as u64;
        Self {
            total,
            cervical: of_type(ScreeningType::Cervical),
            breast: of_type(ScreeningType::Breast),
            prostate: of_type(ScreeningType::Prostate),
            colorectal: of_type(ScreeningType::Colorectal),
            high_risk,
            requiring_follow_up: screenings
                .iter()
                .filter(|s| s.requires_specialist_follow_up)
                .count() as u64,
            high_risk_pct: percentage(high_risk, total),
        }
    }
}

/// Screenings grouped by adherence to their type's recommended interval.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ScreeningAdherenceReport {
    /// Absent when every type was included.
    pub screening_type: Option<ScreeningType>,
    pub measured_on: NaiveDate,
    pub total: u64,
    pub good: u64,
    pub regular: u64,
    pub poor: u64,
    pub good_pct: f64,
    pub regular_pct: f64,
    pub poor_pct: f64,
}

impl ScreeningAdherenceReport {
    pub fn from_screenings(
        screening_type: Option<ScreeningType>,
        screenings: &[CancerScreening],
        today: NaiveDate,
    ) -> Self {
        let total = screenings.len() as u64;
        let count = |level| {
            screenings
                .iter()
                .filter(|s| s.adherence_on(today) == level)
                .count() as u64
        };
        let (good, regular, poor) = (
            count(ScreeningAdherence::Good),
            count(ScreeningAdherence::Regular),
            count(ScreeningAdherence::Poor),
        );
        Self {
            screening_type,
            measured_on: today,
            total,
            good,
            regular,
            poor,
            good_pct: percentage(good, total),
            regular_pct: percentage(regular, total),
            poor_pct: percentage(poor, total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn screening(kind: &str) -> CancerScreening {
        serde_json::from_value(json!({
            "patient_id": "7d1c1a52-59a2-4e1b-9a4f-0d8f1f3c2b11",
            "encounter_date": "2024-01-01",
            "screening_type": kind
        }))
        .expect("deserialize should succeed")
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn test_cervical_risk() {
        let mut s = screening("CERVICAL");
        assert_eq!(s.risk(), ScreeningRisk::NotEvaluated);
        s.cytology_result = Some(CytologyResult::Normal);
        s.hpv_dna_result = Some(TestResult::Negative);
        assert_eq!(s.risk(), ScreeningRisk::Low);
        s.hpv_dna_result = Some(TestResult::Positive);
        assert_eq!(s.risk(), ScreeningRisk::Moderate);
        s.cytology_result = Some(CytologyResult::AscH);
        assert_eq!(s.risk(), ScreeningRisk::High);
    }

    #[test]
    fn test_breast_and_prostate_risk() {
        let mut s = screening("BREAST");
        s.mammography_birads = Some(4);
        assert_eq!(s.risk(), ScreeningRisk::Moderate);
        s.mammography_birads = Some(0);
        assert_eq!(s.risk(), ScreeningRisk::NotEvaluated);

        let mut s = screening("PROSTATE");
        assert_eq!(s.risk(), ScreeningRisk::Low);
        s.psa_ng_ml = Some(6.0);
        assert_eq!(s.risk(), ScreeningRisk::Moderate);
        s.digital_rectal_exam = Some(ExamFinding::Abnormal);
        assert_eq!(s.risk(), ScreeningRisk::High);
        assert_eq!(s.next_visit_days(s.risk()), 30);
    }

    #[test]
    fn test_adherence_against_interval() {
        let s = screening("CERVICAL");
        assert_eq!(s.adherence_on(day(2024, 12, 31)), ScreeningAdherence::Good);
        assert_eq!(s.adherence_on(day(2025, 6, 1)), ScreeningAdherence::Regular);
        assert_eq!(s.adherence_on(day(2025, 8, 1)), ScreeningAdherence::Poor);

        let s = screening("COLORECTAL");
        assert_eq!(s.adherence_on(day(2026, 6, 1)), ScreeningAdherence::Good);
        assert_eq!(s.next_visit_days(s.risk()), 1095);
    }

    #[test]
    fn test_completeness_by_type() {
        let mut s = screening("PROSTATE");
        assert_eq!(s.completeness_pct(), 0.0);
        s.psa_ng_ml = Some(2.0);
        assert_eq!(s.completeness_pct(), 50.0);
        let mut s = screening("COLORECTAL");
        s.fecal_occult_blood_result = Some(TestResult::Negative);
        assert_eq!(s.completeness_pct(), 100.0);
    }

    #[test]
    fn test_psa_range_and_stats() {
        let mut s = screening("PROSTATE");
        s.psa_ng_ml = Some(100.5);
        assert!(s.validate().is_err());
        s.psa_ng_ml = Some(12.0);
        let stats = ScreeningStats::from_screenings(&[s, screening("BREAST")]);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.prostate, 1);
        assert_eq!(stats.high_risk, 1);
        assert_eq!(stats.high_risk_pct, 50.0);
    }

    #[test]
    fn test_adherence_report_groups_by_interval() {
        let today = day(2025, 6, 1);
        // 517 days after screening: within the breast interval, within 1.5x the yearly ones
        let report = ScreeningAdherenceReport::from_screenings(
            None,
            &[screening("CERVICAL"), screening("BREAST"), screening("PROSTATE")],
            today,
        );
        assert_eq!(report.total, 3);
        assert_eq!(report.good, 1);
        assert_eq!(report.regular, 2);
        assert_eq!(report.poor, 0);
        assert_eq!(report.good_pct, 33.3);
        assert_eq!(report.measured_on, today);
    }
}
