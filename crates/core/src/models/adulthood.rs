//! Adulthood care (30–59 years): cardiovascular risk and chronic non-communicable disease screening.

use super::patient::Sex;
use super::{EncounterDetail, EncounterKind, EncounterLink, RecordMeta, TableRecord};
use crate::store::Table;
use crate::validation::{body_mass_index, check_range, percentage, round_to};
use crate::CoreResult;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhysicalActivity {
    Sedentary,
    Light,
    Moderate,
    Vigorous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CardiovascularRisk {
    Low,
    Intermediate,
    High,
    VeryHigh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NcdScreening {
    Normal,
    Mild,
    Moderate,
    Severe,
    NeedsSpecialist,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AdulthoodCare {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(flatten)]
    pub link: EncounterLink,

    pub age_years: i32,
    pub sex: Sex,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub height_cm: Option<f64>,
    #[serde(default)]
    pub bmi: Option<f64>,
    #[serde(default)]
    pub waist_cm: Option<f64>,
    #[serde(default)]
    pub systolic_bp: Option<i32>,
    #[serde(default)]
    pub diastolic_bp: Option<i32>,

    #[serde(default)]
    pub fasting_glucose_mg_dl: Option<f64>,
    #[serde(default)]
    pub total_cholesterol_mg_dl: Option<f64>,
    #[serde(default)]
    pub hdl_cholesterol_mg_dl: Option<f64>,

    #[serde(default)]
    pub smoker: bool,
    #[serde(default)]
    pub diabetes: bool,
    #[serde(default)]
    pub physical_activity: Option<PhysicalActivity>,
    /// Perceived stress, 0–40.
    #[serde(default)]
    pub stress_score: Option<i32>,
    /// Work-related stress, 0–10.
    #[serde(default)]
    pub work_stress: Option<i32>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl AdulthoodCare {
    /// Framingham point score, split by sex.
    pub fn framingham_points(&self) -> i32 {
        let age = self.age_years;
        let total = self.total_cholesterol_mg_dl.unwrap_or(0.0);
        let hdl = self.hdl_cholesterol_mg_dl;
        let systolic = self.systolic_bp.unwrap_or(0);

        let band = |value: i32, cuts: &[(i32, i32)]| {
            cuts.iter()
                .rev()
                .find(|(min, _)| value >= *min)
                .map_or(0, |(_, pts)| *pts)
        };
        let fband = |value: f64, cuts: &[(f64, i32)]| {
            cuts.iter()
                .rev()
                .find(|(min, _)| value >= *min)
                .map_or(0, |(_, pts)| *pts)
        };

        let mut points = 0;
        if self.sex == Sex::Female {
            points += band(age, &[(40, 2), (45, 3), (50, 5), (55, 7), (60, 9), (65, 11), (70, 12)]);
            points += fband(total, &[(160.0, 1), (200.0, 2), (240.0, 3), (280.0, 4)]);
            points += match hdl {
                Some(h) if h < 35.0 => 5,
                Some(h) if h < 45.0 => 2,
                Some(h) if h < 50.0 => 1,
                Some(h) if h >= 60.0 => -2,
                _ => 0,
            };
            points += band(systolic, &[(130, 1), (140, 2), (160, 4)]);
            if self.smoker {
                points += 3;
            }
            if self.diabetes {
                points += 4;
            }
        } else {
            points += band(age, &[(40, 1), (45, 2), (50, 4), (55, 6), (60, 8), (65, 10), (70, 11)]);
            points += fband(total, &[(200.0, 1), (240.0, 2), (280.0, 3)]);
            points += match hdl {
                Some(h) if h < 35.0 => 2,
                Some(h) if h < 45.0 => 1,
                Some(h) if h >= 60.0 => -1,
                _ => 0,
            };
            points += band(systolic, &[(130, 1), (140, 2), (160, 3)]);
            if self.smoker {
                points += 2;
            }
            if self.diabetes {
                points += 2;
            }
        }
        points
    }

    /// Ten-year cardiovascular risk percentage from the point score.
    pub fn framingham_percent(points: i32) -> f64 {
        if points <= 0 {
            return 1.0;
        }
        if points >= 20 {
            return 40.0;
        }
        round_to((1.5 * 1.3f64.powi(points)).clamp(1.0, 40.0), 1)
    }

    fn ncd_screening(&self, bmi: Option<f64>) -> NcdScreening {
        let mut points = 0;
        match self.fasting_glucose_mg_dl {
            Some(g) if g >= 126.0 => points += 3,
            Some(g) if g >= 100.0 => points += 1,
            _ => {}
        }
        let systolic = self.systolic_bp.unwrap_or(0);
        let diastolic = self.diastolic_bp.unwrap_or(0);
        if systolic >= 140 || diastolic >= 90 {
            points += 2;
        } else if systolic >= 130 || diastolic >= 85 {
            points += 1;
        }
        match self.total_cholesterol_mg_dl {
            Some(c) if c >= 240.0 => points += 2,
            Some(c) if c >= 200.0 => points += 1,
            _ => {}
        }
        match bmi {
            Some(b) if b >= 35.0 => points += 2,
            Some(b) if b >= 30.0 => points += 1,
            _ => {}
        }
        match points {
            0 => NcdScreening::Normal,
            1..=2 => NcdScreening::Mild,
            3..=4 => NcdScreening::Moderate,
            5..=6 => NcdScreening::Severe,
            _ => NcdScreening::NeedsSpecialist,
        }
    }

    pub fn assess(&self) -> AdulthoodAssessment {
        let bmi = self
            .bmi
            .or_else(|| body_mass_index(self.weight_kg, self.height_cm));
        let points = self.framingham_points();
        let percent = Self::framingham_percent(points);
        let cardiovascular_risk = match percent {
            p if p < 10.0 => CardiovascularRisk::Low,
            p if p < 20.0 => CardiovascularRisk::Intermediate,
            p if p < 30.0 => CardiovascularRisk::High,
            _ => CardiovascularRisk::VeryHigh,
        };
        let ncd_screening = self.ncd_screening(bmi);
        AdulthoodAssessment {
            bmi,
            framingham_points: points,
            framingham_risk_pct: percent,
            cardiovascular_risk,
            ncd_screening_positive: ncd_screening != NcdScreening::Normal,
            ncd_screening,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AdulthoodAssessment {
    pub bmi: Option<f64>,
    pub framingham_points: i32,
    pub framingham_risk_pct: f64,
    pub cardiovascular_risk: CardiovascularRisk,
    pub ncd_screening: NcdScreening,
    pub ncd_screening_positive: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AdulthoodView {
    #[serde(flatten)]
    pub record: AdulthoodCare,
    pub assessment: AdulthoodAssessment,
}

impl TableRecord for AdulthoodCare {
    const TABLE: Table = Table::AdulthoodCare;
    const LABEL: &'static str = "Adulthood care";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn validate(&self) -> CoreResult<()> {
        check_range("age_years", Some(self.age_years), 30, 59)?;
        check_range("weight_kg", self.weight_kg, 30.0, 300.0)?;
        check_range("height_cm", self.height_cm, 120.0, 230.0)?;
        check_range("systolic_bp", self.systolic_bp, 60, 260)?;
        check_range("diastolic_bp", self.diastolic_bp, 30, 160)?;
        check_range("fasting_glucose_mg_dl", self.fasting_glucose_mg_dl, 20.0, 700.0)?;
        check_range("total_cholesterol_mg_dl", self.total_cholesterol_mg_dl, 50.0, 600.0)?;
        check_range("hdl_cholesterol_mg_dl", self.hdl_cholesterol_mg_dl, 10.0, 200.0)?;
        check_range("stress_score", self.stress_score, 0, 40)?;
        check_range("work_stress", self.work_stress, 0, 10)?;
        Ok(())
    }

    fn normalize(&mut self) {
        if let Some(bmi) = body_mass_index(self.weight_kg, self.height_cm) {
            self.bmi = Some(bmi);
        }
    }
}

impl EncounterDetail for AdulthoodCare {
    type View = AdulthoodView;

    fn kind(&self) -> EncounterKind {
        EncounterKind::Adulthood
    }

    fn link(&self) -> &EncounterLink {
        &self.link
    }

    fn link_mut(&mut self) -> &mut EncounterLink {
        &mut self.link
    }

    fn into_view(self) -> Self::View {
        let assessment = self.assess();
        AdulthoodView {
            record: self,
            assessment,
        }
    }
}

// ============================================================================
// AGGREGATES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AdulthoodStats {
    pub total: u64,
    pub low_risk: u64,
    pub intermediate_risk: u64,
    pub high_risk: u64,
    pub very_high_risk: u64,
    pub underweight: u64,
    pub normal_weight: u64,
    pub overweight: u64,
    pub obesity: u64,
    pub bmi_not_recorded: u64,
    pub ncd_screening_positive: u64,
    pub ncd_screening_positive_pct: f64,
}

impl AdulthoodStats {
    pub fn from_records(records: &[AdulthoodCare]) -> Self {
        let total = records.len() as u64;
        let assessments: Vec<AdulthoodAssessment> = records.iter().map(AdulthoodCare::assess).collect();
        let risk = |level| {
            assessments
                .iter()
                .filter(|a| a.cardiovascular_risk == level)
                .count() as u64
        };
        let bmi_band = |low: f64, high: f64| {
            assessments
                .iter()
                .filter(|a| a.bmi.is_some_and(|b| b >= low && b < high))
                .count() as u64
        };
        let positive = assessments.iter().filter(|a| a.ncd_screening_positive).count() as u64;
        Self {
            total,
            low_risk: risk(CardiovascularRisk::Low),
            intermediate_risk: risk(CardiovascularRisk::Intermediate),
            high_risk: risk(CardiovascularRisk::High),
            very_high_risk: risk(CardiovascularRisk::VeryHigh),
            underweight: bmi_band(0.0, 18.5),
            normal_weight: bmi_band(18.5, 25.0),
            overweight: bmi_band(25.0, 30.0),
            obesity: bmi_band(30.0, f64::INFINITY),
            bmi_not_recorded: assessments.iter().filter(|a| a.bmi.is_none()).count() as u64,
            ncd_screening_positive: positive,
            ncd_screening_positive_pct: percentage(positive, total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(sex: &str) -> AdulthoodCare {
        serde_json::from_value(json!({
            "patient_id": "7d1c1a52-59a2-4e1b-9a4f-0d8f1f3c2b11",
            "encounter_date": "2024-06-01",
            "age_years": 52,
            "sex": sex,
            "weight_kg": 80.0,
            "height_cm": 175.0,
            "systolic_bp": 135,
            "diastolic_bp": 82,
            "total_cholesterol_mg_dl": 210.0,
            "hdl_cholesterol_mg_dl": 42.0,
            "fasting_glucose_mg_dl": 95.0
        }))
        .expect("deserialize should succeed")
    }

    #[test]
    fn test_framingham_points_by_sex() {
        // age 50 → 4, TC 200 → 1, HDL < 45 → 1, SBP 130 → 1
        assert_eq!(record("MALE").framingham_points(), 7);
        // age 50 → 5, TC 200 → 2, HDL < 45 → 2, SBP 130 → 1
        assert_eq!(record("FEMALE").framingham_points(), 10);

        let mut smoker = record("MALE");
        smoker.smoker = true;
        smoker.diabetes = true;
        assert_eq!(smoker.framingham_points(), 11);
    }

    #[test]
    fn test_framingham_percent_is_clamped() {
        assert_eq!(AdulthoodCare::framingham_percent(-2), 1.0);
        assert_eq!(AdulthoodCare::framingham_percent(0), 1.0);
        assert_eq!(AdulthoodCare::framingham_percent(7), 9.4);
        assert_eq!(AdulthoodCare::framingham_percent(15), 40.0);
        assert_eq!(AdulthoodCare::framingham_percent(25), 40.0);
    }

    #[test]
    fn test_assessment_categories() {
        let a = record("MALE").assess();
        assert_eq!(a.cardiovascular_risk, CardiovascularRisk::Low);
        // SBP 130 → 1, TC 200 → 1
        assert_eq!(a.ncd_screening, NcdScreening::Mild);
        assert!(a.ncd_screening_positive);

        let mut r = record("FEMALE");
        r.systolic_bp = Some(120);
        r.diastolic_bp = Some(75);
        r.total_cholesterol_mg_dl = Some(180.0);
        assert_eq!(r.assess().ncd_screening, NcdScreening::Normal);

        r.fasting_glucose_mg_dl = Some(130.0);
        r.systolic_bp = Some(150);
        r.total_cholesterol_mg_dl = Some(250.0);
        assert_eq!(r.assess().ncd_screening, NcdScreening::NeedsSpecialist);
    }

    #[test]
    fn test_age_band_enforced() {
        let mut r = record("MALE");
        r.age_years = 60;
        assert!(r.validate().is_err());
    }

    #[test]
    fn test_stats_by_risk_and_weight() {
        let mut unrecorded = record("MALE");
        unrecorded.weight_kg = None;
        unrecorded.systolic_bp = Some(120);
        unrecorded.diastolic_bp = Some(75);
        unrecorded.total_cholesterol_mg_dl = Some(180.0);
        unrecorded.fasting_glucose_mg_dl = None;

        let stats = AdulthoodStats::from_records(&[record("MALE"), record("FEMALE"), unrecorded]);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.low_risk, 2);
        assert_eq!(stats.high_risk, 1);
        // 80 kg at 175 cm
        assert_eq!(stats.overweight, 2);
        assert_eq!(stats.bmi_not_recorded, 1);
        assert_eq!(stats.ncd_screening_positive, 2);
        assert_eq!(stats.ncd_screening_positive_pct, 66.7);
    }
}
