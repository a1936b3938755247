//! Childhood care (6–11 years).

use super::{EncounterDetail, EncounterKind, EncounterLink, RecordMeta, TableRecord};
use crate::store::Table;
use crate::validation::{
    body_mass_index, check_range, check_range_exclusive_min, percentage, round_to,
};
use crate::CoreResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchoolPerformance {
    Superior,
    High,
    Basic,
    Low,
    NotEnrolled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScreeningOutcome {
    Normal,
    Abnormal,
    NeedsEvaluation,
    NotPerformed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChildNutritionalStatus {
    Thinness,
    Normal,
    Overweight,
    Obesity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChildhoodCare {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(flatten)]
    pub link: EncounterLink,

    pub weight_kg: f64,
    pub height_cm: f64,
    #[serde(default)]
    pub bmi: Option<f64>,

    #[serde(default)]
    pub school_grade: Option<String>,
    #[serde(default)]
    pub school_performance: Option<SchoolPerformance>,
    #[serde(default)]
    pub learning_difficulties: bool,

    #[serde(default)]
    pub vision_screening: Option<ScreeningOutcome>,
    #[serde(default)]
    pub hearing_screening: Option<ScreeningOutcome>,
    #[serde(default)]
    pub permanent_teeth: Option<i32>,
    #[serde(default)]
    pub caries_count: Option<i32>,

    #[serde(default)]
    pub vaccination_up_to_date: bool,
    #[serde(default)]
    pub deworming: bool,

    #[serde(default)]
    pub physical_activity_hours_week: Option<f64>,
    #[serde(default)]
    pub screen_time_hours_day: Option<f64>,
    #[serde(default)]
    pub sleep_hours_day: Option<f64>,
    /// Free-form list of risk factors noted by the professional.
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub risk_factors: Option<Value>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ChildhoodCare {
    pub fn assess(&self) -> ChildhoodAssessment {
        let bmi = self
            .bmi
            .or_else(|| body_mass_index(Some(self.weight_kg), Some(self.height_cm)));
        let nutritional_status = bmi.map(|v| match v {
            v if v < 14.5 => ChildNutritionalStatus::Thinness,
            v if v < 18.5 => ChildNutritionalStatus::Normal,
            v if v < 21.0 => ChildNutritionalStatus::Overweight,
            _ => ChildNutritionalStatus::Obesity,
        });

        let abnormal = |s: Option<ScreeningOutcome>| s == Some(ScreeningOutcome::Abnormal);
        let development_appropriate = matches!(
            self.school_performance,
            Some(SchoolPerformance::Superior | SchoolPerformance::High | SchoolPerformance::Basic)
        ) && self.vision_screening == Some(ScreeningOutcome::Normal)
            && self.hearing_screening == Some(ScreeningOutcome::Normal)
            && !self.learning_difficulties;

        let specialist_follow_up = abnormal(self.vision_screening)
            || abnormal(self.hearing_screening)
            || self.learning_difficulties
            || self.caries_count.is_some_and(|c| c > 3);

        let nutritional_risk = matches!(
            nutritional_status,
            Some(ChildNutritionalStatus::Thinness | ChildNutritionalStatus::Obesity)
        );

        let next_visit_days = if specialist_follow_up && nutritional_risk {
            30
        } else if specialist_follow_up || nutritional_risk {
            90
        } else if !self.vaccination_up_to_date {
            180
        } else {
            365
        };

        ChildhoodAssessment {
            bmi,
            nutritional_status,
            development_appropriate,
            specialist_follow_up,
            nutritional_risk,
            next_visit_days,
            completeness_pct: self.completeness(),
        }
    }

    /// Weighted share of the follow-up fields that were filled in.
    fn completeness(&self) -> f64 {
        let checks: [(bool, f64); 6] = [
            (true, 30.0), // anthropometry is required
            (self.school_performance.is_some(), 20.0),
            (self.vision_screening.is_some(), 15.0),
            (self.hearing_screening.is_some(), 15.0),
            (self.caries_count.is_some(), 10.0),
            (self.sleep_hours_day.is_some(), 10.0),
        ];
        round_to(
            checks.iter().filter(|(ok, _)| *ok).map(|(_, w)| w).sum(),
            1,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ChildhoodAssessment {
    pub bmi: Option<f64>,
    pub nutritional_status: Option<ChildNutritionalStatus>,
    pub development_appropriate: bool,
    pub specialist_follow_up: bool,
    pub nutritional_risk: bool,
    pub next_visit_days: u32,
    pub completeness_pct: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChildhoodView {
    #[serde(flatten)]
    pub record: ChildhoodCare,
    pub assessment: ChildhoodAssessment,
}

impl TableRecord for ChildhoodCare {
    const TABLE: Table = Table::ChildhoodCare;
    const LABEL: &'static str = "Childhood care";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn validate(&self) -> CoreResult<()> {
        check_range_exclusive_min("weight_kg", Some(self.weight_kg), 0.0, 150.0)?;
        check_range_exclusive_min("height_cm", Some(self.height_cm), 50.0, 200.0)?;
        check_range("permanent_teeth", self.permanent_teeth, 0, 32)?;
        check_range("caries_count", self.caries_count, 0, 32)?;
        check_range("physical_activity_hours_week", self.physical_activity_hours_week, 0.0, 168.0)?;
        check_range("screen_time_hours_day", self.screen_time_hours_day, 0.0, 24.0)?;
        check_range("sleep_hours_day", self.sleep_hours_day, 0.0, 24.0)?;
        Ok(())
    }

    fn normalize(&mut self) {
        self.bmi = body_mass_index(Some(self.weight_kg), Some(self.height_cm));
    }
}

impl EncounterDetail for ChildhoodCare {
    type View = ChildhoodView;

    fn kind(&self) -> EncounterKind {
        EncounterKind::Childhood
    }

    fn link(&self) -> &EncounterLink {
        &self.link
    }

    fn link_mut(&mut self) -> &mut EncounterLink {
        &mut self.link
    }

    fn into_view(self) -> Self::View {
        let assessment = self.assess();
        ChildhoodView {
            record: self,
            assessment,
        }
    }
}

// ============================================================================
// AGGREGATES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ChildhoodStats {
    pub total: u64,
    pub superior_performance: u64,
    pub high_performance: u64,
    pub basic_performance: u64,
    pub low_performance: u64,
    pub not_enrolled: u64,
    pub thinness: u64,
    pub overweight: u64,
    pub obesity: u64,
    pub development_appropriate_pct: f64,
    pub specialist_follow_up_pct: f64,
    pub vaccination_up_to_date_pct: f64,
}

impl ChildhoodStats {
    pub fn from_records(records: &[ChildhoodCare]) -> Self {
        let total = records.len() as u64;
        let assessments: Vec<ChildhoodAssessment> = records.iter().map(ChildhoodCare::assess).collect();
        let performance = |level| {
            records
                .iter()
                .filter(|r| r.school_performance == Some(level))
                .count() as u64
        };
        let nutrition = |status| {
            assessments
                .iter()
                .filter(|a| a.nutritional_status == Some(status))
                .count() as u64
        };
        let appropriate = assessments.iter().filter(|a| a.development_appropriate).count() as u64;
        let follow_up = assessments.iter().filter(|a| a.specialist_follow_up).count() as u64;
        let vaccinated = records.iter().filter(|r| r.vaccination_up_to_date).count() as u64;
        Self {
            total,
            superior_performance: performance(SchoolPerformance::Superior),
            high_performance: performance(SchoolPerformance::High),
            basic_performance: performance(SchoolPerformance::Basic),
            low_performance: performance(SchoolPerformance::Low),
            not_enrolled: performance(SchoolPerformance::NotEnrolled),
            thinness: nutrition(ChildNutritionalStatus::Thinness),
            overweight: nutrition(ChildNutritionalStatus::Overweight),
            obesity: nutrition(ChildNutritionalStatus::Obesity),
            development_appropriate_pct: percentage(appropriate, total),
            specialist_follow_up_pct: percentage(follow_up, total),
            vaccination_up_to_date_pct: percentage(vaccinated, total),
        }
    }
}

/// Development problems found among school-age children, optionally for one school grade.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ChildDevelopmentReport {
    pub school_grade: Option<String>,
    pub total: u64,
    /// Superior, high or basic school performance.
    pub satisfactory_performance: u64,
    pub low_performance: u64,
    pub learning_difficulties: u64,
    /// Vision screening abnormal or pending further evaluation.
    pub vision_problems: u64,
    pub hearing_problems: u64,
    pub nutritional_problems: u64,
    pub specialist_follow_up: u64,
}

impl ChildDevelopmentReport {
    pub fn from_records(school_grade: Option<String>, records: &[ChildhoodCare]) -> Self {
        let count = |pred: &dyn Fn(&ChildhoodCare) -> bool| records.iter().filter(|r| pred(r)).count() as u64;
        let flagged = |s: Option<ScreeningOutcome>| {
            matches!(s, Some(ScreeningOutcome::Abnormal | ScreeningOutcome::NeedsEvaluation))
        };
        Self {
            school_grade,
            total: records.len() as u64,
            satisfactory_performance: count(&|r| {
                matches!(
                    r.school_performance,
                    Some(SchoolPerformance::Superior | SchoolPerformance::High | SchoolPerformance::Basic)
                )
            }),
            low_performance: count(&|r| r.school_performance == Some(SchoolPerformance::Low)),
            learning_difficulties: count(&|r| r.learning_difficulties),
            vision_problems: count(&|r| flagged(r.vision_screening)),
            hearing_problems: count(&|r| flagged(r.hearing_screening)),
            nutritional_problems: count(&|r| r.assess().nutritional_risk),
            specialist_follow_up: count(&|r| r.assess().specialist_follow_up),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> ChildhoodCare {
        serde_json::from_value(json!({
            "patient_id": "7d1c1a52-59a2-4e1b-9a4f-0d8f1f3c2b11",
            "encounter_date": "2024-06-01",
            "weight_kg": 25.0,
            "height_cm": 125.0,
            "school_performance": "HIGH",
            "vision_screening": "NORMAL",
            "hearing_screening": "NORMAL",
            "vaccination_up_to_date": true
        }))
        .expect("deserialize should succeed")
    }

    #[test]
    fn test_healthy_child() {
        let mut r = record();
        r.normalize();
        assert_eq!(r.bmi, Some(16.0));
        let a = r.assess();
        assert_eq!(a.nutritional_status, Some(ChildNutritionalStatus::Normal));
        assert!(a.development_appropriate);
        assert!(!a.specialist_follow_up);
        assert_eq!(a.next_visit_days, 365);
        assert_eq!(a.completeness_pct, 80.0);
    }

    #[test]
    fn test_follow_up_and_risk_shorten_next_visit() {
        let mut r = record();
        r.caries_count = Some(4);
        assert!(r.assess().specialist_follow_up);
        assert_eq!(r.assess().next_visit_days, 90);

        r.weight_kg = 40.0;
        r.normalize();
        assert_eq!(r.assess().nutritional_status, Some(ChildNutritionalStatus::Obesity));
        assert_eq!(r.assess().next_visit_days, 30);
    }

    #[test]
    fn test_learning_difficulties_mark_development_inappropriate() {
        let mut r = record();
        r.learning_difficulties = true;
        assert!(!r.assess().development_appropriate);
    }

    #[test]
    fn test_required_anthropometry_bounds() {
        let mut r = record();
        r.height_cm = 50.0;
        assert!(r.validate().is_err());
        r.height_cm = 120.0;
        r.weight_kg = 0.0;
        assert!(r.validate().is_err());
        assert!(
            serde_json::from_value::<ChildhoodCare>(json!({
                "patient_id": "7d1c1a52-59a2-4e1b-9a4f-0d8f1f3c2b11",
                "encounter_date": "2024-06-01",
                "height_cm": 120.0
            }))
            .is_err()
        );
    }

    #[test]
    fn test_stats_and_development_report() {
        let healthy = record();
        let mut struggling = record();
        struggling.school_performance = Some(SchoolPerformance::Low);
        struggling.vision_screening = Some(ScreeningOutcome::NeedsEvaluation);
        struggling.learning_difficulties = true;
        struggling.vaccination_up_to_date = false;
        struggling.weight_kg = 40.0;
        struggling.normalize();

        let stats = ChildhoodStats::from_records(&[healthy.clone(), struggling.clone()]);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.high_performance, 1);
        assert_eq!(stats.low_performance, 1);
        assert_eq!(stats.obesity, 1);
        assert_eq!(stats.development_appropriate_pct, 50.0);
        assert_eq!(stats.specialist_follow_up_pct, 50.0);
        assert_eq!(stats.vaccination_up_to_date_pct, 50.0);

        let report = ChildDevelopmentReport::from_records(Some("3".into()), &[healthy, struggling]);
        assert_eq!(report.satisfactory_performance, 1);
        assert_eq!(report.low_performance, 1);
        assert_eq!(report.vision_problems, 1);
        assert_eq!(report.hearing_problems, 0);
        assert_eq!(report.nutritional_problems, 1);
        assert_eq!(report.specialist_follow_up, 1);

        let empty = ChildhoodStats::from_records(&[]);
        assert_eq!(empty.development_appropriate_pct, 0.0);
    }
}
