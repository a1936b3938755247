//! Integral care plans: cross-cutting care coordinated across patients, families and settings.

use super::{RecordMeta, TableRecord};
use crate::store::Table;
use crate::{CoreError, CoreResult};
use chrono::{DateTime, NaiveDate, Utc};
use ips_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CareApproach {
    PopulationPromotion,
    PrimaryPrevention,
    SecondaryPreventionScreening,
    EarlyRiskIntervention,
    DiseaseManagement,
    FunctionalRehabilitation,
    PalliativeCare,
    Emergency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CareComplexity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CareModality {
    Institutional,
    Home,
    Telehealth,
    Hybrid,
    Mobile,
    Community,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanStatus {
    Planned,
    InProgress,
    Completed,
    Cancelled,
}

/// Who the plan is for: one person, a family, or a setting's population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CareSubject {
    Individual,
    Family,
    Community,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct IntegralCarePlan {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[schema(value_type = String)]
    pub code: NonEmptyText,
    pub approach: CareApproach,
    #[serde(default)]
    pub complexity: Option<CareComplexity>,
    #[serde(default)]
    pub modality: Option<CareModality>,
    pub subject: CareSubject,

    #[serde(default)]
    pub patient_id: Option<Uuid>,
    #[serde(default)]
    pub family_id: Option<Uuid>,
    /// Settings involved in the plan, as a JSON array of ids.
    #[serde(default)]
    #[schema(value_type = Vec<Uuid>)]
    pub setting_ids: Option<Value>,
    #[serde(default)]
    pub coordinator_id: Option<Uuid>,

    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub objectives: Option<Value>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub interventions: Option<Value>,

    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub planned_end_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub actual_end_at: Option<DateTime<Utc>>,
    /// Date of the next scheduled follow-up evaluation.
    #[serde(default)]
    pub next_evaluation_on: Option<NaiveDate>,
    #[serde(default = "default_status")]
    pub status: PlanStatus,
    #[serde(default)]
    pub closing_notes: Option<String>,
}

fn default_status() -> PlanStatus {
    PlanStatus::Planned
}

/// Body of a finalize request.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct FinalizePlan {
    #[serde(default)]
    pub actual_end_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub closing_notes: Option<String>,
}

impl IntegralCarePlan {
    /// Close the plan. The end time defaults to `now`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidInput` if the plan was cancelled or the end precedes the start.
    pub fn finalize(&mut self, request: FinalizePlan, now: DateTime<Utc>) -> CoreResult<()> {
        if self.status == PlanStatus::Cancelled {
            return Err(CoreError::InvalidInput(
                "a cancelled plan cannot be finalized".into(),
            ));
        }
        let end = request.actual_end_at.unwrap_or(now);
        if self.started_at.is_some_and(|start| end < start) {
            return Err(CoreError::InvalidInput(
                "actual_end_at cannot precede started_at".into(),
            ));
        }
        self.status = PlanStatus::Completed;
        self.actual_end_at = Some(end);
        if request.closing_notes.is_some() {
            self.closing_notes = request.closing_notes;
        }
        Ok(())
    }
}

impl TableRecord for IntegralCarePlan {
    const TABLE: Table = Table::IntegralCarePlans;
    const LABEL: &'static str = "Integral care plan";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn validate(&self) -> CoreResult<()> {
        if self.subject == CareSubject::Individual && self.patient_id.is_none() {
            return Err(CoreError::InvalidInput(
                "an individual plan requires patient_id".into(),
            ));
        }
        if self.subject == CareSubject::Family && self.family_id.is_none() {
            return Err(CoreError::InvalidInput(
                "a family plan requires family_id".into(),
            ));
        }
        if let Some(ids) = &self.setting_ids {
            let valid = ids.as_array().is_some_and(|items| {
                items
                    .iter()
                    .all(|v| v.as_str().is_some_and(|s| Uuid::parse_str(s).is_ok()))
            });
            if !valid {
                return Err(CoreError::InvalidInput(
                    "setting_ids must be an array of UUIDs".into(),
                ));
            }
        }
        if let (Some(start), Some(end)) = (self.started_at, self.planned_end_at) {
            if end < start {
                return Err(CoreError::InvalidInput(
                    "planned_end_at cannot precede started_at".into(),
                ));
            }
        }
        Ok(())
    }

    fn unique_key(&self) -> Option<(&'static str, Value)> {
        Some(("code", Value::String(self.code.as_str().to_string())))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ApproachCount {
    pub approach: CareApproach,
    pub plans: u64,
    pub completed: u64,
}

/// Plans grouped by care approach.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ApproachReport {
    pub total_plans: u64,
    pub by_approach: Vec<ApproachCount>,
}

impl ApproachReport {
    pub fn from_plans(plans: &[IntegralCarePlan]) -> Self {
        let mut groups = std::collections::BTreeMap::<CareApproach, (u64, u64)>::new();
        for plan in plans {
            let entry = groups.entry(plan.approach).or_default();
            entry.0 += 1;
            if plan.status == PlanStatus::Completed {
                entry.1 += 1;
            }
        }
        Self {
            total_plans: plans.len() as u64,
            by_approach: groups
                .into_iter()
                .map(|(approach, (plans, completed))| ApproachCount {
                    approach,
                    plans,
                    completed,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ComplexityCount {
    /// Absent for plans with no recorded complexity.
    pub complexity: Option<CareComplexity>,
    pub plans: u64,
    pub in_progress: u64,
}

/// Plans grouped by care complexity.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ComplexityReport {
    pub total_plans: u64,
    pub by_complexity: Vec<ComplexityCount>,
}

impl ComplexityReport {
    pub fn from_plans(plans: &[IntegralCarePlan]) -> Self {
        let mut groups = std::collections::BTreeMap::<Option<CareComplexity>, (u64, u64)>::new();
        for plan in plans {
            let entry = groups.entry(plan.complexity).or_default();
            entry.0 += 1;
            if plan.status == PlanStatus::InProgress {
                entry.1 += 1;
            }
        }
        Self {
            total_plans: plans.len() as u64,
            by_complexity: groups
                .into_iter()
                .map(|(complexity, (plans, in_progress))| ComplexityCount {
                    complexity,
                    plans,
                    in_progress,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn plan() -> IntegralCarePlan {
        serde_json::from_value(json!({
            "code": "PAI-2024-001",
            "approach": "DISEASE_MANAGEMENT",
            "subject": "INDIVIDUAL",
            "patient_id": "7d1c1a52-59a2-4e1b-9a4f-0d8f1f3c2b11",
            "setting_ids": ["0b6f5a5e-7f0e-4a8e-9d5b-6f7d9f1f2a10"],
            "started_at": "2024-03-01T08:00:00Z"
        }))
        .expect("deserialize should succeed")
    }

    #[test]
    fn test_subject_links_and_setting_ids_validated() {
        let mut p = plan();
        assert!(p.validate().is_ok());
        assert_eq!(p.status, PlanStatus::Planned);
        p.patient_id = None;
        assert!(p.validate().is_err());

        let mut p = plan();
        p.setting_ids = Some(json!(["not-a-uuid"]));
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_finalize_defaults_end_to_now() {
        let now: DateTime<Utc> = "2024-06-01T12:00:00Z".parse().expect("valid timestamp");
        let mut p = plan();
        p.finalize(
            FinalizePlan {
                actual_end_at: None,
                closing_notes: Some("Goals met".into()),
            },
            now,
        )
        .expect("finalize should succeed");
        assert_eq!(p.status, PlanStatus::Completed);
        assert_eq!(p.actual_end_at, Some(now));
        assert_eq!(p.closing_notes.as_deref(), Some("Goals met"));
    }

    #[test]
    fn test_finalize_rejects_end_before_start_and_cancelled() {
        let now: DateTime<Utc> = "2024-06-01T12:00:00Z".parse().expect("valid timestamp");
        let mut p = plan();
        let early = FinalizePlan {
            actual_end_at: Some("2024-01-01T00:00:00Z".parse().expect("valid timestamp")),
            closing_notes: None,
        };
        assert!(p.finalize(early, now).is_err());

        p.status = PlanStatus::Cancelled;
        assert!(p.finalize(FinalizePlan::default(), now).is_err());
    }

    #[test]
    fn test_approach_report() {
        let mut done = plan();
        done.status = PlanStatus::Completed;
        let mut promo = plan();
        promo.approach = CareApproach::PopulationPromotion;
        let report = ApproachReport::from_plans(&[plan(), done, promo]);
        assert_eq!(report.total_plans, 3);
        assert_eq!(report.by_approach[0].approach, CareApproach::PopulationPromotion);
        assert_eq!(report.by_approach[1].plans, 2);
        assert_eq!(report.by_approach[1].completed, 1);
    }

    #[test]
    fn test_complexity_report() {
        let mut high = plan();
        high.complexity = Some(CareComplexity::High);
        high.status = PlanStatus::InProgress;
        let mut low = plan();
        low.complexity = Some(CareComplexity::Low);
        let report = ComplexityReport::from_plans(&[high.clone(), high, low, plan()]);
        assert_eq!(report.total_plans, 4);
        assert_eq!(report.by_complexity.len(), 3);
        assert_eq!(report.by_complexity[0].complexity, None);
        assert_eq!(report.by_complexity[1].complexity, Some(CareComplexity::Low));
        assert_eq!(report.by_complexity[2].plans, 2);
        assert_eq!(report.by_complexity[2].in_progress, 2);
    }
}
