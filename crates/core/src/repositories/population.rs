//! Population-level records: public-health settings, collective interventions, family units
//! and integral care plans.
//!
//! Plain CRUD goes through [`RecordService`]; this module adds the listing filters and the
//! operations that only make sense for one record type.

use super::records::RecordService;
use super::Page;
use crate::config::CoreConfig;
use crate::models::collective::CollectiveIntervention;
use crate::models::family::{FamilyStructure, FamilyStructureReport, FamilyUnit, LifeCycleReport};
use crate::models::integral_care::{
    ApproachReport, CareApproach, ComplexityReport, FinalizePlan, IntegralCarePlan, PlanStatus,
};
use crate::models::public_health_setting::{ActivationState, PublicHealthSetting, SettingType};
use crate::store::{Filter, Query, RecordStore};
use crate::{CoreError, CoreResult};
use chrono::{Days, NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;
use uuid::Uuid;

const SETTING_ID_COLUMN: &str = "setting_id";
const NEXT_EVALUATION_COLUMN: &str = "next_evaluation_on";
const DEFAULT_EVALUATION_WINDOW_DAYS: u32 = 7;
const MAX_EVALUATION_WINDOW_DAYS: u32 = 365;

fn collect(filters: impl IntoIterator<Item = Option<Filter>>) -> Vec<Filter> {
    filters.into_iter().flatten().collect()
}

// ============================================================================
// SETTINGS
// ============================================================================

#[derive(Clone, Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SettingFilter {
    #[serde(default)]
    pub setting_type: Option<SettingType>,
    #[serde(default)]
    pub activation_state: Option<ActivationState>,
    /// Case-insensitive substring of the municipality name.
    #[serde(default)]
    pub municipality: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
}

impl SettingFilter {
    pub fn filters(&self) -> Vec<Filter> {
        collect([
            self.setting_type.map(|t| Filter::eq("setting_type", t)),
            self.activation_state.map(|s| Filter::eq("activation_state", s)),
            self.municipality
                .as_deref()
                .map(|m| Filter::ilike("municipality", m.trim())),
        ])
    }

    pub fn page(&self) -> Page {
        Page::new(self.limit, self.offset)
    }
}

pub type SettingService = RecordService<PublicHealthSetting>;

// ============================================================================
// COLLECTIVE INTERVENTIONS
// ============================================================================

#[derive(Clone, Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CollectiveFilter {
    /// Exact setting label, e.g. `school`.
    #[serde(default)]
    pub setting: Option<String>,
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
}

impl CollectiveFilter {
    pub fn filters(&self) -> Vec<Filter> {
        collect([
            self.setting
                .as_deref()
                .map(|s| Filter::eq("setting", s.trim())),
            self.date_from.map(|d| Filter::gte("intervention_date", d)),
            self.date_to.map(|d| Filter::lte("intervention_date", d)),
        ])
    }

    pub fn page(&self) -> Page {
        Page::new(self.limit, self.offset)
    }
}

pub type CollectiveService = RecordService<CollectiveIntervention>;

// ============================================================================
// FAMILY UNITS
// ============================================================================

#[derive(Clone, Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FamilyFilter {
    #[serde(default)]
    pub setting_id: Option<Uuid>,
    #[serde(default)]
    pub structure: Option<FamilyStructure>,
    /// Case-insensitive substring of the head of household's name.
    #[serde(default)]
    pub head_of_household: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
}

impl FamilyFilter {
    fn filters(&self) -> Vec<Filter> {
        collect([
            self.setting_id.map(|id| Filter::eq(SETTING_ID_COLUMN, id)),
            self.structure.map(|s| Filter::eq("structure", s)),
            self.head_of_household
                .as_deref()
                .map(|name| Filter::ilike("head_of_household", name.trim())),
        ])
    }
}

#[derive(Clone)]
pub struct FamilyService {
    records: RecordService<FamilyUnit>,
}

impl FamilyService {
    pub fn new(store: Arc<dyn RecordStore>, cfg: Arc<CoreConfig>) -> Self {
        Self {
            records: RecordService::new(store, cfg),
        }
    }

    pub fn records(&self) -> &RecordService<FamilyUnit> {
        &self.records
    }

    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if no family has this code.
    pub async fn by_code(&self, family_code: &str) -> CoreResult<FamilyUnit> {
        self.records.get_by("family_code", family_code.trim()).await
    }

    pub async fn list(&self, filter: &FamilyFilter) -> CoreResult<Vec<FamilyUnit>> {
        self.records
            .list(filter.filters(), Page::new(filter.limit, filter.offset))
            .await
    }

    /// Every family, grouped by structure type.
    pub async fn structure_report(&self) -> CoreResult<FamilyStructureReport> {
        let units = self.records.select(&Query::new()).await?;
        Ok(FamilyStructureReport::from_units(&units))
    }

    /// Every family, grouped by life-cycle stage.
    pub async fn life_cycle_report(&self) -> CoreResult<LifeCycleReport> {
        let units = self.records.select(&Query::new()).await?;
        Ok(LifeCycleReport::from_units(&units))
    }

    /// One page of the families attached to a public-health setting.
    pub async fn by_setting(&self, setting_id: Uuid, page: Page) -> CoreResult<Vec<FamilyUnit>> {
        self.records
            .list(vec![Filter::eq(SETTING_ID_COLUMN, setting_id)], page)
            .await
    }
}

// ============================================================================
// INTEGRAL CARE PLANS
// ============================================================================

#[derive(Clone, Copy, Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CarePlanFilter {
    #[serde(default)]
    pub patient_id: Option<Uuid>,
    #[serde(default)]
    pub family_id: Option<Uuid>,
    /// Plans whose `setting_ids` include this setting.
    #[serde(default)]
    pub setting_id: Option<Uuid>,
    #[serde(default)]
    pub coordinator_id: Option<Uuid>,
    #[serde(default)]
    pub approach: Option<CareApproach>,
    #[serde(default)]
    pub status: Option<PlanStatus>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
}

/// How far ahead to look for scheduled evaluations.
#[derive(Clone, Copy, Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EvaluationWindow {
    /// Days from today, 7 when absent.
    #[serde(default)]
    pub days: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
}

impl CarePlanFilter {
    fn filters(&self) -> Vec<Filter> {
        collect([
            self.patient_id.map(|id| Filter::eq("patient_id", id)),
            self.family_id.map(|id| Filter::eq("family_id", id)),
            self.setting_id.map(|id| Filter::contains("setting_ids", id)),
            self.coordinator_id.map(|id| Filter::eq("coordinator_id", id)),
            self.approach.map(|a| Filter::eq("approach", a)),
            self.status.map(|s| Filter::eq("status", s)),
        ])
    }
}

#[derive(Clone)]
pub struct CarePlanService {
    records: RecordService<IntegralCarePlan>,
}

impl CarePlanService {
    pub fn new(store: Arc<dyn RecordStore>, cfg: Arc<CoreConfig>) -> Self {
        Self {
            records: RecordService::new(store, cfg),
        }
    }

    pub fn records(&self) -> &RecordService<IntegralCarePlan> {
        &self.records
    }

    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if no plan has this code.
    pub async fn by_code(&self, code: &str) -> CoreResult<IntegralCarePlan> {
        self.records.get_by("code", code.trim()).await
    }

    pub async fn list(&self, filter: &CarePlanFilter) -> CoreResult<Vec<IntegralCarePlan>> {
        self.records
            .list(filter.filters(), Page::new(filter.limit, filter.offset))
            .await
    }

    /// Mark a plan completed.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if the plan does not exist, or
    /// `CoreError::InvalidInput` if it was cancelled or the end precedes the start.
    pub async fn finalize(&self, id: Uuid, request: FinalizePlan) -> CoreResult<IntegralCarePlan> {
        let mut plan = self.records.get(id).await?;
        plan.finalize(request, Utc::now())?;
        let plan = self.records.replace(id, plan).await?;
        tracing::info!(%id, code = %plan.code, "Integral care plan finalized");
        Ok(plan)
    }

    /// Every plan, grouped by care approach.
    pub async fn approach_report(&self) -> CoreResult<ApproachReport> {
        let plans = self.records.select(&Query::new()).await?;
        Ok(ApproachReport::from_plans(&plans))
    }

    /// Every plan, grouped by care complexity.
    pub async fn complexity_report(&self) -> CoreResult<ComplexityReport> {
        let plans = self.records.select(&Query::new()).await?;
        Ok(ComplexityReport::from_plans(&plans))
    }

    /// In-progress plans with an evaluation due within the window, soonest first. Overdue
    /// evaluations are included.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidInput` if the window exceeds a year.
    pub async fn upcoming_evaluations(
        &self,
        window: &EvaluationWindow,
    ) -> CoreResult<Vec<IntegralCarePlan>> {
        self.upcoming_evaluations_on(window, Utc::now().date_naive())
            .await
    }

    pub(crate) async fn upcoming_evaluations_on(
        &self,
        window: &EvaluationWindow,
        today: NaiveDate,
    ) -> CoreResult<Vec<IntegralCarePlan>> {
        let days = window.days.unwrap_or(DEFAULT_EVALUATION_WINDOW_DAYS);
        if days > MAX_EVALUATION_WINDOW_DAYS {
            return Err(CoreError::InvalidInput(format!(
                "days must be at most {MAX_EVALUATION_WINDOW_DAYS}"
            )));
        }
        let until = today
            .checked_add_days(Days::new(u64::from(days)))
            .ok_or_else(|| CoreError::InvalidInput("evaluation window is out of range".into()))?;
        let query = Query::new()
            .filter(Filter::eq("status", PlanStatus::InProgress))
            .filter(Filter::lte(NEXT_EVALUATION_COLUMN, until))
            .order_by(NEXT_EVALUATION_COLUMN, false);
        self.records
            .list_query(query, Page::new(window.limit, window.offset))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::integral_care::CareComplexity;
    use crate::models::TableRecord;
    use crate::store::MemoryStore;
    use crate::CoreError;
    use serde_json::json;

    fn store() -> (Arc<dyn RecordStore>, Arc<CoreConfig>) {
        (
            Arc::new(MemoryStore::new()),
            Arc::new(CoreConfig::in_memory()),
        )
    }

    #[tokio::test]
    async fn test_setting_filters_and_duplicate_code() {
        let (store, cfg) = store();
        let svc = SettingService::new(store, cfg);
        for (code, kind, town) in [
            ("ENT-1", "COMMUNITY", "Chía"),
            ("ENT-2", "EDUCATIONAL", "Cajicá"),
            ("ENT-3", "COMMUNITY", "Cajicá"),
        ] {
            let setting: PublicHealthSetting = serde_json::from_value(json!({
                "code": code, "name": code, "setting_type": kind, "municipality": town
            }))
            .expect("deserialize should succeed");
            svc.create(setting).await.expect("create should succeed");
        }

        let filter = SettingFilter {
            setting_type: Some(SettingType::Community),
            municipality: Some("cajic".into()),
            ..SettingFilter::default()
        };
        let found = svc
            .list(filter.filters(), filter.page())
            .await
            .expect("list should succeed");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].code.as_str(), "ENT-3");

        let duplicate: PublicHealthSetting = serde_json::from_value(json!({
            "code": "ENT-1", "name": "Otro", "setting_type": "WORKPLACE"
        }))
        .expect("deserialize should succeed");
        assert!(matches!(
            svc.create(duplicate).await,
            Err(CoreError::Conflict { field: "code", .. })
        ));
    }

    #[tokio::test]
    async fn test_collective_interventions_filtered_by_setting() {
        let (store, cfg) = store();
        let svc = CollectiveService::new(store, cfg);
        for setting in ["school", "community", "school"] {
            let intervention: CollectiveIntervention = serde_json::from_value(json!({
                "intervention_date": "2024-03-08",
                "setting": setting,
                "topic": "Lavado de manos",
                "target_population": "Escolares",
                "participant_count": 30
            }))
            .expect("deserialize should succeed");
            svc.create(intervention).await.expect("create should succeed");
        }
        let filter = CollectiveFilter {
            setting: Some("school".into()),
            ..CollectiveFilter::default()
        };
        let found = svc
            .list(filter.filters(), filter.page())
            .await
            .expect("list should succeed");
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn test_family_lookup_search_and_report() {
        let (store, cfg) = store();
        let svc = FamilyService::new(store, cfg);
        let setting_id = Uuid::new_v4();
        for (code, head, structure) in [
            ("FAM-001", "María Gómez", "NUCLEAR_TWO_PARENT"),
            ("FAM-002", "Pedro Gómez", "SINGLE_PERSON"),
            ("FAM-003", "Ana Torres", "NUCLEAR_TWO_PARENT"),
        ] {
            let unit: FamilyUnit = serde_json::from_value(json!({
                "family_code": code,
                "head_of_household": head,
                "structure": structure,
                "total_members": 3,
                "setting_id": setting_id
            }))
            .expect("deserialize should succeed");
            svc.records().create(unit).await.expect("create should succeed");
        }

        let found = svc.by_code("FAM-002").await.expect("by_code should succeed");
        assert_eq!(found.head_of_household.as_deref(), Some("Pedro Gómez"));
        assert!(matches!(
            svc.by_code("FAM-404").await,
            Err(CoreError::NotFound { .. })
        ));

        let gomez = svc
            .list(&FamilyFilter {
                head_of_household: Some("gómez".into()),
                ..FamilyFilter::default()
            })
            .await
            .expect("list should succeed");
        assert_eq!(gomez.len(), 2);

        let in_setting = svc
            .list(&FamilyFilter {
                setting_id: Some(setting_id),
                ..FamilyFilter::default()
            })
            .await
            .expect("list should succeed");
        assert_eq!(in_setting.len(), 3);

        let report = svc.structure_report().await.expect("report should succeed");
        assert_eq!(report.total_families, 3);
        assert_eq!(report.by_structure[0].families, 2);
    }

    #[tokio::test]
    async fn test_families_by_setting_and_life_cycle_report() {
        let (store, cfg) = store();
        let svc = FamilyService::new(store, cfg);
        let (rural, urban) = (Uuid::new_v4(), Uuid::new_v4());
        for (code, setting, stage) in [
            ("FAM-101", rural, Some("YOUNG_CHILDREN")),
            ("FAM-102", rural, Some("EMPTY_NEST")),
            ("FAM-103", urban, Some("YOUNG_CHILDREN")),
            ("FAM-104", urban, None),
        ] {
            let unit: FamilyUnit = serde_json::from_value(json!({
                "family_code": code,
                "structure": "NUCLEAR_TWO_PARENT",
                "life_cycle": stage,
                "total_members": 4,
                "setting_id": setting
            }))
            .expect("deserialize should succeed");
            svc.records().create(unit).await.expect("create should succeed");
        }

        let in_rural = svc
            .by_setting(rural, Page::default())
            .await
            .expect("by_setting should succeed");
        assert_eq!(in_rural.len(), 2);
        assert!(in_rural.iter().all(|f| f.setting_id == Some(rural)));
        let one = svc
            .by_setting(urban, Page::new(Some(1), None))
            .await
            .expect("by_setting should succeed");
        assert_eq!(one.len(), 1);

        let report = svc.life_cycle_report().await.expect("report should succeed");
        assert_eq!(report.total_families, 4);
        assert_eq!(report.by_life_cycle.len(), 3);
        assert_eq!(report.by_life_cycle[0].life_cycle, None);
        assert_eq!(report.by_life_cycle[1].families, 2);
        assert_eq!(report.by_life_cycle[1].members, 8);
    }

    #[tokio::test]
    async fn test_care_plan_setting_filter_and_finalize() {
        let (store, cfg) = store();
        let svc = CarePlanService::new(store, cfg);
        let setting_id = Uuid::new_v4();
        let plan: IntegralCarePlan = serde_json::from_value(json!({
            "code": "PAI-001",
            "approach": "POPULATION_PROMOTION",
            "subject": "COMMUNITY",
            "setting_ids": [setting_id],
            "started_at": "2024-01-10T08:00:00Z"
        }))
        .expect("deserialize should succeed");
        let created = svc.records().create(plan).await.expect("create should succeed");
        let id = created.id().expect("plan should have an id");

        let listed = svc
            .list(&CarePlanFilter {
                setting_id: Some(setting_id),
                ..CarePlanFilter::default()
            })
            .await
            .expect("list should succeed");
        assert_eq!(listed.len(), 1);

        let finalized = svc
            .finalize(
                id,
                FinalizePlan {
                    actual_end_at: None,
                    closing_notes: Some("Cierre".into()),
                },
            )
            .await
            .expect("finalize should succeed");
        assert_eq!(finalized.status, PlanStatus::Completed);
        assert!(finalized.actual_end_at.is_some());
        assert_eq!(
            svc.by_code("PAI-001")
                .await
                .expect("by_code should succeed")
                .status,
            PlanStatus::Completed
        );

        let report = svc.approach_report().await.expect("report should succeed");
        assert_eq!(report.by_approach[0].completed, 1);
    }

    #[tokio::test]
    async fn test_upcoming_evaluations_and_complexity_report() {
        let (store, cfg) = store();
        let svc = CarePlanService::new(store, cfg);
        for (code, status, next, complexity) in [
            ("PAI-010", "IN_PROGRESS", Some("2024-05-03"), "HIGH"),
            ("PAI-011", "IN_PROGRESS", Some("2024-04-28"), "HIGH"),
            ("PAI-012", "IN_PROGRESS", Some("2024-06-30"), "LOW"),
            ("PAI-013", "PLANNED", Some("2024-05-02"), "LOW"),
            ("PAI-014", "IN_PROGRESS", None, "MEDIUM"),
        ] {
            let plan: IntegralCarePlan = serde_json::from_value(json!({
                "code": code,
                "approach": "DISEASE_MANAGEMENT",
                "subject": "COMMUNITY",
                "status": status,
                "complexity": complexity,
                "next_evaluation_on": next
            }))
            .expect("deserialize should succeed");
            svc.records().create(plan).await.expect("create should succeed");
        }
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date");

        let due = svc
            .upcoming_evaluations_on(&EvaluationWindow::default(), today)
            .await
            .expect("upcoming_evaluations should succeed");
        let codes: Vec<&str> = due.iter().map(|p| p.code.as_str()).collect();
        assert_eq!(codes, ["PAI-011", "PAI-010"]);

        let wide = EvaluationWindow {
            days: Some(90),
            ..EvaluationWindow::default()
        };
        let due = svc
            .upcoming_evaluations_on(&wide, today)
            .await
            .expect("upcoming_evaluations should succeed");
        assert_eq!(due.len(), 3);

        let too_wide = EvaluationWindow {
            days: Some(400),
            ..EvaluationWindow::default()
        };
        assert!(matches!(
            svc.upcoming_evaluations_on(&too_wide, today).await,
            Err(CoreError::InvalidInput(_))
        ));

        let report = svc.complexity_report().await.expect("report should succeed");
        assert_eq!(report.total_plans, 5);
        let high = report
            .by_complexity
            .iter()
            .find(|c| c.complexity == Some(CareComplexity::High))
            .expect("high complexity group");
        assert_eq!(high.plans, 2);
        assert_eq!(high.in_progress, 2);
    }
}
