//! Listings and aggregates for the life-course encounter types: childhood, adolescence and
//! youth, adulthood and old age.
//!
//! Stored columns such as school performance or age filter in the store. Levels that only
//! exist in the computed assessment (integral risk, cardiovascular risk, functional status,
//! frailty) filter after the read, through [`EncounterService::list_where`].

use super::encounters::{EncounterFilter, EncounterService};
use super::Page;
use crate::config::CoreConfig;
use crate::models::adolescence::{
    AdolescenceCare, AdolescenceStats, IntegralRisk, PsychosocialReport,
};
use crate::models::adulthood::{AdulthoodCare, AdulthoodStats, CardiovascularRisk};
use crate::models::childhood::{
    ChildDevelopmentReport, ChildhoodCare, ChildhoodStats, SchoolPerformance,
};
use crate::models::old_age::{Frailty, FunctionalStatus, GeriatricReport, OldAgeCare, OldAgeStats};
use crate::store::{Filter, Query, RecordStore};
use crate::{CoreError, CoreResult};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

const AGE_YEARS_COLUMN: &str = "age_years";

/// Inclusive date range a report covers. Both ends are required.
#[derive(Clone, Copy, Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportPeriod {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
}

impl ReportPeriod {
    fn filter(&self) -> CoreResult<EncounterFilter> {
        if self.date_to < self.date_from {
            return Err(CoreError::InvalidInput(
                "date_to cannot precede date_from".into(),
            ));
        }
        Ok(EncounterFilter {
            date_from: Some(self.date_from),
            date_to: Some(self.date_to),
            ..EncounterFilter::default()
        })
    }
}

// ============================================================================
// CHILDHOOD
// ============================================================================

#[derive(Clone, Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SchoolGrade {
    /// Restrict the report to one school grade.
    #[serde(default)]
    pub school_grade: Option<String>,
}

#[derive(Clone)]
pub struct ChildhoodService {
    records: EncounterService<ChildhoodCare>,
}

impl ChildhoodService {
    pub fn new(store: Arc<dyn RecordStore>, cfg: Arc<CoreConfig>) -> Self {
        Self {
            records: EncounterService::new(store, cfg),
        }
    }

    pub fn records(&self) -> &EncounterService<ChildhoodCare> {
        &self.records
    }

    /// One page of visits recording this school performance, most recent first.
    pub async fn by_school_performance(
        &self,
        performance: SchoolPerformance,
        page: Page,
    ) -> CoreResult<Vec<ChildhoodCare>> {
        self.records
            .list_by(vec![Filter::eq("school_performance", performance)], page)
            .await
    }

    pub async fn stats(&self, filter: &EncounterFilter) -> CoreResult<ChildhoodStats> {
        let records = self.records.matching(filter).await?;
        Ok(ChildhoodStats::from_records(&records))
    }

    /// Development problems over the visits matching `filter`, optionally for one grade.
    pub async fn development_report(
        &self,
        filter: &EncounterFilter,
        grade: &SchoolGrade,
    ) -> CoreResult<ChildDevelopmentReport> {
        let school_grade = grade
            .school_grade
            .as_deref()
            .map(str::trim)
            .filter(|g| !g.is_empty());
        let query = Query {
            filters: filter.filters(),
            ..Query::new()
        }
        .filter_opt(school_grade.map(|g| Filter::eq("school_grade", g)));
        let records = self.records.select(&query).await?;
        Ok(ChildDevelopmentReport::from_records(
            school_grade.map(String::from),
            &records,
        ))
    }
}

// ============================================================================
// ADOLESCENCE AND YOUTH
// ============================================================================

#[derive(Clone)]
pub struct AdolescenceService {
    records: EncounterService<AdolescenceCare>,
}

impl AdolescenceService {
    pub fn new(store: Arc<dyn RecordStore>, cfg: Arc<CoreConfig>) -> Self {
        Self {
            records: EncounterService::new(store, cfg),
        }
    }

    pub fn records(&self) -> &EncounterService<AdolescenceCare> {
        &self.records
    }

    /// One page of visits with `min_age <= age_years <= max_age`, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidInput` if `min_age` exceeds `max_age`.
    pub async fn by_age_range(
        &self,
        min_age: i32,
        max_age: i32,
        page: Page,
    ) -> CoreResult<Vec<AdolescenceCare>> {
        if min_age > max_age {
            return Err(CoreError::InvalidInput(format!(
                "age range {min_age}..{max_age} is empty"
            )));
        }
        let filters = vec![
            Filter::gte(AGE_YEARS_COLUMN, min_age),
            Filter::lte(AGE_YEARS_COLUMN, max_age),
        ];
        self.records.list_by(filters, page).await
    }

    pub async fn by_integral_risk(
        &self,
        level: IntegralRisk,
        filter: &EncounterFilter,
    ) -> CoreResult<Vec<AdolescenceCare>> {
        self.records
            .list_where(filter, |r| r.assess().integral_risk == level)
            .await
    }

    /// Visits assessed at high integral risk or above.
    pub async fn high_risk_alerts(
        &self,
        filter: &EncounterFilter,
    ) -> CoreResult<Vec<AdolescenceCare>> {
        let alerts = self
            .records
            .list_where(filter, |r| r.assess().integral_risk.is_high())
            .await?;
        if !alerts.is_empty() {
            tracing::debug!(count = alerts.len(), "High-risk adolescence visits listed");
        }
        Ok(alerts)
    }

    pub async fn stats(&self, filter: &EncounterFilter) -> CoreResult<AdolescenceStats> {
        let records = self.records.matching(filter).await?;
        Ok(AdolescenceStats::from_records(&records))
    }

    pub async fn psychosocial_report(
        &self,
        filter: &EncounterFilter,
    ) -> CoreResult<PsychosocialReport> {
        let records = self.records.matching(filter).await?;
        Ok(PsychosocialReport::from_records(&records))
    }
}

// ============================================================================
// ADULTHOOD
// ============================================================================

#[derive(Clone)]
pub struct AdulthoodService {
    records: EncounterService<AdulthoodCare>,
}

impl AdulthoodService {
    pub fn new(store: Arc<dyn RecordStore>, cfg: Arc<CoreConfig>) -> Self {
        Self {
            records: EncounterService::new(store, cfg),
        }
    }

    pub fn records(&self) -> &EncounterService<AdulthoodCare> {
        &self.records
    }

    pub async fn by_cardiovascular_risk(
        &self,
        level: CardiovascularRisk,
        filter: &EncounterFilter,
    ) -> CoreResult<Vec<AdulthoodCare>> {
        self.records
            .list_where(filter, |r| r.assess().cardiovascular_risk == level)
            .await
    }

    pub async fn stats(&self, filter: &EncounterFilter) -> CoreResult<AdulthoodStats> {
        let records = self.records.matching(filter).await?;
        Ok(AdulthoodStats::from_records(&records))
    }
}

// ============================================================================
// OLD AGE
// ============================================================================

#[derive(Clone)]
pub struct OldAgeService {
    records: EncounterService<OldAgeCare>,
}

impl OldAgeService {
    pub fn new(store: Arc<dyn RecordStore>, cfg: Arc<CoreConfig>) -> Self {
        Self {
            records: EncounterService::new(store, cfg),
        }
    }

    pub fn records(&self) -> &EncounterService<OldAgeCare> {
        &self.records
    }

    pub async fn by_functional_status(
        &self,
        status: FunctionalStatus,
        filter: &EncounterFilter,
    ) -> CoreResult<Vec<OldAgeCare>> {
        self.records
            .list_where(filter, |r| r.assess().functional_status == status)
            .await
    }

    pub async fn by_frailty(
        &self,
        level: Frailty,
        filter: &EncounterFilter,
    ) -> CoreResult<Vec<OldAgeCare>> {
        self.records
            .list_where(filter, |r| r.assess().frailty == level)
            .await
    }

    pub async fn stats(&self, filter: &EncounterFilter) -> CoreResult<OldAgeStats> {
        let records = self.records.matching(filter).await?;
        Ok(OldAgeStats::from_records(&records))
    }

    /// # Errors
    ///
    /// Returns `CoreError::InvalidInput` if the period ends before it starts.
    pub async fn geriatric_report(&self, period: ReportPeriod) -> CoreResult<GeriatricReport> {
        let records = self.records.matching(&period.filter()?).await?;
        Ok(GeriatricReport::from_records(
            period.date_from,
            period.date_to,
            &records,
        ))
    }
}
