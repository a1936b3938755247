//! Cancer-screening listings by type, screening statistics and interval adherence.

use super::encounters::{EncounterFilter, EncounterService};
use super::Page;
use crate::config::CoreConfig;
use crate::models::cancer_screening::{
    CancerScreening, ScreeningAdherenceReport, ScreeningStats, ScreeningType,
};
use crate::store::{Filter, Query, RecordStore};
use crate::CoreResult;
use chrono::{NaiveDate, Utc};
use std::sync::Arc;

const SCREENING_TYPE_COLUMN: &str = "screening_type";

#[derive(Clone)]
pub struct ScreeningService {
    cfg: Arc<CoreConfig>,
    records: EncounterService<CancerScreening>,
}

impl ScreeningService {
    pub fn new(store: Arc<dyn RecordStore>, cfg: Arc<CoreConfig>) -> Self {
        Self {
            records: EncounterService::new(store, cfg.clone()),
            cfg,
        }
    }

    pub fn records(&self) -> &EncounterService<CancerScreening> {
        &self.records
    }

    /// One page of screenings of one type, most recent first.
    pub async fn by_type(
        &self,
        screening_type: ScreeningType,
        page: Page,
    ) -> CoreResult<Vec<CancerScreening>> {
        let query = Query::new()
            .filter(Filter::eq(SCREENING_TYPE_COLUMN, screening_type))
            .order_by("encounter_date", true)
            .limit(self.cfg.page_size(page.limit))
            .offset(page.offset.unwrap_or(0));
        self.records.select(&query).await
    }

    /// Figures over every screening matching the filters, optionally of one type.
    pub async fn stats(
        &self,
        filter: &EncounterFilter,
        screening_type: Option<ScreeningType>,
    ) -> CoreResult<ScreeningStats> {
        let query = Query {
            filters: filter.filters(),
            ..Query::new()
        }
        .filter_opt(screening_type.map(|t| Filter::eq(SCREENING_TYPE_COLUMN, t)));
        let screenings = self.records.select(&query).await?;
        Ok(ScreeningStats::from_screenings(&screenings))
    }

    /// Adherence of every matching screening to its recommended interval, measured today.
    pub async fn adherence_report(
        &self,
        filter: &EncounterFilter,
        screening_type: Option<ScreeningType>,
    ) -> CoreResult<ScreeningAdherenceReport> {
        self.adherence_report_on(filter, screening_type, Utc::now().date_naive())
            .await
    }

    pub(crate) async fn adherence_report_on(
        &self,
        filter: &EncounterFilter,
        screening_type: Option<ScreeningType>,
        today: NaiveDate,
    ) -> CoreResult<ScreeningAdherenceReport> {
        let query = Query {
            filters: filter.filters(),
            ..Query::new()
        }
        .filter_opt(screening_type.map(|t| Filter::eq(SCREENING_TYPE_COLUMN, t)));
        let screenings = self.records.select(&query).await?;
        Ok(ScreeningAdherenceReport::from_screenings(
            screening_type,
            &screenings,
            today,
        ))
    }
}
