//! Chronic-disease control visits.
//!
//! A control is written across three levels in one linked write:
//!
//! ```text
//! encounters ──detail_id──▶ chronic_disease_controls ──condition_detail_id──▶ <condition>_details
//!                                      ▲                                          │
//!                                      └──────────────── control_id ──────────────┘
//! ```
//!
//! The condition detail block is optional; a control without one stops after the second
//! level. Reads assemble the control together with the detail row for its condition.

use super::encounters::{
    close_encounter, discard_encounter, ensure_patient, open_encounter, sync_encounter,
};
use super::Page;
use crate::config::CoreConfig;
use crate::linked_write::LinkedWrite;
use crate::models::chronic::{
    AdherenceReport, ChronicCondition, ChronicControl, ChronicControlRecord, ChronicStats,
    ControlStatus,
};
use crate::models::{
    from_row, patch, row_id, to_insert_row, to_replace_row, EncounterKind, TableRecord,
};
use crate::store::{Filter, Query, RecordStore, Row, Table};
use crate::{CoreError, CoreResult};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use utoipa::IntoParams;
use uuid::Uuid;

const CONTROL_ID_COLUMN: &str = "control_id";
const CONDITION_DETAIL_ID_COLUMN: &str = "condition_detail_id";

/// Filters for control listings and reports.
#[derive(Clone, Copy, Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ChronicFilter {
    #[serde(default)]
    pub patient_id: Option<Uuid>,
    #[serde(default)]
    pub condition: Option<ChronicCondition>,
    #[serde(default)]
    pub control_status: Option<ControlStatus>,
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
}

impl ChronicFilter {
    fn query(&self) -> Query {
        Query::new()
            .filter_opt(self.patient_id.map(|id| Filter::eq("patient_id", id)))
            .filter_opt(self.condition.map(|c| Filter::eq("condition", c)))
            .filter_opt(self.control_status.map(|s| Filter::eq("control_status", s)))
            .filter_opt(self.date_from.map(|d| Filter::gte("encounter_date", d)))
            .filter_opt(self.date_to.map(|d| Filter::lte("encounter_date", d)))
    }
}

/// Row for the detail block matching the control's condition, tagged with `control_id`.
///
/// `replacing` keeps null columns so an update clears them.
fn detail_row(
    record: &ChronicControlRecord,
    control_id: Uuid,
    replacing: bool,
) -> CoreResult<Option<Row>> {
    fn tagged<T: TableRecord>(detail: &T, control_id: Uuid, replacing: bool) -> CoreResult<Row> {
        let mut row = if replacing {
            to_replace_row(detail)?
        } else {
            to_insert_row(detail)?
        };
        row.insert(CONTROL_ID_COLUMN.into(), json!(control_id));
        Ok(row)
    }

    let row = match record.control.condition {
        ChronicCondition::Hypertension => record
            .hypertension
            .as_ref()
            .map(|d| tagged(d, control_id, replacing)),
        ChronicCondition::Diabetes => record
            .diabetes
            .as_ref()
            .map(|d| tagged(d, control_id, replacing)),
        ChronicCondition::KidneyDisease => record
            .kidney_disease
            .as_ref()
            .map(|d| tagged(d, control_id, replacing)),
        ChronicCondition::Dyslipidemia => record
            .dyslipidemia
            .as_ref()
            .map(|d| tagged(d, control_id, replacing)),
    };
    row.transpose()
}

/// Place a stored detail row into the block for the control's condition.
fn put_detail(record: &mut ChronicControlRecord, row: Row) -> CoreResult<()> {
    match record.control.condition {
        ChronicCondition::Hypertension => record.hypertension = Some(from_row(row)?),
        ChronicCondition::Diabetes => record.diabetes = Some(from_row(row)?),
        ChronicCondition::KidneyDisease => record.kidney_disease = Some(from_row(row)?),
        ChronicCondition::Dyslipidemia => record.dyslipidemia = Some(from_row(row)?),
    }
    Ok(())
}

#[derive(Clone)]
pub struct ChronicService {
    store: Arc<dyn RecordStore>,
    cfg: Arc<CoreConfig>,
}

impl ChronicService {
    pub fn new(store: Arc<dyn RecordStore>, cfg: Arc<CoreConfig>) -> Self {
        Self { store, cfg }
    }

    /// Create the encounter, the control and its condition detail in one linked write.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `CoreError::InvalidInput` if validation fails or the detail block does not match
    ///   the condition
    /// - `CoreError::UnknownPatient` if `patient_id` does not exist
    /// - the failing step's error after compensation, or `CoreError::CompensationFailed`
    pub async fn create(&self, mut record: ChronicControlRecord) -> CoreResult<ChronicControlRecord> {
        record.control.normalize();
        record.validate()?;
        ensure_patient(self.store.as_ref(), record.control.link.patient_id).await?;

        let mut write = LinkedWrite::begin(self.store.clone(), ChronicControl::LABEL);
        let result = Self::write_linked(&mut write, record).await;
        let created = write.finish(result).await?;

        tracing::info!(
            id = ?created.control.id(),
            condition = ?created.control.condition,
            detail_id = ?created.control.condition_detail_id,
            "Chronic-disease control created"
        );
        Ok(created)
    }

    async fn write_linked(
        write: &mut LinkedWrite,
        mut record: ChronicControlRecord,
    ) -> CoreResult<ChronicControlRecord> {
        let encounter_id = open_encounter(
            write,
            EncounterKind::ChronicDiseaseControl,
            &record.control.link,
        )
        .await?;
        record.control.link.encounter_id = Some(encounter_id);
        record.control.condition_detail_id = None;

        let stored = write
            .insert(Table::ChronicDiseaseControls, to_insert_row(&record.control)?)
            .await?;
        let control_id = row_id(&stored)?;
        let mut control: ChronicControl = from_row(stored)?;

        if let Some(row) = detail_row(&record, control_id, false)? {
            let detail = write
                .insert(record.control.condition.detail_table(), row)
                .await?;
            let detail_id = row_id(&detail)?;
            let linked = write
                .link(
                    Table::ChronicDiseaseControls,
                    control_id,
                    patch([(CONDITION_DETAIL_ID_COLUMN, json!(detail_id))]),
                )
                .await?;
            control = from_row(linked)?;
            put_detail(&mut record, detail)?;
        }

        close_encounter(write, encounter_id, control_id).await?;
        record.control = control;
        Ok(record)
    }

    async fn assemble(&self, control: ChronicControl) -> CoreResult<ChronicControlRecord> {
        let mut record = ChronicControlRecord::new(control);
        let Some(control_id) = record.control.id() else {
            return Ok(record);
        };
        let query = Query::new()
            .filter(Filter::eq(CONTROL_ID_COLUMN, control_id))
            .limit(1);
        let table = record.control.condition.detail_table();
        if let Some(row) = self.store.select(table, &query).await?.into_iter().next() {
            put_detail(&mut record, row)?;
        }
        Ok(record)
    }

    async fn control(&self, id: Uuid) -> CoreResult<ChronicControl> {
        let query = Query::new().filter(Filter::id(id)).limit(1);
        let row = self
            .store
            .select(Table::ChronicDiseaseControls, &query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::not_found(ChronicControl::LABEL, id))?;
        from_row(row)
    }

    async fn controls(&self, query: &Query) -> CoreResult<Vec<ChronicControl>> {
        self.store
            .select(Table::ChronicDiseaseControls, query)
            .await?
            .into_iter()
            .map(from_row)
            .collect()
    }

    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if no control has this id.
    pub async fn get(&self, id: Uuid) -> CoreResult<ChronicControlRecord> {
        let control = self.control(id).await?;
        self.assemble(control).await
    }

    /// One page of controls with their details, most recent first.
    pub async fn list(&self, filter: &ChronicFilter) -> CoreResult<Vec<ChronicControlRecord>> {
        let page = Page::new(filter.limit, filter.offset);
        let query = filter
            .query()
            .order_by("encounter_date", true)
            .limit(self.cfg.page_size(page.limit))
            .offset(page.offset.unwrap_or(0));
        let mut records = Vec::new();
        for control in self.controls(&query).await? {
            records.push(self.assemble(control).await?);
        }
        Ok(records)
    }

    pub async fn by_condition(
        &self,
        condition: ChronicCondition,
        page: Page,
    ) -> CoreResult<Vec<ChronicControlRecord>> {
        let filter = ChronicFilter {
            condition: Some(condition),
            limit: page.limit,
            offset: page.offset,
            ..ChronicFilter::default()
        };
        self.list(&filter).await
    }

    /// Every control for a patient, oldest first.
    pub async fn history(&self, patient_id: Uuid) -> CoreResult<Vec<ChronicControlRecord>> {
        let query = Query::new()
            .filter(Filter::eq("patient_id", patient_id))
            .order_by("encounter_date", false);
        let mut records = Vec::new();
        for control in self.controls(&query).await? {
            records.push(self.assemble(control).await?);
        }
        Ok(records)
    }

    /// Replace a control and, when supplied, its detail block. The condition cannot change.
    ///
    /// A body without a detail block leaves the stored detail untouched.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `CoreError::NotFound` if no control has this id
    /// - `CoreError::InvalidInput` if validation fails or the condition differs
    /// - `CoreError::UnknownPatient` if the new `patient_id` does not exist
    pub async fn replace(
        &self,
        id: Uuid,
        mut record: ChronicControlRecord,
    ) -> CoreResult<ChronicControlRecord> {
        let existing = self.control(id).await?;
        if record.control.condition != existing.condition {
            return Err(CoreError::InvalidInput(format!(
                "condition cannot change from {:?} to {:?}",
                existing.condition, record.control.condition
            )));
        }
        record.control.normalize();
        record.validate()?;
        if record.control.link.patient_id != existing.link.patient_id {
            ensure_patient(self.store.as_ref(), record.control.link.patient_id).await?;
        }
        record.control.link.encounter_id = existing.link.encounter_id;
        record.control.condition_detail_id = existing.condition_detail_id;

        let detail_table = existing.condition.detail_table();
        let mut detail_updated = false;
        if let Some(detail_id) = existing.condition_detail_id {
            if let Some(row) = detail_row(&record, id, true)? {
                detail_updated = !self
                    .store
                    .update(detail_table, &[Filter::id(detail_id)], row)
                    .await?
                    .is_empty();
                if !detail_updated {
                    tracing::warn!(%id, %detail_id, "Condition detail missing; inserting a new one");
                }
            }
        }
        if !detail_updated {
            if let Some(row) = detail_row(&record, id, false)? {
                let stored = self.store.insert(detail_table, row).await?;
                record.control.condition_detail_id = Some(row_id(&stored)?);
            }
        }

        let row = to_replace_row(&record.control)?;
        let updated = self
            .store
            .update(Table::ChronicDiseaseControls, &[Filter::id(id)], row)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::not_found(ChronicControl::LABEL, id))?;
        let control: ChronicControl = from_row(updated)?;

        if let Some(encounter_id) = control.link.encounter_id {
            sync_encounter(
                self.store.as_ref(),
                encounter_id,
                EncounterKind::ChronicDiseaseControl,
                &control.link,
            )
            .await?;
        }
        tracing::info!(%id, "Chronic-disease control replaced");
        self.assemble(control).await
    }

    /// Delete the condition details, the control, then the generic encounter.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if no control has this id.
    pub async fn delete(&self, id: Uuid) -> CoreResult<()> {
        let control = self.control(id).await?;
        self.store
            .delete(
                control.condition.detail_table(),
                &[Filter::eq(CONTROL_ID_COLUMN, id)],
            )
            .await?;
        let deleted = self
            .store
            .delete(Table::ChronicDiseaseControls, &[Filter::id(id)])
            .await?;
        if deleted.is_empty() {
            return Err(CoreError::not_found(ChronicControl::LABEL, id));
        }
        if let Some(encounter_id) = control.link.encounter_id {
            discard_encounter(self.store.as_ref(), encounter_id).await;
        }
        tracing::info!(%id, "Chronic-disease control deleted");
        Ok(())
    }

    pub async fn stats(&self, filter: &ChronicFilter) -> CoreResult<ChronicStats> {
        let controls = self.controls(&filter.query()).await?;
        Ok(ChronicStats::from_controls(&controls))
    }

    pub async fn adherence_report(&self, filter: &ChronicFilter) -> CoreResult<AdherenceReport> {
        let controls = self.controls(&filter.query()).await?;
        Ok(AdherenceReport::from_controls(&controls))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::{Fault, FaultyStore};
    use crate::store::MemoryStore;
    use serde_json::Value;

    async fn seed_patient(store: &dyn RecordStore) -> Uuid {
        let Value::Object(row) = json!({
            "document_type": "CC",
            "document_number": "79111222",
            "first_name": "Jorge",
            "first_surname": "Díaz",
            "birth_date": "1958-09-30",
            "sex": "MALE"
        }) else {
            panic!("expected object")
        };
        let stored = store
            .insert(Table::Patients, row)
            .await
            .expect("insert should succeed");
        row_id(&stored).expect("row_id should succeed")
    }

    fn hypertension(patient_id: Uuid, status: &str) -> ChronicControlRecord {
        serde_json::from_value(json!({
            "patient_id": patient_id,
            "encounter_date": "2024-06-01",
            "condition": "HYPERTENSION",
            "control_status": status,
            "adherence": "REGULAR",
            "weight_kg": 82.0,
            "height_cm": 170.0,
            "systolic_bp": 150,
            "diastolic_bp": 95,
            "hypertension": {
                "stage": 1,
                "antihypertensive_count": 2,
                "home_monitoring": true
            }
        }))
        .expect("deserialize should succeed")
    }

    fn service(store: Arc<dyn RecordStore>) -> ChronicService {
        ChronicService::new(store, Arc::new(CoreConfig::in_memory()))
    }

    async fn count(store: &dyn RecordStore, table: Table) -> u64 {
        store.count(table, &[]).await.expect("count should succeed")
    }

    #[tokio::test]
    async fn test_create_writes_three_linked_levels() {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
        let patient_id = seed_patient(store.as_ref()).await;
        let svc = service(store.clone());

        let created = svc
            .create(hypertension(patient_id, "NOT_CONTROLLED"))
            .await
            .expect("create should succeed");
        let control_id = created.control.id().expect("control should have an id");
        let detail = created
            .hypertension
            .as_ref()
            .expect("detail should be returned");
        assert_eq!(detail.control_id, Some(control_id));
        assert_eq!(created.control.condition_detail_id, detail.meta.id);
        assert_eq!(created.control.bmi, Some(28.37));

        let encounters = store
            .select(Table::Encounters, &Query::new())
            .await
            .expect("select should succeed");
        assert_eq!(encounters.len(), 1);
        assert_eq!(encounters[0]["detail_id"], json!(control_id));
        assert_eq!(encounters[0]["kind"], json!("CHRONIC_DISEASE_CONTROL"));

        let fetched = svc.get(control_id).await.expect("get should succeed");
        assert_eq!(
            fetched.hypertension.and_then(|h| h.antihypertensive_count),
            Some(2)
        );
    }

    #[tokio::test]
    async fn test_control_without_detail_stops_at_second_level() {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
        let patient_id = seed_patient(store.as_ref()).await;
        let mut record = hypertension(patient_id, "CONTROLLED");
        record.hypertension = None;

        let created = service(store.clone())
            .create(record)
            .await
            .expect("create should succeed");
        assert_eq!(created.control.condition_detail_id, None);
        assert_eq!(count(store.as_ref(), Table::HypertensionDetails).await, 0);
    }

    #[tokio::test]
    async fn test_mismatched_detail_is_rejected_before_writing() {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
        let patient_id = seed_patient(store.as_ref()).await;
        let mut record = hypertension(patient_id, "CONTROLLED");
        record.control.condition = ChronicCondition::Diabetes;

        let err = service(store.clone())
            .create(record)
            .await
            .expect_err("create should fail");
        assert!(matches!(err, CoreError::InvalidInput(_)));
        assert_eq!(count(store.as_ref(), Table::Encounters).await, 0);
    }

    #[tokio::test]
    async fn test_failed_detail_insert_removes_control_and_encounter() {
        let faulty = Arc::new(FaultyStore::new());
        let patient_id = seed_patient(&faulty.inner).await;
        faulty.fail(Fault::Insert(Table::HypertensionDetails));

        assert!(service(faulty.clone())
            .create(hypertension(patient_id, "CONTROLLED"))
            .await
            .is_err());
        assert_eq!(count(&faulty.inner, Table::Encounters).await, 0);
        assert_eq!(count(&faulty.inner, Table::ChronicDiseaseControls).await, 0);
    }

    #[tokio::test]
    async fn test_failed_control_backfill_removes_all_three_rows() {
        let faulty = Arc::new(FaultyStore::new());
        let patient_id = seed_patient(&faulty.inner).await;
        faulty.fail(Fault::Update(Table::ChronicDiseaseControls));

        assert!(service(faulty.clone())
            .create(hypertension(patient_id, "CONTROLLED"))
            .await
            .is_err());
        assert_eq!(count(&faulty.inner, Table::Encounters).await, 0);
        assert_eq!(count(&faulty.inner, Table::ChronicDiseaseControls).await, 0);
        assert_eq!(count(&faulty.inner, Table::HypertensionDetails).await, 0);
    }

    #[tokio::test]
    async fn test_replace_updates_detail_and_rejects_condition_change() {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
        let patient_id = seed_patient(store.as_ref()).await;
        let svc = service(store.clone());
        let created = svc
            .create(hypertension(patient_id, "NOT_CONTROLLED"))
            .await
            .expect("create should succeed");
        let id = created.control.id().expect("control should have an id");

        let mut body = hypertension(patient_id, "CONTROLLED");
        if let Some(h) = body.hypertension.as_mut() {
            h.antihypertensive_count = Some(3);
        }
        let replaced = svc.replace(id, body).await.expect("replace should succeed");
        assert_eq!(replaced.control.control_status, ControlStatus::Controlled);
        assert_eq!(
            replaced.hypertension.and_then(|h| h.antihypertensive_count),
            Some(3)
        );
        assert_eq!(count(store.as_ref(), Table::HypertensionDetails).await, 1);

        let mut body = hypertension(patient_id, "CONTROLLED");
        body.control.condition = ChronicCondition::Dyslipidemia;
        body.hypertension = None;
        assert!(matches!(
            svc.replace(id, body).await,
            Err(CoreError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_replace_reinserts_detail_when_stored_one_is_gone() {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
        let patient_id = seed_patient(store.as_ref()).await;
        let svc = service(store.clone());
        let created = svc
            .create(hypertension(patient_id, "NOT_CONTROLLED"))
            .await
            .expect("create should succeed");
        let id = created.control.id().expect("control should have an id");
        let stale_id = created
            .control
            .condition_detail_id
            .expect("detail id should be set");
        store
            .delete(Table::HypertensionDetails, &[Filter::id(stale_id)])
            .await
            .expect("delete should succeed");

        let mut body = hypertension(patient_id, "CONTROLLED");
        if let Some(h) = body.hypertension.as_mut() {
            h.antihypertensive_count = Some(3);
        }
        let replaced = svc.replace(id, body).await.expect("replace should succeed");
        let detail_id = replaced
            .control
            .condition_detail_id
            .expect("detail id should be re-pointed");
        assert_ne!(detail_id, stale_id);
        assert_eq!(count(store.as_ref(), Table::HypertensionDetails).await, 1);

        let fetched = svc.get(id).await.expect("get should succeed");
        assert_eq!(
            fetched.hypertension.and_then(|h| h.antihypertensive_count),
            Some(3)
        );
    }

    #[tokio::test]
    async fn test_delete_removes_every_level() {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
        let patient_id = seed_patient(store.as_ref()).await;
        let svc = service(store.clone());
        let created = svc
            .create(hypertension(patient_id, "CONTROLLED"))
            .await
            .expect("create should succeed");
        let id = created.control.id().expect("control should have an id");

        svc.delete(id).await.expect("delete should succeed");
        assert_eq!(count(store.as_ref(), Table::Encounters).await, 0);
        assert_eq!(count(store.as_ref(), Table::ChronicDiseaseControls).await, 0);
        assert_eq!(count(store.as_ref(), Table::HypertensionDetails).await, 0);
        assert!(matches!(svc.get(id).await, Err(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_stats_and_adherence_filtered_by_condition() {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
        let patient_id = seed_patient(store.as_ref()).await;
        let svc = service(store.clone());
        svc.create(hypertension(patient_id, "CONTROLLED"))
            .await
            .expect("create should succeed");
        svc.create(hypertension(patient_id, "NOT_CONTROLLED"))
            .await
            .expect("create should succeed");

        let stats = svc
            .stats(&ChronicFilter::default())
            .await
            .expect("stats should succeed");
        assert_eq!(stats.total, 2);
        assert_eq!(stats.hypertension, 2);
        assert_eq!(stats.controlled_pct, 50.0);

        let filter = ChronicFilter {
            condition: Some(ChronicCondition::Diabetes),
            ..ChronicFilter::default()
        };
        let report = svc
            .adherence_report(&filter)
            .await
            .expect("report should succeed");
        assert_eq!(report.total, 0);

        let listed = svc
            .by_condition(ChronicCondition::Hypertension, Page::default())
            .await
            .expect("list should succeed");
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|r| r.hypertension.is_some()));
    }
}
