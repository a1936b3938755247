//! Early-childhood extras: applying the EAD-3 and ASQ-3 scales to a stored record, and
//! population statistics.

use super::encounters::{EncounterFilter, EncounterService};
use crate::config::CoreConfig;
use crate::models::early_childhood::{Asq3Scores, EarlyChildhoodCare, EarlyChildhoodStats, Ead3Scores};
use crate::models::{from_row, to_replace_row, TableRecord};
use crate::store::{Filter, RecordStore};
use crate::{CoreError, CoreResult};
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct EarlyChildhoodService {
    store: Arc<dyn RecordStore>,
    records: EncounterService<EarlyChildhoodCare>,
}

impl EarlyChildhoodService {
    pub fn new(store: Arc<dyn RecordStore>, cfg: Arc<CoreConfig>) -> Self {
        Self {
            records: EncounterService::new(store.clone(), cfg),
            store,
        }
    }

    /// The plain encounter-detail operations for this type.
    pub fn records(&self) -> &EncounterService<EarlyChildhoodCare> {
        &self.records
    }

    /// Record an EAD-3 application dated today.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if the record does not exist, or
    /// `CoreError::InvalidInput` if a score is missing or out of range.
    pub async fn apply_ead3(&self, id: Uuid, scores: Ead3Scores) -> CoreResult<EarlyChildhoodCare> {
        self.apply_ead3_on(id, scores, Utc::now().date_naive()).await
    }

    pub(crate) async fn apply_ead3_on(
        &self,
        id: Uuid,
        scores: Ead3Scores,
        today: NaiveDate,
    ) -> CoreResult<EarlyChildhoodCare> {
        let mut record = self.records.get(id).await?;
        record.apply_ead3(scores, today)?;
        tracing::info!(%id, total = ?record.ead3_total, "EAD-3 applied");
        self.save(id, record).await
    }

    /// Record an ASQ-3 application dated today.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if the record does not exist.
    pub async fn apply_asq3(&self, id: Uuid, scores: Asq3Scores) -> CoreResult<EarlyChildhoodCare> {
        let mut record = self.records.get(id).await?;
        record.apply_asq3(scores, Utc::now().date_naive());
        tracing::info!(%id, "ASQ-3 applied");
        self.save(id, record).await
    }

    async fn save(&self, id: Uuid, record: EarlyChildhoodCare) -> CoreResult<EarlyChildhoodCare> {
        record.validate()?;
        let row = to_replace_row(&record)?;
        let updated = self
            .store
            .update(EarlyChildhoodCare::TABLE, &[Filter::id(id)], row)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::not_found(EarlyChildhoodCare::LABEL, id))?;
        from_row(updated)
    }

    /// Figures over every record matching the patient and date filters. Paging is ignored.
    pub async fn stats(&self, filter: &EncounterFilter) -> CoreResult<EarlyChildhoodStats> {
        let records = self.records.matching(filter).await?;
        Ok(EarlyChildhoodStats::from_records(&records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::row_id;
    use crate::store::{MemoryStore, Table};
    use serde_json::{json, Value};

    async fn setup() -> (EarlyChildhoodService, Uuid) {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
        let Value::Object(row) = json!({
            "document_type": "RC",
            "document_number": "1100223344",
            "first_name": "Sofía",
            "first_surname": "López",
            "birth_date": "2022-08-14",
            "sex": "FEMALE"
        }) else {
            panic!("expected object")
        };
        let stored = store
            .insert(Table::Patients, row)
            .await
            .expect("insert should succeed");
        let patient_id = row_id(&stored).expect("row_id should succeed");
        (
            EarlyChildhoodService::new(store, Arc::new(CoreConfig::in_memory())),
            patient_id,
        )
    }

    fn visit(patient_id: Uuid) -> EarlyChildhoodCare {
        serde_json::from_value(json!({
            "patient_id": patient_id,
            "encounter_date": "2024-02-14",
            "age_months": 18,
            "weight_kg": 10.8,
            "height_cm": 80.5,
            "bcg": true,
            "hepatitis_b_newborn": true,
            "pentavalent_doses": 3
        }))
        .expect("deserialize should succeed")
    }

    #[tokio::test]
    async fn test_apply_ead3_persists_scores_and_total() {
        let (svc, patient_id) = setup().await;
        let created = svc
            .records()
            .create(visit(patient_id))
            .await
            .expect("create should succeed");
        let id = created.id().expect("record should have an id");
        let today = NaiveDate::from_ymd_opt(2024, 2, 20).expect("valid date");

        let scores: Ead3Scores = serde_json::from_value(json!({
            "gross_motor": 60, "fine_motor": 55, "hearing_language": 50, "personal_social": 58
        }))
        .expect("deserialize should succeed");
        let updated = svc
            .apply_ead3_on(id, scores, today)
            .await
            .expect("apply_ead3 should succeed");
        assert!(updated.ead3_applied);
        assert_eq!(updated.ead3_total, Some(223));
        assert_eq!(updated.ead3_applied_on, Some(today));

        let fetched = svc.records().get(id).await.expect("get should succeed");
        assert_eq!(fetched.ead3_total, Some(223));
        assert_eq!(fetched.link.encounter_id, created.link.encounter_id);
    }

    #[tokio::test]
    async fn test_apply_ead3_rejects_missing_area_and_unknown_record() {
        let (svc, patient_id) = setup().await;
        let created = svc
            .records()
            .create(visit(patient_id))
            .await
            .expect("create should succeed");
        let id = created.id().expect("record should have an id");

        let partial: Ead3Scores = serde_json::from_value(json!({
            "gross_motor": 60, "fine_motor": 55, "hearing_language": null, "personal_social": 58
        }))
        .expect("deserialize should succeed");
        assert!(matches!(
            svc.apply_ead3(id, partial).await,
            Err(CoreError::InvalidInput(_))
        ));
        assert!(matches!(
            svc.apply_asq3(Uuid::new_v4(), serde_json::from_value(json!({})).expect("empty scores"))
                .await,
            Err(CoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_stats_over_stored_records() {
        let (svc, patient_id) = setup().await;
        let first = svc
            .records()
            .create(visit(patient_id))
            .await
            .expect("create should succeed");
        let mut second = visit(patient_id);
        second.pentavalent_doses = Some(1);
        svc.records()
            .create(second)
            .await
            .expect("create should succeed");

        let id = first.id().expect("record should have an id");
        svc.apply_asq3(id, serde_json::from_value(json!({"communication": 50})).expect("scores"))
            .await
            .expect("apply_asq3 should succeed");

        let stats = svc
            .stats(&EncounterFilter::for_patient(patient_id))
            .await
            .expect("stats should succeed");
        assert_eq!(stats.total, 2);
        assert_eq!(stats.asq3_applied_pct, 50.0);
        assert_eq!(stats.ead3_applied_pct, 0.0);
    }
}
