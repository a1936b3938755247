//! Typed encounter details and the generic encounter they extend.
//!
//! Every typed encounter (maternal-perinatal, early childhood, childhood, adolescence/youth,
//! adulthood, old age, cancer screening) is written the same way:
//!
//! 1. insert a generic `encounters` row for the detail's kind with an empty `detail_id`
//! 2. insert the detail row carrying the new `encounter_id`
//! 3. point `encounters.detail_id` at the detail
//!
//! The steps run inside a [`LinkedWrite`], so a failure at any step deletes the rows already
//! inserted. Chronic-disease controls add a third level and live in
//! [`chronic`](super::chronic).

use super::Page;
use crate::config::CoreConfig;
use crate::linked_write::LinkedWrite;
use crate::models::encounter::Encounter;
use crate::models::{
    from_row, patch, row_id, to_insert_row, to_replace_row, EncounterDetail, EncounterKind,
    EncounterLink, TableRecord,
};
use crate::store::{Filter, Query, RecordStore, Table};
use crate::{CoreError, CoreResult};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use std::marker::PhantomData;
use std::sync::Arc;
use utoipa::IntoParams;
use uuid::Uuid;

const ENCOUNTER_DATE_COLUMN: &str = "encounter_date";
const PATIENT_ID_COLUMN: &str = "patient_id";
const DETAIL_ID_COLUMN: &str = "detail_id";
const KIND_COLUMN: &str = "kind";

/// Filters accepted by encounter-detail listings.
#[derive(Clone, Copy, Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EncounterFilter {
    #[serde(default)]
    pub patient_id: Option<Uuid>,
    /// Inclusive lower bound on `encounter_date`.
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound on `encounter_date`.
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
}

impl EncounterFilter {
    pub fn for_patient(patient_id: Uuid) -> Self {
        Self {
            patient_id: Some(patient_id),
            ..Self::default()
        }
    }

    pub fn page(&self) -> Page {
        Page::new(self.limit, self.offset)
    }

    pub(crate) fn filters(&self) -> Vec<Filter> {
        [
            self.patient_id.map(|id| Filter::eq(PATIENT_ID_COLUMN, id)),
            self.date_from.map(|d| Filter::gte(ENCOUNTER_DATE_COLUMN, d)),
            self.date_to.map(|d| Filter::lte(ENCOUNTER_DATE_COLUMN, d)),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// Fail with `UnknownPatient` unless the patient row exists.
pub(crate) async fn ensure_patient(store: &dyn RecordStore, patient_id: Uuid) -> CoreResult<()> {
    if store
        .count(Table::Patients, &[Filter::id(patient_id)])
        .await?
        == 0
    {
        return Err(CoreError::UnknownPatient(patient_id));
    }
    Ok(())
}

/// Insert the generic encounter that opens a linked write and return its id.
pub(crate) async fn open_encounter(
    write: &mut LinkedWrite,
    kind: EncounterKind,
    link: &EncounterLink,
) -> CoreResult<Uuid> {
    let row = to_insert_row(&Encounter::opening(kind, link))?;
    let stored = write.insert(Table::Encounters, row).await?;
    row_id(&stored)
}

/// Point the generic encounter at its detail row.
pub(crate) async fn close_encounter(
    write: &mut LinkedWrite,
    encounter_id: Uuid,
    detail_id: Uuid,
) -> CoreResult<()> {
    write
        .link(
            Table::Encounters,
            encounter_id,
            patch([(DETAIL_ID_COLUMN, json!(detail_id))]),
        )
        .await?;
    Ok(())
}

/// Copy a detail's kind and link columns onto its generic encounter.
pub(crate) async fn sync_encounter(
    store: &dyn RecordStore,
    encounter_id: Uuid,
    kind: EncounterKind,
    link: &EncounterLink,
) -> CoreResult<()> {
    let row = patch([
        (KIND_COLUMN, json!(kind)),
        (PATIENT_ID_COLUMN, json!(link.patient_id)),
        ("doctor_id", json!(link.doctor_id)),
        (ENCOUNTER_DATE_COLUMN, json!(link.encounter_date)),
        ("setting", json!(link.setting)),
    ]);
    store
        .update(Table::Encounters, &[Filter::id(encounter_id)], row)
        .await?;
    Ok(())
}

/// Delete a generic encounter after its detail is gone. Failure is logged, not returned.
pub(crate) async fn discard_encounter(store: &dyn RecordStore, encounter_id: Uuid) {
    if let Err(e) = store
        .delete(Table::Encounters, &[Filter::id(encounter_id)])
        .await
    {
        tracing::warn!(%encounter_id, error = %e, "Failed to delete generic encounter");
    }
}

// ============================================================================
// TYPED DETAILS
// ============================================================================

/// Service for one encounter-detail type `D`.
pub struct EncounterService<D> {
    store: Arc<dyn RecordStore>,
    cfg: Arc<CoreConfig>,
    _detail: PhantomData<fn() -> D>,
}

impl<D> Clone for EncounterService<D> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            cfg: self.cfg.clone(),
            _detail: PhantomData,
        }
    }
}

impl<D: EncounterDetail> EncounterService<D> {
    pub fn new(store: Arc<dyn RecordStore>, cfg: Arc<CoreConfig>) -> Self {
        Self {
            store,
            cfg,
            _detail: PhantomData,
        }
    }

    /// Create the generic encounter and the detail in one linked write.
    ///
    /// Any `encounter_id` in the body is ignored; the new encounter's id is used.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `CoreError::InvalidInput` if validation fails
    /// - `CoreError::UnknownPatient` if `patient_id` does not exist
    /// - the failing step's error after successful compensation, or
    ///   `CoreError::CompensationFailed` if some inserted row could not be deleted
    pub async fn create(&self, mut detail: D) -> CoreResult<D> {
        detail.normalize();
        detail.validate()?;
        ensure_patient(self.store.as_ref(), detail.link().patient_id).await?;

        let mut write = LinkedWrite::begin(self.store.clone(), D::LABEL);
        let result = Self::write_linked(&mut write, detail).await;
        let created = write.finish(result).await?;

        tracing::info!(
            table = %D::TABLE,
            id = ?created.id(),
            encounter_id = ?created.link().encounter_id,
            "{} created",
            D::LABEL
        );
        Ok(created)
    }

    async fn write_linked(write: &mut LinkedWrite, mut detail: D) -> CoreResult<D> {
        let encounter_id = open_encounter(write, detail.kind(), detail.link()).await?;
        detail.link_mut().encounter_id = Some(encounter_id);

        let stored = write.insert(D::TABLE, to_insert_row(&detail)?).await?;
        let detail_id = row_id(&stored)?;
        close_encounter(write, encounter_id, detail_id).await?;
        from_row(stored)
    }

    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if no detail has this id.
    pub async fn get(&self, id: Uuid) -> CoreResult<D> {
        let query = Query::new().filter(Filter::id(id)).limit(1);
        let row = self
            .store
            .select(D::TABLE, &query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::not_found(D::LABEL, id))?;
        from_row(row)
    }

    /// One page of details, most recent encounter first.
    pub async fn list(&self, filter: &EncounterFilter) -> CoreResult<Vec<D>> {
        self.list_by(filter.filters(), filter.page()).await
    }

    /// One page of details matching `filters`, most recent encounter first.
    pub async fn list_by(&self, filters: Vec<Filter>, page: Page) -> CoreResult<Vec<D>> {
        let query = Query {
            filters,
            ..Query::new()
        }
        .order_by(ENCOUNTER_DATE_COLUMN, true)
        .limit(self.cfg.page_size(page.limit))
        .offset(page.offset.unwrap_or(0));
        self.select(&query).await
    }

    /// One page of the details matching `filter` that also satisfy `keep`, most recent
    /// encounter first.
    ///
    /// `keep` usually tests a computed assessment, which has no column, so it runs over every
    /// stored match and paging applies to what it keeps.
    pub async fn list_where(
        &self,
        filter: &EncounterFilter,
        keep: impl Fn(&D) -> bool,
    ) -> CoreResult<Vec<D>> {
        let page = filter.page();
        let query = Query {
            filters: filter.filters(),
            ..Query::new()
        }
        .order_by(ENCOUNTER_DATE_COLUMN, true);
        Ok(self
            .select(&query)
            .await?
            .into_iter()
            .filter(|detail| keep(detail))
            .skip(page.offset.unwrap_or(0) as usize)
            .take(self.cfg.page_size(page.limit) as usize)
            .collect())
    }

    /// Every detail matching the patient and date filters, unpaged.
    pub async fn matching(&self, filter: &EncounterFilter) -> CoreResult<Vec<D>> {
        let query = Query {
            filters: filter.filters(),
            ..Query::new()
        };
        self.select(&query).await
    }

    /// Every detail for a patient, oldest encounter first.
    pub async fn history(&self, patient_id: Uuid) -> CoreResult<Vec<D>> {
        let query = Query::new()
            .filter(Filter::eq(PATIENT_ID_COLUMN, patient_id))
            .order_by(ENCOUNTER_DATE_COLUMN, false);
        self.select(&query).await
    }

    /// Every detail matching `query`, unpaged.
    pub async fn select(&self, query: &Query) -> CoreResult<Vec<D>> {
        self.store
            .select(D::TABLE, query)
            .await?
            .into_iter()
            .map(from_row)
            .collect()
    }

    /// Replace a detail's fields. The link to its generic encounter is kept, and the
    /// encounter's kind, patient, doctor, date and setting follow the new values.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `CoreError::NotFound` if no detail has this id
    /// - `CoreError::InvalidInput` if validation fails
    /// - `CoreError::UnknownPatient` if the new `patient_id` does not exist
    pub async fn replace(&self, id: Uuid, mut detail: D) -> CoreResult<D> {
        let existing = self.get(id).await?;
        detail.normalize();
        detail.validate()?;
        if detail.link().patient_id != existing.link().patient_id {
            ensure_patient(self.store.as_ref(), detail.link().patient_id).await?;
        }
        let encounter_id = existing.link().encounter_id;
        detail.link_mut().encounter_id = encounter_id;

        let row = to_replace_row(&detail)?;
        let updated = self
            .store
            .update(D::TABLE, &[Filter::id(id)], row)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::not_found(D::LABEL, id))?;
        let replaced: D = from_row(updated)?;

        if let Some(encounter_id) = encounter_id {
            sync_encounter(
                self.store.as_ref(),
                encounter_id,
                replaced.kind(),
                replaced.link(),
            )
            .await?;
        }
        tracing::info!(table = %D::TABLE, %id, "{} replaced", D::LABEL);
        Ok(replaced)
    }

    /// Delete a detail, then its generic encounter.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if no detail has this id.
    pub async fn delete(&self, id: Uuid) -> CoreResult<()> {
        let deleted = self.store.delete(D::TABLE, &[Filter::id(id)]).await?;
        let Some(row) = deleted.into_iter().next() else {
            return Err(CoreError::not_found(D::LABEL, id));
        };
        let detail: D = from_row(row)?;
        if let Some(encounter_id) = detail.link().encounter_id {
            discard_encounter(self.store.as_ref(), encounter_id).await;
        }
        tracing::info!(table = %D::TABLE, %id, "{} deleted", D::LABEL);
        Ok(())
    }
}

// ============================================================================
// GENERIC ENCOUNTERS
// ============================================================================

/// Filters accepted by the generic encounter listing.
#[derive(Clone, Copy, Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GenericEncounterFilter {
    #[serde(default)]
    pub patient_id: Option<Uuid>,
    #[serde(default)]
    pub kind: Option<EncounterKind>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
}

/// Read API over the `encounters` table, plus creation of `GENERAL` encounters that have
/// no detail table.
#[derive(Clone)]
pub struct GenericEncounterService {
    store: Arc<dyn RecordStore>,
    cfg: Arc<CoreConfig>,
}

impl GenericEncounterService {
    pub fn new(store: Arc<dyn RecordStore>, cfg: Arc<CoreConfig>) -> Self {
        Self { store, cfg }
    }

    /// Create a standalone encounter.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidInput` for a kind that needs a detail record, or
    /// `CoreError::UnknownPatient` if the patient does not exist.
    pub async fn create(&self, mut encounter: Encounter) -> CoreResult<Encounter> {
        if encounter.kind.detail_table().is_some() {
            return Err(CoreError::InvalidInput(format!(
                "{:?} encounters are created through their detail endpoint",
                encounter.kind
            )));
        }
        if let Some(patient_id) = encounter.patient_id {
            ensure_patient(self.store.as_ref(), patient_id).await?;
        }
        encounter.detail_id = None;
        let stored = self
            .store
            .insert(Table::Encounters, to_insert_row(&encounter)?)
            .await?;
        let created: Encounter = from_row(stored)?;
        tracing::info!(id = ?created.id(), "Encounter created");
        Ok(created)
    }

    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if no encounter has this id.
    pub async fn get(&self, id: Uuid) -> CoreResult<Encounter> {
        let query = Query::new().filter(Filter::id(id)).limit(1);
        let row = self
            .store
            .select(Table::Encounters, &query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::not_found(Encounter::LABEL, id))?;
        from_row(row)
    }

    pub async fn list(&self, filter: &GenericEncounterFilter) -> CoreResult<Vec<Encounter>> {
        let query = Query::new()
            .filter_opt(filter.patient_id.map(|id| Filter::eq(PATIENT_ID_COLUMN, id)))
            .filter_opt(filter.kind.map(|k| Filter::eq(KIND_COLUMN, k)))
            .order_by(ENCOUNTER_DATE_COLUMN, true)
            .limit(self.cfg.page_size(filter.limit))
            .offset(filter.offset.unwrap_or(0));
        self.store
            .select(Table::Encounters, &query)
            .await?
            .into_iter()
            .map(from_row)
            .collect()
    }

    /// Delete an encounter that has no detail row.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if the encounter does not exist, or
    /// `CoreError::InvalidInput` while a detail row still points at it.
    pub async fn delete(&self, id: Uuid) -> CoreResult<()> {
        let encounter = self.get(id).await?;
        if let (Some(table), Some(detail_id)) = (encounter.kind.detail_table(), encounter.detail_id)
        {
            let attached = self
                .store
                .count(table, &[Filter::id(detail_id)])
                .await?;
            if attached > 0 {
                return Err(CoreError::InvalidInput(format!(
                    "encounter {id} still has a {table} record; delete that record instead"
                )));
            }
        }
        self.store
            .delete(Table::Encounters, &[Filter::id(id)])
            .await?;
        tracing::info!(%id, "Encounter deleted");
        Ok(())
    }
}
