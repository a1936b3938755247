//! Single-table CRUD shared by every plain record type.
//!
//! [`RecordService`] serves patients, doctors, collective interventions, settings, family
//! units, integral care plans and the occupation catalogue. Writes run
//! [`TableRecord::normalize`] and [`TableRecord::validate`] first, and records that declare a
//! [`TableRecord::unique_key`] are checked for duplicates before they reach the store.
//!
//! `replace` is a full replacement: optional fields missing from the body are cleared.

use super::Page;
use crate::config::CoreConfig;
use crate::constants::CREATED_AT_COLUMN;
use crate::models::{from_row, to_insert_row, to_replace_row, TableRecord};
use crate::store::{Filter, Query, RecordStore, StoreError};
use crate::{CoreError, CoreResult};
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use uuid::Uuid;

pub struct RecordService<T> {
    store: Arc<dyn RecordStore>,
    cfg: Arc<CoreConfig>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for RecordService<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            cfg: self.cfg.clone(),
            _record: PhantomData,
        }
    }
}

fn display_value(value: &Value) -> String {
    value
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| value.to_string())
}

impl<T: TableRecord> RecordService<T> {
    pub fn new(store: Arc<dyn RecordStore>, cfg: Arc<CoreConfig>) -> Self {
        Self {
            store,
            cfg,
            _record: PhantomData,
        }
    }

    /// Create a record and return it as stored.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `CoreError::InvalidInput` if validation fails
    /// - `CoreError::Conflict` if the record's unique column is already taken
    /// - `CoreError::Store` if the insert fails
    pub async fn create(&self, mut record: T) -> CoreResult<T> {
        record.normalize();
        record.validate()?;
        self.ensure_unique(&record, None).await?;

        let row = to_insert_row(&record)?;
        let stored = self
            .store
            .insert(T::TABLE, row)
            .await
            .map_err(|e| self.unique_violation(&record, e))?;
        let created: T = from_row(stored)?;

        tracing::info!(table = %T::TABLE, id = ?created.id(), "{} created", T::LABEL);
        Ok(created)
    }

    /// Fetch one record by id.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if no record has this id.
    pub async fn get(&self, id: Uuid) -> CoreResult<T> {
        self.find_one(Filter::id(id))
            .await?
            .ok_or_else(|| CoreError::not_found(T::LABEL, id))
    }

    /// First record matching `filter`, if any.
    pub async fn find_one(&self, filter: Filter) -> CoreResult<Option<T>> {
        let query = Query::new().filter(filter).limit(1);
        match self.store.select(T::TABLE, &query).await?.into_iter().next() {
            Some(row) => Ok(Some(from_row(row)?)),
            None => Ok(None),
        }
    }

    /// Fetch a record by a unique column such as a code.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` naming the looked-up value when nothing matches.
    pub async fn get_by(&self, column: &'static str, value: &str) -> CoreResult<T> {
        self.find_one(Filter::eq(column, value))
            .await?
            .ok_or_else(|| CoreError::not_found(T::LABEL, value))
    }

    /// One page of records matching `filters`, newest first.
    pub async fn list(&self, filters: Vec<Filter>, page: Page) -> CoreResult<Vec<T>> {
        let query = Query {
            filters,
            ..Query::new()
        }
        .order_by(CREATED_AT_COLUMN, true);
        self.list_query(query, page).await
    }

    /// One page of records for a caller-built query. The query's own paging is replaced.
    pub async fn list_query(&self, query: Query, page: Page) -> CoreResult<Vec<T>> {
        let query = query
            .limit(self.cfg.page_size(page.limit))
            .offset(page.offset.unwrap_or(0));
        self.select(&query).await
    }

    /// Every record matching `query`, unpaged. Used for reports.
    pub async fn select(&self, query: &Query) -> CoreResult<Vec<T>> {
        self.store
            .select(T::TABLE, query)
            .await?
            .into_iter()
            .map(from_row)
            .collect()
    }

    /// Replace every client-writable column of an existing record.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `CoreError::InvalidInput` if validation fails
    /// - `CoreError::Conflict` if the new unique value belongs to another record
    /// - `CoreError::NotFound` if no record has this id
    pub async fn replace(&self, id: Uuid, mut record: T) -> CoreResult<T> {
        record.normalize();
        record.validate()?;
        self.ensure_unique(&record, Some(id)).await?;

        let row = to_replace_row(&record)?;
        let updated = self
            .store
            .update(T::TABLE, &[Filter::id(id)], row)
            .await
            .map_err(|e| self.unique_violation(&record, e))?;
        let row = updated
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::not_found(T::LABEL, id))?;

        tracing::info!(table = %T::TABLE, %id, "{} replaced", T::LABEL);
        from_row(row)
    }

    /// Delete a record by id.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if no record has this id.
    pub async fn delete(&self, id: Uuid) -> CoreResult<()> {
        let deleted = self.store.delete(T::TABLE, &[Filter::id(id)]).await?;
        if deleted.is_empty() {
            return Err(CoreError::not_found(T::LABEL, id));
        }
        tracing::info!(table = %T::TABLE, %id, "{} deleted", T::LABEL);
        Ok(())
    }

    async fn ensure_unique(&self, record: &T, exclude: Option<Uuid>) -> CoreResult<()> {
        let Some((field, value)) = record.unique_key() else {
            return Ok(());
        };
        let query = Query::new().filter(Filter::Eq(field, value.clone())).limit(2);
        let holders: Vec<T> = self.select(&query).await?;
        if holders.iter().any(|h| h.id().is_none() || h.id() != exclude) {
            return Err(CoreError::Conflict {
                entity: T::LABEL,
                field,
                value: display_value(&value),
            });
        }
        Ok(())
    }

    /// A concurrent insert can still race past `ensure_unique`; the database constraint
    /// catches it.
    fn unique_violation(&self, record: &T, err: StoreError) -> CoreError {
        match (err, record.unique_key()) {
            (StoreError::UniqueViolation { .. }, Some((field, value))) => CoreError::Conflict {
                entity: T::LABEL,
                field,
                value: display_value(&value),
            },
            (err, _) => CoreError::Store(err),
        }
    }
}
