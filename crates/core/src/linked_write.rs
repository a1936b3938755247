//! Multi-row writes with best-effort compensation.
//!
//! Creating a typed encounter touches several tables: the generic encounter, the detail row,
//! sometimes a third-level row, and back-references between them. The store offers no
//! transaction across these calls, so [`LinkedWrite`] remembers every row it inserted and, if
//! a later step fails, deletes them again in reverse order.
//!
//! Compensation is attempted once per row. When every delete succeeds the caller sees the
//! original error; otherwise [`CoreError::CompensationFailed`] carries the original error and
//! every cleanup error, and the orphaned rows stay behind.

use crate::models::row_id;
use crate::store::{Filter, RecordStore, Row, StoreError, Table};
use crate::{CoreError, CoreResult};
use std::sync::Arc;
use uuid::Uuid;

pub struct LinkedWrite {
    store: Arc<dyn RecordStore>,
    label: &'static str,
    step: String,
    inserted: Vec<(Table, Uuid)>,
}

impl LinkedWrite {
    /// Start a write. `label` names the record being created in logs and errors.
    pub fn begin(store: Arc<dyn RecordStore>, label: &'static str) -> Self {
        Self {
            store,
            label,
            step: String::new(),
            inserted: Vec::new(),
        }
    }

    /// Insert a row and remember it for compensation.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Store` if the insert fails, or `CoreError::InvalidInput` if the
    /// stored row carries no id.
    pub async fn insert(&mut self, table: Table, row: Row) -> CoreResult<Row> {
        self.step = format!("insert into {table}");
        let stored = self.store.insert(table, row).await?;
        let id = row_id(&stored)?;
        self.inserted.push((table, id));
        tracing::debug!(label = self.label, %table, %id, "Linked write inserted row");
        Ok(stored)
    }

    /// Point an already-inserted row at another one.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if no row with `id` exists in `table`, or
    /// `CoreError::Store` if the update fails.
    pub async fn link(&mut self, table: Table, id: Uuid, patch: Row) -> CoreResult<Row> {
        self.step = format!("link {table}");
        let mut rows = self.store.update(table, &[Filter::id(id)], patch).await?;
        rows.pop()
            .ok_or_else(|| CoreError::not_found(table.name(), id))
    }

    /// Rows inserted so far, oldest first.
    pub fn inserted(&self) -> &[(Table, Uuid)] {
        &self.inserted
    }

    /// Return `result` unchanged on success; roll back and return the failure otherwise.
    pub async fn finish<T>(self, result: CoreResult<T>) -> CoreResult<T> {
        match result {
            Ok(value) => Ok(value),
            Err(error) => Err(self.rollback(error).await),
        }
    }

    /// Delete every inserted row, newest first, and decide which error the caller sees.
    pub async fn rollback(self, write_error: CoreError) -> CoreError {
        tracing::warn!(
            label = self.label,
            step = %self.step,
            error = %write_error,
            rows = self.inserted.len(),
            "Linked write failed; compensating"
        );

        let mut cleanup_errors: Vec<StoreError> = Vec::new();
        for (table, id) in self.inserted.iter().rev() {
            if let Err(e) = self.store.delete(*table, &[Filter::id(*id)]).await {
                tracing::warn!(%table, %id, error = %e, "Compensating delete failed");
                cleanup_errors.push(e);
            }
        }

        if cleanup_errors.is_empty() {
            write_error
        } else {
            CoreError::CompensationFailed {
                step: self.step,
                write_error: Box::new(write_error),
                cleanup_errors,
            }
        }
    }
}
