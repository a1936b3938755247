//! Fault injection and select recording for store-level tests.

use super::{Filter, MemoryStore, Query, RecordStore, Row, StoreError, StoreResult, Table};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

/// Operations a [`FaultyStore`] can be told to fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Fault {
    Insert(Table),
    Update(Table),
    Delete(Table),
}

/// A [`MemoryStore`] that fails selected operations with [`StoreError::Unavailable`] and
/// keeps every select query it receives.
#[derive(Debug, Default)]
pub struct FaultyStore {
    pub inner: MemoryStore,
    faults: Mutex<HashSet<Fault>>,
    selects: Mutex<Vec<(Table, Query)>>,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, fault: Fault) {
        self.faults
            .lock()
            .expect("fault set lock should not be poisoned")
            .insert(fault);
    }

    /// Select queries received so far, oldest first.
    pub fn selects(&self) -> Vec<(Table, Query)> {
        self.selects
            .lock()
            .expect("select log lock should not be poisoned")
            .clone()
    }

    fn check(&self, fault: Fault) -> StoreResult<()> {
        let armed = self
            .faults
            .lock()
            .expect("fault set lock should not be poisoned")
            .contains(&fault);
        if armed {
            return Err(StoreError::Unavailable(format!("injected fault: {fault:?}")));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for FaultyStore {
    async fn insert(&self, table: Table, row: Row) -> StoreResult<Row> {
        self.check(Fault::Insert(table))?;
        self.inner.insert(table, row).await
    }

    async fn select(&self, table: Table, query: &Query) -> StoreResult<Vec<Row>> {
        self.selects
            .lock()
            .expect("select log lock should not be poisoned")
            .push((table, query.clone()));
        self.inner.select(table, query).await
    }

    async fn update(&self, table: Table, filters: &[Filter], patch: Row) -> StoreResult<Vec<Row>> {
        self.check(Fault::Update(table))?;
        self.inner.update(table, filters, patch).await
    }

    async fn delete(&self, table: Table, filters: &[Filter]) -> StoreResult<Vec<Row>> {
        self.check(Fault::Delete(table))?;
        self.inner.delete(table, filters).await
    }

    async fn count(&self, table: Table, filters: &[Filter]) -> StoreResult<u64> {
        self.inner.count(table, filters).await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.inner.ping().await
    }
}
