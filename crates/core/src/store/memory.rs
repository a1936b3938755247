use super::{Filter, Query, RecordStore, Row, StoreError, StoreResult, Table};
use crate::constants::{CREATED_AT_COLUMN, ID_COLUMN, UPDATED_AT_COLUMN};
use crate::validation::validate_column_name;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Process-local tables behind a single lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<Table, Vec<Row>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_columns<'a>(columns: impl IntoIterator<Item = &'a String>) -> StoreResult<()> {
    for column in columns {
        validate_column_name(column).map_err(|_| StoreError::InvalidColumn(column.clone()))?;
    }
    Ok(())
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn matches(row: &Row, filter: &Filter) -> bool {
    let value = row.get(filter.column()).unwrap_or(&Value::Null);
    match filter {
        Filter::Eq(_, expected) => compare(value, expected) == Some(Ordering::Equal),
        Filter::Gte(_, bound) => matches!(
            compare(value, bound),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Filter::Lte(_, bound) => {
            matches!(compare(value, bound), Some(Ordering::Less | Ordering::Equal))
        }
        Filter::ILike(_, term) => value
            .as_str()
            .is_some_and(|s| s.to_lowercase().contains(&term.to_lowercase())),
        Filter::StartsWith(_, prefix) => value
            .as_str()
            .is_some_and(|s| s.starts_with(prefix.as_str())),
        Filter::Contains(_, needle) => value
            .as_array()
            .is_some_and(|items| items.iter().any(|item| item == needle)),
    }
}

fn matches_all(row: &Row, filters: &[Filter]) -> bool {
    filters.iter().all(|f| matches(row, f))
}

fn require_filter(operation: &'static str, table: Table, filters: &[Filter]) -> StoreResult<()> {
    if filters.is_empty() {
        return Err(StoreError::UnfilteredWrite {
            operation,
            table: table.name(),
        });
    }
    Ok(())
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert(&self, table: Table, mut row: Row) -> StoreResult<Row> {
        check_columns(row.keys())?;

        let now = Value::String(Utc::now().to_rfc3339());
        if row.get(ID_COLUMN).map_or(true, Value::is_null) {
            row.insert(
                ID_COLUMN.into(),
                Value::String(uuid::Uuid::new_v4().to_string()),
            );
        }
        row.entry(CREATED_AT_COLUMN).or_insert_with(|| now.clone());
        row.insert(UPDATED_AT_COLUMN.into(), now);

        let mut tables = self.tables.write().await;
        tables.entry(table).or_default().push(row.clone());
        Ok(row)
    }

    async fn select(&self, table: Table, query: &Query) -> StoreResult<Vec<Row>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Row> = tables
            .get(&table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| matches_all(row, &query.filters))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        drop(tables);

        if let Some(order) = query.order {
            rows.sort_by(|a, b| {
                let left = a.get(order.column).unwrap_or(&Value::Null);
                let right = b.get(order.column).unwrap_or(&Value::Null);
                // Nulls sort last in both directions.
                let ordering = match (left.is_null(), right.is_null()) {
                    (true, true) => return Ordering::Equal,
                    (true, false) => return Ordering::Greater,
                    (false, true) => return Ordering::Less,
                    _ => compare(left, right).unwrap_or(Ordering::Equal),
                };
                if order.descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }

        let offset = query.offset.unwrap_or(0) as usize;
        let limit = query.limit.map_or(usize::MAX, |l| l as usize);
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }

    async fn update(&self, table: Table, filters: &[Filter], patch: Row) -> StoreResult<Vec<Row>> {
        require_filter("update", table, filters)?;
        check_columns(patch.keys())?;

        let now = Value::String(Utc::now().to_rfc3339());
        let mut tables = self.tables.write().await;
        let mut updated = Vec::new();
        for row in tables.entry(table).or_default().iter_mut() {
            if !matches_all(row, filters) {
                continue;
            }
            for (column, value) in &patch {
                if column != ID_COLUMN && column != CREATED_AT_COLUMN {
                    row.insert(column.clone(), value.clone());
                }
            }
            row.insert(UPDATED_AT_COLUMN.into(), now.clone());
            updated.push(row.clone());
        }
        Ok(updated)
    }

    async fn delete(&self, table: Table, filters: &[Filter]) -> StoreResult<Vec<Row>> {
        require_filter("delete", table, filters)?;

        let mut tables = self.tables.write().await;
        let rows = tables.entry(table).or_default();
        let (deleted, kept): (Vec<Row>, Vec<Row>) = rows
            .drain(..)
            .partition(|row| matches_all(row, filters));
        *rows = kept;
        Ok(deleted)
    }

    async fn count(&self, table: Table, filters: &[Filter]) -> StoreResult<u64> {
        let tables = self.tables.read().await;
        Ok(tables.get(&table).map_or(0, |rows| {
            rows.iter().filter(|row| matches_all(row, filters)).count() as u64
        }))
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().expect("test row should be an object")
    }

    #[tokio::test]
    async fn test_insert_generates_managed_columns() {
        let store = MemoryStore::new();
        let stored = store
            .insert(Table::Patients, row(json!({"first_name": "Ana"})))
            .await
            .expect("insert should succeed");

        assert!(stored.get("id").and_then(Value::as_str).is_some());
        assert!(stored.contains_key("created_at"));
        assert!(stored.contains_key("updated_at"));
        assert_eq!(stored["first_name"], json!("Ana"));
    }

    #[tokio::test]
    async fn test_insert_rejects_unsafe_column_names() {
        let store = MemoryStore::new();
        let err = store
            .insert(Table::Patients, row(json!({"bad column": 1})))
            .await;
        assert!(matches!(err, Err(StoreError::InvalidColumn(_))));
    }

    #[tokio::test]
    async fn test_select_filters_orders_and_pages() {
        let store = MemoryStore::new();
        for (name, date) in [("a", "2024-03-01"), ("b", "2024-01-15"), ("c", "2024-02-10")] {
            store
                .insert(
                    Table::Encounters,
                    row(json!({"kind": name, "encounter_date": date})),
                )
                .await
                .expect("insert should succeed");
        }

        let query = Query::new()
            .filter(Filter::gte("encounter_date", "2024-02-01"))
            .order_by("encounter_date", false);
        let rows = store
            .select(Table::Encounters, &query)
            .await
            .expect("select should succeed");
        let kinds: Vec<_> = rows.iter().map(|r| r["kind"].clone()).collect();
        assert_eq!(kinds, vec![json!("c"), json!("a")]);

        let paged = store
            .select(
                Table::Encounters,
                &Query::new().order_by("encounter_date", true).offset(1).limit(1),
            )
            .await
            .expect("select should succeed");
        assert_eq!(paged.len(), 1);
        assert_eq!(paged[0]["kind"], json!("c"));
    }

    #[tokio::test]
    async fn test_ilike_and_contains_filters() {
        let store = MemoryStore::new();
        store
            .insert(
                Table::IntegralCarePlans,
                row(json!({"subject": "Familia Pérez", "setting_ids": ["s1", "s2"]})),
            )
            .await
            .expect("insert should succeed");

        assert_eq!(
            store
                .count(Table::IntegralCarePlans, &[Filter::ilike("subject", "PÉREZ")])
                .await
                .expect("count should succeed"),
            1
        );
        assert_eq!(
            store
                .count(Table::IntegralCarePlans, &[Filter::contains("setting_ids", "s2")])
                .await
                .expect("count should succeed"),
            1
        );
        assert_eq!(
            store
                .count(Table::IntegralCarePlans, &[Filter::contains("setting_ids", "s3")])
                .await
                .expect("count should succeed"),
            0
        );
    }

    #[tokio::test]
    async fn test_update_and_delete_require_filter() {
        let store = MemoryStore::new();
        let stored = store
            .insert(Table::Doctors, row(json!({"first_name": "Luis"})))
            .await
            .expect("insert should succeed");
        let id = stored["id"].clone();

        assert!(matches!(
            store.delete(Table::Doctors, &[]).await,
            Err(StoreError::UnfilteredWrite { .. })
        ));

        let updated = store
            .update(
                Table::Doctors,
                &[Filter::Eq("id", id.clone())],
                row(json!({"specialty": "Pediatría", "id": "ignored"})),
            )
            .await
            .expect("update should succeed");
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0]["specialty"], json!("Pediatría"));
        assert_eq!(updated[0]["id"], id);

        let deleted = store
            .delete(Table::Doctors, &[Filter::Eq("id", id)])
            .await
            .expect("delete should succeed");
        assert_eq!(deleted.len(), 1);
        assert_eq!(
            store
                .count(Table::Doctors, &[])
                .await
                .expect("count should succeed"),
            0
        );
    }
}
