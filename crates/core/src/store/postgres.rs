//! Postgres-backed [`RecordStore`].
//!
//! One dynamic SQL path serves every table. Rows travel as `jsonb` and are converted with
//! `jsonb_populate_record(NULL::<table>, $n)` on the way in and `to_jsonb(target)` on the way
//! out, so Postgres performs the column type coercion. Table names come from [`Table`] and
//! column names are checked with [`validate_column_name`]; values are always bound.

use super::{Filter, Query, RecordStore, Row, StoreError, StoreResult, Table};
use crate::constants::UPDATED_AT_COLUMN;
use crate::validation::validate_column_name;
use async_trait::async_trait;
use serde_json::{json, Value};
use sqlx::postgres::{PgPool, PgPoolOptions};

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone, Debug)]
pub struct PostgresStore {
    pool: PgPool,
}

/// A positional parameter for a generated statement.
#[derive(Clone, Debug, PartialEq)]
enum Bind {
    Json(Value),
    Text(String),
}

impl PostgresStore {
    /// Open a connection pool.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the pool cannot establish a connection.
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        tracing::info!("Connected to Postgres (max {} connections)", max_connections);
        Ok(Self { pool })
    }

    /// Apply the embedded migrations under `crates/core/migrations`.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    async fn fetch_rows(&self, table: Table, sql: &str, binds: Vec<Bind>) -> StoreResult<Vec<Row>> {
        tracing::debug!(%table, sql, "executing statement");
        let mut query = sqlx::query_scalar::<_, Value>(sql);
        for bind in binds {
            query = match bind {
                Bind::Json(v) => query.bind(v),
                Bind::Text(s) => query.bind(s),
            };
        }
        let values = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_db_error(table, e))?;

        values
            .into_iter()
            .map(|value| match value {
                Value::Object(row) => Ok(row),
                _ => Err(StoreError::MalformedRow {
                    table: table.name(),
                }),
            })
            .collect()
    }
}

fn map_db_error(table: Table, err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return StoreError::UniqueViolation {
                table: table.name(),
                constraint: db.constraint().unwrap_or("unknown").to_string(),
            };
        }
    }
    StoreError::Database(err)
}

fn checked_columns(row: &Row) -> StoreResult<Vec<&str>> {
    row.keys()
        .map(|column| {
            validate_column_name(column)
                .map(|_| column.as_str())
                .map_err(|_| StoreError::InvalidColumn(column.clone()))
        })
        .collect()
}

fn single_column(column: &str, value: &Value) -> Value {
    let mut row = Row::new();
    row.insert(column.to_string(), value.clone());
    Value::Object(row)
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Render `filters` as a `WHERE` clause with parameters numbered from `first_param`.
fn where_clause(table: Table, filters: &[Filter], first_param: usize) -> StoreResult<(String, Vec<Bind>)> {
    if filters.is_empty() {
        return Ok((String::new(), Vec::new()));
    }

    let t = table.name();
    let mut clauses = Vec::with_capacity(filters.len());
    let mut binds = Vec::with_capacity(filters.len());

    for (i, filter) in filters.iter().enumerate() {
        let column = filter.column();
        validate_column_name(column).map_err(|_| StoreError::InvalidColumn(column.into()))?;
        let n = first_param + i;

        let typed = |op: &str| {
            format!("target.{column} {op} (jsonb_populate_record(NULL::{t}, ${n})).{column}")
        };
        let (clause, bind) = match filter {
            Filter::Eq(_, v) => (typed("="), Bind::Json(single_column(column, v))),
            Filter::Gte(_, v) => (typed(">="), Bind::Json(single_column(column, v))),
            Filter::Lte(_, v) => (typed("<="), Bind::Json(single_column(column, v))),
            Filter::ILike(_, term) => (
                format!("target.{column}::text ILIKE ${n}"),
                Bind::Text(format!("%{}%", escape_like(term))),
            ),
            Filter::StartsWith(_, prefix) => (
                format!("target.{column}::text LIKE ${n}"),
                Bind::Text(format!("{}%", escape_like(prefix))),
            ),
            Filter::Contains(_, v) => (
                format!("target.{column} @> ${n}"),
                Bind::Json(json!([v])),
            ),
        };
        clauses.push(clause);
        binds.push(bind);
    }

    Ok((format!(" WHERE {}", clauses.join(" AND ")), binds))
}

fn insert_sql(table: Table, columns: &[&str]) -> String {
    let t = table.name();
    if columns.is_empty() {
        return format!("INSERT INTO {t} AS target DEFAULT VALUES RETURNING to_jsonb(target)");
    }
    let list = columns.join(", ");
    format!(
        "INSERT INTO {t} AS target ({list}) SELECT {list} FROM jsonb_populate_record(NULL::{t}, $1) RETURNING to_jsonb(target)"
    )
}

fn update_sql(table: Table, columns: &[&str], where_sql: &str) -> String {
    let t = table.name();
    let mut assignments: Vec<String> = columns
        .iter()
        .map(|c| format!("{c} = src.{c}"))
        .collect();
    if !columns.contains(&UPDATED_AT_COLUMN) {
        assignments.push(format!("{UPDATED_AT_COLUMN} = now()"));
    }
    format!(
        "UPDATE {t} AS target SET {} FROM jsonb_populate_record(NULL::{t}, $1) AS src{where_sql} RETURNING to_jsonb(target)",
        assignments.join(", ")
    )
}

fn select_sql(table: Table, query: &Query, where_sql: &str) -> StoreResult<String> {
    let mut sql = format!("SELECT to_jsonb(target) FROM {} AS target{where_sql}", table.name());
    if let Some(order) = query.order {
        validate_column_name(order.column)
            .map_err(|_| StoreError::InvalidColumn(order.column.into()))?;
        let direction = if order.descending { "DESC" } else { "ASC" };
        sql.push_str(&format!(" ORDER BY target.{} {direction} NULLS LAST", order.column));
    }
    if let Some(limit) = query.limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }
    if let Some(offset) = query.offset {
        sql.push_str(&format!(" OFFSET {offset}"));
    }
    Ok(sql)
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
impl RecordStore for PostgresStore {
    async fn insert(&self, table: Table, row: Row) -> StoreResult<Row> {
        let sql = insert_sql(table, &checked_columns(&row)?);
        let binds = if row.is_empty() {
            Vec::new()
        } else {
            vec![Bind::Json(Value::Object(row))]
        };
        self.fetch_rows(table, &sql, binds)
            .await?
            .into_iter()
            .next()
            .ok_or(StoreError::MalformedRow {
                table: table.name(),
            })
    }

    async fn select(&self, table: Table, query: &Query) -> StoreResult<Vec<Row>> {
        let (where_sql, binds) = where_clause(table, &query.filters, 1)?;
        let sql = select_sql(table, query, &where_sql)?;
        self.fetch_rows(table, &sql, binds).await
    }

    async fn update(&self, table: Table, filters: &[Filter], patch: Row) -> StoreResult<Vec<Row>> {
        require_filter("update", table, filters)?;
        let columns = checked_columns(&patch)?;
        let (where_sql, filter_binds) = where_clause(table, filters, 2)?;
        let sql = update_sql(table, &columns, &where_sql);

        let mut binds = vec![Bind::Json(Value::Object(patch))];
        binds.extend(filter_binds);
        self.fetch_rows(table, &sql, binds).await
    }

    async fn delete(&self, table: Table, filters: &[Filter]) -> StoreResult<Vec<Row>> {
        require_filter("delete", table, filters)?;
        let (where_sql, binds) = where_clause(table, filters, 1)?;
        let sql = format!(
            "DELETE FROM {} AS target{where_sql} RETURNING to_jsonb(target)",
            table.name()
        );
        self.fetch_rows(table, &sql, binds).await
    }

    async fn count(&self, table: Table, filters: &[Filter]) -> StoreResult<u64> {
        let (where_sql, binds) = where_clause(table, filters, 1)?;
        let sql = format!("SELECT count(*) FROM {} AS target{where_sql}", table.name());

        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for bind in binds {
            query = match bind {
                Bind::Json(v) => query.bind(v),
                Bind::Text(s) => query.bind(s),
            };
        }
        let count = query
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_error(table, e))?;
        Ok(count.max(0) as u64)
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_sql_lists_only_supplied_columns() {
        let sql = insert_sql(Table::Patients, &["first_name", "birth_date"]);
        assert_eq!(
            sql,
            "INSERT INTO patients AS target (first_name, birth_date) SELECT first_name, birth_date \
             FROM jsonb_populate_record(NULL::patients, $1) RETURNING to_jsonb(target)"
        );
        assert_eq!(
            insert_sql(Table::Doctors, &[]),
            "INSERT INTO doctors AS target DEFAULT VALUES RETURNING to_jsonb(target)"
        );
    }

    #[test]
    fn test_where_clause_numbers_params_and_types_values() {
        let filters = [
            Filter::eq("patient_id", "p-1"),
            Filter::gte("encounter_date", "2024-01-01"),
            Filter::ilike("name", "50%_off"),
            Filter::starts_with("code", "22"),
        ];
        let (sql, binds) =
            where_clause(Table::Encounters, &filters, 2).expect("where_clause should succeed");

        assert_eq!(
            sql,
            " WHERE target.patient_id = (jsonb_populate_record(NULL::encounters, $2)).patient_id \
             AND target.encounter_date >= (jsonb_populate_record(NULL::encounters, $3)).encounter_date \
             AND target.name::text ILIKE $4 \
             AND target.code::text LIKE $5"
        );
        assert_eq!(binds[0], Bind::Json(json!({"patient_id": "p-1"})));
        assert_eq!(binds[2], Bind::Text("%50\\%\\_off%".into()));
        assert_eq!(binds[3], Bind::Text("22%".into()));
    }

    #[test]
    fn test_update_sql_touches_updated_at() {
        let sql = update_sql(Table::Encounters, &["detail_id"], " WHERE x");
        assert_eq!(
            sql,
            "UPDATE encounters AS target SET detail_id = src.detail_id, updated_at = now() \
             FROM jsonb_populate_record(NULL::encounters, $1) AS src WHERE x RETURNING to_jsonb(target)"
        );
    }

    #[test]
    fn test_select_sql_orders_and_pages() {
        let query = Query::new().order_by("encounter_date", true).limit(10).offset(20);
        let sql = select_sql(Table::CancerScreenings, &query, "").expect("select_sql should succeed");
        assert_eq!(
            sql,
            "SELECT to_jsonb(target) FROM cancer_screenings AS target \
             ORDER BY target.encounter_date DESC NULLS LAST LIMIT 10 OFFSET 20"
        );
    }

    #[test]
    fn test_unsafe_columns_are_rejected() {
        let mut row = Row::new();
        row.insert("name) VALUES (1); --".into(), json!(1));
        assert!(matches!(
            checked_columns(&row),
            Err(StoreError::InvalidColumn(_))
        ));
    }
}
