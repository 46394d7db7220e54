use crate::{DatabaseResult, DbError};

use super::Database;
use serde_json::{Value, json};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};
use std::path::Path;

/// SQLite backend. The pool hands connections to whichever tokio worker asks,
/// so the handle is never tied to the thread that opened it.
#[derive(Debug, Clone)]
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    pub async fn open_read_only(path: &Path) -> Result<Self, DbError> {
        if !path.exists() {
            return Err(DbError::MissingFile(path.to_path_buf()));
        }

        let options = SqliteConnectOptions::new().filename(path).read_only(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        tracing::info!(path = %path.display(), "opened local database read-only");
        Ok(Self { pool })
    }
}

/// Decode a column using the storage class of the value actually stored,
/// since SQLite only treats declared column types as affinities.
pub(crate) fn decode_value(row: &SqliteRow, i: usize) -> Value {
    let Ok(raw) = row.try_get_raw(i) else {
        return Value::Null;
    };
    if raw.is_null() {
        return Value::Null;
    }
    let type_name = raw.type_info().name().to_string();

    match type_name.as_str() {
        "INTEGER" => row
            .try_get::<i64, _>(i)
            .map(|v| json!(v))
            .unwrap_or(Value::Null),

        "REAL" => row
            .try_get::<f64, _>(i)
            .map(|v| json!(v))
            .unwrap_or(Value::Null),

        "BLOB" => row
            .try_get::<Vec<u8>, _>(i)
            .map(|v| json!(format!("<{} bytes>", v.len())))
            .unwrap_or(Value::Null),

        _ => row
            .try_get::<String, _>(i)
            .map(|v| json!(v))
            .unwrap_or(Value::Null),
    }
}

pub(crate) fn collect_results(rows: &[SqliteRow]) -> DatabaseResult {
    let mut results = DatabaseResult::default();

    let Some(first) = rows.first() else {
        return results;
    };

    for col in first.columns() {
        results
            .headers
            .push((col.name().to_string(), col.type_info().name().to_string()));
    }

    for row in rows {
        let row_data = (0..row.columns().len())
            .map(|i| decode_value(row, i))
            .collect();
        results.rows.push(row_data);
    }

    results
}

#[async_trait::async_trait]
impl Database for SqliteDatabase {
    fn dialect(&self) -> &'static str {
        "SQLite"
    }

    fn quote_identifier(&self, identifier: &str) -> String {
        format!("\"{}\"", identifier.replace('"', "\"\""))
    }

    async fn list_tables(&self) -> Result<Vec<String>, DbError> {
        let tables = sqlx::query_scalar::<_, String>(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
             ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(tables)
    }

    async fn table_ddl(&self, table: &str) -> Result<String, DbError> {
        let ddl = sqlx::query_scalar::<_, String>(
            "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind(table)
        .fetch_optional(&self.pool)
        .await?;

        ddl.ok_or_else(|| DbError::UnknownTables(vec![table.to_string()]))
    }

    async fn get_results(&self, query: &str) -> Result<DatabaseResult, DbError> {
        let rows = sqlx::query(query).fetch_all(&self.pool).await?;
        Ok(collect_results(&rows))
    }
}
