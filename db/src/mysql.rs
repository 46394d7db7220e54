use crate::{DatabaseResult, DbError};

use super::Database;
use config::NetworkConfig;
use serde_json::{Value, json};
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};

/// MySQL backend over a lazily connecting pool. Nothing touches the network until
/// the first query, so bad credentials surface when the agent runs one.
#[derive(Debug, Clone)]
pub struct MySqlDatabase {
    pool: MySqlPool,
}

/// Options are set field by field so no user input is ever parsed as part of a URL.
fn connect_options(config: &NetworkConfig) -> MySqlConnectOptions {
    MySqlConnectOptions::new()
        .host(&config.host)
        .username(&config.user)
        .password(&config.password)
        .database(&config.database)
}

impl MySqlDatabase {
    pub fn connect_lazy(config: &NetworkConfig) -> Self {
        let pool = MySqlPoolOptions::new()
            .max_connections(5)
            .connect_lazy_with(connect_options(config));

        tracing::info!(
            host = %config.host,
            user = %config.user,
            database = %config.database,
            "created MySQL connection pool"
        );
        Self { pool }
    }
}

fn decode_value(row: &MySqlRow, i: usize, type_name: &str) -> Value {
    match row.try_get_raw(i) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Err(_) => return Value::Null,
        Ok(_) => {}
    }

    match type_name {
        "BOOLEAN" => row
            .try_get::<bool, _>(i)
            .map(|v| json!(v))
            .unwrap_or(Value::Null),

        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => row
            .try_get::<i64, _>(i)
            .map(|v| json!(v))
            .unwrap_or(Value::Null),

        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" | "YEAR" => row
            .try_get::<u64, _>(i)
            .map(|v| json!(v))
            .unwrap_or(Value::Null),

        "FLOAT" => row
            .try_get::<f32, _>(i)
            .map(|v| json!(v))
            .unwrap_or(Value::Null),

        "DOUBLE" => row
            .try_get::<f64, _>(i)
            .map(|v| json!(v))
            .unwrap_or(Value::Null),

        "DECIMAL" => row
            .try_get::<rust_decimal::Decimal, _>(i)
            .map(|v| json!(v))
            .unwrap_or(Value::Null),

        "DATE" => row
            .try_get::<chrono::NaiveDate, _>(i)
            .map(|v| json!(v.format("%Y-%m-%d").to_string()))
            .unwrap_or(Value::Null),

        "TIME" => row
            .try_get::<chrono::NaiveTime, _>(i)
            .map(|v| json!(v.format("%H:%M:%S").to_string()))
            .unwrap_or(Value::Null),

        "DATETIME" => row
            .try_get::<chrono::NaiveDateTime, _>(i)
            .map(|dt| json!(dt.format("%Y-%m-%dT%H:%M:%S").to_string()))
            .unwrap_or(Value::Null),

        "TIMESTAMP" => row
            .try_get::<chrono::DateTime<chrono::Utc>, _>(i)
            .map(|dt| json!(dt.to_rfc3339()))
            .unwrap_or(Value::Null),

        "JSON" => row.try_get::<Value, _>(i).unwrap_or(Value::Null),

        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BIT" => row
            .try_get::<Vec<u8>, _>(i)
            .map(|v| match String::from_utf8(v) {
                Ok(s) => json!(s),
                Err(e) => json!(format!("<{} bytes>", e.as_bytes().len())),
            })
            .unwrap_or(Value::Null),

        _ => row
            .try_get::<String, _>(i)
            .map(|v| json!(v))
            .unwrap_or(Value::Null),
    }
}

#[async_trait::async_trait]
impl Database for MySqlDatabase {
    fn dialect(&self) -> &'static str {
        "MySQL"
    }

    fn quote_identifier(&self, identifier: &str) -> String {
        format!("`{}`", identifier.replace('`', "``"))
    }

    async fn list_tables(&self) -> Result<Vec<String>, DbError> {
        let tables = sqlx::query_scalar::<_, String>(
            "SELECT CAST(table_name AS CHAR) FROM information_schema.tables
             WHERE table_schema = DATABASE()
             ORDER BY table_name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(tables)
    }

    async fn table_ddl(&self, table: &str) -> Result<String, DbError> {
        let row = sqlx::query(&format!("SHOW CREATE TABLE {}", self.quote_identifier(table)))
            .fetch_one(&self.pool)
            .await?;

        Ok(row.try_get::<String, _>(1)?)
    }

    async fn get_results(&self, query: &str) -> Result<DatabaseResult, DbError> {
        let rows = sqlx::query(query).fetch_all(&self.pool).await?;

        let mut results = DatabaseResult::default();

        let Some(first) = rows.first() else {
            return Ok(results);
        };

        for col in first.columns() {
            results
                .headers
                .push((col.name().to_string(), col.type_info().name().to_string()));
        }

        for row in &rows {
            let row_data = row
                .columns()
                .iter()
                .enumerate()
                .map(|(i, col)| decode_value(row, i, col.type_info().name()))
                .collect();
            results.rows.push(row_data);
        }

        Ok(results)
    }
}
