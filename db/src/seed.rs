//! One-off population of the local SQLite file.
//!
//! The shipped [`STUDENT_SEED`] declares two columns but every insert supplies
//! four values, so running it creates the table and then fails on the first
//! insert. That mismatch is kept as-is until the intended schema is settled.

use crate::sqlite::collect_results;
use crate::{DatabaseResult, DbError};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;

#[derive(Debug, Clone, Copy)]
pub struct SeedPlan<'a> {
    pub table: &'a str,
    /// Must be idempotent, e.g. `CREATE TABLE IF NOT EXISTS`.
    pub ddl: &'a str,
    pub inserts: &'a [&'a str],
}

pub const STUDENT_SEED: SeedPlan<'static> = SeedPlan {
    table: "STUDENT",
    ddl: "CREATE TABLE IF NOT EXISTS STUDENT(
    roll_no INTEGER,
    name TEXT
)",
    inserts: &[
        "INSERT INTO STUDENT VALUES('Prateek','Data Science','A',93)",
        "INSERT INTO STUDENT VALUES('Gudu','AI-ML','A',63)",
        "INSERT INTO STUDENT VALUES('Chetan','Web Development','A',88)",
        "INSERT INTO STUDENT VALUES('Pulkit','APP Development','A',61)",
        "INSERT INTO STUDENT VALUES('Abhishek','Game Development','A',88)",
    ],
};

/// Open `path` for writing, creating the file when it does not exist yet.
pub async fn open_writable(path: &Path) -> Result<SqlitePool, DbError> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Ensure the table exists, append every row of `plan` and return the table's
/// full contents. The inserts share one transaction; the table creation does not.
pub async fn seed(pool: &SqlitePool, plan: &SeedPlan<'_>) -> Result<DatabaseResult, DbError> {
    sqlx::query(plan.ddl).execute(pool).await?;
    tracing::debug!(table = plan.table, "table ensured");

    let mut tx = pool.begin().await?;
    for insert in plan.inserts {
        sqlx::query(insert).execute(&mut *tx).await?;
    }

    let rows = sqlx::query(&format!("SELECT * FROM \"{}\"", plan.table.replace('"', "\"\"")))
        .fetch_all(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!(
        table = plan.table,
        inserted = plan.inserts.len(),
        total = rows.len(),
        "seeded table"
    );
    Ok(collect_results(&rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TWO_COLUMN_SEED: SeedPlan<'static> = SeedPlan {
        table: "STUDENT",
        ddl: "CREATE TABLE IF NOT EXISTS STUDENT(roll_no INTEGER, name TEXT)",
        inserts: &[
            "INSERT INTO STUDENT VALUES(1, 'Prateek')",
            "INSERT INTO STUDENT VALUES(2, 'Gudu')",
            "INSERT INTO STUDENT VALUES(3, 'Chetan')",
            "INSERT INTO STUDENT VALUES(4, 'Pulkit')",
            "INSERT INTO STUDENT VALUES(5, 'Abhishek')",
        ],
    };

    async fn table_count(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'STUDENT'")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    async fn row_count(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM STUDENT")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn schema_is_idempotent_but_rows_accumulate() {
        let dir = tempfile::tempdir().unwrap();
        let pool = open_writable(&dir.path().join("student.db")).await.unwrap();

        let first = seed(&pool, &TWO_COLUMN_SEED).await.unwrap();
        let second = seed(&pool, &TWO_COLUMN_SEED).await.unwrap();

        assert_eq!(first.rows.len(), 5);
        assert_eq!(second.rows.len(), 10);
        assert_eq!(first.rows[0], vec![json!(1), json!("Prateek")]);
        assert_eq!(table_count(&pool).await, 1);
        assert_eq!(row_count(&pool).await, 10);
    }

    #[tokio::test]
    async fn student_seed_fails_on_column_mismatch_and_leaves_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let pool = open_writable(&dir.path().join("student.db")).await.unwrap();

        let err = seed(&pool, &STUDENT_SEED).await.unwrap_err();

        assert!(
            err.to_string().contains("has 2 columns but 4 values were supplied"),
            "{err}"
        );
        assert_eq!(table_count(&pool).await, 1);
        assert_eq!(row_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn file_is_created_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.db");

        let pool = open_writable(&path).await.unwrap();
        seed(&pool, &TWO_COLUMN_SEED).await.unwrap();
        pool.close().await;

        assert!(path.exists());
    }
}
