pub mod mysql;
pub mod seed;
pub mod sqlite;

use async_trait::async_trait;
use config::ConnectionConfig;
use serde_json::Value;
use std::fmt::{self, Display};
use std::path::{Path, PathBuf};

/// Longest cell text handed to the model before it gets cut off.
pub const MAX_CELL_LENGTH: usize = 300;

/// Number of example rows included with each table description.
pub const SAMPLE_ROWS: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error("table_names {{{}}} not found in database", .0.join(", "))]
    UnknownTables(Vec<String>),
    #[error("local database file {} does not exist, run the seed binary first", .0.display())]
    MissingFile(PathBuf),
}

/// Trait defining the interface for database operations
#[async_trait]
pub trait Database: Send + Sync {
    /// Human readable SQL dialect, used to tell the model which syntax to write
    fn dialect(&self) -> &'static str;

    /// Quote an identifier so it can be spliced into generated SQL
    fn quote_identifier(&self, identifier: &str) -> String;

    /// Names of all user tables, sorted
    async fn list_tables(&self) -> Result<Vec<String>, DbError>;

    /// The CREATE TABLE statement for `table`
    async fn table_ddl(&self, table: &str) -> Result<String, DbError>;

    /// Execute a query and return column headers and decoded rows
    async fn get_results(&self, query: &str) -> Result<DatabaseResult, DbError>;

    /// Describe `tables` for the model: each table's DDL followed by a few sample rows.
    async fn table_info(&self, tables: &[String]) -> Result<String, DbError> {
        let known = self.list_tables().await?;
        let unknown: Vec<String> = tables
            .iter()
            .filter(|table| !known.contains(table))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(DbError::UnknownTables(unknown));
        }

        let mut sections = Vec::with_capacity(tables.len());
        for table in tables {
            let ddl = self.table_ddl(table).await?;
            let sample = self
                .get_results(&format!(
                    "SELECT * FROM {} LIMIT {SAMPLE_ROWS}",
                    self.quote_identifier(table)
                ))
                .await?;

            sections.push(format!(
                "{}\n\n/*\n{SAMPLE_ROWS} rows from {table} table:\n{}\n*/",
                ddl.trim(),
                sample.to_tsv()
            ));
        }

        Ok(sections.join("\n\n"))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatabaseResult {
    /// (column name, column type) pairs
    pub headers: Vec<(String, String)>,
    pub rows: Vec<Vec<Value>>,
}

impl DatabaseResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.headers.iter().map(|(name, _)| name.as_str())
    }

    fn render(&self, separator: &str) -> String {
        let mut lines = vec![self.column_names().collect::<Vec<_>>().join(separator)];
        lines.extend(self.rows.iter().map(|row| {
            row.iter()
                .map(|value| truncate(&cell_text(value), MAX_CELL_LENGTH))
                .collect::<Vec<_>>()
                .join(separator)
        }));
        lines.join("\n")
    }

    /// Tab separated rendering used inside table descriptions.
    pub fn to_tsv(&self) -> String {
        self.render("\t")
    }
}

impl Display for DatabaseResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.headers.is_empty() {
            return write!(f, "Query returned no rows.");
        }
        write!(f, "{}", self.render(" | "))
    }
}

/// Plain text for a single decoded value.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render a row as a parenthesized tuple with quoted strings, e.g. `(1, 'Prateek')`.
pub fn format_tuple(row: &[Value]) -> String {
    let cells = row
        .iter()
        .map(|value| match value {
            Value::String(s) => format!("'{}'", s.replace('\'', "\\'")),
            other => cell_text(other),
        })
        .collect::<Vec<_>>();

    if cells.len() == 1 {
        format!("({},)", cells[0])
    } else {
        format!("({})", cells.join(", "))
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => format!("{}...", &text[..index]),
        None => text.to_string(),
    }
}

/// Resolve the local database file: absolute paths are kept, relative ones are
/// taken from the working directory, where the seed binary creates them.
pub fn local_database_path(file: &Path) -> PathBuf {
    if file.is_absolute() {
        return file.to_path_buf();
    }

    std::env::current_dir()
        .map(|dir| dir.join(file))
        .unwrap_or_else(|_| file.to_path_buf())
}

/// Open a handle for the resolved connection configuration.
pub async fn connect(
    config: &ConnectionConfig,
    local_path: &Path,
) -> Result<Box<dyn Database>, DbError> {
    match config {
        ConnectionConfig::Local => {
            let database = sqlite::SqliteDatabase::open_read_only(local_path).await?;
            Ok(Box::new(database))
        }
        ConnectionConfig::Network(network) => {
            Ok(Box::new(mysql::MySqlDatabase::connect_lazy(network)))
        }
    }
}
