use ai::{HashMap, Value, create_tool, json};
use db::{Database, DatabaseResult};
use serde::Deserialize;

/// The database tools offered to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlTool {
    ListTables,
    Schema,
    Query,
}

/// What a tool hands back: text for the model, plus the rows when there are any.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub text: String,
    pub table: Option<DatabaseResult>,
}

impl ToolOutput {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            table: None,
        }
    }

    pub fn error(err: impl std::fmt::Display) -> Self {
        Self::text(format!("Error: {err}"))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TableNames {
    List(Vec<String>),
    Joined(String),
}

impl TableNames {
    fn into_vec(self) -> Vec<String> {
        let names = match self {
            TableNames::List(names) => names,
            TableNames::Joined(joined) => joined.split(',').map(str::to_string).collect(),
        };
        names
            .into_iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect()
    }
}

#[derive(Deserialize)]
struct SchemaArgs {
    table_names: TableNames,
}

#[derive(Deserialize)]
struct QueryArgs {
    query: String,
}

fn object_schema(properties: Value, required: &[&str]) -> HashMap<String, Value> {
    HashMap::from([
        ("type".to_string(), json!("object")),
        ("properties".to_string(), properties),
        ("required".to_string(), json!(required)),
    ])
}

impl SqlTool {
    pub const ALL: [SqlTool; 3] = [SqlTool::ListTables, SqlTool::Schema, SqlTool::Query];

    pub fn name(self) -> &'static str {
        match self {
            SqlTool::ListTables => "sql_db_list_tables",
            SqlTool::Schema => "sql_db_schema",
            SqlTool::Query => "sql_db_query",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }

    pub fn definition(self) -> ai::Tool {
        match self {
            SqlTool::ListTables => create_tool(
                self.name(),
                "List the tables in the database. Takes no input and returns a comma-separated list of table names.",
                object_schema(json!({}), &[]),
            ),
            SqlTool::Schema => create_tool(
                self.name(),
                "Get the schema and a few sample rows for the given tables. Make sure the tables exist by calling sql_db_list_tables first.",
                object_schema(
                    json!({
                        "table_names": {
                            "type": "string",
                            "description": "Comma-separated list of table names, e.g. `table1, table2`.",
                        },
                    }),
                    &["table_names"],
                ),
            ),
            SqlTool::Query => create_tool(
                self.name(),
                "Execute a SQL query against the database and get back the result. If the query is not correct, an error message is returned; rewrite the query, check it, and try again.",
                object_schema(
                    json!({
                        "query": {
                            "type": "string",
                            "description": "A detailed and correct SQL query.",
                        },
                    }),
                    &["query"],
                ),
            ),
        }
    }

    /// Run the tool. Failures come back as `Error: ...` text so the model can correct itself.
    pub async fn run(self, db: &dyn Database, arguments: &str) -> ToolOutput {
        match self {
            SqlTool::ListTables => match db.list_tables().await {
                Ok(tables) => ToolOutput::text(tables.join(", ")),
                Err(err) => ToolOutput::error(err),
            },
            SqlTool::Schema => {
                let args: SchemaArgs = match serde_json::from_str(arguments) {
                    Ok(args) => args,
                    Err(err) => return ToolOutput::error(format!("invalid arguments: {err}")),
                };
                match db.table_info(&args.table_names.into_vec()).await {
                    Ok(info) => ToolOutput::text(info),
                    Err(err) => ToolOutput::error(err),
                }
            }
            SqlTool::Query => {
                let args: QueryArgs = match serde_json::from_str(arguments) {
                    Ok(args) => args,
                    Err(err) => return ToolOutput::error(format!("invalid arguments: {err}")),
                };
                match db.get_results(&args.query).await {
                    Ok(result) => ToolOutput {
                        text: result.to_string(),
                        table: (!result.is_empty()).then_some(result),
                    },
                    Err(err) => ToolOutput::error(err),
                }
            }
        }
    }
}
