use std::fmt;
use std::future::{Ready, ready};

use ai::{LLM, LlmError, StreamChunk, ToolCallInfo};
use config::AgentConfig;
use db::{Database, DatabaseResult};
use tracing::{info, warn};

use crate::tools::{SqlTool, ToolOutput};

pub const ITERATION_LIMIT_ANSWER: &str = "Agent stopped due to iteration limit or time limit.";

/// Progress reported while the agent works on a question.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    /// A fragment of text streamed by the model
    Thought(String),
    /// The model asked for a tool
    Action { tool: String, input: String },
    /// What the tool returned
    Observation {
        tool: String,
        output: String,
        table: Option<DatabaseResult>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error(transparent)]
    Llm(#[from] LlmError),
}

fn system_prompt(dialect: &str, top_k: usize) -> String {
    format!(
        r#"You are an agent designed to interact with a SQL database.
Given an input question, create a syntactically correct {dialect} query to run, then look at the results of the query and return the answer.
Unless the user specifies a specific number of examples they wish to obtain, always limit your query to at most {top_k} results.
You can order the results by a relevant column to return the most interesting examples in the database.
Never query for all the columns from a specific table, only ask for the relevant columns given the question.
Only use the information returned by the tools to construct your final answer.
Start by listing the tables, then look at the schema of the most relevant ones before writing a query.
You MUST double check your query before executing it. If you get an error while executing a query, rewrite the query and try again.
DO NOT make any DML statements (INSERT, UPDATE, DELETE, DROP etc.) to the database.
If the question does not seem related to the database, just return "I don't know" as the answer."#
    )
}

fn thought<F: FnMut(AgentEvent)>(on_event: &mut F, chunk: StreamChunk) -> Ready<()> {
    if let StreamChunk::Text(text) = chunk {
        on_event(AgentEvent::Thought(text));
    }
    ready(())
}

/// Answers questions by letting the model call the SQL tools against one database.
pub struct SqlAgent {
    llm: LLM,
    db: Box<dyn Database>,
    config: AgentConfig,
}

impl fmt::Debug for SqlAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlAgent")
            .field("llm", &self.llm)
            .field("dialect", &self.db.dialect())
            .field("config", &self.config)
            .finish()
    }
}

impl SqlAgent {
    pub fn new(mut llm: LLM, db: Box<dyn Database>, config: AgentConfig) -> Self {
        llm.set_tools(SqlTool::ALL.into_iter().map(SqlTool::definition).collect());
        llm.set_system_prompt(system_prompt(db.dialect(), config.top_k));

        Self { llm, db, config }
    }

    pub fn dialect(&self) -> &'static str {
        self.db.dialect()
    }

    /// Answer one question. Every call starts from a clean conversation.
    pub async fn ask<F>(&mut self, question: &str, mut on_event: F) -> Result<String, AgentError>
    where
        F: FnMut(AgentEvent),
    {
        self.llm.clear_history();
        info!(model = self.llm.model(), question, "agent started");

        let mut iteration = 1;
        let mut completion = self
            .llm
            .stream_completion(question, |chunk| thought(&mut on_event, chunk))
            .await?;

        loop {
            if completion.tool_calls.is_empty() {
                info!(iterations = iteration, "agent finished");
                return Ok(completion.text.trim().to_string());
            }

            for call in &completion.tool_calls {
                let output = self.run_tool(call, &mut on_event).await;
                self.llm.add_tool_result(call.id.clone(), output);
            }

            if iteration >= self.config.max_iterations {
                warn!(iterations = iteration, "agent hit the iteration limit");
                return Ok(ITERATION_LIMIT_ANSWER.to_string());
            }
            iteration += 1;

            completion = self
                .llm
                .continue_completion(|chunk| thought(&mut on_event, chunk))
                .await?;
        }
    }

    async fn run_tool<F>(&self, call: &ToolCallInfo, on_event: &mut F) -> String
    where
        F: FnMut(AgentEvent),
    {
        on_event(AgentEvent::Action {
            tool: call.name.clone(),
            input: call.arguments.clone(),
        });
        if self.config.verbose {
            info!(tool = %call.name, input = %call.arguments, "agent action");
        }

        let output = match SqlTool::from_name(&call.name) {
            Some(tool) => tool.run(self.db.as_ref(), &call.arguments).await,
            None => {
                let names: Vec<&str> = SqlTool::ALL.into_iter().map(SqlTool::name).collect();
                ToolOutput::error(format!(
                    "{} is not a valid tool, try one of [{}].",
                    call.name,
                    names.join(", ")
                ))
            }
        };

        if self.config.verbose {
            info!(tool = %call.name, output = %output.text, "agent observation");
        }

        let text = output.text.clone();
        on_event(AgentEvent::Observation {
            tool: call.name.clone(),
            output: output.text,
            table: output.table,
        });
        text
    }
}
