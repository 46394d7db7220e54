mod error;
mod types;

use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::future::Future;

use eventsource_stream::Eventsource;
use futures::StreamExt;

use types::{ChatCompletionChunk, ChatCompletionRequest};

pub use error::LlmError;
// Re-export types that consumers will need to create and use tools
pub use types::{ChatMessage, Function, FunctionCall, TextMessageRole, Tool, ToolCall, ToolType};
pub use serde_json::{Value, json};
pub use std::collections::HashMap;

/// Information about a tool call from the model
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolCallInfo {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

impl From<&ToolCallInfo> for ToolCall {
    fn from(call: &ToolCallInfo) -> Self {
        ToolCall {
            id: call.id.clone(),
            tp: ToolType::Function,
            function: FunctionCall {
                name: call.name.clone(),
                arguments: call.arguments.clone(),
            },
        }
    }
}

/// Represents a chunk in the streaming response
#[derive(Debug, Clone)]
pub enum StreamChunk {
    /// Regular text content
    Text(String),
    /// A tool call request from the model, emitted once its arguments are complete
    ToolCall(ToolCallInfo),
}

/// Everything the model produced in one streamed turn
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    pub text: String,
    pub tool_calls: Vec<ToolCallInfo>,
}

/// Streaming client for an OpenAI-compatible chat completions endpoint,
/// holding the running conversation and the tools offered to the model.
pub struct LLM {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: Option<f32>,
    history: Vec<ChatMessage>,
    tools: Vec<Tool>,
}

impl fmt::Debug for LLM {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LLM")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("history", &self.history.len())
            .field("tools", &self.tools.len())
            .finish_non_exhaustive()
    }
}

impl LLM {
    pub fn new(conf: &config::AIConfig, api_key: impl Into<String>) -> Self {
        LLM {
            client: reqwest::Client::new(),
            endpoint: format!("{}/chat/completions", conf.url.trim_end_matches('/')),
            api_key: api_key.into(),
            model: conf.model.clone(),
            temperature: conf.temperature,
            history: vec![],
            tools: vec![],
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Set all tools for the LLM, replacing any existing tools
    pub fn set_tools(&mut self, tools: Vec<Tool>) {
        self.tools = tools;
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn set_system_prompt(&mut self, prompt: impl Display) {
        self.history
            .retain(|message| message.role != TextMessageRole::System);
        self.history
            .insert(0, ChatMessage::text(TextMessageRole::System, prompt.to_string()));
    }

    /// Forget the conversation, keeping only the system prompt
    pub fn clear_history(&mut self) {
        self.history
            .retain(|message| message.role == TextMessageRole::System);
    }

    pub async fn stream_completion<F, Fut>(
        &mut self,
        prompt: impl Display,
        mut on_chunk: F,
    ) -> Result<Completion, LlmError>
    where
        F: FnMut(StreamChunk) -> Fut,
        Fut: Future<Output = ()>,
    {
        self.history
            .push(ChatMessage::text(TextMessageRole::User, prompt.to_string()));

        self.request(&mut on_chunk).await
    }

    /// Add a tool result to the conversation history. Call
    /// [`LLM::continue_completion`] once every requested tool has answered.
    pub fn add_tool_result(&mut self, tool_call_id: impl Into<String>, result: impl Into<String>) {
        self.history.push(ChatMessage {
            role: TextMessageRole::Tool,
            content: Some(result.into()),
            tool_calls: vec![],
            tool_call_id: Some(tool_call_id.into()),
        });
    }

    /// Ask the model to carry on from the current history, usually after tool results
    pub async fn continue_completion<F, Fut>(&mut self, mut on_chunk: F) -> Result<Completion, LlmError>
    where
        F: FnMut(StreamChunk) -> Fut,
        Fut: Future<Output = ()>,
    {
        self.request(&mut on_chunk).await
    }

    async fn request<F, Fut>(&mut self, on_chunk: &mut F) -> Result<Completion, LlmError>
    where
        F: FnMut(StreamChunk) -> Fut,
        Fut: Future<Output = ()>,
    {
        let has_tools = !self.tools.is_empty();
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: &self.history,
            stream: true,
            tools: has_tools.then_some(self.tools.as_slice()),
            tool_choice: has_tools.then_some("auto"),
            temperature: self.temperature,
        };

        tracing::debug!(
            model = %self.model,
            messages = self.history.len(),
            tools = self.tools.len(),
            "requesting completion"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::from_response(status.as_u16(), &body));
        }

        let mut stream = Box::pin(response.bytes_stream().eventsource());

        let mut full_response = String::new();
        let mut partial_calls: BTreeMap<usize, ToolCallInfo> = BTreeMap::new();

        while let Some(event) = stream.next().await {
            let event = event.map_err(|e| LlmError::Stream(e.to_string()))?;
            if event.data.trim() == "[DONE]" {
                break;
            }

            let chunk: ChatCompletionChunk = serde_json::from_str(&event.data)?;
            if let Some(error) = chunk.error {
                return Err(LlmError::Stream(error.message));
            }
            let Some(choice) = chunk.choices.into_iter().next() else {
                continue;
            };

            if let Some(content) = choice.delta.content
                && !content.is_empty()
            {
                full_response.push_str(&content);
                on_chunk(StreamChunk::Text(content)).await;
            }

            for delta in choice.delta.tool_calls.unwrap_or_default() {
                let call = partial_calls.entry(delta.index).or_insert_with(|| ToolCallInfo {
                    id: format!("call_{}", delta.index),
                    name: String::new(),
                    arguments: String::new(),
                });
                if let Some(id) = delta.id
                    && !id.is_empty()
                {
                    call.id = id;
                }
                if let Some(function) = delta.function {
                    if let Some(name) = function.name
                        && call.name.is_empty()
                    {
                        call.name = name;
                    }
                    if let Some(arguments) = function.arguments {
                        call.arguments.push_str(&arguments);
                    }
                }
            }
        }

        let tool_calls: Vec<ToolCallInfo> = partial_calls.into_values().collect();
        for call in &tool_calls {
            on_chunk(StreamChunk::ToolCall(call.clone())).await;
        }

        self.history.push(ChatMessage {
            role: TextMessageRole::Assistant,
            content: (!full_response.is_empty() || tool_calls.is_empty())
                .then(|| full_response.clone()),
            tool_calls: tool_calls.iter().map(ToolCall::from).collect(),
            tool_call_id: None,
        });

        Ok(Completion {
            text: full_response,
            tool_calls,
        })
    }
}

/// Helper function to create a tool with the given name, description, and parameters
///
/// # Example
/// ```rust
/// use ai::{create_tool, json, HashMap, Value};
///
/// let parameters: HashMap<String, Value> = serde_json::from_value(json!({
///     "type": "object",
///     "properties": {
///         "query": {
///             "type": "string",
///             "description": "The SQL query to execute",
///         },
///     },
///     "required": ["query"],
/// })).unwrap();
///
/// let tool = create_tool(
///     "sql_db_query",
///     "Execute a SQL query against the database",
///     parameters,
/// );
/// assert_eq!(tool.function.name, "sql_db_query");
/// ```
pub fn create_tool(
    name: impl Into<String>,
    description: impl Into<String>,
    parameters: HashMap<String, Value>,
) -> Tool {
    Tool {
        tp: ToolType::Function,
        function: Function {
            name: name.into(),
            description: Some(description.into()),
            parameters: Some(parameters),
        },
    }
}
