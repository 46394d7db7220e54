use std::sync::{Arc, Mutex};

use ai::{LLM, LlmError, StreamChunk, TextMessageRole, ToolCallInfo, Value, create_tool, json};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sse(events: &[Value]) -> String {
    let mut body: String = events
        .iter()
        .map(|event| format!("data: {event}\n\n"))
        .collect();
    body.push_str("data: [DONE]\n\n");
    body
}

fn sse_response(events: &[Value]) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/event-stream")
        .set_body_string(sse(events))
}

fn llm_for(server: &MockServer) -> LLM {
    let conf = config::AIConfig {
        url: server.uri(),
        model: "test-model".to_string(),
        ..config::AIConfig::default()
    };
    LLM::new(&conf, "test-key")
}

#[tokio::test]
async fn text_fragments_are_streamed_and_recorded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(sse_response(&[
            json!({"choices": [{"delta": {"role": "assistant", "content": ""}}]}),
            json!({"choices": [{"delta": {"content": "Hello"}}]}),
            json!({"choices": [{"delta": {"content": " there"}}]}),
            json!({"choices": [{"delta": {}, "finish_reason": "stop"}]}),
        ]))
        .expect(1)
        .mount(&server)
        .await;

    let mut llm = llm_for(&server);
    let seen = Arc::new(Mutex::new(Vec::new()));

    let completion = llm
        .stream_completion("hi", |chunk| {
            let seen = Arc::clone(&seen);
            async move {
                if let StreamChunk::Text(text) = chunk {
                    seen.lock().unwrap().push(text);
                }
            }
        })
        .await
        .unwrap();

    assert_eq!(completion.text, "Hello there");
    assert!(completion.tool_calls.is_empty());
    assert_eq!(*seen.lock().unwrap(), vec!["Hello", " there"]);

    let last = llm.history().last().unwrap();
    assert_eq!(last.role, TextMessageRole::Assistant);
    assert_eq!(last.content.as_deref(), Some("Hello there"));
}

#[tokio::test]
async fn tool_call_fragments_are_assembled_by_index() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(sse_response(&[
            json!({"choices": [{"delta": {"tool_calls": [
                {"index": 0, "id": "call_abc", "type": "function",
                 "function": {"name": "sql_db_query", "arguments": ""}}
            ]}}]}),
            json!({"choices": [{"delta": {"tool_calls": [
                {"index": 0, "function": {"arguments": "{\"query\":"}}
            ]}}]}),
            json!({"choices": [{"delta": {"tool_calls": [
                {"index": 0, "function": {"arguments": " \"SELECT 1\"}"}}
            ]}}]}),
            json!({"choices": [{"delta": {"tool_calls": [
                {"index": 1, "id": "call_def", "type": "function",
                 "function": {"name": "sql_db_list_tables", "arguments": "{}"}}
            ]}}]}),
            json!({"choices": [{"delta": {}, "finish_reason": "tool_calls"}]}),
        ]))
        .mount(&server)
        .await;

    let mut llm = llm_for(&server);
    llm.set_tools(vec![create_tool("sql_db_query", "Run a query", ai::HashMap::new())]);
    let announced = Arc::new(Mutex::new(Vec::new()));

    let completion = llm
        .stream_completion("how many?", |chunk| {
            let announced = Arc::clone(&announced);
            async move {
                if let StreamChunk::ToolCall(call) = chunk {
                    announced.lock().unwrap().push(call.name);
                }
            }
        })
        .await
        .unwrap();

    assert_eq!(
        completion.tool_calls,
        vec![
            ToolCallInfo {
                id: "call_abc".to_string(),
                name: "sql_db_query".to_string(),
                arguments: "{\"query\": \"SELECT 1\"}".to_string(),
            },
            ToolCallInfo {
                id: "call_def".to_string(),
                name: "sql_db_list_tables".to_string(),
                arguments: "{}".to_string(),
            },
        ]
    );
    assert_eq!(*announced.lock().unwrap(), vec!["sql_db_query", "sql_db_list_tables"]);

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["stream"], json!(true));
    assert_eq!(body["model"], json!("test-model"));
    assert_eq!(body["tool_choice"], json!("auto"));
    assert_eq!(body["tools"][0]["function"]["name"], json!("sql_db_query"));
}

#[tokio::test]
async fn tool_results_are_sent_back_with_their_call_ids() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(sse_response(&[json!({"choices": [{"delta": {"tool_calls": [
            {"index": 0, "id": "call_1", "type": "function",
             "function": {"name": "sql_db_list_tables", "arguments": "{}"}}
        ]}}]})]))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(sse_response(&[
            json!({"choices": [{"delta": {"content": "There is one table."}}]}),
        ]))
        .mount(&server)
        .await;

    let mut llm = llm_for(&server);
    llm.set_system_prompt("You answer questions about a database.");
    let first = llm
        .stream_completion("what tables exist?", |_| async {})
        .await
        .unwrap();
    llm.add_tool_result(first.tool_calls[0].id.clone(), "STUDENT");
    let second = llm.continue_completion(|_| async {}).await.unwrap();

    assert_eq!(second.text, "There is one table.");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    let body: Value = serde_json::from_slice(&requests[1].body).unwrap();
    let messages = body["messages"].as_array().unwrap();
    let roles: Vec<&str> = messages
        .iter()
        .map(|message| message["role"].as_str().unwrap())
        .collect();
    assert_eq!(roles, ["system", "user", "assistant", "tool"]);
    assert_eq!(messages[2]["tool_calls"][0]["id"], json!("call_1"));
    assert_eq!(messages[3]["tool_call_id"], json!("call_1"));
    assert_eq!(messages[3]["content"], json!("STUDENT"));
}

#[tokio::test]
async fn api_errors_surface_with_status_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Invalid API Key", "type": "invalid_request_error"}
        })))
        .mount(&server)
        .await;

    let mut llm = llm_for(&server);
    let err = llm
        .stream_completion("hi", |_| async {})
        .await
        .unwrap_err();

    assert!(
        matches!(&err, LlmError::Api { status: 401, message } if message == "Invalid API Key"),
        "{err:?}"
    );
}

#[tokio::test]
async fn error_events_inside_the_stream_fail_the_turn() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(sse_response(&[
            json!({"choices": [{"delta": {"content": "partial"}}]}),
            json!({"error": {"message": "model overloaded"}}),
        ]))
        .mount(&server)
        .await;

    let mut llm = llm_for(&server);
    let err = llm
        .stream_completion("hi", |_| async {})
        .await
        .unwrap_err();

    assert!(matches!(&err, LlmError::Stream(message) if message == "model overloaded"));
}
