//! Agent client tests against a local mock of the `:run` endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use ragweave::agent_client::AgentClient;
use ragweave::config::{AgentConfig, AgentTransport};
use serde_json::{json, Value};

#[derive(Debug, Clone)]
struct Captured {
    path: String,
    authorization: Option<String>,
    body: Value,
}

#[derive(Clone)]
struct MockState {
    status: StatusCode,
    reply: String,
    captured: Arc<Mutex<Vec<Captured>>>,
}

async fn handle(
    State(state): State<MockState>,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    state.captured.lock().unwrap().push(Captured {
        path: uri.path().to_string(),
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_str(&body).unwrap_or(Value::Null),
    });
    (state.status, state.reply.clone()).into_response()
}

/// Serve `reply` with `status` for every request; returns the base URL.
async fn start_mock(status: StatusCode, reply: &str) -> (String, Arc<Mutex<Vec<Captured>>>) {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        status,
        reply: reply.to_string(),
        captured: captured.clone(),
    };
    let app = Router::new().fallback(handle).with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), captured)
}

fn agent_config(base_url: &str, transport: AgentTransport) -> AgentConfig {
    AgentConfig {
        base_url: base_url.to_string(),
        database: "SALES_INTELLIGENCE".to_string(),
        schema: "DATA".to_string(),
        name: "SALES_CONVERSATION_AGENT".to_string(),
        transport,
        timeout_secs: 10,
    }
}

#[tokio::test]
async fn test_stream_folds_events_until_done() {
    let body = [
        r#"data: {"event":"response","data":{"content":[{"thinking":{"text":"Look up deals"}}]}}"#,
        r#"data: {"event":"response.tool_use","data":{"name":"analyst","type":"cortex_analyst_text_to_sql","input":{"sql":"SELECT 1"}}}"#,
        "data: {not json",
        "data: [1, 2]",
        ": keep-alive",
        r#"data:{"event":"response.text.delta","data":{"text":"Top deal "}}"#,
        r#"data: {"event":"response.text.delta","data":{"text":"is Acme."}}"#,
        r#"data: {"event":"response.table","data":{"result_set":{"data":[["Acme",100]]}}}"#,
        "data: [DONE]",
        r#"data: {"event":"response.text.delta","data":{"text":" ignored"}}"#,
        "",
    ]
    .join("\r\n");
    let (base, captured) = start_mock(StatusCode::OK, &body).await;

    let client = AgentClient::new(
        &agent_config(&base, AgentTransport::Stream),
        Some("pat-123".to_string()),
    )
    .unwrap();
    let response = client.run("Which deal is largest?").await;

    assert_eq!(response.text, "Top deal is Acme.");
    assert_eq!(response.thinking, "Look up deals");
    assert_eq!(response.tool_name.as_deref(), Some("analyst"));
    assert_eq!(response.sql.as_deref(), Some("SELECT 1"));
    assert_eq!(response.row_count(), 1);
    assert_eq!(response.events.len(), 5);

    let requests = captured.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].path,
        "/api/v2/databases/SALES_INTELLIGENCE/schemas/DATA/agents/SALES_CONVERSATION_AGENT:run"
    );
    assert_eq!(
        requests[0].authorization.as_deref(),
        Some("Snowflake Token=\"pat-123\"")
    );
    assert_eq!(requests[0].body["stream"], true);
    assert_eq!(
        requests[0].body["messages"][0]["content"][0]["text"],
        "Which deal is largest?"
    );
}

#[tokio::test]
async fn test_batch_folds_json_array() {
    let events = json!([
        {"event": "response.text", "data": {"text": "Two reps closed deals."}},
        {"event": "response.tool_result", "data": {"content": [
            {"type": "json", "json": {"sql": "SELECT rep FROM deals", "result_set": {"data": [["Ann"], ["Bo"]]}}}
        ]}},
        {"event": "response.status", "data": {"status": "done"}}
    ]);
    let (base, captured) = start_mock(StatusCode::OK, &events.to_string()).await;

    let client = AgentClient::new(&agent_config(&base, AgentTransport::Batch), None).unwrap();
    let response = client.run("Who closed deals?").await;

    assert_eq!(response.text, "Two reps closed deals.");
    assert_eq!(response.sql.as_deref(), Some("SELECT rep FROM deals"));
    assert_eq!(response.row_count(), 2);
    assert_eq!(response.events.len(), 3);

    let requests = captured.lock().unwrap();
    assert_eq!(requests[0].authorization, None);
    assert_eq!(requests[0].body["stream"], false);
}

#[tokio::test]
async fn test_error_status_becomes_api_error_text() {
    let (base, _captured) =
        start_mock(StatusCode::INTERNAL_SERVER_ERROR, "warehouse suspended").await;

    let client = AgentClient::new(&agent_config(&base, AgentTransport::Stream), None).unwrap();
    let response = client.run("anything").await;

    assert_eq!(response.text, "API Error: warehouse suspended");
    assert!(response.events.is_empty());
    assert!(response.sql.is_none());
}

#[tokio::test]
async fn test_batch_body_not_an_array_is_exception() {
    let (base, _captured) = start_mock(StatusCode::OK, r#"{"event":"response.text"}"#).await;

    let client = AgentClient::new(&agent_config(&base, AgentTransport::Batch), None).unwrap();
    let response = client.run("anything").await;

    assert!(response.text.starts_with("Exception: "));
    assert_eq!(response.events.len(), 1);
    assert!(response.events[0]["error"].is_string());
}

#[tokio::test]
async fn test_in_band_error_event() {
    let body = concat!(
        "data: {\"event\":\"response.text.delta\",\"data\":{\"text\":\"Partial\"}}\n",
        "data: {\"event\":\"error\",\"data\":{\"error\":{\"message\":\"quota exceeded\"}}}\n",
        "data: [DONE]\n",
    );
    let (base, _captured) = start_mock(StatusCode::OK, body).await;

    let client = AgentClient::new(&agent_config(&base, AgentTransport::Stream), None).unwrap();
    let response = client.run("anything").await;

    assert_eq!(response.text, "Partial\n\nError: quota exceeded");
}
