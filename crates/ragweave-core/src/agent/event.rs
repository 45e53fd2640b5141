//! Tagged agent events.
//!
//! A raw record is `{"event": "<kind>", "data": {...}}`. [`AgentEvent::decode`]
//! maps it onto a closed set of variants, pulling out only the payload fields
//! the reducer needs. Kinds outside the set decode to [`AgentEvent::Ignored`].

use serde::Deserialize;
use serde_json::Value;

/// Tool type whose `tool_use` input carries generated SQL.
pub const SQL_TOOL_TYPE: &str = "cortex_analyst_text_to_sql";

/// One decoded record of the event stream.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventRecord {
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl EventRecord {
    /// Interpret a JSON value as a record. Anything but an object whose
    /// `event` (if present) is a string is malformed.
    pub fn from_value(value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    /// `response`: the planning/final response envelope, possibly carrying
    /// the agent's reasoning trace.
    Response { thinking: Option<String> },
    /// `response.text.delta`: an incremental piece of answer text.
    TextDelta(String),
    /// `response.text`: the complete answer text.
    Text(String),
    /// `response.tool_use`: the agent invoked a tool.
    ToolUse {
        name: Option<String>,
        tool_type: Option<String>,
        sql: Option<String>,
    },
    /// `response.tool_result`: output of a tool, possibly SQL and rows.
    ToolResult {
        sql: Option<String>,
        result_set: Option<Value>,
    },
    /// `response.table`: a result set to render.
    Table { result_set: Option<Value> },
    /// `error`: an upstream failure reported in-band.
    Error { message: String },
    /// Any other kind.
    Ignored { kind: String },
}

impl AgentEvent {
    pub fn decode(record: &EventRecord) -> Self {
        let data = &record.data;
        match record.event.as_str() {
            "response" => AgentEvent::Response {
                thinking: first_thinking(data),
            },
            "response.text.delta" => {
                AgentEvent::TextDelta(str_field(data, "text").unwrap_or_default())
            }
            "response.text" => AgentEvent::Text(whole_text(data.get("text"))),
            "response.tool_use" => {
                let tool_type = str_field(data, "type");
                let sql = if tool_type.as_deref() == Some(SQL_TOOL_TYPE) {
                    data.get("input")
                        .and_then(|input| str_field(input, "sql"))
                        .filter(|s| !s.is_empty())
                } else {
                    None
                };
                AgentEvent::ToolUse {
                    name: str_field(data, "name"),
                    tool_type,
                    sql,
                }
            }
            "response.tool_result" => {
                let mut sql = None;
                let mut result_set = None;
                for item in json_items(data) {
                    if let Some(s) = str_field(item, "sql").filter(|s| !s.is_empty()) {
                        sql = Some(s);
                    }
                    if let Some(rs) = item.get("result_set") {
                        result_set = Some(rs.clone());
                    }
                }
                AgentEvent::ToolResult { sql, result_set }
            }
            "response.table" => AgentEvent::Table {
                result_set: data.get("result_set").filter(|rs| has_rows(rs)).cloned(),
            },
            "error" => AgentEvent::Error {
                message: error_message(data),
            },
            other => AgentEvent::Ignored {
                kind: other.to_string(),
            },
        }
    }
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

/// The first `content[]` item carrying a `thinking` key decides the trace.
fn first_thinking(data: &Value) -> Option<String> {
    let items = data.get("content")?.as_array()?;
    let thinking = items.iter().find_map(|item| item.get("thinking"))?;
    let text = match thinking {
        Value::Object(obj) => obj.get("text").and_then(Value::as_str).unwrap_or_default(),
        Value::String(s) => s.as_str(),
        _ => "",
    };
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn whole_text(text: Option<&Value>) -> String {
    match text {
        None | Some(Value::Null) => String::new(),
        Some(Value::Object(obj)) => obj
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Payloads of `content[]` items typed `json`.
fn json_items(data: &Value) -> impl Iterator<Item = &Value> {
    data.get("content")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|item| item.get("type").and_then(Value::as_str) == Some("json"))
        .filter_map(|item| item.get("json"))
}

fn has_rows(result_set: &Value) -> bool {
    result_set
        .get("data")
        .and_then(Value::as_array)
        .is_some_and(|rows| !rows.is_empty())
}

fn error_message(data: &Value) -> String {
    match data.get("error") {
        Some(Value::Object(err)) => err
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Unknown error")
            .to_string(),
        Some(Value::String(s)) => s.clone(),
        _ => "Unknown error".to_string(),
    }
}
