//! The folded agent response.
//!
//! [`AgentResponse::push_record`] is the single reducer step shared by the
//! batch transport ([`fold_events`], [`AgentResponse::from_batch_body`]) and
//! the streaming transport ([`AgentStream`](super::sse::AgentStream)).

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::event::{AgentEvent, EventRecord};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AgentResponse {
    /// Answer text, accumulated from deltas or replaced wholesale.
    pub text: String,
    /// Reasoning trace; the first non-empty one wins.
    pub thinking: String,
    pub tool_name: Option<String>,
    pub tool_type: Option<String>,
    /// Generated SQL; the last non-empty one wins. Never executed here.
    pub sql: Option<String>,
    /// Result set as sent by the agent (`data` rows plus metadata).
    pub table_data: Option<Value>,
    /// Every well-formed record, in arrival order.
    pub events: Vec<Value>,
}

impl AgentResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Response for a non-2xx reply: the body becomes the text and no
    /// events are processed.
    pub fn transport_error(body: &str) -> Self {
        Self {
            text: format!("API Error: {}", body),
            ..Self::default()
        }
    }

    /// Response for a failure that prevented reading the event sequence.
    pub fn exception(message: &str) -> Self {
        Self {
            text: format!("Exception: {}", message),
            events: vec![serde_json::json!({ "error": message })],
            ..Self::default()
        }
    }

    /// Fold one raw record. Returns `false` (and changes nothing) when the
    /// record is malformed.
    pub fn push_record(&mut self, raw: Value) -> bool {
        let Some(record) = EventRecord::from_value(&raw) else {
            debug!(record = %raw, "skipping malformed agent event");
            return false;
        };
        let event = AgentEvent::decode(&record);
        self.events.push(raw);
        self.apply(event);
        true
    }

    /// Apply one decoded event.
    pub fn apply(&mut self, event: AgentEvent) {
        match event {
            AgentEvent::Response { thinking } => {
                if self.thinking.is_empty() {
                    if let Some(t) = thinking {
                        self.thinking = t;
                    }
                }
            }
            AgentEvent::TextDelta(delta) => self.text.push_str(&delta),
            AgentEvent::Text(text) => self.text = text,
            AgentEvent::ToolUse {
                name,
                tool_type,
                sql,
            } => {
                if name.is_some() {
                    self.tool_name = name;
                }
                if tool_type.is_some() {
                    self.tool_type = tool_type;
                }
                if sql.is_some() {
                    self.sql = sql;
                }
            }
            AgentEvent::ToolResult { sql, result_set } => {
                if sql.is_some() {
                    self.sql = sql;
                }
                if result_set.is_some() {
                    self.table_data = result_set;
                }
            }
            AgentEvent::Table { result_set } => {
                if result_set.is_some() {
                    self.table_data = result_set;
                }
            }
            AgentEvent::Error { message } => {
                self.text.push_str("\n\nError: ");
                self.text.push_str(&message);
            }
            AgentEvent::Ignored { kind } => {
                debug!(kind = %kind, "ignoring agent event");
            }
        }
    }

    /// Decode a batch body (a JSON array of records) and fold it.
    ///
    /// A body that is not a JSON array yields an [`exception`](Self::exception)
    /// response instead of an error.
    pub fn from_batch_body(body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(Value::Array(records)) => fold_events(records),
            Ok(_) => Self::exception("expected a JSON array of events"),
            Err(e) => Self::exception(&e.to_string()),
        }
    }

    /// Number of rows in `table_data`, if any.
    pub fn row_count(&self) -> usize {
        self.table_data
            .as_ref()
            .and_then(|rs| rs.get("data"))
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }
}

/// Fold an ordered sequence of raw records into one response.
pub fn fold_events<I>(records: I) -> AgentResponse
where
    I: IntoIterator<Item = Value>,
{
    let mut response = AgentResponse::new();
    for raw in records {
        response.push_record(raw);
    }
    response
}
