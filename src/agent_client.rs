//! HTTP client for a hosted agent's `:run` endpoint.
//!
//! The client posts a single user message and folds whatever comes back
//! into an [`AgentResponse`]. It never returns an error from
//! [`AgentClient::run`]: transport failures become response text so the
//! caller always has something to render.

use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use ragweave_core::agent::{AgentResponse, AgentStream};

use crate::config::{AgentConfig, AgentTransport};

pub struct AgentClient {
    http: reqwest::Client,
    endpoint: String,
    transport: AgentTransport,
    token: Option<String>,
}

impl AgentClient {
    /// Build a client for `config`. `token` is sent verbatim when present.
    pub fn new(config: &AgentConfig, token: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            endpoint: config.endpoint(),
            transport: config.transport,
            token,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn request_body(&self, query: &str) -> Value {
        json!({
            "messages": [{
                "role": "user",
                "content": [{ "type": "text", "text": query }],
            }],
            "stream": self.transport == AgentTransport::Stream,
        })
    }

    /// Run the agent on `query` and fold its events.
    pub async fn run(&self, query: &str) -> AgentResponse {
        let mut request = self
            .http
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&self.request_body(query));
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Snowflake Token=\"{}\"", token));
        }
        if self.transport == AgentTransport::Stream {
            request = request.header("Accept", "text/event-stream");
        }

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(endpoint = %self.endpoint, error = %e, "agent request failed");
                return AgentResponse::exception(&e.to_string());
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(endpoint = %self.endpoint, %status, "agent returned error status");
            return AgentResponse::transport_error(&body);
        }

        let folded = match self.transport {
            AgentTransport::Stream => read_stream(response).await,
            AgentTransport::Batch => read_batch(response).await,
        };

        match folded {
            Ok(result) => {
                info!(
                    events = result.events.len(),
                    has_sql = result.sql.is_some(),
                    rows = result.row_count(),
                    "agent run complete"
                );
                result
            }
            Err(e) => {
                warn!(endpoint = %self.endpoint, error = %e, "agent response unreadable");
                AgentResponse::exception(&e.to_string())
            }
        }
    }
}

async fn read_stream(mut response: reqwest::Response) -> reqwest::Result<AgentResponse> {
    let mut stream = AgentStream::new();
    while let Some(bytes) = response.chunk().await? {
        stream.feed(&bytes);
        if stream.is_done() {
            debug!("agent stream terminated");
            break;
        }
    }
    Ok(stream.finish())
}

async fn read_batch(response: reqwest::Response) -> reqwest::Result<AgentResponse> {
    let body = response.text().await?;
    Ok(AgentResponse::from_batch_body(&body))
}
