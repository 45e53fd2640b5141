//! Agent event stream folding.
//!
//! A remote agent run emits an ordered sequence of tagged records
//! (`response`, `response.text.delta`, `response.tool_use`, …). This module
//! reduces that sequence into one [`AgentResponse`], whether the records
//! arrive as a decoded JSON array or as a `data:` line stream.
//!
//! ```rust
//! use ragweave_core::agent::fold_sse_text;
//!
//! let body = "data: {\"event\":\"response.text.delta\",\"data\":{\"text\":\"Hi\"}}\n\
//!             data: [DONE]\n";
//! assert_eq!(fold_sse_text(body).text, "Hi");
//! ```
//!
//! The reducer never executes SQL and never performs I/O.

pub mod event;
pub mod response;
pub mod sse;

pub use event::{AgentEvent, EventRecord, SQL_TOOL_TYPE};
pub use response::{fold_events, AgentResponse};
pub use sse::{fold_sse_text, AgentStream, SseDecoder};
