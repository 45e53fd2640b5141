//! # ragweave
//!
//! Document chunking, keyword retrieval and agent-response folding for
//! retrieval-augmented question answering.
//!
//! The pure pieces (word-window chunking, the agent event reducer, RAG
//! prompt assembly, storage traits) live in [`ragweave_core`]. This crate
//! adds the I/O around them: filesystem scanning, text extraction, a SQLite
//! FTS5 store and an HTTP client for a hosted agent.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌───────────┐
//! │ Filesystem  │──▶│ Extract +    │──▶│  SQLite   │
//! │ connector   │   │ word windows │   │  FTS5     │
//! └─────────────┘   └──────────────┘   └─────┬─────┘
//!                                            │ retrieve
//!                                            ▼
//!                 ┌──────────────┐     ┌───────────┐
//!                 │ Agent client │     │ RAG prompt│
//!                 │ SSE / batch  │     │ + answer  │
//!                 └──────────────┘     └───────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`connector_fs`] | Filesystem scan |
//! | [`extract`] | TXT / Markdown / PDF text extraction |
//! | [`ingest`] | Scan → extract → chunk → store |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite chunk store and retriever |
//! | [`agent_client`] | Agent `:run` endpoint client |

pub mod agent_client;
pub mod config;
pub mod connector_fs;
pub mod db;
pub mod extract;
pub mod ingest;
pub mod migrate;
pub mod sqlite_store;

pub use ragweave_core as core;
