//! # ragweave core
//!
//! Shared, I/O-free logic for ragweave: document and chunk models, the
//! word-window chunker, the agent event reducer, RAG prompt assembly, and
//! the storage and retrieval traits.
//!
//! This crate contains no tokio, sqlx, HTTP, or filesystem code. Everything
//! here is a deterministic function of its inputs, testable without a
//! database or a network.

pub mod agent;
pub mod chunk;
pub mod error;
pub mod models;
pub mod rag;
pub mod store;

pub use error::CoreError;
