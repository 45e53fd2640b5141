//! Storage abstraction for documents and chunks.
//!
//! The [`ChunkStore`] trait covers what ingestion needs to persist a run;
//! the [`Retriever`] trait covers what RAG answering needs to find context.
//! Backends: [`memory::InMemoryStore`] here, and the SQLite store in the
//! native crate.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

pub use memory::InMemoryStore;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::{Chunk, Document};

/// Whether a write clears existing rows first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    #[default]
    Replace,
    Append,
}

/// A chunk returned by retrieval, with the file it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetrievedChunk {
    pub text: String,
    pub source: String,
}

/// Persistence for extracted documents and their chunks.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`write_documents`](ChunkStore::write_documents) | Store documents (replace or append) |
/// | [`write_chunks`](ChunkStore::write_chunks) | Store chunks (replace or append) |
/// | [`write_run`](ChunkStore::write_run) | Store one run's documents and chunks atomically |
/// | [`max_document_id`](ChunkStore::max_document_id) | Highest stored `doc_id`, 0 when empty |
/// | [`max_chunk_id`](ChunkStore::max_chunk_id) | Highest stored `chunk_id`, 0 when empty |
/// | [`list_chunks`](ChunkStore::list_chunks) | All chunks ordered by `chunk_id` |
/// | [`count_chunks`](ChunkStore::count_chunks) | Number of stored chunks |
#[async_trait]
pub trait ChunkStore: Send + Sync {
    async fn write_documents(&self, docs: &[Document], mode: WriteMode) -> Result<()>;

    async fn write_chunks(&self, chunks: &[Chunk], mode: WriteMode) -> Result<()>;

    /// Write documents and chunks as one unit. On error neither table
    /// changes.
    async fn write_run(&self, docs: &[Document], chunks: &[Chunk], mode: WriteMode)
        -> Result<()>;

    async fn max_document_id(&self) -> Result<i64>;

    async fn max_chunk_id(&self) -> Result<i64>;

    async fn list_chunks(&self) -> Result<Vec<Chunk>>;

    async fn count_chunks(&self) -> Result<i64>;
}

/// Finds the chunks most relevant to a query.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Up to `limit` chunks, most relevant first.
    async fn retrieve(&self, query: &str, limit: usize) -> Result<Vec<RetrievedChunk>>;
}

/// Lowercased alphanumeric terms of a query, deduplicated in order.
pub fn query_terms(query: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for term in query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
    {
        if !terms.contains(&term) {
            terms.push(term);
        }
    }
    terms
}
