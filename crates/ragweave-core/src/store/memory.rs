//! In-memory [`ChunkStore`] and [`Retriever`] for tests and embedding.
//!
//! Uses `Vec`s behind `std::sync::RwLock`. Retrieval ranks chunks by how
//! many distinct query terms they contain; ties keep `chunk_id` order.

use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::{Chunk, Document};

use super::{query_terms, ChunkStore, RetrievedChunk, Retriever, WriteMode};

#[derive(Default)]
pub struct InMemoryStore {
    docs: RwLock<Vec<Document>>,
    chunks: RwLock<Vec<Chunk>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of stored documents.
    pub fn documents(&self) -> Result<Vec<Document>> {
        Ok(self
            .docs
            .read()
            .map_err(|_| anyhow!("document lock poisoned"))?
            .clone())
    }
}

fn write_rows<T: Clone>(lock: &RwLock<Vec<T>>, rows: &[T], mode: WriteMode) -> Result<()> {
    let mut stored = lock.write().map_err(|_| anyhow!("store lock poisoned"))?;
    apply_rows(&mut stored, rows, mode);
    Ok(())
}

fn apply_rows<T: Clone>(stored: &mut Vec<T>, rows: &[T], mode: WriteMode) {
    if mode == WriteMode::Replace {
        stored.clear();
    }
    stored.extend_from_slice(rows);
}

#[async_trait]
impl ChunkStore for InMemoryStore {
    async fn write_documents(&self, docs: &[Document], mode: WriteMode) -> Result<()> {
        write_rows(&self.docs, docs, mode)
    }

    async fn write_chunks(&self, chunks: &[Chunk], mode: WriteMode) -> Result<()> {
        write_rows(&self.chunks, chunks, mode)
    }

    async fn write_run(&self, docs: &[Document], chunks: &[Chunk], mode: WriteMode) -> Result<()> {
        // Both locks are held before either table changes.
        let mut stored_docs = self.docs.write().map_err(|_| anyhow!("store lock poisoned"))?;
        let mut stored_chunks = self
            .chunks
            .write()
            .map_err(|_| anyhow!("store lock poisoned"))?;
        apply_rows(&mut stored_docs, docs, mode);
        apply_rows(&mut stored_chunks, chunks, mode);
        Ok(())
    }

    async fn max_document_id(&self) -> Result<i64> {
        let docs = self.docs.read().map_err(|_| anyhow!("store lock poisoned"))?;
        Ok(docs.iter().map(|d| d.doc_id).max().unwrap_or(0))
    }

    async fn max_chunk_id(&self) -> Result<i64> {
        let chunks = self.chunks.read().map_err(|_| anyhow!("store lock poisoned"))?;
        Ok(chunks.iter().map(|c| c.chunk_id).max().unwrap_or(0))
    }

    async fn list_chunks(&self) -> Result<Vec<Chunk>> {
        let mut chunks = self
            .chunks
            .read()
            .map_err(|_| anyhow!("store lock poisoned"))?
            .clone();
        chunks.sort_by_key(|c| c.chunk_id);
        Ok(chunks)
    }

    async fn count_chunks(&self) -> Result<i64> {
        let chunks = self.chunks.read().map_err(|_| anyhow!("store lock poisoned"))?;
        Ok(chunks.len() as i64)
    }
}

#[async_trait]
impl Retriever for InMemoryStore {
    async fn retrieve(&self, query: &str, limit: usize) -> Result<Vec<RetrievedChunk>> {
        let terms = query_terms(query);
        if terms.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let chunks = self.list_chunks().await?;
        let mut scored: Vec<(usize, &Chunk)> = chunks
            .iter()
            .filter_map(|c| {
                let words = query_terms(&c.chunk_text);
                let hits = terms.iter().filter(|t| words.contains(*t)).count();
                (hits > 0).then_some((hits, c))
            })
            .collect();
        // Stable sort keeps chunk_id order among equal scores.
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(_, c)| RetrievedChunk {
                text: c.chunk_text.clone(),
                source: c.file_name.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{chunk_documents, ChunkingOptions};

    fn docs() -> Vec<Document> {
        vec![
            Document::new(1, "battery.txt", 0, "The battery lasts two full days".to_string()),
            Document::new(2, "screen.md", 0, "Screen is bright, battery is average".to_string()),
            Document::new(3, "box.txt", 0, "Packaging arrived dented".to_string()),
        ]
    }

    #[tokio::test]
    async fn test_replace_and_append() {
        let store = InMemoryStore::new();
        let chunks = chunk_documents(&docs(), &ChunkingOptions::window(200, 50)).unwrap();

        store.write_chunks(&chunks, WriteMode::Replace).await.unwrap();
        store.write_chunks(&chunks[..1], WriteMode::Append).await.unwrap();
        assert_eq!(store.count_chunks().await.unwrap(), 4);

        store.write_chunks(&chunks[..2], WriteMode::Replace).await.unwrap();
        assert_eq!(store.count_chunks().await.unwrap(), 2);
        assert_eq!(store.max_chunk_id().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_write_run_replaces_both_tables() {
        let store = InMemoryStore::new();
        let all = docs();
        let chunks = chunk_documents(&all, &ChunkingOptions::window(200, 50)).unwrap();
        store.write_run(&all, &chunks, WriteMode::Replace).await.unwrap();

        let first = &all[..1];
        let first_chunks = chunk_documents(first, &ChunkingOptions::window(200, 50)).unwrap();
        store
            .write_run(first, &first_chunks, WriteMode::Replace)
            .await
            .unwrap();
        assert_eq!(store.documents().unwrap().len(), 1);
        assert_eq!(store.count_chunks().await.unwrap(), 1);

        store.write_run(&all, &chunks, WriteMode::Append).await.unwrap();
        assert_eq!(store.documents().unwrap().len(), 4);
        assert_eq!(store.count_chunks().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_max_ids_empty() {
        let store = InMemoryStore::new();
        assert_eq!(store.max_document_id().await.unwrap(), 0);
        assert_eq!(store.max_chunk_id().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_documents_roundtrip() {
        let store = InMemoryStore::new();
        store.write_documents(&docs(), WriteMode::Append).await.unwrap();
        assert_eq!(store.max_document_id().await.unwrap(), 3);
        assert_eq!(store.documents().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_retrieve_ranks_by_term_hits() {
        let store = InMemoryStore::new();
        let chunks = chunk_documents(&docs(), &ChunkingOptions::window(200, 50)).unwrap();
        store.write_chunks(&chunks, WriteMode::Replace).await.unwrap();

        let hits = store.retrieve("battery screen", 5).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].source, "screen.md");
        assert_eq!(hits[1].source, "battery.txt");

        let hits = store.retrieve("battery", 1).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].source, "battery.txt");

        assert!(store.retrieve("?!", 3).await.unwrap().is_empty());
    }
}
