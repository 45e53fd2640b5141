//! Ingestion pipeline orchestration.
//!
//! Coordinates the full flow: connector → extraction → chunking → storage.
//! Files that fail extraction are logged and reported, never fatal.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use ragweave_core::chunk::chunk_documents_from;
use ragweave_core::models::{ChunkType, Document};
use ragweave_core::store::{ChunkStore, WriteMode};

use crate::config::Config;
use crate::connector_fs;
use crate::extract::extract_document;

/// A file that was scanned but could not be turned into a document.
#[derive(Debug, Clone, Serialize)]
pub struct IngestFailure {
    pub file: String,
    pub error: String,
}

/// Summary of one ingestion run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub files_scanned: usize,
    pub documents: usize,
    pub failures: Vec<IngestFailure>,
    pub chunks: usize,
    pub full_chunks: usize,
    pub split_chunks: usize,
    pub total_words: usize,
}

impl IngestReport {
    /// Mean words per chunk, or 0 when nothing was chunked.
    pub fn average_chunk_words(&self) -> f64 {
        if self.chunks == 0 {
            0.0
        } else {
            self.total_words as f64 / self.chunks as f64
        }
    }
}

pub async fn run_ingest(config: &Config, store: &dyn ChunkStore) -> Result<IngestReport> {
    let options = config.chunking.options();
    let mode = config.ingest.write_mode;

    let files = connector_fs::scan_filesystem(&config.ingest)?;
    let mut report = IngestReport {
        files_scanned: files.len(),
        ..IngestReport::default()
    };

    let (doc_offset, chunk_offset) = match mode {
        WriteMode::Replace => (0, 0),
        WriteMode::Append => (
            store.max_document_id().await?,
            store.max_chunk_id().await?,
        ),
    };

    let mut docs: Vec<Document> = Vec::with_capacity(files.len());
    for file in &files {
        let doc_id = doc_offset + docs.len() as i64 + 1;
        match extract_document(doc_id, &file.file_name, &file.bytes) {
            Ok(doc) => docs.push(doc),
            Err(e) => {
                warn!(file = %file.relative_path, error = %e, "skipping file");
                report.failures.push(IngestFailure {
                    file: file.relative_path.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    let chunks = chunk_documents_from(&docs, &options, chunk_offset + 1)
        .context("Failed to chunk documents")?;

    store
        .write_run(&docs, &chunks, mode)
        .await
        .context("Failed to write documents and chunks")?;

    report.documents = docs.len();
    report.chunks = chunks.len();
    for chunk in &chunks {
        match chunk.chunk_type {
            ChunkType::FullReview => report.full_chunks += 1,
            ChunkType::ChunkedReview => report.split_chunks += 1,
        }
        report.total_words += chunk.chunk_size;
    }

    info!(
        files = report.files_scanned,
        documents = report.documents,
        failed = report.failures.len(),
        chunks = report.chunks,
        full = report.full_chunks,
        split = report.split_chunks,
        "ingest complete"
    );

    Ok(report)
}
