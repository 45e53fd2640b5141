//! Word-window text chunker.
//!
//! Splits extracted document text into [`Chunk`]s of at most `chunk_size`
//! words, with `overlap` words shared between consecutive windows so that
//! a sentence cut at a boundary is still retrievable from either side.
//!
//! # Algorithm
//!
//! 1. Count whitespace-separated words.
//! 2. If the count is at or below `chunk_size`, emit the whole text as one
//!    `full_review` chunk (text kept verbatim).
//! 3. Otherwise slide a window of `chunk_size` words starting at offsets
//!    `0, step, 2·step, …` where `step = chunk_size - overlap`, rejoining
//!    each window with single spaces and tagging it `chunked_review`.
//! 4. Stop after the first window that reaches the last word.
//!
//! Chunk ids are assigned across a whole batch of documents, in document
//! order then window order, starting at 1.
//!
//! # Example
//!
//! ```rust
//! use ragweave_core::chunk::{chunk_documents, ChunkingOptions};
//! use ragweave_core::models::Document;
//!
//! let docs = vec![Document::new(1, "a.txt", 11, "short review".to_string())];
//! let chunks = chunk_documents(&docs, &ChunkingOptions::window(200, 50)).unwrap();
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].chunk_id, 1);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::models::{word_count, Chunk, ChunkType, Document};

/// How documents are turned into chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkingMode {
    /// Overlapping word windows for documents longer than `chunk_size`.
    #[default]
    Window,
    /// One chunk per document, whatever its length.
    PerDocument,
}

/// Validated chunking parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingOptions {
    pub mode: ChunkingMode,
    /// Maximum words per chunk.
    pub chunk_size: usize,
    /// Words shared by consecutive windows.
    pub overlap: usize,
}

impl ChunkingOptions {
    pub fn window(chunk_size: usize, overlap: usize) -> Self {
        Self {
            mode: ChunkingMode::Window,
            chunk_size,
            overlap,
        }
    }

    pub fn per_document() -> Self {
        Self {
            mode: ChunkingMode::PerDocument,
            chunk_size: usize::MAX,
            overlap: 0,
        }
    }

    /// Reject parameters under which the window would never advance.
    pub fn validate(&self) -> Result<()> {
        if self.mode == ChunkingMode::PerDocument {
            return Ok(());
        }
        if self.chunk_size == 0 {
            return Err(CoreError::InvalidConfiguration(
                "chunk_size must be > 0".to_string(),
            ));
        }
        if self.overlap >= self.chunk_size {
            return Err(CoreError::InvalidConfiguration(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }

    fn step(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

/// One chunk's text before ids are assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub word_count: usize,
    pub chunk_type: ChunkType,
}

/// Lazy sequence of overlapping word windows over one text.
///
/// Clones walk the same boundaries independently of each other.
#[derive(Debug, Clone)]
pub struct WordWindows<'a> {
    words: Vec<&'a str>,
    size: usize,
    step: usize,
    next_start: Option<usize>,
}

impl<'a> WordWindows<'a> {
    /// Build the window sequence. Fails when `overlap >= chunk_size`.
    pub fn new(text: &'a str, chunk_size: usize, overlap: usize) -> Result<Self> {
        let options = ChunkingOptions::window(chunk_size, overlap);
        options.validate()?;
        let words: Vec<&str> = text.split_whitespace().collect();
        let next_start = if words.is_empty() { None } else { Some(0) };
        Ok(Self {
            words,
            size: chunk_size,
            step: options.step(),
            next_start,
        })
    }
}

impl Iterator for WordWindows<'_> {
    /// Window words rejoined with single spaces, and the window's word count.
    type Item = (String, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.next_start?;
        let end = (start + self.size).min(self.words.len());
        let window = &self.words[start..end];

        self.next_start = if end >= self.words.len() {
            None
        } else {
            Some(start + self.step)
        };

        Some((window.join(" "), window.len()))
    }
}

/// Split one document's text into spans according to `options`.
///
/// # Guarantees
///
/// - At least one span is returned, even for empty text.
/// - Short texts (word count ≤ `chunk_size`) come back verbatim as a single
///   `full_review` span.
/// - Every windowed span except the last holds exactly `chunk_size` words,
///   and consecutive spans share exactly `overlap` words.
pub fn chunk_document(text: &str, options: &ChunkingOptions) -> Result<Vec<Span>> {
    options.validate()?;

    let words = word_count(text);
    if options.mode == ChunkingMode::PerDocument || words <= options.chunk_size {
        return Ok(vec![Span {
            text: text.to_string(),
            word_count: words,
            chunk_type: ChunkType::FullReview,
        }]);
    }

    let spans = WordWindows::new(text, options.chunk_size, options.overlap)?
        .map(|(text, word_count)| Span {
            text,
            word_count,
            chunk_type: ChunkType::ChunkedReview,
        })
        .collect();
    Ok(spans)
}

/// Chunk a batch of documents, numbering chunks from 1.
pub fn chunk_documents(docs: &[Document], options: &ChunkingOptions) -> Result<Vec<Chunk>> {
    chunk_documents_from(docs, options, 1)
}

/// Chunk a batch of documents, numbering chunks from `first_id`.
///
/// Ids increase by one per chunk across document boundaries.
pub fn chunk_documents_from(
    docs: &[Document],
    options: &ChunkingOptions,
    first_id: i64,
) -> Result<Vec<Chunk>> {
    options.validate()?;

    let mut chunks = Vec::new();
    let mut next_id = first_id;
    for doc in docs {
        for span in chunk_document(&doc.extracted_text, options)? {
            chunks.push(make_chunk(doc, next_id, span));
            next_id += 1;
        }
    }
    Ok(chunks)
}

fn make_chunk(doc: &Document, chunk_id: i64, span: Span) -> Chunk {
    Chunk {
        chunk_id,
        doc_id: doc.doc_id,
        file_name: doc.file_name.clone(),
        chunk_text: span.text,
        chunk_size: span.word_count,
        chunk_type: span.chunk_type,
    }
}
