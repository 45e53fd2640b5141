//! Core data models.
//!
//! These types represent the documents and chunks that flow through the
//! extraction, chunking, and storage pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Document format, derived from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileType {
    #[serde(rename = "TXT")]
    Txt,
    Markdown,
    #[serde(rename = "PDF")]
    Pdf,
    Unknown,
}

impl FileType {
    /// Classify a file by its extension (case-insensitive).
    pub fn from_file_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".txt") {
            FileType::Txt
        } else if lower.ends_with(".md") {
            FileType::Markdown
        } else if lower.ends_with(".pdf") {
            FileType::Pdf
        } else {
            FileType::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Txt => "TXT",
            FileType::Markdown => "Markdown",
            FileType::Pdf => "PDF",
            FileType::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file whose text has been extracted. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub doc_id: i64,
    pub file_name: String,
    pub file_type: FileType,
    pub file_size: u64,
    pub extracted_text: String,
    pub word_count: usize,
    pub char_count: usize,
}

impl Document {
    /// Build a document, computing word and character counts from `text`.
    ///
    /// Words are whitespace-separated runs; characters are Unicode scalar
    /// values, not bytes.
    pub fn new(doc_id: i64, file_name: &str, file_size: u64, text: String) -> Self {
        Self {
            doc_id,
            file_name: file_name.to_string(),
            file_type: FileType::from_file_name(file_name),
            file_size,
            word_count: word_count(&text),
            char_count: text.chars().count(),
            extracted_text: text,
        }
    }
}

/// Number of whitespace-separated words in `text`.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Whether a chunk holds a whole document or one window of a longer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkType {
    FullReview,
    ChunkedReview,
}

impl ChunkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkType::FullReview => "full_review",
            ChunkType::ChunkedReview => "chunked_review",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "full_review" => Some(ChunkType::FullReview),
            "chunked_review" => Some(ChunkType::ChunkedReview),
            _ => None,
        }
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A word-bounded span of a document, ready for indexing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: i64,
    pub doc_id: i64,
    pub file_name: String,
    pub chunk_text: String,
    /// Number of words in `chunk_text`.
    pub chunk_size: usize,
    pub chunk_type: ChunkType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_from_extension() {
        assert_eq!(FileType::from_file_name("notes.TXT"), FileType::Txt);
        assert_eq!(FileType::from_file_name("README.md"), FileType::Markdown);
        assert_eq!(FileType::from_file_name("report.Pdf"), FileType::Pdf);
        assert_eq!(FileType::from_file_name("image.png"), FileType::Unknown);
        assert_eq!(FileType::from_file_name("no_extension"), FileType::Unknown);
    }

    #[test]
    fn test_file_type_labels_match_serde() {
        for ft in [FileType::Txt, FileType::Markdown, FileType::Pdf, FileType::Unknown] {
            assert_eq!(serde_json::to_value(ft).unwrap(), ft.as_str());
        }
    }

    #[test]
    fn test_document_counts() {
        let doc = Document::new(7, "review.txt", 42, "Great  product,\nwould buy — again".to_string());
        assert_eq!(doc.doc_id, 7);
        assert_eq!(doc.file_type, FileType::Txt);
        assert_eq!(doc.word_count, 6);
        assert_eq!(doc.char_count, 33);
    }

    #[test]
    fn test_chunk_type_serializes_snake_case() {
        let json = serde_json::to_string(&ChunkType::ChunkedReview).unwrap();
        assert_eq!(json, "\"chunked_review\"");
        assert_eq!(ChunkType::parse("full_review"), Some(ChunkType::FullReview));
        assert_eq!(ChunkType::parse("other"), None);
    }
}
