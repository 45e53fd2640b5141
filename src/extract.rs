//! Plain-text extraction for uploaded documents.
//!
//! TXT and Markdown are decoded as UTF-8; PDF goes through `pdf-extract`.
//! Extraction never panics: every failure is an [`ExtractError`] and the
//! ingestion pipeline records the file as failed and moves on.

use thiserror::Error;

use ragweave_core::models::{Document, FileType};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),
    #[error("file is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("no text extracted")]
    NoText,
}

/// Extract plain text from file bytes of the given type.
pub fn extract_text(bytes: &[u8], file_type: FileType) -> Result<String, ExtractError> {
    let text = match file_type {
        FileType::Txt | FileType::Markdown => String::from_utf8(bytes.to_vec())?,
        FileType::Pdf => extract_pdf(bytes)?,
        FileType::Unknown => {
            return Err(ExtractError::UnsupportedFileType(file_type.to_string()));
        }
    };
    if text.trim().is_empty() {
        return Err(ExtractError::NoText);
    }
    Ok(text)
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
}

/// Extract a file into a [`Document`] with the given id.
pub fn extract_document(doc_id: i64, file_name: &str, bytes: &[u8]) -> Result<Document, ExtractError> {
    let file_type = FileType::from_file_name(file_name);
    let text = extract_text(bytes, file_type)?;
    Ok(Document::new(doc_id, file_name, bytes.len() as u64, text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_type_returns_error() {
        let err = extract_document(1, "photo.png", b"\x89PNG").unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFileType(_)));
    }

    #[test]
    fn invalid_pdf_returns_error() {
        let err = extract_text(b"not a pdf", FileType::Pdf).unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }

    #[test]
    fn invalid_utf8_returns_error() {
        let err = extract_text(b"caf\xe9", FileType::Txt).unwrap_err();
        assert!(matches!(err, ExtractError::Encoding(_)));
    }

    #[test]
    fn blank_text_is_no_text() {
        let err = extract_text(b"  \n\t ", FileType::Markdown).unwrap_err();
        assert!(matches!(err, ExtractError::NoText));
    }

    #[test]
    fn markdown_document_metadata() {
        let doc = extract_document(3, "Review.MD", "# Title\n\nSolid build.".as_bytes()).unwrap();
        assert_eq!(doc.file_type, FileType::Markdown);
        assert_eq!(doc.file_size, 21);
        assert_eq!(doc.word_count, 4);
        assert_eq!(doc.extracted_text, "# Title\n\nSolid build.");
    }
}
