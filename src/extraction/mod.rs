//! Text extraction from stored documents.
//!
//! PDF parsing is CPU-bound and synchronous, so the PDF extractor runs on the blocking pool to
//! keep the async workers free for other requests.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Errors raised while turning a stored document into text.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Stored document could not be read back from disk.
    #[error("Failed to read document: {0}")]
    Io(#[from] std::io::Error),
    /// Document bytes were not a parseable PDF.
    #[error("Failed to extract text: {0}")]
    Parse(String),
    /// Extraction task panicked or was cancelled.
    #[error("Extraction task aborted: {0}")]
    Aborted(String),
}

/// Interface implemented by document-to-text extractors.
///
/// An empty string is a valid result; callers decide whether that is an error.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract all text from the document at `path`, pages concatenated in order.
    async fn extract(&self, path: &Path) -> Result<String, ExtractionError>;
}

/// Extractor backed by the `pdf-extract` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    /// Construct a new PDF extractor.
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
        let bytes = tokio::fs::read(path).await?;
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
            .await
            .map_err(|error| ExtractionError::Aborted(error.to_string()))?
            .map_err(|error| ExtractionError::Parse(error.to_string()))?;
        tracing::debug!(
            path = %path.display(),
            chars = text.chars().count(),
            "Extracted document text"
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn non_pdf_bytes_fail_to_extract() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("garbage.pdf");
        tokio::fs::write(&path, b"definitely not a pdf")
            .await
            .expect("write");

        let error = PdfTextExtractor::new()
            .extract(&path)
            .await
            .expect_err("garbage input");
        assert!(matches!(
            error,
            ExtractionError::Parse(_) | ExtractionError::Aborted(_)
        ));
    }

    #[tokio::test]
    async fn missing_document_is_an_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let error = PdfTextExtractor::new()
            .extract(&dir.path().join("absent.pdf"))
            .await
            .expect_err("missing file");
        assert!(matches!(error, ExtractionError::Io(_)));
    }
}
