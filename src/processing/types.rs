//! Outcome types and error definitions for the document pipeline.

use crate::{
    completion::CompletionError,
    extraction::ExtractionError,
    processing::prompt::TemplateError,
    storage::{StorageError, StoredDocument},
};
use thiserror::Error;

/// Errors emitted by the upload and summarize pipelines.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// Summarize was called without any text.
    #[error("No text was provided to summarize")]
    NoTextProvided,
    /// The uploaded document yielded no text.
    #[error("No text could be extracted from the PDF")]
    EmptyExtraction,
    /// Document or summary storage failed.
    #[error("Storage failure: {0}")]
    Storage(#[from] StorageError),
    /// Text extraction failed.
    #[error("Text extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
    /// Completion service failed or timed out.
    #[error("Completion failed: {0}")]
    Completion(#[from] CompletionError),
}

/// Errors raised while assembling the service at startup.
#[derive(Debug, Error)]
pub enum InitError {
    /// Storage directories could not be prepared.
    #[error("Failed to prepare storage: {0}")]
    Storage(#[from] StorageError),
    /// Prompt template is missing or malformed.
    #[error("Failed to load prompt template: {0}")]
    Template(#[from] TemplateError),
    /// Completion client could not be constructed.
    #[error("Failed to build completion client: {0}")]
    Completion(#[from] CompletionError),
}

/// Result of a successful upload.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    /// Text extracted from the stored document.
    pub extracted_text: String,
    /// Where and under which digest the document was stored.
    pub document: StoredDocument,
}

/// Result of a successful summarize call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryOutcome {
    /// Summary text, freshly generated or read from the cache.
    pub summary: String,
    /// Whether the summary came from the cache.
    pub cached: bool,
}
