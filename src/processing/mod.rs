//! Document pipeline: storage, extraction, prompt rendering, and cached summarization.

pub mod prompt;
mod service;
pub mod types;

pub use prompt::{PromptTemplate, TemplateError};
pub use service::{CompletionSettings, DocumentApi, DocumentService};
pub use types::{InitError, ProcessingError, SummaryOutcome, UploadOutcome};
