//! Document service coordinating storage, extraction, completion, and the summary cache.

use crate::{
    completion::{CompletionClient, CompletionError, CompletionRequest, OpenAiCompletionClient},
    config::Config,
    extraction::{PdfTextExtractor, TextExtractor},
    metrics::{MetricsSnapshot, ServiceMetrics},
    processing::{
        prompt::PromptTemplate,
        types::{InitError, ProcessingError, SummaryOutcome, UploadOutcome},
    },
    storage::{ContentStore, SummaryCache, SummaryRecord},
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Parameters applied to every completion call.
#[derive(Debug, Clone)]
pub struct CompletionSettings {
    /// Model identifier sent to the completion service.
    pub model: String,
    /// Deadline for a single completion call.
    pub timeout: Duration,
}

/// Runs the upload and summarize pipelines.
///
/// The service owns the document store, the summary cache, and handles to the two external
/// collaborators (text extraction and completion). Build it once at startup and share it
/// through an `Arc`; the filesystem is the only state shared between concurrent requests.
pub struct DocumentService {
    content_store: ContentStore,
    summary_cache: SummaryCache,
    extractor: Box<dyn TextExtractor>,
    completion_client: Box<dyn CompletionClient>,
    prompt: PromptTemplate,
    settings: CompletionSettings,
    metrics: Arc<ServiceMetrics>,
}

/// Abstraction over the document pipeline used by the HTTP surface.
#[async_trait]
pub trait DocumentApi: Send + Sync {
    /// Store an uploaded document and extract its text.
    async fn upload_document(
        &self,
        bytes: Vec<u8>,
        declared_name: String,
    ) -> Result<UploadOutcome, ProcessingError>;

    /// Summarize text addressed by a logical filename, consulting the cache first.
    async fn summarize(
        &self,
        text: String,
        filename: String,
    ) -> Result<SummaryOutcome, ProcessingError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl DocumentService {
    /// Assemble a service from explicit components.
    pub fn new(
        content_store: ContentStore,
        summary_cache: SummaryCache,
        extractor: Box<dyn TextExtractor>,
        completion_client: Box<dyn CompletionClient>,
        prompt: PromptTemplate,
        settings: CompletionSettings,
    ) -> Self {
        Self {
            content_store,
            summary_cache,
            extractor,
            completion_client,
            prompt,
            settings,
            metrics: Arc::new(ServiceMetrics::new()),
        }
    }

    /// Build the production service: PDF extraction, OpenAI completions, on-disk stores.
    ///
    /// Fails when the storage directories cannot be created or the prompt template is missing
    /// or malformed, so those problems surface before the server accepts traffic.
    pub async fn from_config(config: &Config) -> Result<Self, InitError> {
        let prompt = PromptTemplate::load(&config.prompt_template_path).await?;
        let content_store = ContentStore::open(&config.document_dir).await?;
        let summary_cache = SummaryCache::open(&config.summary_dir).await?;
        let completion_client =
            OpenAiCompletionClient::new(&config.openai_base_url, &config.openai_api_key)?;
        tracing::info!(
            document_dir = %config.document_dir.display(),
            summary_dir = %config.summary_dir.display(),
            model = %config.completion_model,
            "Document service initialized"
        );

        Ok(Self::new(
            content_store,
            summary_cache,
            Box::new(PdfTextExtractor::new()),
            Box::new(completion_client),
            prompt,
            CompletionSettings {
                model: config.completion_model.clone(),
                timeout: config.completion_timeout,
            },
        ))
    }

    /// Persist the upload under its content digest and return the extracted text.
    pub async fn upload_document(
        &self,
        bytes: &[u8],
        declared_name: &str,
    ) -> Result<UploadOutcome, ProcessingError> {
        let document = self.content_store.store(bytes, declared_name).await?;
        self.metrics.record_upload(document.deduplicated);

        let extracted_text = self.extractor.extract(&document.path).await?;
        if extracted_text.is_empty() {
            tracing::warn!(
                digest = %document.digest,
                declared_name,
                "Document produced no text"
            );
            return Err(ProcessingError::EmptyExtraction);
        }

        tracing::info!(
            digest = %document.digest,
            declared_name,
            deduplicated = document.deduplicated,
            chars = extracted_text.chars().count(),
            "Upload processed"
        );
        Ok(UploadOutcome {
            extracted_text,
            document,
        })
    }

    /// Return the summary for `filename`, generating and caching it on a miss.
    ///
    /// A cached record is returned as-is even when `text` differs from the text it was built
    /// from. Failed completions are never cached, and a failure to write the cache does not
    /// fail the request.
    pub async fn summarize(
        &self,
        text: &str,
        filename: &str,
    ) -> Result<SummaryOutcome, ProcessingError> {
        if text.is_empty() {
            return Err(ProcessingError::NoTextProvided);
        }

        if let Some(record) = self.summary_cache.lookup(filename).await? {
            self.metrics.record_cache_hit();
            tracing::info!(filename, "Summary cache hit");
            return Ok(SummaryOutcome {
                summary: record.summary,
                cached: true,
            });
        }

        let request =
            CompletionRequest::new(self.settings.model.clone(), self.prompt.render(text));
        tracing::debug!(
            filename,
            model = %request.model,
            prompt_chars = request.prompt.chars().count(),
            "Requesting completion"
        );
        let completion = tokio::time::timeout(
            self.settings.timeout,
            self.completion_client.complete(request),
        )
        .await
        .unwrap_or_else(|_| Err(CompletionError::Timeout(self.settings.timeout)));

        let summary = match completion {
            Ok(summary) => summary,
            Err(error) => {
                self.metrics.record_completion_failure();
                tracing::warn!(filename, error = %error, "Completion failed");
                return Err(error.into());
            }
        };
        self.metrics.record_summary_generated();

        let record = SummaryRecord::new(filename.to_string(), text.to_string(), summary);
        if let Err(error) = self.summary_cache.put(&record).await {
            tracing::error!(filename, error = %error, "Failed to cache summary");
        } else {
            tracing::info!(filename, title = %record.title, "Summary generated and cached");
        }

        Ok(SummaryOutcome {
            summary: record.summary,
            cached: false,
        })
    }

    /// Return the current service metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[async_trait]
impl DocumentApi for DocumentService {
    async fn upload_document(
        &self,
        bytes: Vec<u8>,
        declared_name: String,
    ) -> Result<UploadOutcome, ProcessingError> {
        DocumentService::upload_document(self, &bytes, &declared_name).await
    }

    async fn summarize(
        &self,
        text: String,
        filename: String,
    ) -> Result<SummaryOutcome, ProcessingError> {
        DocumentService::summarize(self, &text, &filename).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        DocumentService::metrics_snapshot(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::ExtractionError;
    use std::path::Path;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedExtractor(String);

    #[async_trait]
    impl TextExtractor for FixedExtractor {
        async fn extract(&self, _path: &Path) -> Result<String, ExtractionError> {
            Ok(self.0.clone())
        }
    }

    #[derive(Default)]
    struct RecordingCompletion {
        prompts: Mutex<Vec<CompletionRequest>>,
    }

    #[async_trait]
    impl CompletionClient for Arc<RecordingCompletion> {
        async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
            self.prompts.lock().expect("lock").push(request);
            Ok("Summary".into())
        }
    }

    struct StalledCompletion(AtomicUsize);

    #[async_trait]
    impl CompletionClient for Arc<StalledCompletion> {
        async fn complete(&self, _request: CompletionRequest) -> Result<String, CompletionError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("too late".into())
        }
    }

    async fn service_with(
        root: &Path,
        extracted: &str,
        completion: Box<dyn CompletionClient>,
        timeout: Duration,
    ) -> DocumentService {
        DocumentService::new(
            ContentStore::open(root.join("docs")).await.expect("store"),
            SummaryCache::open(root.join("summaries")).await.expect("cache"),
            Box::new(FixedExtractor(extracted.into())),
            completion,
            PromptTemplate::parse("Summarize this:\n{text}").expect("template"),
            CompletionSettings {
                model: "gpt-4o-mini".into(),
                timeout,
            },
        )
    }

    #[tokio::test]
    async fn summarize_renders_prompt_with_fixed_parameters() {
        let dir = tempfile::tempdir().expect("tempdir");
        let completion = Arc::new(RecordingCompletion::default());
        let service = service_with(
            dir.path(),
            "",
            Box::new(completion.clone()),
            Duration::from_secs(5),
        )
        .await;

        let outcome = service.summarize("Hello", "a.pdf").await.expect("summary");

        assert_eq!(outcome.summary, "Summary");
        assert!(!outcome.cached);
        let prompts = completion.prompts.lock().expect("lock");
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].prompt, "Summarize this:\nHello");
        assert_eq!(prompts[0].model, "gpt-4o-mini");
        assert_eq!(prompts[0].max_tokens, 5000);
        assert_eq!(prompts[0].temperature, 0.7);
    }

    #[tokio::test]
    async fn timed_out_completion_is_not_cached() {
        let dir = tempfile::tempdir().expect("tempdir");
        let completion = Arc::new(StalledCompletion(AtomicUsize::new(0)));
        let service = service_with(
            dir.path(),
            "",
            Box::new(completion.clone()),
            Duration::from_millis(50),
        )
        .await;

        let error = service
            .summarize("Hello", "slow.pdf")
            .await
            .expect_err("timeout");

        assert!(matches!(
            error,
            ProcessingError::Completion(CompletionError::Timeout(_))
        ));
        assert_eq!(completion.0.load(Ordering::SeqCst), 1);
        assert!(
            service
                .summary_cache
                .lookup("slow.pdf")
                .await
                .expect("lookup")
                .is_none()
        );
        assert_eq!(service.metrics_snapshot().completion_failures, 1);
    }

    #[tokio::test]
    async fn whitespace_only_extraction_is_returned_verbatim() {
        let dir = tempfile::tempdir().expect("tempdir");
        let service = service_with(
            dir.path(),
            " \n\t",
            Box::new(Arc::new(RecordingCompletion::default())),
            Duration::from_secs(5),
        )
        .await;

        let outcome = service
            .upload_document(b"%PDF-1.4 scanned", "scan.pdf")
            .await
            .expect("whitespace is still text");
        assert_eq!(outcome.extracted_text, " \n\t");
    }

    #[tokio::test]
    async fn zero_length_extraction_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let service = service_with(
            dir.path(),
            "",
            Box::new(Arc::new(RecordingCompletion::default())),
            Duration::from_secs(5),
        )
        .await;

        let error = service
            .upload_document(b"%PDF-1.4 image only", "scan.pdf")
            .await
            .expect_err("empty extraction");
        assert!(matches!(error, ProcessingError::EmptyExtraction));
    }

    #[tokio::test]
    async fn whitespace_text_is_sent_for_summarization() {
        let dir = tempfile::tempdir().expect("tempdir");
        let completion = Arc::new(RecordingCompletion::default());
        let service = service_with(
            dir.path(),
            "",
            Box::new(completion.clone()),
            Duration::from_secs(5),
        )
        .await;

        let outcome = service.summarize("  \n", "blank.pdf").await.expect("summary");

        assert_eq!(outcome.summary, "Summary");
        assert_eq!(completion.prompts.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn failed_cache_write_still_returns_summary() {
        let dir = tempfile::tempdir().expect("tempdir");
        let completion = Arc::new(RecordingCompletion::default());
        let service = service_with(
            dir.path(),
            "",
            Box::new(completion.clone()),
            Duration::from_secs(5),
        )
        .await;
        tokio::fs::remove_dir_all(dir.path().join("summaries"))
            .await
            .expect("remove summaries dir");

        let outcome = service
            .summarize("Hello", "unsaved.pdf")
            .await
            .expect("summary despite cache failure");

        assert_eq!(outcome.summary, "Summary");
        assert!(!outcome.cached);
        assert_eq!(service.metrics_snapshot().summaries_generated, 1);
        assert!(!dir.path().join("summaries").exists());
    }
}
