//! HTTP surface for Summarist.
//!
//! This module exposes a compact Axum router:
//!
//! - `POST /upload-pdf/` – Multipart upload (field `file`). Stores the PDF under the MD5 of its
//!   bytes and returns `{ "extracted_text", "filename" }` where `filename` is `{digest}.pdf`.
//! - `POST /summarize-text/` – JSON `{ "text", "filename" }`. Returns `{ "summary" }`, served
//!   from the on-disk cache when the filename has been summarized before.
//! - `GET /metrics` – Upload and summarization counters.
//! - `GET /commands` – Machine-readable command catalog.
//!
//! Every failure is reported as `{ "error": message }` with a non-2xx status.

use crate::completion::CompletionError;
use crate::processing::{DocumentApi, ProcessingError};
use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, State,
        multipart::MultipartError,
        rejection::JsonRejection,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Multipart field carrying the uploaded document.
const UPLOAD_FIELD: &str = "file";

/// Request body ceilings, in bytes, for the two write endpoints.
#[derive(Debug, Clone, Copy)]
pub struct BodyLimits {
    /// Largest multipart body accepted by `POST /upload-pdf/`.
    pub upload_bytes: usize,
    /// Largest JSON body accepted by `POST /summarize-text/`.
    pub text_bytes: usize,
}

/// Build the HTTP router exposing the upload and summarize endpoints.
pub fn create_router<S>(service: Arc<S>, limits: BodyLimits) -> Router
where
    S: DocumentApi + 'static,
{
    Router::new()
        .route(
            "/upload-pdf/",
            post(upload_pdf::<S>).layer(DefaultBodyLimit::max(limits.upload_bytes)),
        )
        .route(
            "/summarize-text/",
            post(summarize_text::<S>).layer(DefaultBodyLimit::max(limits.text_bytes)),
        )
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Success response for `POST /upload-pdf/`.
#[derive(Debug, Serialize)]
struct UploadResponse {
    /// Text extracted from every page, in order.
    extracted_text: String,
    /// Stored document identifier, `{digest}.pdf`.
    filename: String,
}

/// Store an uploaded PDF and return its text.
async fn upload_pdf<S>(
    State(service): State<Arc<S>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError>
where
    S: DocumentApi,
{
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let declared_name = field.file_name().unwrap_or("upload.pdf").to_string();
        let bytes = field.bytes().await?;
        let outcome = service
            .upload_document(bytes.to_vec(), declared_name)
            .await?;
        return Ok(Json(UploadResponse {
            filename: outcome.document.file_name(),
            extracted_text: outcome.extracted_text,
        }));
    }

    Err(AppError::Rejected {
        status: StatusCode::BAD_REQUEST,
        message: format!("Multipart field '{UPLOAD_FIELD}' is required"),
    })
}

/// Request body for `POST /summarize-text/`.
#[derive(Debug, Deserialize)]
struct SummarizeRequest {
    /// Text to summarize.
    text: String,
    /// Logical filename; also the cache key.
    filename: String,
}

/// Success response for `POST /summarize-text/`.
#[derive(Debug, Serialize)]
struct SummarizeResponse {
    summary: String,
}

/// Summarize text, answering from the cache when the filename is known.
async fn summarize_text<S>(
    State(service): State<Arc<S>>,
    payload: Result<Json<SummarizeRequest>, JsonRejection>,
) -> Result<Json<SummarizeResponse>, AppError>
where
    S: DocumentApi,
{
    let Json(SummarizeRequest { text, filename }) = payload?;
    let outcome = service.summarize(text, filename.clone()).await?;
    tracing::info!(filename, cached = outcome.cached, "Summarize request completed");
    Ok(Json(SummarizeResponse {
        summary: outcome.summary,
    }))
}

/// Return service counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<crate::metrics::MetricsSnapshot>
where
    S: DocumentApi,
{
    Json(service.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "upload_pdf",
                method: "POST",
                path: "/upload-pdf/",
                description: "Upload a PDF as multipart field 'file'. Response returns { \"extracted_text\": string, \"filename\": \"<md5>.pdf\" }.",
                request_example: None,
            },
            CommandDescriptor {
                name: "summarize_text",
                method: "POST",
                path: "/summarize-text/",
                description: "Summarize extracted text. Results are cached per filename. Response returns { \"summary\": string }.",
                request_example: Some(json!({
                    "text": "Extracted document text",
                    "filename": "report.pdf"
                })),
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return upload and summarization counters.",
                request_example: None,
            },
        ],
    })
}

/// Error body shared by every endpoint.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

enum AppError {
    Processing(ProcessingError),
    Rejected { status: StatusCode, message: String },
}

impl AppError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Rejected { status, message } => (*status, message.clone()),
            Self::Processing(error) => match error {
                ProcessingError::NoTextProvided => (StatusCode::BAD_REQUEST, error.to_string()),
                ProcessingError::EmptyExtraction => {
                    (StatusCode::UNPROCESSABLE_ENTITY, error.to_string())
                }
                ProcessingError::Extraction(_) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "Failed to extract text from the PDF".into(),
                ),
                ProcessingError::Completion(CompletionError::Timeout(_)) => (
                    StatusCode::GATEWAY_TIMEOUT,
                    "Summary generation timed out".into(),
                ),
                ProcessingError::Completion(_) => (
                    StatusCode::BAD_GATEWAY,
                    "Summary generation failed".into(),
                ),
                ProcessingError::Storage(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal storage error".into(),
                ),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        match &self {
            Self::Processing(error) if status.is_server_error() => {
                tracing::error!(status = %status, error = %error, "Request failed");
            }
            Self::Processing(error) => {
                tracing::debug!(status = %status, error = %error, "Request rejected");
            }
            Self::Rejected { .. } => {
                tracing::debug!(status = %status, reason = %message, "Malformed request");
            }
        }
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<ProcessingError> for AppError {
    fn from(inner: ProcessingError) -> Self {
        Self::Processing(inner)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(error: MultipartError) -> Self {
        Self::Rejected {
            status: error.status(),
            message: error.body_text(),
        }
    }
}
