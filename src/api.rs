//! HTTP surface for SummarizePro.
//!
//! - `POST /summarize` – Summarize raw text. Body: `{ "text", "max_length"?, "min_length"? }`.
//! - `POST /summarize-file` – Summarize an uploaded PDF, DOCX or TXT file (multipart field
//!   `file`, optional `max_length` / `min_length` fields).
//! - `GET /health` – Liveness plus the model identifier.
//! - `GET /metrics` – Request and chunk counters.
//! - `GET /` and `/static/*` – The pre-built front-end.
//!
//! Errors are returned as `{ "detail": "..." }` with a 4xx status for bad input, 422 for
//! documents the parsers reject and 502 when the model call fails. CORS is fully open.

use crate::service::{DocumentUpload, SummarizeApi, SummarizeError};
use crate::summarization::SummaryLength;
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::Field, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::Instrument;
use uuid::Uuid;

const SERVICE_TITLE: &str = "SummarizePro";

/// Static settings for the router.
#[derive(Debug, Clone)]
pub struct RouterOptions {
    /// Directory with `index.html` and the other front-end assets.
    pub frontend_dir: PathBuf,
    /// Largest accepted request body in bytes.
    pub max_upload_bytes: usize,
}

/// Build the HTTP router exposing the summarization API and the front-end.
pub fn create_router<S>(service: Arc<S>, options: RouterOptions) -> Router
where
    S: SummarizeApi + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/summarize", post(summarize_text::<S>))
        .route("/summarize-file", post(summarize_file::<S>))
        .route("/health", get(health::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route_service("/", ServeFile::new(options.frontend_dir.join("index.html")))
        .nest_service("/static", ServeDir::new(&options.frontend_dir))
        .with_state(service)
        .layer(DefaultBodyLimit::max(options.max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Request body for `POST /summarize`.
#[derive(Deserialize)]
struct SummarizeRequest {
    /// Raw text to summarize.
    text: String,
    /// Optional bounds, defaulting to 60/20.
    #[serde(flatten)]
    length: SummaryLength,
}

/// Success response shared by both summarization endpoints.
#[derive(Serialize)]
struct SummaryResponse {
    summary: String,
}

/// Summarize raw text.
async fn summarize_text<S>(
    State(service): State<Arc<S>>,
    request: Result<Json<SummarizeRequest>, JsonRejection>,
) -> Result<Json<SummaryResponse>, AppError>
where
    S: SummarizeApi,
{
    let request_id = Uuid::new_v4();
    async move {
        let Json(request) = request.map_err(|rejection| {
            let error = AppError::from(rejection);
            service.record_rejected_request(&error.to_string());
            error
        })?;
        let outcome = service
            .summarize_text(&request.text, request.length)
            .await?;
        tracing::info!(
            chars = request.text.len(),
            chunks = outcome.chunk_count,
            "Summarize request completed"
        );
        Ok::<_, AppError>(Json(SummaryResponse {
            summary: outcome.summary,
        }))
    }
    .instrument(tracing::info_span!("summarize", %request_id))
    .await
}

/// Summarize an uploaded document.
///
/// The upload is buffered in memory; the body limit configured on the router bounds its size.
async fn summarize_file<S>(
    State(service): State<Arc<S>>,
    multipart: Multipart,
) -> Result<Json<SummaryResponse>, AppError>
where
    S: SummarizeApi,
{
    let request_id = Uuid::new_v4();
    async move {
        let (upload, length) = read_upload(multipart).await.map_err(|error| {
            service.record_rejected_request(&error.to_string());
            error
        })?;
        let filename = upload.filename.clone();
        let outcome = service.summarize_document(upload, length).await?;
        tracing::info!(
            filename = %filename,
            chunks = outcome.chunk_count,
            "Summarize-file request completed"
        );
        Ok::<_, AppError>(Json(SummaryResponse {
            summary: outcome.summary,
        }))
    }
    .instrument(tracing::info_span!("summarize_file", %request_id))
    .await
}

/// Collect the `file` part and optional length fields from a multipart body.
async fn read_upload(
    mut multipart: Multipart,
) -> Result<(DocumentUpload, SummaryLength), SummarizeError> {
    let mut upload = None;
    let mut length = SummaryLength::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                upload = Some(DocumentUpload {
                    filename,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            "max_length" => length.max_length = read_length_field(field, "max_length").await?,
            "min_length" => length.min_length = read_length_field(field, "min_length").await?,
            other => tracing::debug!(field = other, "Ignoring unexpected multipart field"),
        }
    }

    let upload = upload.ok_or(SummarizeError::MissingFile)?;
    Ok((upload, length))
}

async fn read_length_field(field: Field<'_>, name: &str) -> Result<usize, SummarizeError> {
    let value = field.text().await.map_err(multipart_error)?;
    value.trim().parse().map_err(|_| {
        SummarizeError::InvalidUpload(format!("{name} must be a non-negative integer"))
    })
}

fn multipart_error(error: axum::extract::multipart::MultipartError) -> SummarizeError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        SummarizeError::UploadTooLarge
    } else {
        SummarizeError::InvalidUpload(error.body_text())
    }
}

/// Response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    title: &'static str,
    version: &'static str,
    model: String,
}

/// Report liveness and the model serving requests.
async fn health<S>(State(service): State<Arc<S>>) -> Json<HealthResponse>
where
    S: SummarizeApi,
{
    Json(HealthResponse {
        status: "ok",
        title: SERVICE_TITLE,
        version: env!("CARGO_PKG_VERSION"),
        model: service.model().to_string(),
    })
}

/// Return request and chunk counters.
async fn get_metrics<S>(
    State(service): State<Arc<S>>,
) -> Json<crate::metrics::MetricsSnapshot>
where
    S: SummarizeApi,
{
    Json(service.metrics_snapshot())
}

enum AppError {
    /// Failure reported by the pipeline or by upload decoding.
    Pipeline(SummarizeError),
    /// Body the JSON extractor refused, with the status axum chose for it.
    Rejected { status: StatusCode, message: String },
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Rejected { status, .. } => *status,
            Self::Pipeline(error) => match error {
                SummarizeError::EmptyText
                | SummarizeError::MissingFile
                | SummarizeError::UnsupportedFileType(_)
                | SummarizeError::NoReadableText
                | SummarizeError::InvalidLength(_)
                | SummarizeError::InvalidUpload(_) => StatusCode::BAD_REQUEST,
                SummarizeError::UploadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
                SummarizeError::Extraction(_) => StatusCode::UNPROCESSABLE_ENTITY,
                SummarizeError::Chunking(_) => StatusCode::INTERNAL_SERVER_ERROR,
                SummarizeError::Summarization(_) => StatusCode::BAD_GATEWAY,
            },
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pipeline(error) => error.fmt(f),
            Self::Rejected { message, .. } => f.write_str(message),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, %status, "Request failed");
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

impl From<SummarizeError> for AppError {
    fn from(inner: SummarizeError) -> Self {
        Self::Pipeline(inner)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::Pipeline(SummarizeError::UploadTooLarge);
        }
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}
