//! Summarization pipeline: validation, extraction, chunking and per-chunk model calls.

use crate::{
    chunking::{ChunkOptions, ChunkingError, OversizedLines, chunk_text},
    config::Config,
    extraction::{DocumentKind, ExtractionError, extract_text},
    metrics::{MetricsSnapshot, SummaryMetrics},
    summarization::{SummarizationClientError, Summarizer, SummaryLength, build_summarizer},
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors emitted by the summarization pipeline.
#[derive(Debug, Error)]
pub enum SummarizeError {
    /// Raw text was blank after trimming.
    #[error("Text cannot be empty")]
    EmptyText,
    /// Multipart request carried no `file` part.
    #[error("No file uploaded")]
    MissingFile,
    /// Upload extension is outside the allow-list.
    #[error("Unsupported file type (PDF, DOCX, TXT only)")]
    UnsupportedFileType(String),
    /// Upload produced only whitespace.
    #[error("File contains no readable text")]
    NoReadableText,
    /// Length bounds cannot be satisfied.
    #[error("{0}")]
    InvalidLength(&'static str),
    /// Multipart body could not be decoded.
    #[error("Invalid upload: {0}")]
    InvalidUpload(String),
    /// Request body exceeded the configured size limit.
    #[error("Request body is too large")]
    UploadTooLarge,
    /// Parser failed on a corrupt or unsupported document.
    #[error("Failed to extract text: {0}")]
    Extraction(String),
    /// Chunker was configured with an impossible budget.
    #[error("Failed to chunk text: {0}")]
    Chunking(#[from] ChunkingError),
    /// Model call failed.
    #[error("Summarization failed: {0}")]
    Summarization(#[from] SummarizationClientError),
}

impl From<ExtractionError> for SummarizeError {
    fn from(error: ExtractionError) -> Self {
        match error {
            ExtractionError::UnsupportedFileType(extension) => Self::UnsupportedFileType(extension),
            ExtractionError::NoReadableText => Self::NoReadableText,
            other @ (ExtractionError::Pdf(_) | ExtractionError::Docx(_)) => {
                Self::Extraction(other.to_string())
            }
        }
    }
}

/// A document received through the upload endpoint, fully buffered.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    /// Client-supplied file name; its extension selects the parser.
    pub filename: String,
    /// Client-declared MIME type, logged only.
    pub content_type: Option<String>,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

/// Result of a successful summarization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryOutcome {
    /// Per-chunk summaries joined by single spaces, in chunk order.
    pub summary: String,
    /// Number of chunks sent to the model.
    pub chunk_count: usize,
}

/// Abstraction over the pipeline used by the HTTP surface.
#[async_trait]
pub trait SummarizeApi: Send + Sync {
    /// Summarize raw text with caller-supplied length bounds.
    async fn summarize_text(
        &self,
        text: &str,
        length: SummaryLength,
    ) -> Result<SummaryOutcome, SummarizeError>;

    /// Extract, chunk and summarize an uploaded document.
    async fn summarize_document(
        &self,
        upload: DocumentUpload,
        length: SummaryLength,
    ) -> Result<SummaryOutcome, SummarizeError>;

    /// Identifier of the model behind the pipeline.
    fn model(&self) -> &str;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;

    /// Count a request the HTTP layer refused before it reached the pipeline.
    fn record_rejected_request(&self, reason: &str);
}

/// Coordinates chunking and model calls for both endpoints.
///
/// Construct once at startup and share through an `Arc`; the summarizer handle is immutable
/// and the counters are atomic, so concurrent requests need no further locking.
pub struct SummarizeService {
    summarizer: Arc<dyn Summarizer>,
    chunk_options: ChunkOptions,
    metrics: SummaryMetrics,
}

impl SummarizeService {
    /// Build a pipeline around an existing summarizer.
    pub fn new(summarizer: Arc<dyn Summarizer>, chunk_options: ChunkOptions) -> Self {
        Self {
            summarizer,
            chunk_options,
            metrics: SummaryMetrics::new(),
        }
    }

    /// Build the pipeline and its summarizer from configuration.
    pub fn from_config(config: &Config) -> Result<Self, SummarizationClientError> {
        let oversized = if config.chunk_split_oversized_lines {
            OversizedLines::Split
        } else {
            OversizedLines::Keep
        };
        Ok(Self::new(
            build_summarizer(config)?,
            ChunkOptions {
                max_chars: config.chunk_max_chars,
                oversized,
            },
        ))
    }

    async fn run_text(
        &self,
        text: &str,
        length: SummaryLength,
    ) -> Result<SummaryOutcome, SummarizeError> {
        if text.trim().is_empty() {
            return Err(SummarizeError::EmptyText);
        }
        validate_length(length)?;
        self.summarize_chunks(text, length).await
    }

    async fn run_document(
        &self,
        upload: DocumentUpload,
        length: SummaryLength,
    ) -> Result<SummaryOutcome, SummarizeError> {
        let DocumentUpload {
            filename,
            content_type,
            bytes,
        } = upload;
        tracing::info!(
            filename = %filename,
            content_type = content_type.as_deref().unwrap_or("unknown"),
            bytes = bytes.len(),
            "Received document upload"
        );

        let kind = DocumentKind::from_filename(&filename)?;
        validate_length(length)?;

        let text = tokio::task::spawn_blocking(move || extract_text(&bytes, kind))
            .await
            .map_err(|error| {
                SummarizeError::Extraction(format!("extraction task failed: {error}"))
            })??;

        self.summarize_chunks(&text, length).await
    }

    /// Chunk `text` and summarize each chunk in order, joining results with single spaces.
    async fn summarize_chunks(
        &self,
        text: &str,
        length: SummaryLength,
    ) -> Result<SummaryOutcome, SummarizeError> {
        let chunks = chunk_text(text, self.chunk_options)?;
        tracing::debug!(
            chunks = chunks.len(),
            max_chars = self.chunk_options.max_chars,
            max_length = length.max_length,
            min_length = length.min_length,
            "Summarizing chunks"
        );

        let mut summaries = Vec::with_capacity(chunks.len());
        for (index, chunk) in chunks.iter().enumerate() {
            let summary = self.summarizer.summarize(chunk, length).await?;
            tracing::trace!(index, input_chars = chunk.len(), "Chunk summarized");
            summaries.push(summary);
        }

        Ok(SummaryOutcome {
            summary: summaries.join(" "),
            chunk_count: chunks.len(),
        })
    }

    fn track(
        &self,
        result: &Result<SummaryOutcome, SummarizeError>,
        record: fn(&SummaryMetrics, u64),
    ) {
        match result {
            Ok(outcome) => record(&self.metrics, outcome.chunk_count as u64),
            Err(error) => {
                tracing::warn!(error = %error, "Summarization request failed");
                self.metrics.record_failure();
            }
        }
    }
}

fn validate_length(length: SummaryLength) -> Result<(), SummarizeError> {
    if length.max_length == 0 {
        return Err(SummarizeError::InvalidLength(
            "max_length must be greater than zero",
        ));
    }
    if length.min_length > length.max_length {
        return Err(SummarizeError::InvalidLength(
            "min_length must not exceed max_length",
        ));
    }
    Ok(())
}

#[async_trait]
impl SummarizeApi for SummarizeService {
    async fn summarize_text(
        &self,
        text: &str,
        length: SummaryLength,
    ) -> Result<SummaryOutcome, SummarizeError> {
        let result = self.run_text(text, length).await;
        self.track(&result, SummaryMetrics::record_text);
        result
    }

    async fn summarize_document(
        &self,
        upload: DocumentUpload,
        length: SummaryLength,
    ) -> Result<SummaryOutcome, SummarizeError> {
        let result = self.run_document(upload, length).await;
        self.track(&result, SummaryMetrics::record_file);
        result
    }

    fn model(&self) -> &str {
        self.summarizer.model()
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    fn record_rejected_request(&self, reason: &str) {
        tracing::warn!(reason, "Request rejected before summarization");
        self.metrics.record_failure();
    }
}
