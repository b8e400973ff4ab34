//! Abstractions over the pretrained abstractive summarization model.
//!
//! The model itself runs outside this process. Each adapter turns one chunk of text plus
//! length bounds into one summary string, decoding greedily so the same input always yields
//! the same output. Adapters are built once at startup and shared behind an `Arc`.

mod huggingface;
mod ollama;

pub use huggingface::HuggingFaceSummarizer;
pub use ollama::OllamaSummarizer;

use crate::config::{Config, SummarizationProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

/// Default upper bound on summary length, in model output units.
pub const DEFAULT_MAX_LENGTH: usize = 60;
/// Default lower bound on summary length, in model output units.
pub const DEFAULT_MIN_LENGTH: usize = 20;

/// Errors surfaced while attempting abstractive summarization.
#[derive(Debug, Error)]
pub enum SummarizationClientError {
    /// Provider was unreachable or the model is not currently served.
    #[error("Summarization provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider returned an error response.
    #[error("Failed to generate summary: {0}")]
    GenerationFailed(String),
    /// Provider response could not be parsed.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

/// Output length bounds passed to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SummaryLength {
    /// Longest acceptable summary.
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    /// Shortest acceptable summary.
    #[serde(default = "default_min_length")]
    pub min_length: usize,
}

impl Default for SummaryLength {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            min_length: DEFAULT_MIN_LENGTH,
        }
    }
}

fn default_max_length() -> usize {
    DEFAULT_MAX_LENGTH
}

fn default_min_length() -> usize {
    DEFAULT_MIN_LENGTH
}

/// Trim a generated summary, rejecting output that is empty once trimmed.
fn non_blank_summary(raw: &str, model: &str) -> Result<String, SummarizationClientError> {
    let summary = raw.trim();
    if summary.is_empty() {
        return Err(SummarizationClientError::InvalidResponse(format!(
            "model {model} returned an empty summary"
        )));
    }
    Ok(summary.to_string())
}

/// Interface implemented by summarization backends.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize one chunk of text within the requested length bounds.
    async fn summarize(
        &self,
        text: &str,
        length: SummaryLength,
    ) -> Result<String, SummarizationClientError>;

    /// Identifier of the model answering requests.
    fn model(&self) -> &str;
}

/// Build the summarizer selected by configuration.
pub fn build_summarizer(
    config: &Config,
) -> Result<Arc<dyn Summarizer>, SummarizationClientError> {
    let http = Client::builder()
        .user_agent(concat!("summarize-pro/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|error| {
            SummarizationClientError::ProviderUnavailable(format!(
                "failed to construct HTTP client: {error}"
            ))
        })?;

    let summarizer: Arc<dyn Summarizer> = match config.summarization_provider {
        SummarizationProvider::HuggingFace => Arc::new(HuggingFaceSummarizer::new(
            http,
            &config.hf_api_url,
            &config.summarization_model,
            config.hf_api_token.clone(),
        )),
        SummarizationProvider::Ollama => Arc::new(OllamaSummarizer::new(
            http,
            config.ollama_url.clone(),
            config.summarization_model.clone(),
        )),
    };

    tracing::info!(
        provider = ?config.summarization_provider,
        model = summarizer.model(),
        "Summarization model ready"
    );
    Ok(summarizer)
}
