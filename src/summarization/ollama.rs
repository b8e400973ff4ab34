//! Ollama adapter for local instruction-tuned models.
//!
//! Ollama has no dedicated summarization task, so the length bounds are expressed in the prompt
//! (as words) and sampling is disabled with a zero temperature.

use super::{SummarizationClientError, Summarizer, SummaryLength, non_blank_summary};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

/// Summarizer backed by the Ollama `/api/generate` endpoint.
pub struct OllamaSummarizer {
    http: Client,
    base_url: String,
    model: String,
}

impl OllamaSummarizer {
    /// Create an adapter for `model` served at `base_url`.
    pub fn new(http: Client, base_url: String, model: String) -> Self {
        Self {
            http,
            base_url,
            model,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }
}

fn build_prompt(text: &str, length: SummaryLength) -> String {
    format!(
        "Summarize the following text in at least {min} and at most {max} words. \
         Reply with the summary only.\n\n{text}",
        min = length.min_length,
        max = length.max_length,
    )
}

/// Body of a non-streaming `/api/generate` call.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
    done: bool,
}

impl OllamaResponse {
    fn into_summary(self, model: &str) -> Result<String, SummarizationClientError> {
        if !self.done {
            return Err(SummarizationClientError::InvalidResponse(
                "Ollama response incomplete (streaming not supported)".into(),
            ));
        }
        non_blank_summary(&self.response, model)
    }
}

#[async_trait]
impl Summarizer for OllamaSummarizer {
    async fn summarize(
        &self,
        text: &str,
        length: SummaryLength,
    ) -> Result<String, SummarizationClientError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt: build_prompt(text, length),
            stream: false,
            options: GenerateOptions { temperature: 0.0 },
        };
        let endpoint = self.endpoint();

        let response = self
            .http
            .post(endpoint.as_str())
            .json(&request)
            .send()
            .await
            .map_err(|error| {
                SummarizationClientError::ProviderUnavailable(format!(
                    "failed to reach Ollama at {}: {error}",
                    self.base_url
                ))
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(SummarizationClientError::ProviderUnavailable(format!(
                "model {} is not available at {endpoint}",
                self.model
            ))),
            status if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                Err(SummarizationClientError::GenerationFailed(format!(
                    "Ollama returned {status}: {body}"
                )))
            }
            _ => response
                .json::<OllamaResponse>()
                .await
                .map_err(|error| {
                    SummarizationClientError::InvalidResponse(format!(
                        "failed to decode Ollama response: {error}"
                    ))
                })?
                .into_summary(&self.model),
        }
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};
    use serde_json::json;

    fn client_for(server: &MockServer) -> OllamaSummarizer {
        OllamaSummarizer::new(
            Client::builder()
                .user_agent("summarize-pro-test")
                .build()
                .expect("client"),
            server.base_url(),
            "llama3.2".into(),
        )
    }

    #[test]
    fn prompt_carries_length_bounds_and_text() {
        let prompt = build_prompt(
            "Body text",
            SummaryLength {
                max_length: 40,
                min_length: 5,
            },
        );
        assert!(prompt.contains("at least 5 and at most 40 words"));
        assert!(prompt.ends_with("Body text"));
    }

    #[tokio::test]
    async fn returns_trimmed_response_text() {
        let server = MockServer::start_async().await;
        let client = client_for(&server);

        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/generate")
                    .json_body_partial(r#"{"model": "llama3.2", "stream": false}"#);
                then.status(200).json_body(json!({
                    "response": "  Summary text\n",
                    "done": true
                }));
            })
            .await;

        let summary = client
            .summarize("Summarize me", SummaryLength::default())
            .await
            .expect("summary");

        mock.assert_async().await;
        assert_eq!(summary, "Summary text");
    }

    #[tokio::test]
    async fn incomplete_response_is_rejected() {
        let server = MockServer::start_async().await;
        let client = client_for(&server);

        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(200).json_body(json!({
                    "response": "partial",
                    "done": false
                }));
            })
            .await;

        let error = client
            .summarize("Summarize me", SummaryLength::default())
            .await
            .expect_err("incomplete");

        assert!(matches!(error, SummarizationClientError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn error_status_is_generation_failure() {
        let server = MockServer::start_async().await;
        let client = client_for(&server);

        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(500).body("boom");
            })
            .await;

        let error = client
            .summarize("Summarize me", SummaryLength::default())
            .await
            .expect_err("error response");

        assert!(
            matches!(error, SummarizationClientError::GenerationFailed(ref message) if message.contains("500"))
        );
    }

    #[test]
    fn blank_response_is_invalid() {
        let body = OllamaResponse {
            response: "\n ".into(),
            done: true,
        };

        let error = body.into_summary("llama3.2").expect_err("blank");
        assert!(matches!(error, SummarizationClientError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn missing_model_is_provider_unavailable() {
        let server = MockServer::start_async().await;
        let client = client_for(&server);

        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(404).body("model not found");
            })
            .await;

        let error = client
            .summarize("Summarize me", SummaryLength::default())
            .await
            .expect_err("missing model");

        assert!(matches!(error, SummarizationClientError::ProviderUnavailable(_)));
    }
}
