//! Hugging Face inference API adapter.
//!
//! Speaks the `summarization` task protocol shared by the hosted inference API and compatible
//! self-hosted servers: `{"inputs", "parameters"}` in, `[{"summary_text"}]` out.

use super::{SummarizationClientError, Summarizer, SummaryLength, non_blank_summary};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

/// Summarizer backed by a Hugging Face `summarization` endpoint.
pub struct HuggingFaceSummarizer {
    http: Client,
    endpoint: String,
    model: String,
    token: Option<String>,
}

impl HuggingFaceSummarizer {
    /// Create an adapter posting to `{base_url}/{model}`.
    pub fn new(http: Client, base_url: &str, model: &str, token: Option<String>) -> Self {
        Self {
            http,
            endpoint: format!("{}/{}", base_url.trim_end_matches('/'), model),
            model: model.to_string(),
            token,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SummaryOutput {
    summary_text: String,
}

#[async_trait]
impl Summarizer for HuggingFaceSummarizer {
    async fn summarize(
        &self,
        text: &str,
        length: SummaryLength,
    ) -> Result<String, SummarizationClientError> {
        let payload = json!({
            "inputs": text,
            "parameters": {
                "max_length": length.max_length,
                "min_length": length.min_length,
                "do_sample": false,
            },
            "options": {
                "wait_for_model": true,
            }
        });

        let mut request = self.http.post(&self.endpoint).json(&payload);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|error| {
            SummarizationClientError::ProviderUnavailable(format!(
                "failed to reach {}: {error}",
                self.endpoint
            ))
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::SERVICE_UNAVAILABLE {
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizationClientError::ProviderUnavailable(format!(
                "{} returned {status}: {body}",
                self.endpoint
            )));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizationClientError::GenerationFailed(format!(
                "model {} returned {status}: {body}",
                self.model
            )));
        }

        let outputs: Vec<SummaryOutput> = response.json().await.map_err(|error| {
            SummarizationClientError::InvalidResponse(format!(
                "failed to decode summarization response: {error}"
            ))
        })?;

        let output = outputs.into_iter().next().ok_or_else(|| {
            SummarizationClientError::InvalidResponse("response contained no summaries".into())
        })?;
        non_blank_summary(&output.summary_text, &self.model)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    fn client_for(server: &MockServer, token: Option<&str>) -> HuggingFaceSummarizer {
        HuggingFaceSummarizer::new(
            Client::builder()
                .user_agent("summarize-pro-test")
                .build()
                .expect("client"),
            &format!("{}/models/", server.base_url()),
            "facebook/bart-large-cnn",
            token.map(str::to_string),
        )
    }

    #[tokio::test]
    async fn sends_greedy_length_bounded_request() {
        let server = MockServer::start_async().await;
        let client = client_for(&server, Some("hf_secret"));

        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/models/facebook/bart-large-cnn")
                    .header("authorization", "Bearer hf_secret")
                    .json_body_partial(
                        r#"{"inputs": "Long article", "parameters": {"max_length": 80, "min_length": 10, "do_sample": false}}"#,
                    );
                then.status(200)
                    .json_body(json!([{ "summary_text": " Short summary. " }]));
            })
            .await;

        let summary = client
            .summarize(
                "Long article",
                SummaryLength {
                    max_length: 80,
                    min_length: 10,
                },
            )
            .await
            .expect("summary");

        mock.assert_async().await;
        assert_eq!(summary, "Short summary.");
    }

    #[tokio::test]
    async fn loading_model_is_reported_as_unavailable() {
        let server = MockServer::start_async().await;
        let client = client_for(&server, None);

        server
            .mock_async(|when, then| {
                when.method(POST).path("/models/facebook/bart-large-cnn");
                then.status(503)
                    .json_body(json!({ "error": "Model is currently loading" }));
            })
            .await;

        let error = client
            .summarize("text", SummaryLength::default())
            .await
            .expect_err("unavailable");

        assert!(
            matches!(error, SummarizationClientError::ProviderUnavailable(ref message) if message.contains("503"))
        );
    }

    #[tokio::test]
    async fn server_errors_are_generation_failures() {
        let server = MockServer::start_async().await;
        let client = client_for(&server, None);

        server
            .mock_async(|when, then| {
                when.method(POST).path("/models/facebook/bart-large-cnn");
                then.status(500).body("boom");
            })
            .await;

        let error = client
            .summarize("text", SummaryLength::default())
            .await
            .expect_err("failure");

        assert!(
            matches!(error, SummarizationClientError::GenerationFailed(ref message) if message.contains("boom"))
        );
    }

    #[tokio::test]
    async fn empty_output_list_is_invalid() {
        let server = MockServer::start_async().await;
        let client = client_for(&server, None);

        server
            .mock_async(|when, then| {
                when.method(POST).path("/models/facebook/bart-large-cnn");
                then.status(200).json_body(json!([]));
            })
            .await;

        let error = client
            .summarize("text", SummaryLength::default())
            .await
            .expect_err("invalid");

        assert!(matches!(error, SummarizationClientError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn blank_summary_text_is_invalid() {
        let server = MockServer::start_async().await;
        let client = client_for(&server, None);

        server
            .mock_async(|when, then| {
                when.method(POST).path("/models/facebook/bart-large-cnn");
                then.status(200).json_body(json!([{ "summary_text": "  " }]));
            })
            .await;

        let error = client
            .summarize("text", SummaryLength::default())
            .await
            .expect_err("blank summary");

        assert!(
            matches!(error, SummarizationClientError::InvalidResponse(ref message) if message.contains("empty summary"))
        );
    }
}
