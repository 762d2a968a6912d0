use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{SummarizationError, SummarizationModel, SummaryRequest};
use crate::{IngestionError, Result};

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

#[derive(Debug, Serialize)]
struct InferenceParameters {
    min_length: usize,
    max_length: usize,
    do_sample: bool,
}

#[derive(Debug, Deserialize)]
struct InferenceSummary {
    summary_text: String,
}

impl<'a> InferenceRequest<'a> {
    fn new(inputs: &'a str, request: &SummaryRequest) -> Self {
        Self {
            inputs,
            parameters: InferenceParameters {
                min_length: request.min_length,
                max_length: request.max_length,
                do_sample: !request.deterministic,
            },
        }
    }
}

fn parse_response(body: &str) -> std::result::Result<String, SummarizationError> {
    let summaries: Vec<InferenceSummary> = serde_json::from_str(body)
        .map_err(|e| SummarizationError::InvalidResponse(e.to_string()))?;

    summaries
        .into_iter()
        .next()
        .map(|s| s.summary_text)
        .ok_or_else(|| SummarizationError::InvalidResponse("empty summary list".to_string()))
}

/// Client for a hosted summarization inference endpoint
#[derive(Debug, Clone)]
pub struct HttpSummarizationModel {
    endpoint: String,
    token: Option<String>,
    client: Client,
}

impl HttpSummarizationModel {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| IngestionError::PipelineError(format!("http client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into(),
            token: None,
            client,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SummarizationModel for HttpSummarizationModel {
    async fn summarize_chunk(
        &self,
        text: &str,
        request: &SummaryRequest,
    ) -> std::result::Result<String, SummarizationError> {
        debug!(endpoint = %self.endpoint, chars = text.len(), "Requesting summary");

        let mut builder = self
            .client
            .post(&self.endpoint)
            .json(&InferenceRequest::new(text, request));
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| SummarizationError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SummarizationError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(SummarizationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_response(&body)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let body =
            serde_json::to_value(InferenceRequest::new("text", &SummaryRequest::new(30, 130)))
                .unwrap();

        assert_eq!(
            body,
            serde_json::json!({
                "inputs": "text",
                "parameters": {"min_length": 30, "max_length": 130, "do_sample": false}
            })
        );
    }

    #[test]
    fn test_parse_response() {
        let summary = parse_response(r#"[{"summary_text": "short"}]"#).unwrap();
        assert_eq!(summary, "short");

        assert!(matches!(
            parse_response("[]"),
            Err(SummarizationError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_response(r#"{"error": "loading"}"#),
            Err(SummarizationError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_request_error() {
        let model = HttpSummarizationModel::new("http://127.0.0.1:9/summarize").unwrap();

        let err = model
            .summarize_chunk("text", &SummaryRequest::new(1, 2))
            .await
            .unwrap_err();
        assert!(matches!(err, SummarizationError::Request(_)));
    }
}
