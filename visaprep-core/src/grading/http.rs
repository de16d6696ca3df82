//! Chat-completion transport over HTTP.

use super::{ChatMessage, CompletionClient};
use crate::config::GraderConfig;
use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::json;
use std::time::Duration;

/// Blocking client for an OpenAI-compatible `/chat/completions` endpoint.
///
/// Owns a current-thread tokio runtime so callers stay synchronous.
/// [`CompletionClient::complete`] drives it with `block_on`, which panics when
/// called from a thread that is already running a tokio runtime.
pub struct HttpCompletionClient {
    model: String,
    endpoint: String,
    api_key: String,
    max_tokens: u32,
    temperature: f32,
    runtime: tokio::runtime::Runtime,
    http: reqwest::Client,
}

impl HttpCompletionClient {
    /// Build a client from grader config.
    ///
    /// Fails with [`Error::Config`] when no credential is available; no
    /// network call is made here.
    pub fn new(config: &GraderConfig) -> Result<Self> {
        let api_key = config.resolved_api_key().ok_or_else(|| {
            Error::Config(
                "grader.api_key (or OPENAI_API_KEY / GPT_API_KEY) is required".to_string(),
            )
        })?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Config(format!("failed to build tokio runtime: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            model: config.model.clone(),
            endpoint: config.resolved_endpoint(),
            api_key,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            runtime,
            http,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|e| Error::Config(format!("invalid auth header: {e}")))?,
        );
        Ok(headers)
    }
}

impl CompletionClient for HttpCompletionClient {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let headers = self.headers()?;
        let body = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "messages": messages,
        });

        self.runtime.block_on(async {
            let resp = self
                .http
                .post(&self.endpoint)
                .headers(headers)
                .json(&body)
                .send()
                .await
                .map_err(|e| Error::GradingTransport {
                    status: None,
                    message: format!("request failed: {e}"),
                })?;
            let status = resp.status();
            let text = resp.text().await.map_err(|e| Error::GradingTransport {
                status: Some(status.as_u16()),
                message: format!("read body failed: {e}"),
            })?;

            if !status.is_success() {
                return Err(Error::GradingTransport {
                    status: Some(status.as_u16()),
                    message: text,
                });
            }

            extract_content(&text)
        })
    }
}

/// Pull `choices[0].message.content` out of a completion response body.
pub(crate) fn extract_content(body: &str) -> Result<String> {
    let json: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| Error::GradingFormat(format!("response is not JSON: {e}")))?;
    json.get("choices")
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .and_then(|v| v.get("message"))
        .and_then(|v| v.get("content"))
        .and_then(|v| v.as_str())
        .map(ToString::to_string)
        .ok_or_else(|| {
            Error::GradingFormat("response missing choices[0].message.content".to_string())
        })
}
