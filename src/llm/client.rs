/// OpenAI-compatible chat-completions client
use futures_util::Stream;

use super::error::LlmError;
use super::sse::content_stream;
use super::types::{ApiErrorBody, ChatMessage, ChatRequest, ChatResponse};
use crate::api::{build_http_client, log_request, log_response};
use crate::config::ProbeConfig;

/// Chat client bound to one key, base URL and model
pub struct ChatClient {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl ChatClient {
    /// Create a client from probe settings.
    ///
    /// No request timeout is applied; a long generation is allowed to run
    /// until the server finishes or the transport gives up.
    pub fn new(config: &ProbeConfig) -> Result<Self, LlmError> {
        Ok(Self {
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            client: build_http_client(None)?,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Build a single-user-message request
    pub fn request(&self, prompt: &str, stream: bool) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::user(prompt)],
            stream,
        }
    }

    async fn send(&self, body: &ChatRequest) -> Result<reqwest::Response, LlmError> {
        let url = self.completions_url();
        if let Ok(body_json) = serde_json::to_value(body) {
            log_request(
                "POST",
                &url,
                &[("Authorization", "Bearer ***"), ("Content-Type", "application/json")],
                Some(&body_json),
            );
        }
        tracing::debug!(model = %body.model, stream = body.stream, "Sending chat completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        log_response(&format!("HTTP {}: {}", status, error_text));

        let message = match serde_json::from_str::<ApiErrorBody>(&error_text) {
            Ok(body) => body.error.message,
            Err(_) => error_text,
        };
        Err(LlmError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Send `prompt` and wait for the whole answer.
    pub async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let response = self.send(&self.request(prompt, false)).await?;
        let text = response.text().await?;
        log_response(&text);

        let parsed: ChatResponse = serde_json::from_str(&text)?;
        let answer = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(LlmError::EmptyResponse)?;
        Ok(answer)
    }

    /// Send `prompt` with streaming on and return its content fragments.
    pub async fn stream(
        &self,
        prompt: &str,
    ) -> Result<impl Stream<Item = Result<String, LlmError>>, LlmError> {
        let response = self.send(&self.request(prompt, true)).await?;
        log_response(&format!("HTTP {} (streaming)", response.status()));
        Ok(content_stream(response.bytes_stream()))
    }
}
