use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;

use super::base::{EventStream, Provider};
use super::configs::AnthropicProviderConfig;
use crate::errors::{ProviderError, ProviderResult};
use crate::framing::LineDecoder;
use crate::models::event::{ErrorBody, StreamEvent};
use crate::models::message::PromptMessage;

pub const ANTHROPIC_HOST: &str = "https://api.anthropic.com";
pub const ANTHROPIC_MODEL: &str = "claude-3-5-sonnet-20241022";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    client: Client,
    config: AnthropicProviderConfig,
}

/// HTTP client for provider calls, meant to be built once and cloned into each provider
pub fn http_client() -> ProviderResult<Client> {
    // No overall timeout: replies stream for as long as the model generates
    let client = Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()?;
    Ok(client)
}

impl AnthropicProvider {
    pub fn new(config: AnthropicProviderConfig) -> ProviderResult<Self> {
        Ok(Self::with_client(http_client()?, config))
    }

    /// Reuse an existing client, keeping its connection pool across requests
    pub fn with_client(client: Client, config: AnthropicProviderConfig) -> Self {
        Self { client, config }
    }

    fn payload(&self, system: &str, messages: &[PromptMessage]) -> Value {
        json!({
            "model": self.config.model,
            "system": system,
            "max_tokens": self.config.max_tokens,
            "messages": messages,
            "stream": true
        })
    }

    async fn post(&self, payload: Value) -> ProviderResult<Response> {
        let url = format!("{}/v1/messages", self.config.host.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!("Anthropic request failed with {}: {}", status, body);
        Err(classify_status(status, &body))
    }

    /// Turn the server-sent events of a successful response into typed events
    fn events(response: Response) -> EventStream {
        Box::pin(async_stream::stream! {
            let mut bytes = response.bytes_stream();
            let mut decoder = LineDecoder::new();
            let mut data = String::new();

            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(ProviderError::Stream(e.to_string()));
                        return;
                    }
                };

                for line in decoder.push(&chunk) {
                    if line.is_empty() {
                        // Blank line dispatches the buffered event
                        match take_event(&mut data) {
                            Some(Ok(event)) => yield Ok(event),
                            Some(Err(e)) => {
                                yield Err(e);
                                return;
                            }
                            None => {}
                        }
                    } else if let Some(value) = line.strip_prefix("data:") {
                        if !data.is_empty() {
                            data.push('\n');
                        }
                        data.push_str(value.strip_prefix(' ').unwrap_or(value));
                    }
                }
            }

            if let Some(tail) = decoder.finish() {
                if let Some(value) = tail.strip_prefix("data:") {
                    data.push_str(value.strip_prefix(' ').unwrap_or(value));
                }
            }
            match take_event(&mut data) {
                Some(Ok(event)) => yield Ok(event),
                Some(Err(e)) => yield Err(e),
                None => {}
            }
        })
    }
}

/// Parse and clear the buffered `data:` payload
fn take_event(data: &mut String) -> Option<ProviderResult<StreamEvent>> {
    if data.is_empty() {
        return None;
    }
    let payload = std::mem::take(data);

    match serde_json::from_str::<StreamEvent>(&payload) {
        Ok(StreamEvent::Error { error }) => Some(Err(classify_error_event(error))),
        Ok(event) => Some(Ok(event)),
        Err(e) => {
            tracing::warn!("Skipping unparseable upstream event: {}", e);
            None
        }
    }
}

fn classify_status(status: StatusCode, body: &str) -> ProviderError {
    // Prefer the structured message from `{"type":"error","error":{...}}`
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Authentication(message),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited(message),
        _ => ProviderError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

fn classify_error_event(error: ErrorBody) -> ProviderError {
    match error.kind.as_str() {
        "authentication_error" | "permission_error" => {
            ProviderError::Authentication(error.message)
        }
        "rate_limit_error" => ProviderError::RateLimited(error.message),
        _ => ProviderError::Stream(format!("{}: {}", error.kind, error.message)),
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    async fn stream(
        &self,
        system: &str,
        messages: &[PromptMessage],
    ) -> ProviderResult<EventStream> {
        let payload = self.payload(system, messages);
        let response = self.post(payload).await?;
        Ok(Self::events(response))
    }
}
