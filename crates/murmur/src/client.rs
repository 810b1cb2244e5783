use futures::{Stream, StreamExt};
use reqwest::{Client, Response};
use std::fmt::Display;

use crate::conversation::{Conversation, ConversationError, PendingMessage, TurnOutcome};
use crate::errors::ClientError;
use crate::framing::LineDecoder;
use crate::models::api::{ChatRequest, ErrorResponse};
use crate::models::event::StreamEvent;
use crate::models::message::Message;

pub const DEFAULT_RELAY_URL: &str = "http://127.0.0.1:3000/api/chat";

/// Sends chat turns to the relay endpoint and consumes its NDJSON replies
pub struct RelayClient {
    client: Client,
    url: String,
}

impl RelayClient {
    pub fn new<S: Into<String>>(url: S) -> Result<Self, ClientError> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// POST the history and return the response once the relay accepted it
    pub async fn open(&self, messages: &[Message]) -> Result<Response, ClientError> {
        let request = ChatRequest {
            messages: messages.to_vec(),
        };
        let response = self.client.post(&self.url).json(&request).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<ErrorResponse>().await {
            Ok(body) => match body.details {
                Some(details) => format!("{} ({})", body.error, details),
                None => body.error,
            },
            Err(_) => status.to_string(),
        };
        Err(ClientError::Status {
            status: status.as_u16(),
            message,
        })
    }

    /// Run one turn: append `text`, stream the reply, and commit or record the failure.
    ///
    /// `on_update` sees the pending reply after every fragment. Transport and stream
    /// failures never escape; they end the turn as `TurnOutcome::Failed`.
    pub async fn send<F>(
        &self,
        conversation: &mut Conversation,
        text: &str,
        mut on_update: F,
    ) -> Result<TurnOutcome, ConversationError>
    where
        F: FnMut(&PendingMessage),
    {
        let history = conversation.begin_turn(text)?.to_vec();

        let response = match self.open(&history).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Failed to send chat request: {}", e);
                return Ok(conversation.fail());
            }
        };

        conversation.start_streaming();
        match consume_stream(conversation, response.bytes_stream(), &mut on_update).await {
            Ok(()) => Ok(conversation.finish()),
            Err(e) => {
                tracing::error!("Chat stream failed: {}", e);
                Ok(conversation.fail())
            }
        }
    }
}

/// Feed a chunked NDJSON body into the conversation's pending reply.
///
/// Malformed lines are skipped. An unterminated trailing line is discarded, never
/// parsed. A chunk error aborts with `ClientError::Stream`.
pub async fn consume_stream<S, B, E, F>(
    conversation: &mut Conversation,
    stream: S,
    on_update: &mut F,
) -> Result<(), ClientError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
    F: FnMut(&PendingMessage),
{
    let mut stream = std::pin::pin!(stream);
    let mut decoder = LineDecoder::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| ClientError::Stream(e.to_string()))?;
        for line in decoder.push(chunk.as_ref()) {
            apply_line(conversation, &line, on_update);
        }
    }

    if let Some(tail) = decoder.finish() {
        tracing::warn!(
            "Discarding incomplete line at end of stream ({} bytes)",
            tail.len()
        );
    }
    Ok(())
}

fn apply_line<F>(conversation: &mut Conversation, line: &str, on_update: &mut F)
where
    F: FnMut(&PendingMessage),
{
    if line.trim().is_empty() {
        return;
    }

    let event = match serde_json::from_str::<StreamEvent>(line) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("Skipping malformed stream line: {}", e);
            return;
        }
    };

    match event.as_text_delta() {
        Some(text) if !text.is_empty() => {
            if let Some(pending) = conversation.push_delta(text) {
                on_update(pending);
            }
        }
        _ => {}
    }
}
