use crate::error::RelayError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use futures::{stream::StreamExt, Stream};
use http::header::{CACHE_CONTROL, CONTENT_TYPE};
use murmur::{
    conversation::prepare_prompt,
    errors::ProviderError,
    models::api::ChatRequest,
    models::event::StreamEvent,
    models::message::PromptMessage,
    providers::base::{EventStream, Provider},
};
use std::{
    pin::Pin,
    task::{Context, Poll},
};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_stream::wrappers::ReceiverStream;

/// Lines buffered between the upstream reader and the response body
const CHANNEL_CAPACITY: usize = 32;

/// A streaming body of newline-delimited JSON records.
///
/// An `Err` item aborts the response mid-stream, so the client sees a broken body
/// rather than a clean end.
pub struct NdjsonResponse {
    rx: ReceiverStream<Result<Bytes, ProviderError>>,
}

impl NdjsonResponse {
    fn new(rx: ReceiverStream<Result<Bytes, ProviderError>>) -> Self {
        Self { rx }
    }
}

impl Stream for NdjsonResponse {
    type Item = Result<Bytes, ProviderError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.rx).poll_next(cx)
    }
}

impl IntoResponse for NdjsonResponse {
    fn into_response(self) -> Response {
        let body = Body::from_stream(self);

        (
            [
                (CONTENT_TYPE, "application/x-ndjson"),
                (CACHE_CONTROL, "no-cache"),
            ],
            body,
        )
            .into_response()
    }
}

/// Open the upstream stream, bounding the time until the provider accepts the request
async fn open_stream(
    provider: &dyn Provider,
    state: &AppState,
    messages: &[PromptMessage],
) -> Result<EventStream, ProviderError> {
    match timeout(
        state.setup_timeout,
        provider.stream(&state.system_prompt, messages),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Connection(format!(
            "no response within {}s",
            state.setup_timeout.as_secs_f32()
        ))),
    }
}

/// Re-emit upstream text deltas as NDJSON lines until the upstream or the client goes away
async fn forward(mut events: EventStream, tx: mpsc::Sender<Result<Bytes, ProviderError>>) {
    while let Some(event) = events.next().await {
        let text = match event {
            Ok(event) => match event.as_text_delta() {
                Some(text) => text.to_string(),
                None => continue,
            },
            Err(e) => {
                tracing::error!("Upstream stream failed: {}", e);
                let _ = tx.send(Err(e)).await;
                return;
            }
        };

        let line = match StreamEvent::text_delta(text).to_ndjson_line() {
            Ok(line) => line,
            Err(e) => {
                tracing::error!("Failed to encode delta: {}", e);
                let _ = tx
                    .send(Err(ProviderError::InvalidResponse(e.to_string())))
                    .await;
                return;
            }
        };

        if tx.send(Ok(Bytes::from(line))).await.is_err() {
            tracing::debug!("Client disconnected, dropping upstream stream");
            return;
        }
    }
    tracing::debug!("Upstream stream completed");
}

async fn handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<NdjsonResponse, RelayError> {
    let Json(request) = payload.map_err(|e| RelayError::InvalidRequest(e.body_text()))?;

    let messages = prepare_prompt(&request.messages);
    if messages.is_empty() {
        return Err(RelayError::NoValidMessages);
    }

    let api_key = state.api_key.resolve()?;
    let provider = state.provider(api_key);

    tracing::info!(
        received = request.messages.len(),
        relayed = messages.len(),
        model = %state.model,
        "Relaying chat request"
    );
    let events = open_stream(&provider, &state, &messages).await?;

    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    tokio::spawn(forward(events, tx));

    Ok(NdjsonResponse::new(ReceiverStream::new(rx)))
}

// Configure routes for this module
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(handler))
        .with_state(state)
}
