use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::errors::ProviderResult;
use crate::models::event::StreamEvent;
use crate::models::message::PromptMessage;

/// Events of one streaming completion, in arrival order.
///
/// An `Err` item means the upstream stream broke; nothing follows it.
pub type EventStream = BoxStream<'static, ProviderResult<StreamEvent>>;

/// Base trait for streaming LLM providers
#[async_trait]
pub trait Provider: Send + Sync {
    /// Open a streaming completion for the conversation.
    ///
    /// Resolves once the provider has accepted the request, so authentication,
    /// rate limit and connection failures surface here instead of inside the stream.
    async fn stream(&self, system: &str, messages: &[PromptMessage])
        -> ProviderResult<EventStream>;
}
