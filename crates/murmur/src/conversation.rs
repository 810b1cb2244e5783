use thiserror::Error;

use crate::models::message::{generate_id, Message, PromptMessage};
use crate::models::role::Role;

/// Prefix of the placeholder the client records when a turn fails
pub const ERROR_SENTINEL: &str = "Sorry, I encountered an error";

/// The synthetic assistant reply appended to history when a turn fails
pub const ERROR_REPLY: &str =
    "Sorry, I encountered an error. Please check your API key and try again.";

/// Filter a chat history into the messages sent upstream.
///
/// Drops blank messages and previous error placeholders, trims the rest, and keeps
/// their order.
pub fn prepare_prompt(messages: &[Message]) -> Vec<PromptMessage> {
    messages
        .iter()
        .filter_map(|message| {
            let content = message.content.trim();
            if content.is_empty() || message.content.starts_with(ERROR_SENTINEL) {
                return None;
            }
            Some(PromptMessage {
                role: message.role,
                content: content.to_string(),
            })
        })
        .collect()
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversationError {
    #[error("A reply is already in progress")]
    Busy,

    #[error("Message is empty")]
    EmptyInput,
}

/// An assistant reply under construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMessage {
    id: String,
    content: String,
}

impl PendingMessage {
    fn new() -> Self {
        Self {
            id: generate_id(),
            content: String::new(),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    fn into_message(self) -> Message {
        Message::assistant(self.content).with_id(self.id)
    }
}

/// Where the current turn is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    Sending,
    Streaming(PendingMessage),
}

/// How a turn ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The reply was appended to history
    Committed(Message),
    /// The reply was empty and nothing was appended
    Discarded,
    /// The turn failed and the error placeholder was appended
    Failed(Message),
}

/// The client's chat history plus the turn currently in flight.
///
/// A turn moves `Idle -> Sending -> Streaming -> Idle`; the user message is appended
/// optimistically when the turn begins, the reply only when it completes.
#[derive(Debug)]
pub struct Conversation {
    messages: Vec<Message>,
    state: TurnState,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            state: TurnState::Idle,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn state(&self) -> &TurnState {
        &self.state
    }

    pub fn is_busy(&self) -> bool {
        self.state != TurnState::Idle
    }

    pub fn pending(&self) -> Option<&PendingMessage> {
        match &self.state {
            TurnState::Streaming(pending) => Some(pending),
            _ => None,
        }
    }

    /// Append the user's message and enter `Sending`, returning the history to send
    pub fn begin_turn(&mut self, text: &str) -> Result<&[Message], ConversationError> {
        if self.is_busy() {
            return Err(ConversationError::Busy);
        }
        if text.trim().is_empty() {
            return Err(ConversationError::EmptyInput);
        }

        self.messages.push(Message::user(text));
        self.state = TurnState::Sending;
        Ok(&self.messages)
    }

    /// The relay accepted the request; start accumulating the reply
    pub fn start_streaming(&mut self) {
        if self.state == TurnState::Sending {
            self.state = TurnState::Streaming(PendingMessage::new());
        }
    }

    /// Append a fragment to the pending reply, returning it for rendering
    pub fn push_delta(&mut self, text: &str) -> Option<&PendingMessage> {
        match &mut self.state {
            TurnState::Streaming(pending) => {
                pending.content.push_str(text);
                Some(pending)
            }
            _ => None,
        }
    }

    /// The stream ended cleanly: keep the reply unless it is blank
    pub fn finish(&mut self) -> TurnOutcome {
        match std::mem::replace(&mut self.state, TurnState::Idle) {
            TurnState::Streaming(pending) if !pending.content.trim().is_empty() => {
                let message = pending.into_message();
                self.messages.push(message.clone());
                TurnOutcome::Committed(message)
            }
            _ => TurnOutcome::Discarded,
        }
    }

    /// The turn failed: drop any partial reply and record the error placeholder
    pub fn fail(&mut self) -> TurnOutcome {
        self.state = TurnState::Idle;
        let message = Message::new(Role::Assistant, ERROR_REPLY);
        self.messages.push(message.clone());
        TurnOutcome::Failed(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(messages: &[PromptMessage]) -> Vec<&str> {
        messages.iter().map(|m| m.content.as_str()).collect()
    }

    #[test]
    fn test_prepare_prompt_filters_and_trims() {
        let history = vec![
            Message::user("  first  "),
            Message::assistant("   "),
            Message::assistant(ERROR_REPLY),
            Message::user("second"),
            Message::assistant("\nreply\n"),
            Message::user(""),
        ];

        let prompt = prepare_prompt(&history);
        assert_eq!(contents(&prompt), vec!["first", "second", "reply"]);
        assert_eq!(
            prompt.iter().map(|m| m.role).collect::<Vec<_>>(),
            vec![Role::User, Role::User, Role::Assistant]
        );
    }

    #[test]
    fn test_prepare_prompt_sentinel_is_a_prefix_match() {
        let history = vec![
            Message::assistant("Sorry, I encountered an error while thinking"),
            Message::user("I said: Sorry, I encountered an error"),
        ];
        let prompt = prepare_prompt(&history);
        assert_eq!(contents(&prompt), vec!["I said: Sorry, I encountered an error"]);
    }

    #[test]
    fn test_prepare_prompt_empty() {
        assert!(prepare_prompt(&[]).is_empty());
        assert!(prepare_prompt(&[Message::user(" \t\n")]).is_empty());
    }

    #[test]
    fn test_committed_turn() {
        let mut conversation = Conversation::new();
        let sent = conversation.begin_turn("Hello").unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(conversation.state(), &TurnState::Sending);

        conversation.start_streaming();
        for fragment in ["Hi", " there", "!"] {
            conversation.push_delta(fragment);
        }
        assert_eq!(conversation.pending().unwrap().content(), "Hi there!");

        let outcome = conversation.finish();
        assert!(matches!(outcome, TurnOutcome::Committed(ref m) if m.content == "Hi there!"));
        assert_eq!(conversation.state(), &TurnState::Idle);
        assert!(conversation.pending().is_none());

        let messages = conversation.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "Hello");
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].content, "Hi there!");
    }

    #[test]
    fn test_blank_reply_is_discarded() {
        let mut conversation = Conversation::new();
        conversation.begin_turn("Hello").unwrap();
        conversation.start_streaming();
        conversation.push_delta("  ");
        conversation.push_delta("\n");

        assert_eq!(conversation.finish(), TurnOutcome::Discarded);
        assert_eq!(conversation.messages().len(), 1);
        assert!(!conversation.is_busy());
    }

    #[test]
    fn test_only_one_turn_in_flight() {
        let mut conversation = Conversation::new();
        conversation.begin_turn("first").unwrap();
        assert_eq!(
            conversation.begin_turn("second"),
            Err(ConversationError::Busy)
        );
        conversation.start_streaming();
        assert_eq!(
            conversation.begin_turn("second"),
            Err(ConversationError::Busy)
        );
        assert_eq!(conversation.messages().len(), 1);
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let mut conversation = Conversation::new();
        assert_eq!(
            conversation.begin_turn("   "),
            Err(ConversationError::EmptyInput)
        );
        assert!(conversation.messages().is_empty());
        assert!(!conversation.is_busy());
    }

    #[test]
    fn test_failure_appends_placeholder_and_drops_partial_reply() {
        let mut conversation = Conversation::new();
        conversation.begin_turn("Hello").unwrap();
        conversation.start_streaming();
        conversation.push_delta("partial");

        let outcome = conversation.fail();
        assert!(matches!(outcome, TurnOutcome::Failed(ref m) if m.content == ERROR_REPLY));
        assert!(!conversation.is_busy());

        let messages = conversation.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "Hello");
        assert_eq!(messages[1].content, ERROR_REPLY);

        // The placeholder never goes back upstream
        assert_eq!(contents(&prepare_prompt(messages)), vec!["Hello"]);
    }

    #[test]
    fn test_delta_outside_streaming_is_ignored() {
        let mut conversation = Conversation::new();
        assert!(conversation.push_delta("stray").is_none());
        conversation.begin_turn("Hello").unwrap();
        assert!(conversation.push_delta("early").is_none());
        conversation.start_streaming();
        assert_eq!(conversation.push_delta("ok").unwrap().content(), "ok");
    }
}
