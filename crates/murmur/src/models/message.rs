use super::role::Role;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Generate an opaque, time-derived message id
pub fn generate_id() -> String {
    format!("{}-{}", Utc::now().timestamp_millis(), nanoid::nanoid!(8))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A message in the chat history, exchanged between the client and the relay
pub struct Message {
    #[serde(default)]
    pub id: String,
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new<S: Into<String>>(role: Role, content: S) -> Self {
        Message {
            id: generate_id(),
            role,
            content: content.into(),
        }
    }

    /// Create a new user message with a fresh id
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self::new(Role::User, content)
    }

    /// Create a new assistant message with a fresh id
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Replace the generated id, mostly useful for fixtures
    pub fn with_id<S: Into<String>>(mut self, id: S) -> Self {
        self.id = id.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A message as it is sent to the LLM: no id, trimmed content
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_ids_are_unique() {
        let first = Message::user("a");
        let second = Message::user("a");
        assert_ne!(first.id, second.id);
        assert!(first.id.contains('-'));
    }

    #[test]
    fn test_deserialize_without_id() {
        let message: Message =
            serde_json::from_value(json!({"role": "user", "content": "Hello"})).unwrap();
        assert_eq!(message.id, "");
        assert_eq!(message.role, Role::User);
        assert_eq!(message.content, "Hello");
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let result: Result<Message, _> =
            serde_json::from_value(json!({"role": "system", "content": "x"}));
        assert!(result.is_err());
    }
}
