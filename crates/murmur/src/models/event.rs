use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
/// A typed event in the LLM's streaming response.
///
/// Only text deltas and errors are consumed; everything else (message_start, ping,
/// content_block_stop, ...) deserializes into `Other` and is dropped.
pub enum StreamEvent {
    ContentBlockDelta { delta: Delta },
    Error { error: ErrorBody },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Delta {
    TextDelta { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub message: String,
}

impl StreamEvent {
    pub fn text_delta<S: Into<String>>(text: S) -> Self {
        StreamEvent::ContentBlockDelta {
            delta: Delta::TextDelta { text: text.into() },
        }
    }

    /// Get the text if this is a text delta
    pub fn as_text_delta(&self) -> Option<&str> {
        match self {
            StreamEvent::ContentBlockDelta {
                delta: Delta::TextDelta { text },
            } => Some(text),
            _ => None,
        }
    }

    /// Serialize as one newline-terminated JSON record
    pub fn to_ndjson_line(&self) -> serde_json::Result<Vec<u8>> {
        let mut line = serde_json::to_vec(self)?;
        line.push(b'\n');
        Ok(line)
    }
}
