//! These models represent the objects passed between the chat client, the relay and the provider
//!
//! There are a few related formats we need to interact with:
//! - chat messages, sent from the client to the relay with the full history
//! - prompt messages, the filtered `{role, content}` pairs sent from the relay to the LLM
//! - stream events, typed events emitted by the LLM and re-emitted by the relay as NDJSON
//!
//! The stream event types double as the wire format of the relay, so the same structs
//! are used to parse upstream events, serialize outgoing lines, and parse them on the client.
pub mod api;
pub mod event;
pub mod message;
pub mod role;
