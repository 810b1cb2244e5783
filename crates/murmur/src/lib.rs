pub mod client;
pub mod conversation;
pub mod errors;
pub mod framing;
pub mod models;
pub mod prompt;
pub mod providers;
