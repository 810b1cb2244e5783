use anyhow::{Context, Result};
use murmur::client::RelayClient;

use crate::prompt::rustyline::RustylinePrompt;
use crate::session::Session;

pub fn build_session<'a>(url: &str) -> Result<Session<'a>> {
    let client = RelayClient::new(url).context("Failed to create relay client")?;
    let prompt = RustylinePrompt::new().context("Failed to initialize the line editor")?;
    Ok(Session::new(client, Box::new(prompt)))
}
