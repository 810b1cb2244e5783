use anyhow::Result;
use murmur::client::RelayClient;
use murmur::conversation::{Conversation, TurnOutcome};

use crate::prompt::{InputType, Prompt};

pub struct Session<'a> {
    client: RelayClient,
    prompt: Box<dyn Prompt + 'a>,
    conversation: Conversation,
}

impl<'a> Session<'a> {
    pub fn new(client: RelayClient, prompt: Box<dyn Prompt + 'a>) -> Self {
        Session {
            client,
            prompt,
            conversation: Conversation::new(),
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub async fn start(&mut self) -> Result<()> {
        self.prompt.murmur_ready();

        loop {
            let input = self.prompt.get_input()?;
            match input.input_type {
                InputType::Message => {
                    if let Some(content) = &input.content {
                        self.process_turn(content).await?;
                    }
                }
                InputType::History => self.prompt.render_history(self.conversation.messages()),
                InputType::Exit => break,
                _ => continue,
            }
        }
        self.prompt.close();
        Ok(())
    }

    /// Send a single message and return how the turn ended
    pub async fn headless_start(&mut self, text: &str) -> Result<TurnOutcome> {
        let outcome = self.process_turn(text).await?;
        self.prompt.close();
        Ok(outcome)
    }

    async fn process_turn(&mut self, text: &str) -> Result<TurnOutcome> {
        self.prompt.show_busy();

        let prompt = &mut self.prompt;
        let mut streaming = false;
        let result = self
            .client
            .send(&mut self.conversation, text, |pending| {
                if !streaming {
                    prompt.hide_busy();
                    streaming = true;
                }
                prompt.render_pending(pending);
            })
            .await;
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                self.prompt.hide_busy();
                return Err(e.into());
            }
        };

        if !streaming {
            self.prompt.hide_busy();
        }
        self.prompt.end_pending();

        match &outcome {
            TurnOutcome::Committed(_) => {}
            TurnOutcome::Discarded => tracing::warn!("Relay returned an empty reply"),
            TurnOutcome::Failed(message) => self.prompt.render(message),
        }
        Ok(outcome)
    }
}
