use anyhow::Result;
use murmur::conversation::PendingMessage;
use murmur::models::message::Message;

pub mod rustyline;
pub mod thinking;

pub trait Prompt {
    /// Render a complete message
    fn render(&mut self, message: &Message);
    /// Render the reply under construction; called after every fragment
    fn render_pending(&mut self, pending: &PendingMessage);
    /// The pending reply is done, committed or not
    fn end_pending(&mut self);
    fn render_history(&mut self, messages: &[Message]);
    fn get_input(&mut self) -> Result<Input>;
    fn show_busy(&mut self);
    fn hide_busy(&mut self);
    fn close(&self);
    fn murmur_ready(&self) {
        println!("\n");
        println!("murmur is connected! Type a message, or /help for commands.");
        println!("\n");
    }
}

pub struct Input {
    pub input_type: InputType,
    pub content: Option<String>, // Optional content as sometimes the user may be issuing a command eg. (Exit)
}

impl Input {
    fn command(input_type: InputType) -> Self {
        Input {
            input_type,
            content: None,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum InputType {
    AskAgain,         // Ask the user for input again. Control flow command.
    Message,          // User sent a message
    Exit,             // User wants to exit the session
    History,          // Show the conversation so far
    ToggleTheme,      // Switch between light and dark rendering
    ToggleVisibility, // Show or hide assistant replies
    Help,
}

pub enum Theme {
    Light,
    Dark,
}

/// Map a line of user input to what the session should do with it
pub fn parse_input(line: &str) -> Input {
    let text = line.trim();
    let input_type = match text.to_ascii_lowercase().as_str() {
        "" => InputType::AskAgain,
        "/exit" | "/quit" => InputType::Exit,
        "/history" => InputType::History,
        "/t" => InputType::ToggleTheme,
        "/hide" => InputType::ToggleVisibility,
        "/?" | "/help" => InputType::Help,
        _ => {
            return Input {
                input_type: InputType::Message,
                content: Some(text.to_string()),
            }
        }
    };
    Input::command(input_type)
}

pub fn print_help() {
    println!("Commands:");
    println!("/exit - Exit the session");
    println!("/history - Show the conversation so far");
    println!("/t - Toggle Light/Dark theme");
    println!("/hide - Hide or show assistant replies");
    println!("/? | /help - Display this help message");
}
