use std::io::{self, Write};

use anyhow::Result;
use bat::WrappingMode;
use cliclack::spinner;
use console::style;
use murmur::conversation::PendingMessage;
use murmur::models::message::Message;
use murmur::models::role::Role;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use super::{
    parse_input, print_help, thinking::get_random_thinking_message, Input, InputType, Prompt,
    Theme,
};

const PROMPT: &str = "\x1b[1m\x1b[38;5;30m( ~)> \x1b[0m";

pub struct RustylinePrompt {
    editor: DefaultEditor,
    spinner: cliclack::ProgressBar,
    theme: Theme,
    show_assistant: bool,
    // How much of the pending reply is already on screen
    printed: usize,
}

impl RustylinePrompt {
    pub fn new() -> Result<Self> {
        Ok(RustylinePrompt {
            editor: DefaultEditor::new()?,
            spinner: spinner(),
            theme: Theme::Dark,
            show_assistant: true,
            printed: 0,
        })
    }

    fn bat_theme(&self) -> &'static str {
        match self.theme {
            Theme::Light => "GitHub",
            Theme::Dark => "zenburn",
        }
    }

    fn toggle_theme(&mut self) {
        self.theme = match self.theme {
            Theme::Light => {
                println!("Switching to Dark theme");
                Theme::Dark
            }
            Theme::Dark => {
                println!("Switching to Light theme");
                Theme::Light
            }
        };
    }

    fn toggle_visibility(&mut self) {
        self.show_assistant = !self.show_assistant;
        if self.show_assistant {
            println!("Showing assistant replies");
        } else {
            println!("Hiding assistant replies");
        }
    }
}

fn print_markdown(content: &str, theme: &str) {
    let printed = bat::PrettyPrinter::new()
        .input(bat::Input::from_bytes(content.as_bytes()))
        .theme(theme)
        .language("Markdown")
        .wrapping_mode(WrappingMode::Character)
        .print();
    if let Err(e) = printed {
        tracing::warn!("Failed to render markdown: {}", e);
        println!("{}", content);
    }
}

fn print_header(role: &Role) {
    let header = match role {
        Role::User => style("you").cyan().bold(),
        Role::Assistant => style("murmur").magenta().bold(),
    };
    println!("─── {} ──────────────────────────", header);
}

fn flush() {
    if let Err(e) = io::stdout().flush() {
        tracing::warn!("Failed to flush stdout: {}", e);
    }
}

impl Prompt for RustylinePrompt {
    fn render(&mut self, message: &Message) {
        if message.role == Role::Assistant && !self.show_assistant {
            return;
        }
        print_markdown(&message.content, self.bat_theme());
        println!();
        flush();
    }

    fn render_pending(&mut self, pending: &PendingMessage) {
        let content = pending.content();
        if !self.show_assistant || content.len() <= self.printed {
            return;
        }
        // Fragments only append, so the old length is still a char boundary
        print!("{}", &content[self.printed..]);
        self.printed = content.len();
        flush();
    }

    fn end_pending(&mut self) {
        if self.printed > 0 {
            println!("\n");
            flush();
        }
        self.printed = 0;
    }

    fn render_history(&mut self, messages: &[Message]) {
        if messages.is_empty() {
            println!("{}", style("No messages yet").dim());
            return;
        }
        let theme = self.bat_theme();
        for message in messages {
            if message.role == Role::Assistant && !self.show_assistant {
                continue;
            }
            print_header(&message.role);
            print_markdown(&message.content, theme);
            println!();
        }
        flush();
    }

    fn show_busy(&mut self) {
        self.spinner = spinner();
        self.spinner
            .start(format!("{}...", get_random_thinking_message()));
    }

    fn hide_busy(&mut self) {
        self.spinner.stop("");
    }

    fn get_input(&mut self) -> Result<Input> {
        let line = match self.editor.readline(PROMPT) {
            Ok(line) => line,
            Err(e) => {
                match e {
                    ReadlineError::Interrupted | ReadlineError::Eof => (),
                    _ => eprintln!("Input error: {}", e),
                }
                return Ok(Input {
                    input_type: InputType::Exit,
                    content: None,
                });
            }
        };

        let input = parse_input(&line);
        match input.input_type {
            InputType::ToggleTheme => self.toggle_theme(),
            InputType::ToggleVisibility => self.toggle_visibility(),
            InputType::Help => print_help(),
            InputType::Message => {
                let _ = self.editor.add_history_entry(line.trim());
                return Ok(input);
            }
            _ => return Ok(input),
        }

        Ok(Input {
            input_type: InputType::AskAgain,
            content: None,
        })
    }

    fn close(&self) {
        // No cleanup required
    }
}
