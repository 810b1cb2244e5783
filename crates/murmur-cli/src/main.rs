use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use murmur::client::DEFAULT_RELAY_URL;
use murmur::conversation::TurnOutcome;

mod commands {
    pub mod session;
}
mod prompt;
mod session;

use commands::session::build_session;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Relay endpoint to send chat turns to
    #[arg(long, env = "MURMUR_URL", default_value = DEFAULT_RELAY_URL)]
    url: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start an interactive chat session
    Session,

    /// Send a single message and print the reply
    Run {
        /// Message text
        #[arg(short, long)]
        text: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they never interleave with the streamed reply
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(tracing::Level::WARN)
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Session) {
        Command::Session => {
            println!(
                "murmur chat {}",
                style(format!("- relaying through {}", cli.url)).dim()
            );
            let mut session = build_session(&cli.url)?;
            session.start().await?;
        }
        Command::Run { text } => {
            let mut session = build_session(&cli.url)?;
            if let TurnOutcome::Failed(_) = session.headless_start(&text).await? {
                anyhow::bail!("The relay did not return a reply");
            }
        }
    }
    Ok(())
}
