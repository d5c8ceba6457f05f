mod client;
mod config;
mod conversation;
mod decoder;
mod error;
mod events;
mod logging;
mod quick_reply;
mod session;
mod streaming;
mod ui;

use crate::client::{ChatBackend, HttpChatBackend};
use crate::config::Config;
use crate::events::{DisplayMode, StreamEvent};
use crate::session::{ChatSession, StreamOutcome, SubmitOutcome};
use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "support-chat")]
#[command(version = "0.1.0")]
#[command(about = "Chat with the support assistant", long_about = None)]
struct Cli {
    /// Chat backend URL (overrides config and SUPPORT_CHAT_ENDPOINT)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Start in dark mode
    #[arg(long, global = true)]
    dark: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the chat window (default)
    Chat,
    /// Send one message and print the reply as it streams
    Ask { message: String },
    /// Write the effective settings to the config file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(endpoint) = cli.endpoint {
        config.endpoint = endpoint;
    }
    if cli.dark {
        config.ui.theme = DisplayMode::Dark;
    }

    let backend: Arc<dyn ChatBackend> = Arc::new(HttpChatBackend::new(&config)?);
    let session = ChatSession::new(backend, &config.greeting);

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            logging::init_file(&config.log_dir())?;
            tracing::info!(endpoint = %config.endpoint, "starting chat");
            ui::App::new(&config, session).run().await
        }
        Commands::Ask { message } => {
            logging::init_stderr()?;
            ask(session, &message, &config.endpoint).await
        }
        Commands::Init => {
            config.save()?;
            println!("Wrote {}", config.config_path().display());
            Ok(())
        }
    }
}

async fn ask(mut session: ChatSession, message: &str, endpoint: &str) -> Result<()> {
    let mut stdout = std::io::stdout();
    tracing::debug!(session = %session.id(), "one-shot ask");

    match session.submit(message) {
        SubmitOutcome::Ignored => bail!("Nothing to send: the message is blank"),
        SubmitOutcome::Busy => bail!("A reply is already in progress"),
        SubmitOutcome::QuickReply(reply) => {
            writeln!(stdout, "{}", reply.reply())?;
        }
        SubmitOutcome::Dispatched => {
            let mut printed = false;
            while let Some(event) = session.step().await {
                match event {
                    StreamEvent::Fragment(text) => {
                        write!(stdout, "{text}")?;
                        stdout.flush()?;
                        printed = true;
                    }
                    StreamEvent::Failed(_) => {
                        if printed {
                            writeln!(stdout)?;
                        }
                        if let Some(reply) = session.conversation().last() {
                            write!(stdout, "{}", reply.content)?;
                        }
                    }
                    StreamEvent::Connected | StreamEvent::Completed => {}
                }
            }
            writeln!(stdout)?;

            if session.last_outcome() == Some(StreamOutcome::Failed) {
                bail!("The chat backend at {endpoint} did not answer");
            }
        }
    }

    Ok(())
}
