mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:3000/api/chat";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Configure providers and appearance
    Configure,
    /// Start an interactive chat session (the default)
    Session {
        /// Relay endpoint to chat through
        #[arg(long, default_value = DEFAULT_ENDPOINT)]
        endpoint: String,

        /// Start in a fresh conversation instead of resuming
        #[arg(long)]
        new: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Configure) => commands::configure::handle_configure().await,
        Some(Command::Session { endpoint, new }) => {
            commands::session::start_session(endpoint, new).await
        }
        None => commands::session::start_session(DEFAULT_ENDPOINT.to_string(), false).await,
    }
}
