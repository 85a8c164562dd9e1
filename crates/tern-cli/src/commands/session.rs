use std::io::{self, Write};

use anyhow::Result;
use console::style;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tern::client::{ChatClient, MessageUpdate};
use tern::errors::{ChatError, ChatResult};
use tern::models::conversation::Conversation;
use tern::settings::Settings;
use tern::state::ChatState;
use tern::store::{ConversationStore, SettingsStore};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const PROMPT: &str = "\x1b[1m\x1b[38;5;36m(tern)> \x1b[0m";

pub async fn start_session(endpoint: String, fresh: bool) -> Result<()> {
    let settings_store = SettingsStore::new()?;
    let settings = match settings_store.load() {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("{}", style(format!("Could not read settings: {err}")).yellow());
            Settings::default()
        }
    };

    let store = ConversationStore::new()?;
    let saved = match store.load() {
        Ok(saved) => saved,
        Err(err) => {
            eprintln!(
                "{}",
                style(format!("Could not read saved conversations: {err}")).yellow()
            );
            Vec::new()
        }
    };

    let mut state = ChatState::from_conversations(saved);
    if fresh || state.active_id().is_none() {
        state.create_conversation(None);
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut client = ChatClient::new(endpoint.clone()).with_updates(tx);
    if let Some(entry) = settings.active_provider() {
        client = client
            .with_provider(entry.config.provider_type())
            .with_model(entry.config.model());
        if let Some(temperature) = entry.config.temperature() {
            client = client.with_temperature(temperature);
        }
    }

    println!(
        "tern chat {}",
        style("- type \"exit\" to end, /help for commands").dim()
    );
    println!("{}", style(format!("Relay: {endpoint}")).dim());
    if let Some(conversation) = state.active() {
        println!(
            "{}",
            style(format!("Conversation: {}", conversation.title)).dim()
        );
    }
    println!();

    let mut editor = DefaultEditor::new()?;
    let mut printer = DeltaPrinter::new();

    loop {
        let line = match editor.readline(PROMPT) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("Input error: {}", err);
                break;
            }
        };

        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if text.eq_ignore_ascii_case("exit") {
            break;
        }
        if let Some(command) = text.strip_prefix('/') {
            run_command(&mut state, command);
            if settings.auto_save {
                save_conversations(&store, &state);
            }
            continue;
        }
        if state.is_loading {
            continue;
        }

        let _ = editor.add_history_entry(text);

        if state.active_id().is_none() {
            state.create_conversation(None);
        }
        state.is_loading = true;
        state.error = None;

        let cancel = CancellationToken::new();
        let result = match state.active_mut() {
            Some(conversation) => {
                send_with_interrupt(&client, conversation, text, &cancel, &mut rx, &mut printer)
                    .await
            }
            None => Ok(()),
        };
        state.is_loading = false;

        match result {
            Ok(()) => println!(),
            Err(ChatError::Cancelled) => {
                println!();
                println!("{}", style("Interrupted. Partial reply kept.").dim());
            }
            Err(err) => {
                println!();
                state.error = Some(err.to_string());
                eprintln!("{}", style(format!("Error: {err}")).red());
            }
        }

        if settings.auto_save {
            save_conversations(&store, &state);
        }
    }

    if settings.auto_save {
        save_conversations(&store, &state);
    }
    Ok(())
}

/// Streams one reply while printing deltas as they arrive. Ctrl+C cancels
/// the stream; the partial assistant message stays in the conversation.
async fn send_with_interrupt(
    client: &ChatClient,
    conversation: &mut Conversation,
    text: &str,
    cancel: &CancellationToken,
    rx: &mut mpsc::UnboundedReceiver<MessageUpdate>,
    printer: &mut DeltaPrinter,
) -> ChatResult<()> {
    let send = client.send_message(conversation, text, cancel);
    tokio::pin!(send);

    let result = loop {
        tokio::select! {
            result = &mut send => break result,
            Some(update) = rx.recv() => printer.print(&update),
            _ = tokio::signal::ctrl_c() => cancel.cancel(),
        }
    };

    // Drain updates pushed between the last poll and completion.
    while let Ok(update) = rx.try_recv() {
        printer.print(&update);
    }
    result
}

fn save_conversations(store: &ConversationStore, state: &ChatState) {
    if let Err(err) = store.save(&state.to_persisted()) {
        eprintln!(
            "{}",
            style(format!("Failed to save conversations: {err}")).red()
        );
    }
}

/// Prints only the suffix each cumulative update adds, so streamed text
/// renders incrementally on one line.
struct DeltaPrinter {
    current_id: String,
    printed: usize,
}

impl DeltaPrinter {
    fn new() -> Self {
        DeltaPrinter {
            current_id: String::new(),
            printed: 0,
        }
    }

    fn print(&mut self, update: &MessageUpdate) {
        if update.message_id != self.current_id {
            self.current_id = update.message_id.clone();
            self.printed = 0;
        }
        if update.content.len() > self.printed {
            print!("{}", &update.content[self.printed..]);
            self.printed = update.content.len();
            let _ = io::stdout().flush();
        }
    }
}

fn run_command(state: &mut ChatState, command: &str) {
    let mut parts = command.trim().splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or("").to_lowercase();
    let rest = parts.next().unwrap_or("").trim();

    match name.as_str() {
        "new" => {
            state.create_conversation((!rest.is_empty()).then_some(rest));
            if let Some(conversation) = state.active() {
                println!("Started {}", conversation.title);
            }
        }
        "list" => {
            if state.conversations().is_empty() {
                println!("No conversations yet. /new starts one.");
            }
            let active_id = state.active_id().map(str::to_string);
            for (index, conversation) in state.conversations().iter().enumerate() {
                let marker = if active_id.as_deref() == Some(conversation.id.as_str()) {
                    "*"
                } else {
                    " "
                };
                println!(
                    "{} {}. {} ({} messages)",
                    marker,
                    index + 1,
                    conversation.title,
                    conversation.messages.len()
                );
            }
        }
        "switch" => {
            if rest.is_empty() {
                println!("Usage: /switch <number>");
                return;
            }
            let target = rest
                .parse::<usize>()
                .ok()
                .and_then(|number| state.conversations().get(number.wrapping_sub(1)))
                .map(|conversation| conversation.id.clone())
                .or_else(|| {
                    state
                        .conversations()
                        .iter()
                        .find(|conversation| conversation.id.starts_with(rest))
                        .map(|conversation| conversation.id.clone())
                });
            match target {
                Some(id) => {
                    state.set_active(&id);
                    if let Some(conversation) = state.active() {
                        println!("Switched to {}", conversation.title);
                    }
                }
                None => println!("No conversation matches `{rest}`"),
            }
        }
        "rename" => {
            if rest.is_empty() {
                println!("Usage: /rename <title>");
                return;
            }
            match state.active_id().map(str::to_string) {
                Some(id) => {
                    state.rename(&id, rest);
                    println!("Renamed to {rest}");
                }
                None => println!("No conversation selected. /new starts one."),
            }
        }
        "clear" => match state.active_id().map(str::to_string) {
            Some(id) => {
                state.clear_messages(&id);
                println!("Cleared messages");
            }
            None => println!("No conversation selected. /new starts one."),
        },
        "delete" => match state.active_id().map(str::to_string) {
            Some(id) => {
                state.delete(&id);
                match state.active() {
                    Some(conversation) => println!("Deleted. Now in {}", conversation.title),
                    None => println!("Deleted. No conversations left; /new starts one."),
                }
            }
            None => println!("No conversation selected. /new starts one."),
        },
        "help" | "?" => {
            println!("Commands:");
            println!("/new [title] - Start a fresh conversation");
            println!("/list - List conversations");
            println!("/switch <number> - Select a conversation");
            println!("/rename <title> - Rename the current conversation");
            println!("/clear - Remove all messages from the current conversation");
            println!("/delete - Delete the current conversation");
            println!("/help - Display this help message");
            println!("exit - End the session");
            println!("Ctrl+C - Interrupt a streaming reply (partial text is kept)");
        }
        other => println!("Unknown command: /{other} (try /help)"),
    }
}
