// src/cli/chat.rs — Interactive REPL

use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;

use super::export::{self, ExportFormat};
use super::render::TerminalRenderer;
use super::theme::Theme;
use crate::backend::build_backend;
use crate::core::{ChatSession, RejectReason, SubmitOutcome};
use crate::history::HistoryStore;
use crate::infra::config::Config;
use crate::infra::storage::Storage;

/// Resolve the backend and open the persisted session, wired to `renderer`.
pub fn open_session(
    config: &Config,
    storage: Arc<dyn Storage>,
    renderer: Option<Arc<TerminalRenderer>>,
) -> anyhow::Result<ChatSession> {
    let mode = config.resolve_backend()?;
    tracing::info!(mode = mode.label(), "Using {} backend", mode.label());

    let session = ChatSession::open(build_backend(&mode), HistoryStore::new(storage))?;
    Ok(match renderer {
        Some(r) => session.with_observer(move |event| r.handle(event)),
        None => session,
    })
}

/// Ask before wiping history. Non-interactive input counts as yes.
pub fn confirm_clear() -> bool {
    if !std::io::stdin().is_terminal() {
        return true;
    }
    inquire::Confirm::new("Are you sure you want to clear the chat history?")
        .with_default(false)
        .prompt()
        .unwrap_or(false)
}

/// Run the interactive chat REPL.
pub async fn run_chat(
    session: &ChatSession,
    renderer: &TerminalRenderer,
    storage: &dyn Storage,
    config: &Config,
) -> anyhow::Result<()> {
    eprintln!(
        "counselbot v{} | {} mode | session {}\n",
        env!("CARGO_PKG_VERSION"),
        session.mode(),
        session.session_id(),
    );

    renderer
        .replay(
            &session.history(),
            Duration::from_millis(config.ui.replay_delay_ms),
        )
        .await;

    let mut replies = 0u32;
    let mut failures = 0u32;

    while let Some(input) = read_input() {
        let trimmed = input.trim();

        // Handle quit
        if trimmed == "quit" || trimmed == "exit" || trimmed == "/quit" {
            break;
        }

        // Handle slash commands
        if trimmed.starts_with('/') {
            handle_slash_command(trimmed, session, renderer, storage).await;
            continue;
        }

        match session.submit(trimmed).await {
            SubmitOutcome::Rejected(RejectReason::Empty) => continue,
            SubmitOutcome::Rejected(RejectReason::Busy) => {
                eprintln!("  Still waiting for the previous reply.");
            }
            SubmitOutcome::Replied { .. } => replies += 1,
            SubmitOutcome::Failed { error } => {
                failures += 1;
                tracing::debug!("Turn failed: {}", error);
            }
        }
    }

    eprintln!(
        "\nSession total: {} repl{}, {} failed, {} message(s) saved",
        replies,
        if replies == 1 { "y" } else { "ies" },
        failures,
        session.history().len(),
    );
    Ok(())
}

fn read_input() -> Option<String> {
    use std::io::{self, BufRead, Write};

    print!("> ");
    io::stdout().flush().ok();

    let stdin = io::stdin();
    let mut line = String::new();
    match stdin.lock().read_line(&mut line) {
        Ok(0) => None, // EOF
        Ok(_) => Some(line),
        Err(_) => None,
    }
}

async fn handle_slash_command(
    input: &str,
    session: &ChatSession,
    renderer: &TerminalRenderer,
    storage: &dyn Storage,
) {
    let parts: Vec<&str> = input.splitn(2, ' ').collect();
    let cmd = parts[0];
    let arg = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match cmd {
        "/clear" => {
            if !confirm_clear() {
                eprintln!("  Kept history.");
                return;
            }
            if let Err(e) = session.clear().await {
                eprintln!("  Could not clear history: {}", e);
            }
        }

        "/export" => {
            let output = if arg.is_empty() { None } else { Some(arg) };
            match export::run_export(&session.history(), ExportFormat::Json, output) {
                Ok(Some(path)) => eprintln!("  Exported to {}", path.display()),
                Ok(None) => {}
                Err(e) => eprintln!("  Export failed: {}", e),
            }
        }

        "/history" => {
            renderer.replay(&session.history(), Duration::ZERO).await;
        }

        "/theme" => {
            let next = if arg.is_empty() {
                renderer.theme().toggle()
            } else {
                match Theme::parse(arg) {
                    Some(t) => t,
                    None => {
                        eprintln!("  Unknown theme '{}'. Options: light, dark", arg);
                        return;
                    }
                }
            };
            renderer.set_theme(next);
            if let Err(e) = next.save(storage) {
                tracing::warn!("Could not save theme preference: {}", e);
            }
            eprintln!("  Theme set to {}", next);
        }

        "/session" => {
            eprintln!("  Session: {}", session.session_id());
            eprintln!("  Backend: {} mode", session.mode());
            eprintln!("  Messages: {}", session.history().len());
        }

        "/help" => {
            eprintln!("Slash commands:");
            eprintln!("  /clear             Clear the conversation");
            eprintln!("  /export [path]     Save the conversation as JSON");
            eprintln!("  /history           Reprint the conversation");
            eprintln!("  /theme [name]      Toggle or set light/dark theme");
            eprintln!("  /session           Show session id and backend mode");
            eprintln!("  /help              Show this help");
            eprintln!("  /quit, quit, exit  End session");
        }

        _ => {
            eprintln!("Unknown command: {}. Type /help for commands.", cmd);
        }
    }
}
