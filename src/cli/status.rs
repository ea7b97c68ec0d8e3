// src/cli/status.rs — Configuration and backend status display

use std::path::Path;

use super::theme::Theme;
use crate::backend::CounselBackend;
use crate::infra::config::{BackendMode, Config};
use crate::infra::storage::{FileStorage, Storage};
use crate::history::HistoryStore;

/// Display configuration, local session state, and backend health.
pub async fn show_status(
    config: &Config,
    config_path: &Path,
    storage: &FileStorage,
    store: &HistoryStore,
    backend: &dyn CounselBackend,
) -> anyhow::Result<()> {
    println!("counselbot v{}", env!("CARGO_PKG_VERSION"));
    println!();

    // Config
    if config_path.exists() {
        println!("  Config:     {} (loaded)", config_path.display());
    } else {
        println!("  Config:     (using defaults)");
    }

    // Backend
    let mode = config.resolve_backend()?;
    match &mode {
        BackendMode::Direct { api_url } => {
            println!("  Backend:    direct ({})", api_url);
        }
        BackendMode::Queued {
            run_url,
            status_url,
            api_key,
            poll,
        } => {
            println!("  Backend:    queued ({})", run_url);
            println!("  Status URL: {}", status_url);
            println!(
                "  API key:    {}",
                if api_key.is_some() { "set" } else { "(none)" }
            );
            println!(
                "  Polling:    {} attempts, {}ms apart",
                poll.max_attempts, poll.interval_ms
            );
        }
    }

    // Local state
    println!("  Storage:    {}", storage.root().display());
    match store.session_id() {
        Ok(id) => println!("  Session:    {}", id),
        Err(e) => println!("  Session:    (unavailable: {})", e),
    }
    let history = store.load();
    let user_turns = history.iter().filter(|e| e.is_user).count();
    println!(
        "  History:    {} message(s), {} from you",
        history.len(),
        user_turns
    );
    println!("  Theme:      {}", Theme::load(storage as &dyn Storage));

    // Health
    println!();
    match backend.health().await {
        Ok(Some(status)) => println!("  Health:     {}", status),
        Ok(None) => println!("  Health:     (not available in {} mode)", backend.mode()),
        Err(e) => println!("  Health:     unreachable ({})", e),
    }

    Ok(())
}
