// src/main.rs — counselbot entry point

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use counselbot::cli::chat::{confirm_clear, open_session, run_chat};
use counselbot::cli::render::TerminalRenderer;
use counselbot::cli::theme::Theme;
use counselbot::cli::{export, status, Cli, Commands};
use counselbot::history::HistoryStore;
use counselbot::infra::config::Config;
use counselbot::infra::logger;
use counselbot::infra::paths;
use counselbot::infra::storage::{FileStorage, Storage};

#[tokio::main]
async fn main() {
    // Initialize logging (respects RUST_LOG / COUNSELBOT_LOG)
    logger::init_logging("warn");

    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load config (falls back to defaults if no config.toml)
    let config_path = cli
        .config
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(paths::config_file_path);
    let config = if cli.config.is_some() {
        Config::load_from(&config_path)?
    } else {
        Config::load()?
    };
    let config = cli.apply_overrides(config.with_env_overrides());

    let file_storage = Arc::new(FileStorage::open_default());
    let storage: Arc<dyn Storage> = file_storage.clone();

    // Dispatch subcommands that don't need the renderer
    match &cli.command {
        Some(Commands::Export { format, output }) => {
            let history = HistoryStore::new(storage).load();
            if let Some(path) = export::run_export(&history, *format, output.as_deref())? {
                eprintln!("Exported {} message(s) to {}", history.len(), path.display());
            }
            return Ok(());
        }
        Some(Commands::Theme { theme }) => {
            match theme {
                Some(t) => {
                    t.save(storage.as_ref())?;
                    println!("Theme set to {}", t);
                }
                None => println!("{}", Theme::load(storage.as_ref())),
            }
            return Ok(());
        }
        Some(Commands::Status) => {
            let session = open_session(&config, storage.clone(), None)?;
            let store = HistoryStore::new(storage);
            return status::show_status(
                &config,
                &config_path,
                &file_storage,
                &store,
                session.backend().as_ref(),
            )
            .await;
        }
        _ => {}
    }

    let interactive = std::io::stdin().is_terminal() && std::io::stdout().is_terminal();
    let color = !config.ui.no_color && std::io::stdout().is_terminal();
    let renderer = Arc::new(TerminalRenderer::new(
        Theme::load(storage.as_ref()),
        color,
        interactive,
    ));

    match &cli.command {
        Some(Commands::History) => {
            let history = HistoryStore::new(storage).load();
            renderer.replay(&history, Duration::ZERO).await;
            Ok(())
        }
        Some(Commands::Clear { yes }) => {
            if !yes {
                if !interactive {
                    anyhow::bail!("refusing to clear history without --yes on a non-interactive terminal");
                }
                if !confirm_clear() {
                    eprintln!("Kept history.");
                    return Ok(());
                }
            }
            let session = open_session(&config, storage, Some(renderer))?;
            session.clear().await?;
            Ok(())
        }
        _ => {
            let session = open_session(&config, storage.clone(), Some(renderer.clone()))?;
            run_chat(&session, &renderer, storage.as_ref(), &config).await
        }
    }
}
