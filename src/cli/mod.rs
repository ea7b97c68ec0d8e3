// src/cli/mod.rs — CLI definition (clap derive)

pub mod chat;
pub mod export;
pub mod render;
pub mod status;
pub mod theme;

use clap::{Parser, Subcommand};

use crate::infra::config::{Config, ModeSetting};
use export::ExportFormat;
use theme::Theme;

#[derive(Parser)]
#[command(
    name = "counselbot",
    about = "Terminal chat client for the counseling assistant",
    version
)]
pub struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Inference API base URL (or job endpoint in queued mode)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Backend protocol: auto picks direct for localhost, queued otherwise
    #[arg(long, value_enum, global = true)]
    pub mode: Option<ModeSetting>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Fold command-line overrides into the loaded config.
    pub fn apply_overrides(&self, mut config: Config) -> Config {
        if let Some(url) = &self.api_url {
            config.backend.api_url = url.clone();
        }
        if let Some(mode) = self.mode {
            config.backend.mode = mode;
        }
        if self.no_color {
            config.ui.no_color = true;
        }
        config
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive chat session (default)
    Chat,
    /// Print the saved conversation
    History,
    /// Clear the conversation locally and on the backend
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Export the conversation to a file
    Export {
        #[arg(long, value_enum, default_value = "json")]
        format: ExportFormat,
        /// Output path; defaults to chat_history_<date>.<ext>, "-" for stdout
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Show configuration, session and backend health
    Status,
    /// Show or set the color theme
    Theme {
        #[arg(value_enum)]
        theme: Option<Theme>,
    },
}
