// src/cli/theme.rs — Light/dark color scheme with a persisted preference

use crossterm::style::Color;

use crate::infra::errors::CounselError;
use crate::infra::storage::{Storage, THEME_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Theme {
    Light,
    Dark,
}

/// Colors for one theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub user: Color,
    pub assistant: Color,
    pub dim: Color,
    pub error: Color,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            Theme::Dark => Palette {
                user: Color::Cyan,
                assistant: Color::Magenta,
                dim: Color::DarkGrey,
                error: Color::Red,
            },
            Theme::Light => Palette {
                user: Color::DarkBlue,
                assistant: Color::DarkMagenta,
                dim: Color::Grey,
                error: Color::DarkRed,
            },
        }
    }

    /// Guess from the terminal's `COLORFGBG` ("fg;bg"); dark when unknown.
    pub fn detect(colorfgbg: Option<&str>) -> Self {
        let bg = colorfgbg
            .and_then(|v| v.rsplit(';').next())
            .and_then(|bg| bg.trim().parse::<u8>().ok());
        match bg {
            Some(7) | Some(9..=15) => Theme::Light,
            _ => Theme::Dark,
        }
    }

    /// Saved preference, else the terminal's hint.
    pub fn load(storage: &dyn Storage) -> Self {
        match storage.get(THEME_KEY) {
            Ok(Some(saved)) => Theme::parse(&saved).unwrap_or_else(Self::detect_env),
            Ok(None) => Self::detect_env(),
            Err(e) => {
                tracing::warn!("Could not read theme preference: {}", e);
                Self::detect_env()
            }
        }
    }

    pub fn save(self, storage: &dyn Storage) -> Result<(), CounselError> {
        storage.set(THEME_KEY, self.as_str())
    }

    fn detect_env() -> Self {
        Self::detect(std::env::var("COLORFGBG").ok().as_deref())
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
