// src/cli/export.rs — Chat log export
//
// Writes the conversation as `{timestamp, chatHistory: [...]}` to JSON or YAML.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::core::types::{Analysis, MessageEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ExportFormat {
    #[default]
    Json,
    Yaml,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Yaml => "yaml",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExportDocument<'a> {
    pub timestamp: String,
    #[serde(rename = "chatHistory")]
    pub chat_history: Vec<ExportEntry<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ExportEntry<'a> {
    pub message: &'a str,
    #[serde(rename = "isUser")]
    pub is_user: bool,
    pub timestamp: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<&'a Analysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_points: Option<&'a [String]>,
}

impl<'a> From<&'a MessageEntry> for ExportEntry<'a> {
    fn from(entry: &'a MessageEntry) -> Self {
        // Analysis belongs to user messages, key points to replies.
        Self {
            message: &entry.message,
            is_user: entry.is_user,
            timestamp: &entry.timestamp,
            analysis: entry.analysis.as_ref().filter(|_| entry.is_user),
            key_points: entry.key_points.as_deref().filter(|_| !entry.is_user),
        }
    }
}

pub fn build_document(history: &[MessageEntry]) -> ExportDocument<'_> {
    ExportDocument {
        timestamp: Utc::now().to_rfc3339(),
        chat_history: history.iter().map(ExportEntry::from).collect(),
    }
}

pub fn render(history: &[MessageEntry], format: ExportFormat) -> anyhow::Result<String> {
    let doc = build_document(history);
    let rendered = match format {
        ExportFormat::Json => serde_json::to_string_pretty(&doc)?,
        ExportFormat::Yaml => serde_yml::to_string(&doc)?,
    };
    Ok(rendered)
}

/// `chat_history_2024-05-01.json`
pub fn default_file_name(date: NaiveDate, format: ExportFormat) -> String {
    format!("chat_history_{}.{}", date.format("%Y-%m-%d"), format.extension())
}

/// Export to `output`, or to today's default file name when `None`.
/// `-` writes to stdout. Returns the path written, if any.
pub fn run_export(
    history: &[MessageEntry],
    format: ExportFormat,
    output: Option<&str>,
) -> anyhow::Result<Option<PathBuf>> {
    let rendered = render(history, format)?;

    if output == Some("-") {
        println!("{}", rendered);
        return Ok(None);
    }

    let path = match output {
        Some(p) => PathBuf::from(p),
        None => PathBuf::from(default_file_name(Utc::now().date_naive(), format)),
    };
    write_file(&path, &rendered)?;
    tracing::info!(entries = history.len(), path = %path.display(), "Exported chat history");
    Ok(Some(path))
}

fn write_file(path: &Path, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)?;
    Ok(())
}
