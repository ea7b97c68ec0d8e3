// src/infra/config.rs — Configuration loading (TOML) and backend resolution

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::{Host, Url};

use crate::infra::errors::CounselError;
use crate::infra::paths;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub ui: UiConfig,
}

/// How the client talks to the inference backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModeSetting {
    /// Direct for loopback hosts, queued for everything else.
    #[default]
    Auto,
    Direct,
    Queued,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub mode: ModeSetting,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Bearer token for the queued job endpoint. Passed through untouched.
    pub api_key: Option<String>,
    /// Job status endpoint; derived from `api_url` when unset.
    pub status_url: Option<String>,
    #[serde(default)]
    pub poll: PollConfig,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            mode: ModeSetting::Auto,
            api_url: default_api_url(),
            api_key: None,
            status_url: None,
            poll: PollConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub max_attempts: u32,
    pub interval_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            interval_ms: 2_000,
        }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Delay between entries when replaying saved history.
    #[serde(default = "default_replay_delay_ms")]
    pub replay_delay_ms: u64,
    /// Disable colored output regardless of terminal support.
    #[serde(default)]
    pub no_color: bool,
}

fn default_replay_delay_ms() -> u64 {
    100
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            replay_delay_ms: default_replay_delay_ms(),
            no_color: false,
        }
    }
}

/// Backend protocol variant, selected once at startup.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendMode {
    Direct {
        api_url: Url,
    },
    Queued {
        run_url: Url,
        status_url: Url,
        api_key: Option<String>,
        poll: PollConfig,
    },
}

impl BackendMode {
    pub fn label(&self) -> &'static str {
        match self {
            BackendMode::Direct { .. } => "direct",
            BackendMode::Queued { .. } => "queued",
        }
    }
}

impl Config {
    /// Load config from file, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = paths::config_file_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Apply `COUNSELBOT_*` environment overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("COUNSELBOT_API_URL").filter(|v| !v.is_empty()) {
            self.backend.api_url = url;
        }
        if let Some(key) = lookup("COUNSELBOT_API_KEY").filter(|v| !v.is_empty()) {
            self.backend.api_key = Some(key);
        }
        if let Some(url) = lookup("COUNSELBOT_STATUS_URL").filter(|v| !v.is_empty()) {
            self.backend.status_url = Some(url);
        }
        if let Some(mode) = lookup("COUNSELBOT_MODE") {
            match mode.to_ascii_lowercase().as_str() {
                "auto" => self.backend.mode = ModeSetting::Auto,
                "direct" => self.backend.mode = ModeSetting::Direct,
                "queued" => self.backend.mode = ModeSetting::Queued,
                other => tracing::warn!("Ignoring unknown COUNSELBOT_MODE '{}'", other),
            }
        }
        self
    }

    /// Resolve the backend protocol variant from the configured URL and mode.
    pub fn resolve_backend(&self) -> Result<BackendMode, CounselError> {
        let api_url = parse_url(&self.backend.api_url)?;

        let queued = match self.backend.mode {
            ModeSetting::Direct => false,
            ModeSetting::Queued => true,
            ModeSetting::Auto => !is_local_host(&api_url),
        };

        if !queued {
            return Ok(BackendMode::Direct { api_url });
        }

        let status_url = match &self.backend.status_url {
            Some(s) => parse_url(s)?,
            None => derive_status_url(&api_url),
        };

        Ok(BackendMode::Queued {
            run_url: api_url,
            status_url,
            api_key: self.backend.api_key.clone(),
            poll: self.backend.poll.clone(),
        })
    }
}

fn parse_url(raw: &str) -> Result<Url, CounselError> {
    Url::parse(raw.trim()).map_err(|e| CounselError::Config(format!("invalid URL '{raw}': {e}")))
}

/// True for hosts that only make sense during local development.
pub fn is_local_host(url: &Url) -> bool {
    match url.host() {
        Some(Host::Domain(d)) => d == "localhost" || d.ends_with(".localhost"),
        Some(Host::Ipv4(ip)) => ip.is_loopback() || ip.is_unspecified(),
        Some(Host::Ipv6(ip)) => ip.is_loopback() || ip.is_unspecified(),
        None => false,
    }
}

/// Serverless job endpoints are `…/run` (or `…/runsync`) with status at
/// `…/status`. Anything else gets `/status` appended.
fn derive_status_url(run_url: &Url) -> Url {
    let path = run_url.path().trim_end_matches('/');
    let base = path
        .strip_suffix("/runsync")
        .or_else(|| path.strip_suffix("/run"))
        .unwrap_or(path);

    let mut status = run_url.clone();
    status.set_path(&format!("{base}/status"));
    status.set_query(None);
    status
}
