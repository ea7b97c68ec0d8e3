// src/infra/paths.rs — XDG-compliant path management
//
// All paths respect the COUNSELBOT_HOME environment variable for isolation.
// When COUNSELBOT_HOME is set, config and data live under that directory.
// When unset, config uses ~/.counselbot/ and data uses XDG_DATA_HOME/counselbot.

use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// Returns the COUNSELBOT_HOME override, if set.
fn counselbot_home() -> Option<PathBuf> {
    std::env::var_os("COUNSELBOT_HOME").map(PathBuf::from)
}

/// Home directory, falling back to the working directory when none exists.
pub fn dirs_home() -> PathBuf {
    BaseDirs::new()
        .map(|b| b.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Configuration directory: $COUNSELBOT_HOME/ or ~/.counselbot/
pub fn config_dir() -> PathBuf {
    if let Some(home) = counselbot_home() {
        return home;
    }
    dirs_home().join(".counselbot")
}

/// Data directory: $COUNSELBOT_HOME/data/ or ~/.local/share/counselbot/
pub fn data_dir() -> PathBuf {
    if let Some(home) = counselbot_home() {
        return home.join("data");
    }
    match ProjectDirs::from("", "", "counselbot") {
        Some(dirs) => dirs.data_local_dir().to_path_buf(),
        None => config_dir().join("data"),
    }
}

/// Client storage directory: one file per storage key.
pub fn storage_dir() -> PathBuf {
    data_dir().join("storage")
}

/// Config file path
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}
