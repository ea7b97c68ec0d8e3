// src/infra/storage.rs — Keyed string storage for client state
//
// Mirrors browser local storage: flat string keys mapped to string values.
// The file backend keeps one file per key under the storage directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::infra::errors::CounselError;

pub const HISTORY_KEY: &str = "chatHistory";
pub const SESSION_KEY: &str = "sessionId";
pub const THEME_KEY: &str = "theme";

pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CounselError>;
    fn set(&self, key: &str, value: &str) -> Result<(), CounselError>;
    fn remove(&self, key: &str) -> Result<(), CounselError>;
}

/// File-per-key storage rooted at a directory.
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Storage under the default data directory.
    pub fn open_default() -> Self {
        Self::new(crate::infra::paths::storage_dir())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key_path(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(safe)
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, CounselError> {
        match std::fs::read_to_string(self.key_path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CounselError> {
        std::fs::create_dir_all(&self.root)?;
        // Write to a sibling temp file first so a crash never leaves half a value.
        let path = self.key_path(key);
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CounselError> {
        match std::fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process storage.
#[derive(Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, CounselError> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CounselError> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CounselError> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.remove(key);
        Ok(())
    }
}
