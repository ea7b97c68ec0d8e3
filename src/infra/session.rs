// src/infra/session.rs — Stable client session identifier

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::infra::errors::CounselError;
use crate::infra::storage::{Storage, SESSION_KEY};

/// Opaque token correlating this client's requests on the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(format!("session_{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Read the persisted id, creating and storing a fresh one on a miss.
    pub fn load_or_create(storage: &dyn Storage) -> Result<Self, CounselError> {
        if let Some(existing) = storage.get(SESSION_KEY)? {
            let trimmed = existing.trim();
            if !trimmed.is_empty() {
                return Ok(Self(trimmed.to_string()));
            }
        }

        let id = Self::new();
        storage.set(SESSION_KEY, id.as_str())?;
        tracing::debug!(session_id = id.as_str(), "Created new session id");
        Ok(id)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::storage::MemoryStorage;

    #[test]
    fn test_created_once_and_reused() {
        let storage = MemoryStorage::new();
        let first = SessionId::load_or_create(&storage).unwrap();
        let second = SessionId::load_or_create(&storage).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            storage.get(SESSION_KEY).unwrap().as_deref(),
            Some(first.as_str())
        );
    }

    #[test]
    fn test_blank_value_is_replaced() {
        let storage = MemoryStorage::new();
        storage.set(SESSION_KEY, "  ").unwrap();
        let id = SessionId::load_or_create(&storage).unwrap();
        assert!(id.as_str().starts_with("session_"));
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }
}
