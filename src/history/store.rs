// src/history/store.rs — Persisted conversation log
//
// The whole history is stored as one JSON array under a single key and
// rewritten after every successful turn.

use std::sync::Arc;

use crate::core::types::MessageEntry;
use crate::infra::errors::CounselError;
use crate::infra::session::SessionId;
use crate::infra::storage::{Storage, HISTORY_KEY};

#[derive(Clone)]
pub struct HistoryStore {
    storage: Arc<dyn Storage>,
}

impl HistoryStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Load the saved history. Unreadable or malformed state yields an empty log.
    pub fn load(&self) -> Vec<MessageEntry> {
        let raw = match self.storage.get(HISTORY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!("Could not read chat history: {}", e);
                return Vec::new();
            }
        };

        if raw.trim().is_empty() {
            return Vec::new();
        }

        match serde_json::from_str::<Vec<MessageEntry>>(&raw) {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!("Discarding malformed chat history: {}", e);
                Vec::new()
            }
        }
    }

    pub fn save(&self, history: &[MessageEntry]) -> Result<(), CounselError> {
        let json = serde_json::to_string(history)?;
        self.storage.set(HISTORY_KEY, &json)
    }

    /// Empty the persisted log. The session id is left alone.
    pub fn clear(&self) -> Result<(), CounselError> {
        self.save(&[])
    }

    pub fn session_id(&self) -> Result<SessionId, CounselError> {
        SessionId::load_or_create(self.storage.as_ref())
    }
}
