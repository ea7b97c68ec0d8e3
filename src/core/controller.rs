// src/core/controller.rs — Chat turn controller
//
// `ChatSession` owns the conversation state for one client: the injected
// backend, the history store, the session id and the in-memory log. One turn
// runs at a time; a submission while a turn is pending is rejected, not queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::backend::CounselBackend;
use crate::core::types::{MessageEntry, TurnEvent};
use crate::history::HistoryStore;
use crate::infra::errors::CounselError;
use crate::infra::session::SessionId;

/// Shown in place of a reply when a turn fails. Never persisted.
pub const APOLOGY: &str = "Sorry, I encountered an error. Please try again.";

/// First line of a fresh transcript.
pub const GREETING: &str = "Hello! I'm here to listen. How are you feeling today?";

type TurnObserver = Box<dyn Fn(TurnEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The message was empty after trimming.
    Empty,
    /// Another turn is still waiting on the backend.
    Busy,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Rejected(RejectReason),
    Replied {
        user: MessageEntry,
        assistant: MessageEntry,
    },
    Failed {
        error: String,
    },
}

/// Holds the in-flight flag for the lifetime of one turn.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub struct ChatSession {
    backend: Arc<dyn CounselBackend>,
    store: HistoryStore,
    session_id: SessionId,
    history: Mutex<Vec<MessageEntry>>,
    in_flight: AtomicBool,
    observer: Option<TurnObserver>,
}

impl ChatSession {
    /// Open a session from persisted state: saved history and session id.
    pub fn open(backend: Arc<dyn CounselBackend>, store: HistoryStore) -> Result<Self, CounselError> {
        let session_id = store.session_id()?;
        let history = store.load();
        tracing::debug!(
            session_id = session_id.as_str(),
            entries = history.len(),
            mode = backend.mode(),
            "Chat session opened"
        );
        Ok(Self {
            backend,
            store,
            session_id,
            history: Mutex::new(history),
            in_flight: AtomicBool::new(false),
            observer: None,
        })
    }

    /// Attach a callback that receives turn events (rendering, typing state).
    pub fn with_observer(mut self, observer: impl Fn(TurnEvent) + Send + Sync + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn mode(&self) -> &'static str {
        self.backend.mode()
    }

    pub fn backend(&self) -> &Arc<dyn CounselBackend> {
        &self.backend
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Snapshot of the in-memory history.
    pub fn history(&self) -> Vec<MessageEntry> {
        self.lock_history().clone()
    }

    fn lock_history(&self) -> std::sync::MutexGuard<'_, Vec<MessageEntry>> {
        self.history.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, event: TurnEvent) {
        if let Some(observer) = &self.observer {
            observer(event);
        }
    }

    /// Run one chat turn for `raw_text`.
    ///
    /// Backend failures never escape: they are logged, the fallback message is
    /// emitted, and the trimmed user message stays in memory without a reply.
    pub async fn submit(&self, raw_text: &str) -> SubmitOutcome {
        let text = raw_text.trim();
        if text.is_empty() {
            return SubmitOutcome::Rejected(RejectReason::Empty);
        }

        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            tracing::debug!("Dropping submission while a turn is in flight");
            return SubmitOutcome::Rejected(RejectReason::Busy);
        };

        let pending = MessageEntry::user(text, None);
        self.emit(TurnEvent::UserMessage {
            entry: pending.clone(),
        });
        self.emit(TurnEvent::AwaitingReply);

        match self.backend.submit_turn(text, &self.session_id).await {
            Ok(reply) => {
                let user = MessageEntry {
                    analysis: reply.analysis,
                    ..pending
                };
                let assistant = MessageEntry::assistant(reply.response, reply.key_points);

                let snapshot = {
                    let mut history = self.lock_history();
                    history.push(user.clone());
                    history.push(assistant.clone());
                    history.clone()
                };

                if let Err(e) = self.store.save(&snapshot) {
                    tracing::warn!("Could not save chat history: {}", e);
                }

                self.emit(TurnEvent::Replied {
                    user: user.clone(),
                    assistant: assistant.clone(),
                });
                SubmitOutcome::Replied { user, assistant }
            }
            Err(e) => {
                tracing::error!(
                    mode = self.backend.mode(),
                    job_error = e.is_job_error(),
                    "Chat turn failed: {}",
                    e
                );
                self.lock_history().push(pending);
                self.emit(TurnEvent::Failed {
                    message: APOLOGY.to_string(),
                });
                SubmitOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    /// Forget the conversation locally and on the backend.
    ///
    /// Local state is cleared first; a backend failure is only logged. The
    /// session id is kept.
    pub async fn clear(&self) -> Result<(), CounselError> {
        self.lock_history().clear();
        self.store.clear()?;

        if let Err(e) = self.backend.clear_history(&self.session_id).await {
            tracing::warn!("Backend history clear failed: {}", e);
        }

        self.emit(TurnEvent::Cleared {
            greeting: GREETING.to_string(),
        });
        Ok(())
    }
}
