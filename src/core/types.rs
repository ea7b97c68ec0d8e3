// src/core/types.rs — Core domain types

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One line of the conversation, as persisted and exported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEntry {
    pub message: String,
    #[serde(rename = "isUser")]
    pub is_user: bool,
    #[serde(default)]
    pub timestamp: String,
    /// Classifier output for user messages. Older saves call this `metadata`.
    #[serde(default, alias = "metadata", skip_serializing_if = "Option::is_none")]
    pub analysis: Option<Analysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_points: Option<Vec<String>>,
}

impl MessageEntry {
    pub fn user(message: impl Into<String>, analysis: Option<Analysis>) -> Self {
        Self {
            message: message.into(),
            is_user: true,
            timestamp: now_timestamp(),
            analysis,
            key_points: None,
        }
    }

    pub fn assistant(message: impl Into<String>, key_points: Option<Vec<String>>) -> Self {
        Self {
            message: message.into(),
            is_user: false,
            timestamp: now_timestamp(),
            analysis: None,
            key_points,
        }
    }
}

pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<SentimentAnalysis>,
    #[serde(
        default,
        rename = "mentalHealth",
        alias = "mental_health",
        skip_serializing_if = "Option::is_none"
    )]
    pub mental_health: Option<MentalHealthAnalysis>,
}

impl Analysis {
    pub fn is_empty(&self) -> bool {
        self.sentiment.is_none() && self.mental_health.is_none()
    }

    /// Short human summary, e.g. `sentiment: negative · condition: anxiety`.
    pub fn summary(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(s) = &self.sentiment {
            parts.push(format!("sentiment: {}", s.sentiment));
        }
        if let Some(m) = &self.mental_health {
            parts.push(format!("condition: {}", m.condition));
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" · "))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentAnalysis {
    #[serde(default)]
    pub sentiment: String,
    #[serde(default)]
    pub probabilities: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MentalHealthAnalysis {
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub probabilities: BTreeMap<String, f64>,
}

/// Everything one successful backend turn produces.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnReply {
    pub analysis: Option<Analysis>,
    pub response: String,
    pub key_points: Option<Vec<String>>,
}

/// Events emitted while a turn progresses, consumed by the renderer.
#[derive(Debug, Clone)]
pub enum TurnEvent {
    /// The user's message was accepted and should be shown immediately.
    UserMessage { entry: MessageEntry },
    /// A reply is pending; show the typing indicator.
    AwaitingReply,
    /// The assistant replied. `user` is the stored user entry, now with analysis.
    Replied {
        user: MessageEntry,
        assistant: MessageEntry,
    },
    /// The turn failed; show the fallback message (not part of history).
    Failed { message: String },
    /// History was cleared; the transcript restarts with a greeting.
    Cleared { greeting: String },
}
