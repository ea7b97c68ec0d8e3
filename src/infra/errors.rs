// src/infra/errors.rs — Error types for counselbot

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CounselError {
    // Backend errors (abort the current turn)
    #[error("Request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },

    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Invalid response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    #[error("Job {job_id} failed: {message}")]
    JobFailed { job_id: String, message: String },

    #[error("Job {job_id} did not complete after {attempts} status checks")]
    PollTimeout { job_id: String, attempts: u32 },

    // Local errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CounselError {
    pub(crate) fn transport(endpoint: &str, err: reqwest::Error) -> Self {
        CounselError::Transport {
            endpoint: endpoint.to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn decode(endpoint: &str, err: impl std::fmt::Display) -> Self {
        CounselError::Decode {
            endpoint: endpoint.to_string(),
            message: err.to_string(),
        }
    }

    /// True for failures reported by the backend job itself rather than the
    /// transport.
    pub fn is_job_error(&self) -> bool {
        matches!(
            self,
            CounselError::JobFailed { .. } | CounselError::PollTimeout { .. }
        )
    }
}
