// src/backend/mod.rs — Inference backend clients
//
// Two protocol variants sit behind one trait: direct REST calls for a local
// API server, and a queued job endpoint with status polling for serverless
// deployments. The variant is chosen once from `BackendMode`.

pub mod direct;
pub mod poller;
pub mod queued;
pub mod types;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::core::types::TurnReply;
use crate::infra::config::BackendMode;
use crate::infra::errors::CounselError;
use crate::infra::session::SessionId;

pub use direct::DirectBackend;
pub use poller::{JobPoller, JobStatusSource};
pub use queued::QueuedBackend;

#[async_trait]
pub trait CounselBackend: Send + Sync {
    /// Short variant name for status output.
    fn mode(&self) -> &'static str;

    /// Run one chat turn: classify the prompt and generate a counseling reply.
    async fn submit_turn(
        &self,
        prompt: &str,
        session_id: &SessionId,
    ) -> Result<TurnReply, CounselError>;

    /// Drop the server-side conversation for this session.
    async fn clear_history(&self, session_id: &SessionId) -> Result<(), CounselError>;

    /// Probe backend health. `None` when the variant has no health endpoint.
    async fn health(&self) -> Result<Option<String>, CounselError>;
}

/// Build the client for the resolved backend variant.
pub fn build_backend(mode: &BackendMode) -> Arc<dyn CounselBackend> {
    match mode {
        BackendMode::Direct { api_url } => Arc::new(DirectBackend::new(api_url.clone())),
        BackendMode::Queued {
            run_url,
            status_url,
            api_key,
            poll,
        } => Arc::new(QueuedBackend::new(
            run_url.clone(),
            status_url.clone(),
            api_key.clone(),
            JobPoller::from_config(poll),
        )),
    }
}

/// Check the status code and decode a JSON body, keeping the endpoint in errors.
pub(crate) async fn decode_response<T: DeserializeOwned>(
    endpoint: &str,
    response: reqwest::Response,
) -> Result<T, CounselError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(CounselError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| CounselError::decode(endpoint, e))
}
