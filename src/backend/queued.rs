// src/backend/queued.rs — Serverless job queue client
//
// One submission per turn with `endpoint: "all"`. A terminal status in the
// submission response is used as-is; otherwise the poller takes over.

use async_trait::async_trait;
use url::Url;

use super::poller::{JobPoller, JobStatusSource};
use super::types::{JobInput, JobRequest, JobResponse, ENDPOINT_ALL};
use super::{decode_response, CounselBackend};
use crate::core::types::TurnReply;
use crate::infra::errors::CounselError;
use crate::infra::session::SessionId;

pub struct QueuedBackend {
    run_url: Url,
    status_url: Url,
    api_key: Option<String>,
    client: reqwest::Client,
    poller: JobPoller,
}

impl QueuedBackend {
    pub fn new(run_url: Url, status_url: Url, api_key: Option<String>, poller: JobPoller) -> Self {
        Self {
            run_url,
            status_url,
            api_key,
            client: reqwest::Client::new(),
            poller,
        }
    }

    fn status_endpoint(&self, job_id: &str) -> String {
        format!(
            "{}/{}",
            self.status_url.as_str().trim_end_matches('/'),
            urlencoding_segment(job_id)
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn submit_job(&self, prompt: &str, session_id: &SessionId) -> Result<JobResponse, CounselError> {
        let body = JobRequest {
            input: JobInput {
                prompt,
                endpoint: ENDPOINT_ALL,
                session_id: session_id.as_str(),
            },
        };

        let response = self
            .authorize(self.client.post(self.run_url.clone()))
            .json(&body)
            .send()
            .await
            .map_err(|e| CounselError::transport("job submit", e))?;

        decode_response("job submit", response).await
    }
}

/// Job ids are opaque; keep them to a single path segment.
fn urlencoding_segment(job_id: &str) -> String {
    url::form_urlencoded::byte_serialize(job_id.as_bytes()).collect()
}

#[async_trait]
impl JobStatusSource for QueuedBackend {
    async fn fetch_status(&self, job_id: &str) -> Result<JobResponse, CounselError> {
        let response = self
            .authorize(self.client.get(self.status_endpoint(job_id)))
            .send()
            .await
            .map_err(|e| CounselError::transport("job status", e))?;

        decode_response("job status", response).await
    }
}

#[async_trait]
impl CounselBackend for QueuedBackend {
    fn mode(&self) -> &'static str {
        "queued"
    }

    async fn submit_turn(
        &self,
        prompt: &str,
        session_id: &SessionId,
    ) -> Result<TurnReply, CounselError> {
        let submitted = self.submit_job(prompt, session_id).await?;
        let job_id = submitted.id.clone();
        tracing::debug!(job_id = %job_id, status = ?submitted.status, "Job submitted");

        let output = if submitted.status.is_terminal() {
            submitted.into_output(&job_id)?
        } else {
            if job_id.is_empty() {
                return Err(CounselError::decode(
                    "job submit",
                    "pending job response has no id",
                ));
            }
            self.poller.poll(self, &job_id).await?
        };

        output.into_reply(&job_id)
    }

    async fn clear_history(&self, session_id: &SessionId) -> Result<(), CounselError> {
        // The job handler keeps no per-session state to clear.
        tracing::debug!(session_id = session_id.as_str(), "No server-side history in queued mode");
        Ok(())
    }

    async fn health(&self) -> Result<Option<String>, CounselError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> QueuedBackend {
        QueuedBackend::new(
            Url::parse("https://api.runpod.ai/v2/abc/run").unwrap(),
            Url::parse("https://api.runpod.ai/v2/abc/status/").unwrap(),
            None,
            JobPoller::default(),
        )
    }

    #[test]
    fn test_status_endpoint() {
        assert_eq!(
            backend().status_endpoint("job-42"),
            "https://api.runpod.ai/v2/abc/status/job-42"
        );
    }

    #[test]
    fn test_status_endpoint_escapes_job_id() {
        assert_eq!(
            backend().status_endpoint("a/b"),
            "https://api.runpod.ai/v2/abc/status/a%2Fb"
        );
    }
}
