// src/backend/poller.rs — Fixed-interval job status polling
//
// Waits one interval, checks status, repeats. COMPLETED returns the output,
// FAILED aborts at once, anything else keeps waiting until the attempt budget
// runs out. No backoff and no cancellation.

use async_trait::async_trait;
use std::time::Duration;

use super::types::{JobOutput, JobResponse, JobStatus};
use crate::infra::config::PollConfig;
use crate::infra::errors::CounselError;

/// Anything that can report the current status of a queued job.
#[async_trait]
pub trait JobStatusSource: Send + Sync {
    async fn fetch_status(&self, job_id: &str) -> Result<JobResponse, CounselError>;
}

#[derive(Debug, Clone)]
pub struct JobPoller {
    max_attempts: u32,
    interval: Duration,
}

impl JobPoller {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    pub fn from_config(config: &PollConfig) -> Self {
        Self::new(config.max_attempts, config.interval())
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub async fn poll(
        &self,
        source: &dyn JobStatusSource,
        job_id: &str,
    ) -> Result<JobOutput, CounselError> {
        for attempt in 1..=self.max_attempts {
            tokio::time::sleep(self.interval).await;

            let response = source.fetch_status(job_id).await?;
            match response.status {
                JobStatus::Completed | JobStatus::Failed => {
                    tracing::debug!(job_id, attempt, status = ?response.status, "Job finished");
                    return response.into_output(job_id);
                }
                ref status => {
                    tracing::debug!(
                        job_id,
                        attempt,
                        max_attempts = self.max_attempts,
                        ?status,
                        "Job still pending"
                    );
                }
            }
        }

        tracing::warn!(job_id, attempts = self.max_attempts, "Gave up waiting for job");
        Err(CounselError::PollTimeout {
            job_id: job_id.to_string(),
            attempts: self.max_attempts,
        })
    }
}

impl Default for JobPoller {
    fn default() -> Self {
        Self::from_config(&PollConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Replays a fixed sequence of statuses, repeating the last one forever.
    struct ScriptedSource {
        script: Mutex<VecDeque<serde_json::Value>>,
        last: Mutex<Option<serde_json::Value>>,
        calls: AtomicU32,
    }

    impl ScriptedSource {
        fn new(script: Vec<serde_json::Value>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                last: Mutex::new(None),
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl JobStatusSource for ScriptedSource {
        async fn fetch_status(&self, _job_id: &str) -> Result<JobResponse, CounselError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().unwrap().pop_front();
            let value = match next {
                Some(v) => {
                    *self.last.lock().unwrap() = Some(v.clone());
                    v
                }
                None => self.last.lock().unwrap().clone().unwrap(),
            };
            Ok(serde_json::from_value(value).unwrap())
        }
    }

    struct BrokenSource;

    #[async_trait]
    impl JobStatusSource for BrokenSource {
        async fn fetch_status(&self, _job_id: &str) -> Result<JobResponse, CounselError> {
            Err(CounselError::Transport {
                endpoint: "status".into(),
                message: "connection refused".into(),
            })
        }
    }

    fn fast_poller(max_attempts: u32) -> JobPoller {
        JobPoller::new(max_attempts, Duration::from_millis(1))
    }

    fn status(s: &str) -> serde_json::Value {
        serde_json::json!({"id": "job-1", "status": s})
    }

    fn completed() -> serde_json::Value {
        serde_json::json!({
            "id": "job-1",
            "status": "COMPLETED",
            "output": {"status": "success", "data": {"response": "I'm here for you."}}
        })
    }

    #[test]
    fn test_default_budget() {
        let poller = JobPoller::default();
        assert_eq!(poller.max_attempts(), 30);
        assert_eq!(poller.interval(), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_returns_output_once_completed() {
        let source = ScriptedSource::new(vec![
            status("IN_QUEUE"),
            status("IN_PROGRESS"),
            completed(),
        ]);
        let output = fast_poller(30).poll(&source, "job-1").await.unwrap();
        let reply = output.into_reply("job-1").unwrap();
        assert_eq!(reply.response, "I'm here for you.");
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn test_failed_stops_immediately() {
        let source = ScriptedSource::new(vec![
            status("IN_PROGRESS"),
            serde_json::json!({"id": "job-1", "status": "FAILED", "error": "worker crashed"}),
            completed(),
        ]);
        let err = fast_poller(30).poll(&source, "job-1").await.unwrap_err();
        assert!(matches!(err, CounselError::JobFailed { .. }));
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_times_out_after_budget() {
        let source = ScriptedSource::new(vec![status("IN_PROGRESS")]);
        let err = fast_poller(5).poll(&source, "job-1").await.unwrap_err();
        match err {
            CounselError::PollTimeout { job_id, attempts } => {
                assert_eq!(job_id, "job-1");
                assert_eq!(attempts, 5);
            }
            other => panic!("expected timeout, got {:?}", other),
        }
        assert_eq!(source.calls(), 5);
    }

    #[tokio::test]
    async fn test_unknown_status_keeps_polling() {
        let source = ScriptedSource::new(vec![status("WARMING"), status("WARMING"), completed()]);
        assert!(fast_poller(3).poll(&source, "job-1").await.is_ok());
    }

    #[tokio::test]
    async fn test_transport_error_aborts() {
        let err = fast_poller(30).poll(&BrokenSource, "job-1").await.unwrap_err();
        assert!(matches!(err, CounselError::Transport { .. }));
    }
}
