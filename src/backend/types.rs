// src/backend/types.rs — Wire types for the inference backend

use serde::{Deserialize, Serialize};

use crate::core::types::{Analysis, MentalHealthAnalysis, SentimentAnalysis, TurnReply};
use crate::infra::errors::CounselError;

/// Body of the direct-mode analysis requests.
#[derive(Debug, Serialize)]
pub struct PromptRequest<'a> {
    pub prompt: &'a str,
    pub session_id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct CounselRequest<'a> {
    pub prompt: &'a str,
    pub clear_history: bool,
    pub session_id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ClearRequest<'a> {
    pub session_id: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CounselResponse {
    pub response: String,
    #[serde(default)]
    pub key_points: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    #[serde(default)]
    pub status: String,
}

/// Job endpoint selector understood by the serverless handler.
pub const ENDPOINT_ALL: &str = "all";

#[derive(Debug, Serialize)]
pub struct JobRequest<'a> {
    pub input: JobInput<'a>,
}

#[derive(Debug, Serialize)]
pub struct JobInput<'a> {
    pub prompt: &'a str,
    pub endpoint: &'a str,
    pub session_id: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    InQueue,
    InProgress,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Submission and status responses share this shape.
#[derive(Debug, Clone, Deserialize)]
pub struct JobResponse {
    #[serde(default)]
    pub id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub output: Option<JobOutput>,
    #[serde(default)]
    pub error: Option<String>,
}

impl JobResponse {
    /// Turn a terminal response into the job output, or the job's error.
    pub fn into_output(self, job_id: &str) -> Result<JobOutput, CounselError> {
        match self.status {
            JobStatus::Completed => self.output.ok_or_else(|| CounselError::Decode {
                endpoint: "job status".into(),
                message: format!("job {job_id} completed without output"),
            }),
            JobStatus::Failed => Err(CounselError::JobFailed {
                job_id: job_id.to_string(),
                message: self
                    .error
                    .or_else(|| self.output.and_then(|o| o.error))
                    .unwrap_or_else(|| "no error message".into()),
            }),
            ref other => Err(CounselError::Decode {
                endpoint: "job status".into(),
                message: format!("job {job_id} is not finished ({other:?})"),
            }),
        }
    }
}

/// The handler's own envelope inside a completed job.
#[derive(Debug, Clone, Deserialize)]
pub struct JobOutput {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub data: Option<JobData>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobData {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub sentiment: Option<SentimentAnalysis>,
    #[serde(default)]
    pub mental_health: Option<MentalHealthAnalysis>,
    #[serde(default)]
    pub key_points: Option<Vec<String>>,
}

impl JobOutput {
    pub fn into_reply(self, job_id: &str) -> Result<TurnReply, CounselError> {
        // A job can finish while the handler itself reports an error.
        if self.status.as_deref() == Some("error") {
            return Err(CounselError::JobFailed {
                job_id: job_id.to_string(),
                message: self.error.unwrap_or_else(|| "handler error".into()),
            });
        }

        let data = self.data.ok_or_else(|| CounselError::Decode {
            endpoint: "job output".into(),
            message: format!("job {job_id} output has no data"),
        })?;

        let response = data.response.ok_or_else(|| CounselError::Decode {
            endpoint: "job output".into(),
            message: format!("job {job_id} output has no response"),
        })?;

        let analysis = Analysis {
            sentiment: data.sentiment,
            mental_health: data.mental_health,
        };

        Ok(TurnReply {
            analysis: if analysis.is_empty() {
                None
            } else {
                Some(analysis)
            },
            response,
            key_points: data.key_points,
        })
    }
}
