// src/backend/direct.rs — Direct REST calls to the inference API

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use super::types::{ClearRequest, CounselRequest, CounselResponse, HealthResponse, PromptRequest};
use super::{decode_response, CounselBackend};
use crate::core::types::{Analysis, MentalHealthAnalysis, SentimentAnalysis, TurnReply};
use crate::infra::errors::CounselError;
use crate::infra::session::SessionId;

pub const SENTIMENT_PATH: &str = "/analyze/sentiment";
pub const MENTAL_HEALTH_PATH: &str = "/analyze/mental-health";
pub const COUNSEL_PATH: &str = "/generate/counsel";
pub const CLEAR_PATH: &str = "/clear/history";
pub const HEALTH_PATH: &str = "/health";

pub struct DirectBackend {
    api_url: Url,
    client: reqwest::Client,
}

impl DirectBackend {
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url.as_str().trim_end_matches('/'), path)
    }

    async fn post_json<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, CounselError> {
        let response = self
            .client
            .post(self.endpoint(path))
            .json(body)
            .send()
            .await
            .map_err(|e| CounselError::transport(path, e))?;

        decode_response(path, response).await
    }
}

#[async_trait]
impl CounselBackend for DirectBackend {
    fn mode(&self) -> &'static str {
        "direct"
    }

    async fn submit_turn(
        &self,
        prompt: &str,
        session_id: &SessionId,
    ) -> Result<TurnReply, CounselError> {
        let body = PromptRequest {
            prompt,
            session_id: session_id.as_str(),
        };

        // Both classifiers run concurrently; either failure aborts the turn.
        let (sentiment, mental_health) = tokio::try_join!(
            self.post_json::<_, SentimentAnalysis>(SENTIMENT_PATH, &body),
            self.post_json::<_, MentalHealthAnalysis>(MENTAL_HEALTH_PATH, &body),
        )?;

        tracing::debug!(
            sentiment = %sentiment.sentiment,
            condition = %mental_health.condition,
            "Analysis complete"
        );

        let counsel: CounselResponse = self
            .post_json(
                COUNSEL_PATH,
                &CounselRequest {
                    prompt,
                    clear_history: false,
                    session_id: session_id.as_str(),
                },
            )
            .await?;

        Ok(TurnReply {
            analysis: Some(Analysis {
                sentiment: Some(sentiment),
                mental_health: Some(mental_health),
            }),
            response: counsel.response,
            key_points: counsel.key_points,
        })
    }

    async fn clear_history(&self, session_id: &SessionId) -> Result<(), CounselError> {
        let _: serde_json::Value = self
            .post_json(
                CLEAR_PATH,
                &ClearRequest {
                    session_id: session_id.as_str(),
                },
            )
            .await?;
        Ok(())
    }

    async fn health(&self) -> Result<Option<String>, CounselError> {
        let response = self
            .client
            .get(self.endpoint(HEALTH_PATH))
            .timeout(std::time::Duration::from_secs(5))
            .send()
            .await
            .map_err(|e| CounselError::transport(HEALTH_PATH, e))?;

        let health: HealthResponse = decode_response(HEALTH_PATH, response).await?;
        Ok(Some(health.status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let backend = DirectBackend::new(Url::parse("http://localhost:8000/").unwrap());
        assert_eq!(
            backend.endpoint(SENTIMENT_PATH),
            "http://localhost:8000/analyze/sentiment"
        );

        let backend = DirectBackend::new(Url::parse("https://api.example.com/v1").unwrap());
        assert_eq!(
            backend.endpoint(COUNSEL_PATH),
            "https://api.example.com/v1/generate/counsel"
        );
    }
}
