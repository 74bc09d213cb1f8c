use async_trait::async_trait;
use reqwest::multipart;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

use crate::config::ReasoningConfig;
use crate::db::models::LearningLevel;
use crate::reasoning::{
    ChatContext, ChatOutcome, IngestOutcome, PlanOutcome, PlanTopic, ReasoningError,
    ReasoningGateway,
};

pub struct HttpReasoningGateway {
    client: Client,
    base_url: String,
}

impl HttpReasoningGateway {
    pub fn new(config: &ReasoningConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: config.base_url.clone(),
        }
    }

    /// Builds the error for a non-success response, preferring the
    /// service's structured `error` field over the raw body.
    async fn api_error(response: reqwest::Response, call: &str) -> ReasoningError {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .and_then(|v| v["error"].as_str().map(|s| s.to_string()))
            .unwrap_or(text);
        ReasoningError::Api(format!("{} failed with {}: {}", call, status, detail))
    }
}

#[async_trait]
impl ReasoningGateway for HttpReasoningGateway {
    async fn ingest(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        fingerprint: &str,
    ) -> Result<IngestOutcome, ReasoningError> {
        let part = multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = multipart::Form::new()
            .part("file", part)
            .text("file_hash", fingerprint.to_string());

        let response = self
            .client
            .post(format!("{}/ingest", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ReasoningError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::api_error(response, "ingest").await);
        }

        response
            .json::<IngestOutcome>()
            .await
            .map_err(|e| ReasoningError::Malformed(e.to_string()))
    }

    async fn chat(&self, ctx: ChatContext<'_>) -> Result<ChatOutcome, ReasoningError> {
        let history: Vec<serde_json::Value> = ctx
            .history
            .iter()
            .map(|entry| json!({"role": entry.role, "content": entry.content}))
            .collect();

        let body = json!({
            "query": ctx.query,
            "file_hashes": ctx.fingerprints,
            "history": history,
            "current_topic": ctx.current_topic,
            "learning_level": ctx.learning_level.as_str(),
        });

        let response = self
            .client
            .post(format!("{}/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| ReasoningError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::api_error(response, "chat").await);
        }

        response
            .json::<ChatOutcome>()
            .await
            .map_err(|e| ReasoningError::Malformed(e.to_string()))
    }

    async fn generate_plan(
        &self,
        fingerprints: &[String],
        level: LearningLevel,
    ) -> Result<Vec<PlanTopic>, ReasoningError> {
        let body = json!({
            "file_hashes": fingerprints,
            "learning_level": level.as_str(),
        });

        let response = self
            .client
            .post(format!("{}/generate_plan", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| ReasoningError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::api_error(response, "generate_plan").await);
        }

        let outcome = response
            .json::<PlanOutcome>()
            .await
            .map_err(|e| ReasoningError::Malformed(e.to_string()))?;

        Ok(outcome.study_plan)
    }
}
