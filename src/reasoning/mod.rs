pub mod http;

pub use http::HttpReasoningGateway;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::db::models::{LearningLevel, TranscriptEntry};

#[derive(Debug, Error)]
pub enum ReasoningError {
    #[error("Network Error: {0}")]
    Network(String),
    #[error("Reasoning Service Error: {0}")]
    Api(String),
    #[error("Malformed Reasoning Response: {0}")]
    Malformed(String),
}

#[derive(Debug, Deserialize)]
pub struct IngestOutcome {
    /// The service performs its own cache lookup keyed by fingerprint
    /// and reports whether prior work was reused.
    pub cached: bool,
    pub summary: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatOutcome {
    #[serde(rename = "response")]
    pub reply: String,
    pub topic_completed: bool,
}

#[derive(Debug, Deserialize)]
pub struct PlanTopic {
    pub topic: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
struct PlanOutcome {
    study_plan: Vec<PlanTopic>,
}

/// Everything a /chat call re-sends each turn. The service keeps no
/// conversational state of its own, so the full context goes on the
/// wire every time.
#[derive(Debug)]
pub struct ChatContext<'a> {
    pub query: &'a str,
    pub fingerprints: &'a [String],
    pub history: &'a [TranscriptEntry],
    pub current_topic: Option<&'a str>,
    pub learning_level: LearningLevel,
}

/// Narrow client over the external reasoning service. Each call fails
/// closed: the orchestrator only ever sees a typed payload or an error,
/// never a partially-parsed response.
#[async_trait]
pub trait ReasoningGateway: Send + Sync {
    async fn ingest(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        fingerprint: &str,
    ) -> Result<IngestOutcome, ReasoningError>;

    async fn chat(&self, ctx: ChatContext<'_>) -> Result<ChatOutcome, ReasoningError>;

    async fn generate_plan(
        &self,
        fingerprints: &[String],
        level: LearningLevel,
    ) -> Result<Vec<PlanTopic>, ReasoningError>;
}
