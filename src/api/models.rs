use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct AttachQuery {
    /// Omitted on the first upload; a fresh session is created.
    pub session_id: Option<Uuid>,
    pub filename: String,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct SetTopicStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct SetLevelRequest {
    pub level: String,
}
