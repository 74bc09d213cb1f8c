use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Coarse proficiency setting forwarded to the reasoning service with
/// every chat and plan request. It never influences local control flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl LearningLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LearningLevel::Beginner => "beginner",
            LearningLevel::Intermediate => "intermediate",
            LearningLevel::Advanced => "advanced",
        }
    }
}

impl FromStr for LearningLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beginner" => Ok(LearningLevel::Beginner),
            "intermediate" => Ok(LearningLevel::Intermediate),
            "advanced" => Ok(LearningLevel::Advanced),
            other => Err(format!("unknown learning level '{}'", other)),
        }
    }
}

/// Per-topic lifecycle. Transitions only ever move forward through the
/// state machine; the manual update path stores whatever it is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TopicStatus {
    Pending,
    InProgress,
    Completed,
}

impl FromStr for TopicStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TopicStatus::Pending),
            "in-progress" => Ok(TopicStatus::InProgress),
            "completed" => Ok(TopicStatus::Completed),
            other => Err(format!("unknown topic status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub name: String,
    pub description: String,
    pub status: TopicStatus,
}

/// One transcript line. Synthesized transition announcements use the
/// assistant role and carry no flag distinguishing them from real
/// replies; consumers that care must go by content convention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl TranscriptEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// The full session document. Loaded, mutated, and saved as one unit;
/// the orchestrator is the only writer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub owner_id: String,
    pub document_fingerprints: Vec<String>,
    pub document_names: Vec<String>,
    pub transcript: Vec<TranscriptEntry>,
    pub study_plan: Vec<Topic>,
    pub current_topic_index: Option<usize>,
    pub learning_level: LearningLevel,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Display name shown in listings: the attached filenames joined,
    /// or a placeholder before the first document arrives.
    pub fn display_name(&self) -> String {
        if self.document_names.is_empty() {
            "New session".to_string()
        } else {
            self.document_names.join(", ")
        }
    }

    pub fn current_topic(&self) -> Option<&Topic> {
        self.current_topic_index
            .and_then(|i| self.study_plan.get(i))
    }

    /// Plain-text transcript dump shared by the HTTP export route and
    /// the CLI export command. Every transcript entry is rendered.
    pub fn export_text(&self) -> String {
        let mut export = String::new();
        export.push_str(&format!("Session: {}\n", self.display_name()));
        export.push_str(&format!("ID: {}\n", self.id));
        export.push_str(&format!("Created At: {}\n", self.created_at));
        export.push_str("---\n");

        for entry in &self.transcript {
            export.push_str(&format!("[{}]: {}\n", entry.role.to_uppercase(), entry.content));
            export.push_str("---\n");
        }

        export
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
