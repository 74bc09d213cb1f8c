//! Session orchestration: binds uploaded documents, the transcript,
//! and the study plan into one consistent session per owner.
//!
//! Every mutating operation runs its load-mutate-save cycle under a
//! per-session-id async mutex, so two concurrent actions on the same
//! session cannot clobber each other's full-document save. The DuckDB
//! connection lock is never held across a reasoning-service await.

pub mod plan;

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Mutex as SessionMutex, OwnedMutexGuard};
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::models::{LearningLevel, Session, SessionSummary, TopicStatus, TranscriptEntry};
use crate::db::{service::DbService, DbPool};
use crate::fingerprint;
use crate::reasoning::{ChatContext, ReasoningError, ReasoningGateway};

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Session not found")]
    NotFound,
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Reasoning service failure: {0}")]
    Upstream(#[from] ReasoningError),
    #[error("Persistence failure: {0}")]
    Persistence(#[from] duckdb::Error),
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;

#[derive(Debug, Serialize)]
pub struct AttachOutcome {
    pub session: Session,
    pub fingerprint: String,
    /// True when the fingerprint was already attached and no ingestion
    /// happened.
    pub already_attached: bool,
    /// True when the reasoning service reused prior ingestion work.
    pub cached: bool,
}

#[derive(Debug, Serialize)]
pub struct ChatTurn {
    pub session: Session,
    /// The assistant reply plus any synthesized transition entries
    /// appended by this turn.
    pub appended: Vec<TranscriptEntry>,
}

pub struct SessionOrchestrator {
    pool: DbPool,
    gateway: Arc<dyn ReasoningGateway>,
    locks: Mutex<HashMap<Uuid, Arc<SessionMutex<()>>>>,
}

impl SessionOrchestrator {
    pub fn new(pool: DbPool, gateway: Arc<dyn ReasoningGateway>) -> Self {
        Self {
            pool,
            gateway,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Serializes mutations per session id. Session updates are
    /// read-modify-write over the whole document, so without this the
    /// second of two racing writers would silently win.
    async fn lock_session(&self, id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap();
            locks
                .entry(id)
                .or_insert_with(|| Arc::new(SessionMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    fn load(&self, owner_id: &str, id: Uuid) -> Result<Session> {
        let conn = self.pool.lock().unwrap();
        DbService::get_session(&conn, owner_id, id)?.ok_or(OrchestratorError::NotFound)
    }

    fn save(&self, session: &Session) -> Result<()> {
        let conn = self.pool.lock().unwrap();
        DbService::save_session(&conn, session)?;
        Ok(())
    }

    // --- Session lifecycle ---

    pub fn create_session(&self, owner_id: &str) -> Result<Session> {
        let conn = self.pool.lock().unwrap();
        let session = DbService::insert_session(&conn, owner_id, LearningLevel::default())?;
        info!("Created session {} for owner {}", session.id, owner_id);
        Ok(session)
    }

    pub fn list_sessions(&self, owner_id: &str) -> Result<Vec<SessionSummary>> {
        let conn = self.pool.lock().unwrap();
        Ok(DbService::list_sessions(&conn, owner_id)?)
    }

    pub fn get_session(&self, owner_id: &str, id: Uuid) -> Result<Session> {
        self.load(owner_id, id)
    }

    /// Idempotent: a second delete of the same id is a no-op.
    pub fn delete_session(&self, owner_id: &str, id: Uuid) -> Result<()> {
        {
            let conn = self.pool.lock().unwrap();
            DbService::delete_session(&conn, owner_id, id)?;
        }
        self.locks.lock().unwrap().remove(&id);
        Ok(())
    }

    // --- Documents ---

    /// Fingerprints the uploaded file, forwards new content to the
    /// reasoning service, and records the attachment. A session is
    /// created when no id is given; on ingest failure nothing is
    /// persisted. Re-attaching known bytes (under any filename) is a
    /// silent no-op.
    pub async fn attach_document(
        &self,
        owner_id: &str,
        session_id: Option<Uuid>,
        file_name: &str,
        payload: &Path,
    ) -> Result<AttachOutcome> {
        let digest = fingerprint::fingerprint_file(payload)
            .map_err(|e| OrchestratorError::InvalidArgument(format!("unreadable upload: {}", e)))?;

        match session_id {
            Some(id) => {
                let _guard = self.lock_session(id).await;
                let mut session = self.load(owner_id, id)?;

                if session.document_fingerprints.iter().any(|f| f == &digest) {
                    info!("Fingerprint {} already attached to session {}", digest, id);
                    return Ok(AttachOutcome {
                        session,
                        fingerprint: digest,
                        already_attached: true,
                        cached: false,
                    });
                }

                let bytes = read_upload(payload).await?;
                let ingest = self.gateway.ingest(file_name, bytes, &digest).await?;

                record_attachment(&mut session, digest.clone(), file_name, ingest.summary);
                self.save(&session)?;

                Ok(AttachOutcome {
                    session,
                    fingerprint: digest,
                    already_attached: false,
                    cached: ingest.cached,
                })
            }
            None => {
                // Ingest first: a failed ingest must leave no session
                // behind.
                let bytes = read_upload(payload).await?;
                let ingest = self.gateway.ingest(file_name, bytes, &digest).await?;

                let mut session = self.create_session(owner_id)?;
                record_attachment(&mut session, digest.clone(), file_name, ingest.summary);
                self.save(&session)?;

                Ok(AttachOutcome {
                    session,
                    fingerprint: digest,
                    already_attached: false,
                    cached: ingest.cached,
                })
            }
        }
    }

    // --- Conversation ---

    /// Appends the user's message, asks the reasoning service for a
    /// reply with the full context, then runs the automatic plan step.
    /// On upstream failure the user message is still persisted (the
    /// documented partial state) and the error surfaces unchanged.
    pub async fn send_message(&self, owner_id: &str, id: Uuid, content: &str) -> Result<ChatTurn> {
        let _guard = self.lock_session(id).await;
        let mut session = self.load(owner_id, id)?;

        session.transcript.push(TranscriptEntry::user(content));

        let current_topic = session.current_topic().map(|t| t.name.clone());
        let outcome = self
            .gateway
            .chat(ChatContext {
                query: content,
                fingerprints: &session.document_fingerprints,
                history: &session.transcript,
                current_topic: current_topic.as_deref(),
                learning_level: session.learning_level,
            })
            .await;

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Chat call failed for session {}: {}", id, e);
                self.save(&session)?;
                return Err(e.into());
            }
        };

        let before = session.transcript.len();
        session.transcript.push(TranscriptEntry::assistant(outcome.reply));
        if outcome.topic_completed {
            plan::advance_after_chat(&mut session);
        }
        let appended = session.transcript[before..].to_vec();

        self.save(&session)?;
        Ok(ChatTurn { session, appended })
    }

    // --- Study plan ---

    /// Replaces the study plan with a freshly generated one. The
    /// previous plan is untouched if the gateway call fails.
    pub async fn generate_plan(&self, owner_id: &str, id: Uuid) -> Result<Session> {
        let _guard = self.lock_session(id).await;
        let mut session = self.load(owner_id, id)?;

        let topics = self
            .gateway
            .generate_plan(&session.document_fingerprints, session.learning_level)
            .await?;

        info!("Generated plan with {} topics for session {}", topics.len(), id);
        plan::install_plan(&mut session, topics);
        self.save(&session)?;
        Ok(session)
    }

    pub async fn set_topic_status(
        &self,
        owner_id: &str,
        id: Uuid,
        index: usize,
        status: &str,
    ) -> Result<Session> {
        let status: TopicStatus = status
            .parse()
            .map_err(OrchestratorError::InvalidArgument)?;

        let _guard = self.lock_session(id).await;
        let mut session = self.load(owner_id, id)?;

        if !plan::apply_status(&mut session, index, status) {
            return Err(OrchestratorError::InvalidArgument(format!(
                "no topic at index {}",
                index
            )));
        }

        self.save(&session)?;
        Ok(session)
    }

    pub async fn set_level(&self, owner_id: &str, id: Uuid, level: &str) -> Result<Session> {
        let level: LearningLevel = level
            .parse()
            .map_err(OrchestratorError::InvalidArgument)?;

        let _guard = self.lock_session(id).await;
        let mut session = self.load(owner_id, id)?;
        session.learning_level = level;
        self.save(&session)?;
        Ok(session)
    }
}

fn record_attachment(session: &mut Session, digest: String, file_name: &str, summary: String) {
    session.document_fingerprints.push(digest);
    session.document_names.push(file_name.to_string());
    session.transcript.push(TranscriptEntry::assistant(summary));
}

async fn read_upload(payload: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(payload)
        .await
        .map_err(|e| OrchestratorError::InvalidArgument(format!("unreadable upload: {}", e)))
}
