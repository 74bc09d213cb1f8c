#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use std::io::Write;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tempfile::NamedTempFile;

    use socra::config::DatabaseConfig;
    use socra::db::connection::get_connection;
    use socra::db::models::{LearningLevel, TopicStatus};
    use socra::fingerprint;
    use socra::orchestrator::{OrchestratorError, SessionOrchestrator};
    use socra::reasoning::{
        ChatContext, ChatOutcome, IngestOutcome, PlanTopic, ReasoningError, ReasoningGateway,
    };

    /// Reasoning service stand-in with scriptable behavior per test.
    #[derive(Default)]
    struct ScriptedGateway {
        ingest_calls: AtomicUsize,
        topic_completed: AtomicBool,
        fail_chat: AtomicBool,
        plan_topics: Mutex<Vec<String>>,
    }

    impl ScriptedGateway {
        fn set_plan(&self, names: &[&str]) {
            *self.plan_topics.lock().unwrap() = names.iter().map(|n| n.to_string()).collect();
        }
    }

    #[async_trait]
    impl ReasoningGateway for ScriptedGateway {
        async fn ingest(
            &self,
            file_name: &str,
            _bytes: Vec<u8>,
            _fingerprint: &str,
        ) -> Result<IngestOutcome, ReasoningError> {
            self.ingest_calls.fetch_add(1, Ordering::SeqCst);
            Ok(IngestOutcome {
                cached: false,
                summary: format!("Summary of {}", file_name),
            })
        }

        async fn chat(&self, ctx: ChatContext<'_>) -> Result<ChatOutcome, ReasoningError> {
            if self.fail_chat.load(Ordering::SeqCst) {
                return Err(ReasoningError::Network("connection refused".to_string()));
            }
            Ok(ChatOutcome {
                reply: format!("Echo: {}", ctx.query),
                topic_completed: self.topic_completed.load(Ordering::SeqCst),
            })
        }

        async fn generate_plan(
            &self,
            _fingerprints: &[String],
            _level: LearningLevel,
        ) -> Result<Vec<PlanTopic>, ReasoningError> {
            Ok(self
                .plan_topics
                .lock()
                .unwrap()
                .iter()
                .map(|name| PlanTopic {
                    topic: name.clone(),
                    description: String::new(),
                })
                .collect())
        }
    }

    fn test_orchestrator() -> (SessionOrchestrator, Arc<ScriptedGateway>) {
        let pool = get_connection(&DatabaseConfig {
            path: ":memory:".to_string(),
        })
        .unwrap();
        let gateway = Arc::new(ScriptedGateway::default());
        (SessionOrchestrator::new(pool, gateway.clone()), gateway)
    }

    fn upload(bytes: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file
    }

    #[test]
    fn test_fingerprint_is_content_addressed() {
        let file = upload(b"chapter one");
        let from_file = fingerprint::fingerprint_file(file.path()).unwrap();

        assert_eq!(from_file, fingerprint::fingerprint_bytes(b"chapter one"));
        assert_ne!(from_file, fingerprint::fingerprint_bytes(b"chapter two"));
        assert_eq!(from_file.len(), 64);
    }

    #[tokio::test]
    async fn test_attach_creates_session_and_dedups() {
        let (orchestrator, gateway) = test_orchestrator();

        // First attach: no session id, one gets created
        let file = upload(b"lecture notes");
        let outcome = orchestrator
            .attach_document("alice", None, "notes.pdf", file.path())
            .await
            .unwrap();

        assert!(!outcome.already_attached);
        assert_eq!(outcome.session.document_fingerprints.len(), 1);
        assert_eq!(outcome.session.document_names, vec!["notes.pdf".to_string()]);
        assert_eq!(outcome.session.transcript.len(), 1);
        assert!(outcome.session.transcript[0].content.contains("Summary of notes.pdf"));
        assert_eq!(gateway.ingest_calls.load(Ordering::SeqCst), 1);

        // Same bytes under a different name: silent no-op, no ingest
        let id = outcome.session.id;
        let again = upload(b"lecture notes");
        let outcome = orchestrator
            .attach_document("alice", Some(id), "renamed.pdf", again.path())
            .await
            .unwrap();

        assert!(outcome.already_attached);
        assert_eq!(outcome.session.document_fingerprints.len(), 1);
        assert_eq!(outcome.session.document_names.len(), 1);
        assert_eq!(outcome.session.transcript.len(), 1);
        assert_eq!(gateway.ingest_calls.load(Ordering::SeqCst), 1);

        // Different bytes do attach, and the lists stay index-aligned
        let other = upload(b"problem set");
        let outcome = orchestrator
            .attach_document("alice", Some(id), "problems.pdf", other.path())
            .await
            .unwrap();

        assert_eq!(outcome.session.document_fingerprints.len(), 2);
        assert_eq!(outcome.session.document_names.len(), 2);
        assert_eq!(gateway.ingest_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_attach_to_foreign_session_is_not_found() {
        let (orchestrator, _gateway) = test_orchestrator();

        let file = upload(b"doc");
        let session = orchestrator
            .attach_document("alice", None, "doc.pdf", file.path())
            .await
            .unwrap()
            .session;

        let again = upload(b"other doc");
        let err = orchestrator
            .attach_document("bob", Some(session.id), "other.pdf", again.path())
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::NotFound));
    }

    #[tokio::test]
    async fn test_send_message_appends_and_advances() {
        let (orchestrator, gateway) = test_orchestrator();

        let file = upload(b"rust book");
        let session = orchestrator
            .attach_document("alice", None, "book.pdf", file.path())
            .await
            .unwrap()
            .session;

        gateway.set_plan(&["Ownership", "Borrowing"]);
        let session = orchestrator.generate_plan("alice", session.id).await.unwrap();
        assert_eq!(session.current_topic_index, Some(0));

        gateway.topic_completed.store(true, Ordering::SeqCst);
        let turn = orchestrator
            .send_message("alice", session.id, "I think I get ownership now")
            .await
            .unwrap();

        // Reply plus the synthesized transition entry
        assert_eq!(turn.appended.len(), 2);
        assert!(turn.appended[0].content.contains("I think I get ownership now"));
        assert!(turn.appended[1].content.contains("\"Borrowing\""));

        assert_eq!(turn.session.study_plan[0].status, TopicStatus::Completed);
        assert_eq!(turn.session.study_plan[1].status, TopicStatus::InProgress);
        assert_eq!(turn.session.current_topic_index, Some(1));

        // Persisted, not just in memory
        let reloaded = orchestrator.get_session("alice", session.id).unwrap();
        assert_eq!(reloaded.current_topic_index, Some(1));
        let roles: Vec<&str> = reloaded.transcript.iter().map(|e| e.role.as_str()).collect();
        assert_eq!(roles, vec!["assistant", "assistant", "user", "assistant", "assistant"]);
    }

    #[tokio::test]
    async fn test_chat_failure_keeps_user_message() {
        let (orchestrator, gateway) = test_orchestrator();

        let file = upload(b"doc");
        let session = orchestrator
            .attach_document("alice", None, "doc.pdf", file.path())
            .await
            .unwrap()
            .session;

        gateway.fail_chat.store(true, Ordering::SeqCst);
        let err = orchestrator
            .send_message("alice", session.id, "hello?")
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::Upstream(_)));

        // The user's turn survives; no reply, no state machine step
        let reloaded = orchestrator.get_session("alice", session.id).unwrap();
        let last = reloaded.transcript.last().unwrap();
        assert_eq!(last.role, "user");
        assert_eq!(last.content, "hello?");
    }

    #[tokio::test]
    async fn test_generate_plan_twice_replaces() {
        let (orchestrator, gateway) = test_orchestrator();

        let file = upload(b"doc");
        let session = orchestrator
            .attach_document("alice", None, "doc.pdf", file.path())
            .await
            .unwrap()
            .session;

        gateway.set_plan(&["A", "B", "C"]);
        orchestrator.generate_plan("alice", session.id).await.unwrap();

        gateway.set_plan(&["X", "Y"]);
        let session = orchestrator.generate_plan("alice", session.id).await.unwrap();

        let names: Vec<&str> = session.study_plan.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["X", "Y"]);
        assert_eq!(session.study_plan[0].status, TopicStatus::InProgress);
        assert_eq!(session.current_topic_index, Some(0));
    }

    #[tokio::test]
    async fn test_set_topic_status_validates_index() {
        let (orchestrator, gateway) = test_orchestrator();

        let file = upload(b"doc");
        let session = orchestrator
            .attach_document("alice", None, "doc.pdf", file.path())
            .await
            .unwrap()
            .session;

        gateway.set_plan(&["A"]);
        let session = orchestrator.generate_plan("alice", session.id).await.unwrap();
        let transcript_len = session.transcript.len();

        let err = orchestrator
            .set_topic_status("alice", session.id, 7, "completed")
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidArgument(_)));

        // No transcript or plan mutation leaked through
        let reloaded = orchestrator.get_session("alice", session.id).unwrap();
        assert_eq!(reloaded.transcript.len(), transcript_len);
        assert_eq!(reloaded.study_plan[0].status, TopicStatus::InProgress);

        let err = orchestrator
            .set_topic_status("alice", session.id, 0, "done")
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_set_level_validates_and_persists() {
        let (orchestrator, _gateway) = test_orchestrator();

        let file = upload(b"doc");
        let session = orchestrator
            .attach_document("alice", None, "doc.pdf", file.path())
            .await
            .unwrap()
            .session;

        let err = orchestrator
            .set_level("alice", session.id, "expert")
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidArgument(_)));

        orchestrator.set_level("alice", session.id, "advanced").await.unwrap();
        let reloaded = orchestrator.get_session("alice", session.id).unwrap();
        assert_eq!(reloaded.learning_level, LearningLevel::Advanced);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (orchestrator, _gateway) = test_orchestrator();

        let file = upload(b"doc");
        let session = orchestrator
            .attach_document("alice", None, "doc.pdf", file.path())
            .await
            .unwrap()
            .session;

        orchestrator.delete_session("alice", session.id).unwrap();
        orchestrator.delete_session("alice", session.id).unwrap();

        let err = orchestrator.get_session("alice", session.id).unwrap_err();
        assert!(matches!(err, OrchestratorError::NotFound));
    }
}
