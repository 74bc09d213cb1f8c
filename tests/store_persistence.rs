#[cfg(test)]
mod tests {
    use socra::config::DatabaseConfig;
    use socra::db::connection::get_connection;
    use socra::db::models::{LearningLevel, Topic, TopicStatus, TranscriptEntry};
    use socra::db::service::DbService;
    use socra::db::DbPool;
    use uuid::Uuid;

    // In-memory database just for tests
    fn get_test_db() -> DbPool {
        get_connection(&DatabaseConfig {
            path: ":memory:".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_session_lifecycle() {
        let pool = get_test_db();
        let conn = pool.lock().unwrap();

        // 1. Insert Session
        let session = DbService::insert_session(&conn, "alice", LearningLevel::Beginner).unwrap();
        assert_eq!(session.owner_id, "alice");
        assert_eq!(session.learning_level, LearningLevel::Beginner);
        assert!(session.study_plan.is_empty());
        assert_eq!(session.current_topic_index, None);

        // 2. Get Session
        let fetched = DbService::get_session(&conn, "alice", session.id).unwrap().unwrap();
        assert_eq!(fetched.id, session.id);

        // 3. List Sessions: no documents yet, so the placeholder name
        let list = DbService::list_sessions(&conn, "alice").unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name, "New session");

        // 4. Delete Session
        DbService::delete_session(&conn, "alice", session.id).unwrap();
        assert!(DbService::get_session(&conn, "alice", session.id).unwrap().is_none());

        // 5. Deleting again is a no-op, not an error
        DbService::delete_session(&conn, "alice", session.id).unwrap();
    }

    #[test]
    fn test_owner_scoping() {
        let pool = get_test_db();
        let conn = pool.lock().unwrap();

        let session = DbService::insert_session(&conn, "alice", LearningLevel::Beginner).unwrap();

        // Another owner sees nothing: reads as absent, never "forbidden"
        assert!(DbService::get_session(&conn, "bob", session.id).unwrap().is_none());
        assert!(DbService::list_sessions(&conn, "bob").unwrap().is_empty());

        // A foreign delete silently does nothing
        DbService::delete_session(&conn, "bob", session.id).unwrap();
        assert!(DbService::get_session(&conn, "alice", session.id).unwrap().is_some());
    }

    #[test]
    fn test_full_document_round_trip() {
        let pool = get_test_db();
        let conn = pool.lock().unwrap();

        let mut session = DbService::insert_session(&conn, "alice", LearningLevel::Beginner).unwrap();

        session.document_fingerprints.push("abc123".to_string());
        session.document_names.push("notes.pdf".to_string());
        session.transcript.push(TranscriptEntry::user("What is recursion?"));
        session.transcript.push(TranscriptEntry::assistant("Let's find out together."));
        session.study_plan.push(Topic {
            name: "Recursion".to_string(),
            description: "Base cases and self-reference".to_string(),
            status: TopicStatus::InProgress,
        });
        session.current_topic_index = Some(0);
        session.learning_level = LearningLevel::Advanced;

        DbService::save_session(&conn, &session).unwrap();

        let reloaded = DbService::get_session(&conn, "alice", session.id).unwrap().unwrap();
        assert_eq!(reloaded.document_fingerprints, vec!["abc123".to_string()]);
        assert_eq!(reloaded.document_names, vec!["notes.pdf".to_string()]);
        assert_eq!(reloaded.transcript.len(), 2);
        assert_eq!(reloaded.transcript[0].role, "user");
        assert_eq!(reloaded.transcript[1].role, "assistant");
        assert_eq!(reloaded.study_plan.len(), 1);
        assert_eq!(reloaded.study_plan[0].status, TopicStatus::InProgress);
        assert_eq!(reloaded.current_topic_index, Some(0));
        assert_eq!(reloaded.learning_level, LearningLevel::Advanced);

        // Display name now derives from the attached filenames
        let list = DbService::list_sessions(&conn, "alice").unwrap();
        assert_eq!(list[0].name, "notes.pdf");
    }

    #[test]
    fn test_export_renders_every_transcript_entry() {
        let pool = get_test_db();
        let conn = pool.lock().unwrap();

        let mut session = DbService::insert_session(&conn, "alice", LearningLevel::Beginner).unwrap();
        session.document_names.push("notes.pdf".to_string());
        session.transcript.push(TranscriptEntry::assistant("Here's a summary."));
        session.transcript.push(TranscriptEntry::user("What is recursion?"));
        session.transcript.push(TranscriptEntry::assistant("What do you think happens first?"));
        session.transcript.push(TranscriptEntry::user("The base case?"));
        DbService::save_session(&conn, &session).unwrap();

        let reloaded = DbService::get_session(&conn, "alice", session.id).unwrap().unwrap();
        let text = reloaded.export_text();

        assert!(text.contains(&format!("Session: {}", reloaded.display_name())));
        assert!(text.contains(&format!("ID: {}", reloaded.id)));
        for entry in &reloaded.transcript {
            let line = format!("[{}]: {}", entry.role.to_uppercase(), entry.content);
            assert!(text.contains(&line), "missing export line: {}", line);
        }
        // Header separator plus one after each entry
        assert_eq!(text.matches("---\n").count(), reloaded.transcript.len() + 1);
    }

    #[test]
    fn test_get_unknown_session() {
        let pool = get_test_db();
        let conn = pool.lock().unwrap();

        assert!(DbService::get_session(&conn, "alice", Uuid::new_v4()).unwrap().is_none());
    }
}
