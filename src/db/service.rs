use crate::db::models::{LearningLevel, Session, SessionSummary};
use chrono::{DateTime, Utc};
use duckdb::{params, Connection, Result as DbResult, Row};
use serde::Serialize;
use uuid::Uuid;

// Timestamps are selected with CAST(... AS VARCHAR): without duckdb's
// chrono feature the driver hands back raw timestamp values that are
// awkward to extract, so we let the database render them as text.
const SESSION_COLUMNS: &str = "id, owner_id, document_fingerprints, document_names, transcript, \
     study_plan, current_topic_index, learning_level, \
     CAST(created_at AS VARCHAR), CAST(updated_at AS VARCHAR)";

pub struct DbService;

impl DbService {
    fn row_to_session(row: &Row) -> DbResult<Session> {
        let fingerprints: String = row.get(2)?;
        let names: String = row.get(3)?;
        let transcript: String = row.get(4)?;
        let study_plan: String = row.get(5)?;

        let created_str: String = row.get(8)?;
        let updated_str: String = row.get(9)?;
        let created_at = parse_timestamp(&created_str);
        let updated_at = parse_timestamp(&updated_str);

        Ok(Session {
            id: row.get::<_, String>(0)?.parse().unwrap_or_default(),
            owner_id: row.get(1)?,
            document_fingerprints: serde_json::from_str(&fingerprints).unwrap_or_default(),
            document_names: serde_json::from_str(&names).unwrap_or_default(),
            transcript: serde_json::from_str(&transcript).unwrap_or_default(),
            study_plan: serde_json::from_str(&study_plan).unwrap_or_default(),
            current_topic_index: row.get::<_, Option<i64>>(6)?.map(|i| i as usize),
            learning_level: row
                .get::<_, String>(7)?
                .parse()
                .unwrap_or_default(),
            created_at,
            updated_at,
        })
    }

    // --- Session Operations ---

    pub fn insert_session(
        conn: &Connection,
        owner_id: &str,
        level: LearningLevel,
    ) -> DbResult<Session> {
        let id = Uuid::new_v4();

        conn.execute(
            "INSERT INTO sessions (id, owner_id, learning_level) VALUES (?, ?, ?)",
            params![id.to_string(), owner_id, level.as_str()],
        )?;

        Self::get_session(conn, owner_id, id)?.ok_or(duckdb::Error::QueryReturnedNoRows)
    }

    pub fn get_session(conn: &Connection, owner_id: &str, id: Uuid) -> DbResult<Option<Session>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM sessions WHERE id = ? AND owner_id = ?",
            SESSION_COLUMNS
        ))?;
        let mut rows = stmt.query_map(params![id.to_string(), owner_id], Self::row_to_session)?;

        if let Some(row) = rows.next() {
            Ok(Some(row?))
        } else {
            Ok(None)
        }
    }

    pub fn list_sessions(conn: &Connection, owner_id: &str) -> DbResult<Vec<SessionSummary>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM sessions WHERE owner_id = ? ORDER BY updated_at DESC",
            SESSION_COLUMNS
        ))?;
        let rows = stmt.query_map(params![owner_id], Self::row_to_session)?;

        let mut summaries = Vec::new();
        for row in rows {
            let session = row?;
            summaries.push(SessionSummary {
                id: session.id,
                name: session.display_name(),
                created_at: session.created_at,
                updated_at: session.updated_at,
            });
        }
        Ok(summaries)
    }

    /// Full-document save: every mutable column is rewritten in one
    /// UPDATE so a concurrent reader never observes a partial write.
    pub fn save_session(conn: &Connection, session: &Session) -> DbResult<()> {
        conn.execute(
            "UPDATE sessions SET document_fingerprints = ?, document_names = ?, transcript = ?, \
             study_plan = ?, current_topic_index = ?, learning_level = ?, \
             updated_at = CURRENT_TIMESTAMP \
             WHERE id = ? AND owner_id = ?",
            params![
                to_json(&session.document_fingerprints),
                to_json(&session.document_names),
                to_json(&session.transcript),
                to_json(&session.study_plan),
                session.current_topic_index.map(|i| i as i64),
                session.learning_level.as_str(),
                session.id.to_string(),
                session.owner_id,
            ],
        )?;
        Ok(())
    }

    /// Idempotent: deleting an absent (or another owner's) session is
    /// not an error.
    pub fn delete_session(conn: &Connection, owner_id: &str, id: Uuid) -> DbResult<()> {
        conn.execute(
            "DELETE FROM sessions WHERE id = ? AND owner_id = ?",
            params![id.to_string(), owner_id],
        )?;
        Ok(())
    }
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
                .map(|naive| naive.and_utc())
        })
        .unwrap_or_else(|_| Utc::now())
}

fn to_json<T: Serialize>(value: &T) -> String {
    // Plain structs of strings and enums; serialization cannot fail in
    // practice, and an empty array is the harmless fallback if it did.
    serde_json::to_string(value).unwrap_or_else(|_| "[]".to_string())
}
