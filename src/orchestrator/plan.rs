//! Study-plan state machine.
//!
//! Topics move `pending -> in-progress -> completed`; the session keeps
//! a single cursor (`current_topic_index`) into the plan instead of
//! scanning for the active topic on every read. Transition
//! announcements are written straight into the transcript so it stays
//! self-describing even though the completion decision came from chat.

use crate::db::models::{Session, Topic, TopicStatus, TranscriptEntry};
use crate::reasoning::PlanTopic;

/// Replaces the plan wholesale. Every topic starts `pending`, then the
/// first (if any) is promoted and announced. Regeneration never merges
/// with a previous plan.
pub fn install_plan(session: &mut Session, topics: Vec<PlanTopic>) {
    session.study_plan = topics
        .into_iter()
        .map(|t| Topic {
            name: t.topic,
            description: t.description,
            status: TopicStatus::Pending,
        })
        .collect();
    session.current_topic_index = None;

    if let Some(first) = session.study_plan.first_mut() {
        first.status = TopicStatus::InProgress;
        let name = first.name.clone();
        session.current_topic_index = Some(0);
        session.transcript.push(TranscriptEntry::assistant(format!(
            "Your study plan is ready. Let's begin with the first topic: \"{}\".",
            name
        )));
    }
}

/// Automatic advance after a chat turn the reasoning service flagged
/// as completing the current topic. Only fires while the cursor topic
/// is actually `in-progress`: a stale signal (topic already completed)
/// or a topic someone manually reset does nothing.
pub fn advance_after_chat(session: &mut Session) {
    let Some(index) = session.current_topic_index else {
        return;
    };
    match session.study_plan.get(index) {
        Some(topic) if topic.status == TopicStatus::InProgress => {}
        _ => return,
    }
    complete_and_advance(session, index, false);
}

/// Manual status update at an index the caller already validated.
/// `completed` additionally promotes the next topic, but only out of
/// `pending` so a topic someone already touched is never overridden.
/// `in-progress` just moves the cursor; no other status cascades.
/// Returns false when the index does not resolve to a topic.
pub fn apply_status(session: &mut Session, index: usize, status: TopicStatus) -> bool {
    if index >= session.study_plan.len() {
        return false;
    }

    match status {
        TopicStatus::Completed => complete_and_advance(session, index, true),
        TopicStatus::InProgress => {
            session.study_plan[index].status = TopicStatus::InProgress;
            session.current_topic_index = Some(index);
        }
        other => session.study_plan[index].status = other,
    }
    true
}

fn complete_and_advance(session: &mut Session, index: usize, only_from_pending: bool) {
    session.study_plan[index].status = TopicStatus::Completed;
    let completed = session.study_plan[index].name.clone();
    let next = index + 1;

    match session.study_plan.get_mut(next) {
        Some(topic) if !only_from_pending || topic.status == TopicStatus::Pending => {
            topic.status = TopicStatus::InProgress;
            let name = topic.name.clone();
            session.current_topic_index = Some(next);
            session.transcript.push(TranscriptEntry::assistant(format!(
                "Great work! You've completed \"{}\". Moving on to the next topic: \"{}\".",
                completed, name
            )));
        }
        // Next topic was already picked up; leave it and the cursor alone.
        Some(_) => {}
        None => {
            session.transcript.push(TranscriptEntry::assistant(
                "Congratulations! You've worked through every topic in your study plan.",
            ));
        }
    }
}
