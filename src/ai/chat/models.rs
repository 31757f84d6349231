//! The core models for a chat session with the mock AI.
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// A single chat bubble. Messages are never modified after creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    id: String,
    text: String,
    is_user: bool,
    timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    follow_up_questions: Option<[String; 2]>,
}

impl Message {
    /// A message authored by the user, stamped with the current time.
    pub fn user(text: &str) -> Self {
        Self::user_at(text, Utc::now().timestamp_millis())
    }

    pub fn user_at(text: &str, now_ms: i64) -> Self {
        Self {
            id: now_ms.to_string(),
            text: text.to_string(),
            is_user: true,
            timestamp: now_ms,
            follow_up_questions: None,
        }
    }

    /// A reply from the AI carrying its follow-up questions.
    pub fn ai(text: &str, follow_up_questions: [String; 2]) -> Self {
        Self::ai_at(text, follow_up_questions, Utc::now().timestamp_millis())
    }

    /// The id is offset by one from the timestamp so it can't collide
    /// with a user message created in the same millisecond.
    pub fn ai_at(text: &str, follow_up_questions: [String; 2], now_ms: i64) -> Self {
        Self {
            id: (now_ms + 1).to_string(),
            text: text.to_string(),
            is_user: false,
            timestamp: now_ms,
            follow_up_questions: Some(follow_up_questions),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_user(&self) -> bool {
        self.is_user
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Always `Some` for AI messages and `None` for user messages.
    pub fn follow_up_questions(&self) -> Option<&[String; 2]> {
        self.follow_up_questions.as_ref()
    }
}

/// Append-only, chronologically ordered list of messages.
#[derive(Default, Debug, Clone)]
pub struct Transcript(Vec<Message>);

impl Transcript {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn messages(&self) -> Vec<Message> {
        self.0.clone()
    }

    pub fn push(&mut self, msg: Message) {
        self.0.push(msg)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The most recent AI reply, if any.
    pub fn last_ai_message(&self) -> Option<&Message> {
        self.0.iter().rev().find(|m| !m.is_user())
    }
}
