//! Public types for the chat API
use serde::{Deserialize, Serialize};

use crate::ai::chat::{ChatSession, Message};

#[derive(Serialize, Deserialize)]
pub struct SessionOpenedResponse {
    pub session_id: String,
    pub title: String,
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Deserialize)]
pub struct FollowUpRequest {
    pub question: String,
}

/// Everything needed to render an open chat panel: the header title,
/// the transcript and whether to show the loading indicator.
#[derive(Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub title: String,
    pub waiting: bool,
    pub transcript: Vec<Message>,
}

impl From<&ChatSession> for SessionResponse {
    fn from(session: &ChatSession) -> Self {
        Self {
            session_id: session.id().to_string(),
            title: session.title().to_string(),
            waiting: session.is_waiting(),
            transcript: session.messages(),
        }
    }
}
