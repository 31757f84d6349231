use std::sync::Arc;

use anyhow::{Error, Result};
use async_trait::async_trait;

/// Source of AI replies for a chat session.
///
/// `get_response` is the only suspension point of a turn. Follow-up
/// questions are drawn separately so the two can be swapped or
/// scripted independently.
#[async_trait]
pub trait ResponseProvider {
    async fn get_response(&self) -> Result<String, Error>;
    fn get_follow_up_questions(&self) -> [String; 2];
}

pub type SharedProvider = Arc<dyn ResponseProvider + Send + Sync + 'static>;
