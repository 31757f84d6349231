//! Test utilities for integration tests
use std::sync::{Arc, RwLock};
use std::time::Duration;

use anyhow::{Error, Result};
use async_trait::async_trait;
use axum::{Router, body::Body};

use askme::ai::ResponseProvider;
use askme::api::AppState;
use askme::api::app;
use askme::core::AppConfig;

/// Latency of every reply from `FixedProvider`
pub const REPLY_DELAY: Duration = Duration::from_millis(1500);

/// Idle timeout for sessions in the test app
pub const SESSION_IDLE: Duration = Duration::from_secs(600);

/// Always replies with the same text after `REPLY_DELAY`.
pub struct FixedProvider;

#[async_trait]
impl ResponseProvider for FixedProvider {
    async fn get_response(&self) -> Result<String, Error> {
        tokio::time::sleep(REPLY_DELAY).await;
        Ok(String::from("I'm powered by hopes and dreams"))
    }

    fn get_follow_up_questions(&self) -> [String; 2] {
        [
            String::from("What are some examples?"),
            String::from("What are some examples?"),
        ]
    }
}

/// Creates shared state backed by `FixedProvider`.
pub fn test_state() -> Arc<RwLock<AppState>> {
    let app_config = AppConfig {
        host: String::from("127.0.0.1"),
        port: String::from("2222"),
        title: String::from("Ask me"),
        seed: None,
        session_idle_secs: SESSION_IDLE.as_secs(),
    };
    Arc::new(RwLock::new(AppState::new(app_config, Arc::new(FixedProvider))))
}

/// Creates a test application router backed by `FixedProvider`.
pub fn test_app() -> Router {
    app(test_state())
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
