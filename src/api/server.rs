use std::sync::{Arc, RwLock};
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::routes;
use crate::api::state::AppState;
use crate::core::{AppConfig, provider};

pub fn app(shared_state: Arc<RwLock<AppState>>) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .nest("/api", routes::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::clone(&shared_state))
}

/// Periodically close sessions that clients abandoned without
/// deleting them.
pub fn spawn_idle_sweep(shared_state: Arc<RwLock<AppState>>, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            match shared_state.write() {
                Ok(mut state) => {
                    let evicted = state.evict_idle();
                    if evicted > 0 {
                        tracing::debug!("Evicted {} idle chat sessions", evicted);
                    }
                }
                Err(_) => {
                    tracing::error!("Unable to write shared state, stopping idle sweep");
                    break;
                }
            }
        }
    });
}

// Run the server
pub async fn serve(config: AppConfig) -> Result<()> {
    let app_state = AppState::new(config.clone(), provider(&config));
    let shared_state = Arc::new(RwLock::new(app_state));
    let app = app(Arc::clone(&shared_state));

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.host, config.port))?;

    tracing::debug!("Server started. Listening on {}", listener.local_addr()?);

    // Run the idle sweep in its own tokio task
    spawn_idle_sweep(Arc::clone(&shared_state), Duration::from_secs(60));

    axum::serve(listener, app).await?;
    Ok(())
}
