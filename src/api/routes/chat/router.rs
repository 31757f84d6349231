//! Router for the chat API

use std::sync::{Arc, RwLock};

use anyhow::anyhow;
use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use super::public;
use crate::ai::chat::{ChatSession, SendRejected};
use crate::api::public::ApiError;
use crate::api::state::AppState;

type SharedState = Arc<RwLock<AppState>>;

fn find_session(state: &SharedState, id: &str) -> Result<Option<Arc<ChatSession>>, ApiError> {
    let state = state
        .read()
        .map_err(|_| anyhow!("Unable to read shared state"))?;
    Ok(state.find_session(id))
}

fn not_found(id: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        format!("Chat session {} not found", id),
    )
        .into_response()
}

/// Start a turn the way the panel footer does: blank input and sending
/// while a reply is outstanding are both refused.
fn start_turn(session: &ChatSession, text: &str, follow_up: bool) -> Response {
    let text = text.trim();
    // The flag check and the append happen under one lock so concurrent
    // requests can't both start a turn
    let started = if follow_up {
        session.try_select_follow_up(text)
    } else {
        session.try_send(text)
    };

    // The turn runs in the background, clients poll the session
    // for the reply
    match started {
        Ok(_pending) => (
            StatusCode::ACCEPTED,
            axum::Json(public::SessionResponse::from(session)),
        )
            .into_response(),
        Err(e @ SendRejected::Blank) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
        Err(e) => (StatusCode::CONFLICT, e.to_string()).into_response(),
    }
}

/// Open a new chat session
async fn open_session(State(state): State<SharedState>) -> Result<Response, ApiError> {
    let session = state
        .write()
        .map_err(|_| anyhow!("Unable to write shared state"))?
        .open_session();
    tracing::info!("Opened chat session {}", session.id());

    Ok((
        StatusCode::CREATED,
        axum::Json(public::SessionOpenedResponse {
            session_id: session.id().to_string(),
            title: session.title().to_string(),
        }),
    )
        .into_response())
}

/// Get the transcript and waiting state of a session
async fn get_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let Some(session) = find_session(&state, &id)? else {
        return Ok(not_found(&id));
    };
    Ok(axum::Json(public::SessionResponse::from(session.as_ref())).into_response())
}

/// Send a message typed by the user
async fn send_message(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    axum::Json(payload): axum::Json<public::ChatRequest>,
) -> Result<Response, ApiError> {
    let Some(session) = find_session(&state, &id)? else {
        return Ok(not_found(&id));
    };
    Ok(start_turn(&session, &payload.message, false))
}

/// Send one of the follow-up questions offered by the AI
async fn select_follow_up(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    axum::Json(payload): axum::Json<public::FollowUpRequest>,
) -> Result<Response, ApiError> {
    let Some(session) = find_session(&state, &id)? else {
        return Ok(not_found(&id));
    };
    Ok(start_turn(&session, &payload.question, true))
}

/// Close a session, discarding its transcript and any pending reply
async fn close_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let closed = state
        .write()
        .map_err(|_| anyhow!("Unable to write shared state"))?
        .close_session(&id);

    if !closed {
        return Ok(not_found(&id));
    }
    tracing::info!("Closed chat session {}", id);
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// Create the chat router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/sessions", post(open_session))
        .route("/sessions/{id}", get(get_session).delete(close_session))
        .route("/sessions/{id}/messages", post(send_message))
        .route("/sessions/{id}/follow_up", post(select_follow_up))
}
