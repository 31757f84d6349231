use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use anyhow::{Error, Result};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::models::{Message, Transcript};
use crate::ai::provider::SharedProvider;
use crate::ai::timer::{Cancelled, cancellable};

struct SessionState {
    transcript: Transcript,
    waiting: bool,
    last_active: Instant,
}

impl SessionState {
    fn new() -> Self {
        Self {
            transcript: Transcript::new(),
            waiting: false,
            last_active: Instant::now(),
        }
    }
}

// Sessions never hold the lock across an await so a poisoned lock can
// only come from a panic inside a push, which leaves the state intact.
fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Clears the waiting flag when a turn finishes, however it finishes.
struct WaitingGuard(Weak<Mutex<SessionState>>);

impl Drop for WaitingGuard {
    fn drop(&mut self) {
        if let Some(state) = self.0.upgrade() {
            let mut state = lock(&state);
            state.waiting = false;
            state.last_active = Instant::now();
        }
    }
}

/// How a turn ended.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// The AI reply that was appended to the transcript
    Answered(Message),
    /// The provider failed; the error was logged and the turn dropped
    Failed,
    /// The session was closed or discarded before the reply could be
    /// appended
    Cancelled,
}

/// Why a turn was not started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendRejected {
    Blank,
    Closed,
    Waiting,
}

impl fmt::Display for SendRejected {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SendRejected::Blank => write!(f, "Message must not be empty"),
            SendRejected::Closed => write!(f, "Chat session is closed"),
            SendRejected::Waiting => write!(f, "Still waiting for the previous response"),
        }
    }
}

impl std::error::Error for SendRejected {}

/// Handle to a turn whose AI reply is still outstanding.
pub struct PendingTurn {
    handle: JoinHandle<TurnOutcome>,
}

impl PendingTurn {
    /// Wait for the turn to settle. By the time this returns the
    /// session's waiting flag has been released.
    pub async fn settled(self) -> Result<TurnOutcome, Error> {
        Ok(self.handle.await?)
    }
}

/// One open chat panel: a transcript, a waiting flag and the provider
/// that answers it.
///
/// `send` appends the user's message immediately and answers it in a
/// background task. It does not serialize turns: two overlapping sends
/// both get answered, in whatever order their responses arrive, and the
/// first one to settle clears the waiting flag. Callers that must not
/// overlap turns use `try_send`, which checks the flag and appends under
/// the same lock.
///
/// Closing or dropping the session cancels any outstanding turns.
pub struct ChatSession {
    id: String,
    title: String,
    provider: SharedProvider,
    state: Arc<Mutex<SessionState>>,
    cancel: CancellationToken,
}

impl ChatSession {
    pub fn new(title: &str, provider: SharedProvider) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            provider,
            state: Arc::new(Mutex::new(SessionState::new())),
            cancel: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_waiting(&self) -> bool {
        lock(&self.state).waiting
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Time since the session was opened, last sent to, or last
    /// received a reply.
    pub fn idle_for(&self) -> Duration {
        lock(&self.state).last_active.elapsed()
    }

    pub fn messages(&self) -> Vec<Message> {
        lock(&self.state).transcript.messages()
    }

    pub fn len(&self) -> usize {
        lock(&self.state).transcript.len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.state).transcript.is_empty()
    }

    pub fn last_ai_message(&self) -> Option<Message> {
        lock(&self.state).transcript.last_ai_message().cloned()
    }

    /// Start a new turn with `text` from the user.
    ///
    /// Returns `None` without touching the transcript if `text` is blank
    /// or the session has been closed. Must be called from within a
    /// tokio runtime.
    pub fn send(&self, text: &str) -> Option<PendingTurn> {
        self.start_turn(text, false).ok()
    }

    /// Like `send`, but also refuses while a reply is outstanding.
    pub fn try_send(&self, text: &str) -> Result<PendingTurn, SendRejected> {
        self.start_turn(text, true)
    }

    /// Send one of the follow-up questions offered by an AI message.
    pub fn select_follow_up(&self, question: &str) -> Option<PendingTurn> {
        self.send(question)
    }

    pub fn try_select_follow_up(&self, question: &str) -> Result<PendingTurn, SendRejected> {
        self.try_send(question)
    }

    fn start_turn(&self, text: &str, gated: bool) -> Result<PendingTurn, SendRejected> {
        if text.trim().is_empty() {
            tracing::debug!("Ignoring blank message for session {}", self.id);
            return Err(SendRejected::Blank);
        }
        if self.is_closed() {
            tracing::debug!("Ignoring message for closed session {}", self.id);
            return Err(SendRejected::Closed);
        }

        {
            let mut state = lock(&self.state);
            if gated && state.waiting {
                return Err(SendRejected::Waiting);
            }
            state.transcript.push(Message::user(text));
            state.waiting = true;
            state.last_active = Instant::now();
        }

        let weak_state = Arc::downgrade(&self.state);
        let provider = Arc::clone(&self.provider);
        let token = self.cancel.child_token();
        let session_id = self.id.clone();

        let handle = tokio::spawn(async move {
            let _waiting = WaitingGuard(weak_state.clone());

            match cancellable(&token, provider.get_response()).await {
                Ok(Ok(response)) => {
                    let follow_ups = provider.get_follow_up_questions();
                    let msg = Message::ai(&response, follow_ups);
                    // Dropping the session cancels the token, so this only
                    // misses when the drop lands right after the reply
                    match weak_state.upgrade() {
                        Some(state) => {
                            lock(&state).transcript.push(msg.clone());
                            TurnOutcome::Answered(msg)
                        }
                        None => {
                            tracing::debug!(
                                "Dropping response for discarded session {}",
                                session_id
                            );
                            TurnOutcome::Cancelled
                        }
                    }
                }
                Ok(Err(e)) => {
                    tracing::error!("Error getting response for session {}: {}", session_id, e);
                    TurnOutcome::Failed
                }
                Err(Cancelled) => {
                    tracing::debug!("Pending response cancelled for session {}", session_id);
                    TurnOutcome::Cancelled
                }
            }
        });

        Ok(PendingTurn { handle })
    }

    /// Cancel outstanding turns and refuse further sends.
    pub fn close(&self) {
        if !self.is_closed() {
            tracing::debug!("Closing chat session {}", self.id);
        }
        self.cancel.cancel();
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::time::Duration;

    use anyhow::anyhow;
    use async_trait::async_trait;

    use crate::ai::mock::{CANNED_RESPONSES, FOLLOW_UP_QUESTIONS, MockResponseProvider};
    use crate::ai::provider::ResponseProvider;

    /// Answers with a scripted sequence of (delay, response) pairs.
    struct ScriptedProvider {
        script: std::sync::Mutex<VecDeque<(Duration, Result<String, String>)>>,
    }

    impl ScriptedProvider {
        fn new(script: Vec<(u64, Result<&str, &str>)>) -> SharedProvider {
            let script = script
                .into_iter()
                .map(|(ms, r)| {
                    (
                        Duration::from_millis(ms),
                        r.map(String::from).map_err(String::from),
                    )
                })
                .collect();
            Arc::new(Self {
                script: std::sync::Mutex::new(script),
            })
        }
    }

    #[async_trait]
    impl ResponseProvider for ScriptedProvider {
        async fn get_response(&self) -> Result<String, Error> {
            let (delay, result) = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .expect("Script ran out of responses");
            tokio::time::sleep(delay).await;
            result.map_err(|e| anyhow!(e))
        }

        fn get_follow_up_questions(&self) -> [String; 2] {
            [
                String::from("What are some examples?"),
                String::from("How can I learn more?"),
            ]
        }
    }

    fn mock_session() -> ChatSession {
        ChatSession::new("Ask me", Arc::new(MockResponseProvider::with_seed(9)))
    }

    #[tokio::test(start_paused = true)]
    async fn it_answers_a_message() {
        let session = mock_session();

        let pending = session.send("hi").unwrap();
        assert!(session.is_waiting());
        assert_eq!(session.len(), 1);

        let outcome = pending.settled().await.unwrap();
        assert!(matches!(outcome, TurnOutcome::Answered(_)));
        assert!(!session.is_waiting());

        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].is_user());
        assert_eq!(messages[0].text(), "hi");
        assert!(!messages[1].is_user());
        assert!(CANNED_RESPONSES.contains(&messages[1].text()));

        let questions = messages[1].follow_up_questions().unwrap();
        assert_eq!(questions.len(), 2);
        for q in questions.iter() {
            assert!(FOLLOW_UP_QUESTIONS.contains(&q.as_str()));
        }
        assert_ne!(messages[0].id(), messages[1].id());
    }

    #[tokio::test]
    async fn it_ignores_blank_messages() {
        let session = mock_session();

        assert!(session.send("").is_none());
        assert!(session.send("   ").is_none());
        assert!(session.send("\n\t").is_none());

        assert!(session.is_empty());
        assert!(!session.is_waiting());
    }

    #[tokio::test(start_paused = true)]
    async fn it_alternates_user_and_ai_messages() {
        let session = mock_session();
        let turns = 5;

        for i in 0..turns {
            let pending = session.send(&format!("message {}", i)).unwrap();
            pending.settled().await.unwrap();
        }

        let messages = session.messages();
        assert_eq!(messages.len(), turns * 2);
        for (i, msg) in messages.iter().enumerate() {
            assert_eq!(msg.is_user(), i % 2 == 0);
            if !msg.is_user() {
                assert_eq!(msg.follow_up_questions().unwrap().len(), 2);
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn it_sends_a_selected_follow_up() {
        let session = mock_session();
        session.send("hi").unwrap().settled().await.unwrap();

        let question = "What are some examples?";
        let pending = session.select_follow_up(question).unwrap();
        assert!(session.is_waiting());
        pending.settled().await.unwrap();

        let messages = session.messages();
        assert_eq!(messages.len(), 4);
        assert!(messages[2].is_user());
        assert_eq!(messages[2].text(), question);
        assert!(!messages[3].is_user());
    }

    #[tokio::test(start_paused = true)]
    async fn it_appends_overlapping_replies_in_resolution_order() {
        let provider = ScriptedProvider::new(vec![(2500, Ok("slow")), (1200, Ok("fast"))]);
        let session = ChatSession::new("Ask me", provider);

        let first = session.send("first").unwrap();
        let second = session.send("second").unwrap();
        assert_eq!(session.len(), 2);

        let outcome = second.settled().await.unwrap();
        assert!(matches!(outcome, TurnOutcome::Answered(ref m) if m.text() == "fast"));
        // The first turn to settle releases the flag even though
        // another is still outstanding
        assert!(!session.is_waiting());

        first.settled().await.unwrap();
        let texts: Vec<String> = session
            .messages()
            .iter()
            .map(|m| m.text().to_string())
            .collect();
        assert_eq!(texts, vec!["first", "second", "fast", "slow"]);
    }

    #[tokio::test(start_paused = true)]
    async fn it_drops_the_turn_when_the_provider_fails() {
        let provider = ScriptedProvider::new(vec![(1000, Err("boom")), (1000, Ok("recovered"))]);
        let session = ChatSession::new("Ask me", provider);

        let outcome = session.send("hi").unwrap().settled().await.unwrap();
        assert_eq!(outcome, TurnOutcome::Failed);
        assert!(!session.is_waiting());
        assert_eq!(session.len(), 1);

        // Input is available again after a failed turn
        session.send("again").unwrap().settled().await.unwrap();
        let messages = session.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2].text(), "recovered");
    }

    #[tokio::test(start_paused = true)]
    async fn it_cancels_pending_turns_on_close() {
        let provider = ScriptedProvider::new(vec![(3000, Ok("too late"))]);
        let session = ChatSession::new("Ask me", provider);

        let pending = session.send("hi").unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        session.close();

        assert_eq!(pending.settled().await.unwrap(), TurnOutcome::Cancelled);
        assert!(!session.is_waiting());
        assert_eq!(session.len(), 1);
        assert!(session.send("anyone there?").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn it_survives_the_session_being_dropped() {
        let provider = ScriptedProvider::new(vec![(2000, Ok("orphan"))]);
        let session = ChatSession::new("Ask me", provider);

        let pending = session.send("hi").unwrap();
        drop(session);

        let outcome = pending.settled().await.unwrap();
        assert_eq!(outcome, TurnOutcome::Cancelled);
    }

    #[tokio::test]
    async fn it_gives_each_session_its_own_transcript() {
        let provider = ScriptedProvider::new(vec![(10, Ok("one"))]);
        let a = ChatSession::new("Ask me", Arc::clone(&provider));
        let b = ChatSession::new("Ask me", provider);

        a.send("hello").unwrap().settled().await.unwrap();

        assert_eq!(a.len(), 2);
        assert!(b.is_empty());
        assert_ne!(a.id(), b.id());
    }

    #[tokio::test(start_paused = true)]
    async fn it_refuses_gated_sends_while_waiting() {
        let provider = ScriptedProvider::new(vec![(1500, Ok("one")), (1500, Ok("two"))]);
        let session = ChatSession::new("Ask me", provider);

        assert_eq!(session.try_send("  ").err(), Some(SendRejected::Blank));

        let pending = session.try_send("first").unwrap();
        assert_eq!(session.try_send("second").err(), Some(SendRejected::Waiting));
        assert_eq!(
            session.try_select_follow_up("What are some examples?").err(),
            Some(SendRejected::Waiting)
        );
        assert_eq!(session.len(), 1);

        pending.settled().await.unwrap();
        session
            .try_select_follow_up("What are some examples?")
            .unwrap()
            .settled()
            .await
            .unwrap();
        assert_eq!(session.len(), 4);

        session.close();
        assert_eq!(session.try_send("hi").err(), Some(SendRejected::Closed));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn it_lets_one_concurrent_gated_send_through() {
        let script = (0..32).map(|_| (50, Ok("reply"))).collect();
        let session = Arc::new(ChatSession::new("Ask me", ScriptedProvider::new(script)));
        let barrier = Arc::new(tokio::sync::Barrier::new(32));

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let session = Arc::clone(&session);
                let barrier = Arc::clone(&barrier);
                tokio::spawn(async move {
                    barrier.wait().await;
                    session.try_send(&format!("message {}", i)).ok()
                })
            })
            .collect();

        let mut accepted = Vec::new();
        for handle in handles {
            if let Some(pending) = handle.await.unwrap() {
                accepted.push(pending);
            }
        }
        assert_eq!(accepted.len(), 1);
        assert_eq!(session.len(), 1);

        for pending in accepted {
            pending.settled().await.unwrap();
        }
        assert_eq!(session.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn it_tracks_idle_time() {
        let provider = ScriptedProvider::new(vec![(2000, Ok("reply"))]);
        let session = ChatSession::new("Ask me", provider);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(session.idle_for(), Duration::from_secs(60));

        // A reply counts as activity
        session.send("hi").unwrap().settled().await.unwrap();
        assert_eq!(session.idle_for(), Duration::ZERO);
    }
}
