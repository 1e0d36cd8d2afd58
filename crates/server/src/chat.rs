//! JSON chat API.
//!
//! - `POST /api/sessions`                 open a chat session
//! - `POST /api/sessions/{id}/messages`   send one visitor message

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use chrono::{Duration, Utc};
use folio_agent::{
    AnswerSource, ChatRuntime, ChatSession, NotificationSink, RenderedMessage, Transcript,
    TurnOutcome,
};
use folio_core::errors::{ApplicationError, InterfaceError};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

type SessionMap = HashMap<String, Arc<Mutex<ChatSession>>>;

pub struct ChatState<A, N> {
    runtime: Arc<ChatRuntime<A, N>>,
    sessions: Arc<Mutex<SessionMap>>,
    idle_after: Duration,
    max_sessions: usize,
}

impl<A, N> Clone for ChatState<A, N> {
    fn clone(&self) -> Self {
        Self {
            runtime: Arc::clone(&self.runtime),
            sessions: Arc::clone(&self.sessions),
            idle_after: self.idle_after,
            max_sessions: self.max_sessions,
        }
    }
}

impl<A, N> ChatState<A, N> {
    pub fn new(runtime: Arc<ChatRuntime<A, N>>, session_idle_secs: u64, max_sessions: usize) -> Self {
        let idle_after = i64::try_from(session_idle_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX);
        Self {
            runtime,
            sessions: Arc::new(Mutex::new(HashMap::new())),
            idle_after,
            max_sessions,
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

#[derive(Debug, Serialize)]
pub struct SessionCreated {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub correlation_id: String,
    pub messages: Vec<RenderedMessage>,
    pub outcome: TurnOutcome,
    pub lead_delivered: bool,
}

#[derive(Debug, Serialize)]
pub struct ChatError {
    pub error: String,
    pub correlation_id: String,
}

impl From<InterfaceError> for ChatError {
    fn from(value: InterfaceError) -> Self {
        Self { error: value.user_message().to_string(), correlation_id: value.correlation_id().to_string() }
    }
}

type ChatFailure = (StatusCode, Json<ChatError>);

fn failure(status: StatusCode, error: ApplicationError, correlation_id: String) -> ChatFailure {
    (status, Json(ChatError::from(error.into_interface(correlation_id))))
}

pub fn router<A, N>(state: ChatState<A, N>) -> Router
where
    A: AnswerSource + 'static,
    N: NotificationSink + 'static,
{
    Router::new()
        .route("/api/sessions", post(create_session::<A, N>))
        .route("/api/sessions/{id}/messages", post(post_message::<A, N>))
        .with_state(state)
}

/// Opens a session. Sessions idle past the configured window are evicted
/// first; a session whose lock is held is still in use and is kept. When
/// the store is still full after eviction the request is refused with 503.
pub async fn create_session<A, N>(
    State(state): State<ChatState<A, N>>,
) -> Result<Json<SessionCreated>, ChatFailure>
where
    A: AnswerSource + 'static,
    N: NotificationSink + 'static,
{
    let now = Utc::now();
    let cutoff = now.checked_sub_signed(state.idle_after);
    let chat = ChatSession::start(now);
    let session_id = chat.id().to_string();

    let mut sessions = state.sessions.lock().await;
    let before = sessions.len();
    if let Some(cutoff) = cutoff {
        sessions.retain(|_, session| match session.try_lock() {
            Ok(chat) => !chat.is_idle_since(cutoff),
            Err(_) => true,
        });
    }
    let evicted = before - sessions.len();
    if sessions.len() >= state.max_sessions {
        let active = sessions.len();
        drop(sessions);
        let correlation_id = Uuid::new_v4().to_string();
        warn!(
            event_name = "http.session.rejected",
            correlation_id = %correlation_id,
            evicted,
            active,
            max_sessions = state.max_sessions,
            "session store is full"
        );
        return Err(failure(
            StatusCode::SERVICE_UNAVAILABLE,
            ApplicationError::SessionLimit(state.max_sessions),
            correlation_id,
        ));
    }
    sessions.insert(session_id.clone(), Arc::new(Mutex::new(chat)));
    let active = sessions.len();
    drop(sessions);

    info!(
        event_name = "http.session.created",
        session_id = %session_id,
        evicted,
        active,
        "chat session opened"
    );
    Ok(Json(SessionCreated { session_id }))
}

pub async fn post_message<A, N>(
    Path(id): Path<String>,
    State(state): State<ChatState<A, N>>,
    payload: Result<Json<MessageRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ChatFailure>
where
    A: AnswerSource + 'static,
    N: NotificationSink + 'static,
{
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let correlation_id = Uuid::new_v4().to_string();
            warn!(
                event_name = "http.message.invalid",
                session_id = %id,
                correlation_id = %correlation_id,
                error = %rejection.body_text(),
                "message body rejected"
            );
            return Err(failure(
                StatusCode::BAD_REQUEST,
                ApplicationError::InvalidRequest(rejection.body_text()),
                correlation_id,
            ));
        }
    };

    let session = state.sessions.lock().await.get(&id).cloned();
    let Some(session) = session else {
        let correlation_id = Uuid::new_v4().to_string();
        warn!(
            event_name = "http.session.not_found",
            session_id = %id,
            correlation_id = %correlation_id,
            "message posted to unknown session"
        );
        return Err(failure(StatusCode::NOT_FOUND, ApplicationError::SessionNotFound(id), correlation_id));
    };

    // Held for the whole turn so messages in one session are handled in order.
    let mut chat = session.lock().await;
    let mut transcript = Transcript::default();
    let report = state.runtime.handle_message(&mut chat, &request.message, &mut transcript).await;

    Ok(Json(MessageResponse {
        correlation_id: report.correlation_id,
        messages: transcript.into_messages(),
        outcome: report.outcome,
        lead_delivered: report.lead_delivered,
    }))
}
