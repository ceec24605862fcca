//! HTTP handlers for the monitor API.

use std::convert::Infallible;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures_util::stream::StreamExt;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::store::{Session, SessionEvent, SharedStore};

/// Default capacity for the event broadcast channel.
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Session store read by the query handlers.
    pub store: SharedStore,
    /// Broadcast channel fanning store events out to SSE clients.
    pub events: broadcast::Sender<SessionEvent>,
}

impl AppState {
    /// Create app state over a store, with a fresh event channel.
    #[must_use]
    pub fn new(store: SharedStore) -> Self {
        let (events, _) = broadcast::channel(DEFAULT_EVENT_CHANNEL_CAPACITY);
        Self { store, events }
    }

    /// Create app state and register the store-to-broadcast forwarder.
    ///
    /// A failed broadcast send only means no client is subscribed at that
    /// moment; such events are dropped, never buffered.
    pub async fn connected(store: SharedStore) -> Self {
        let state = Self::new(store);
        let events = state.events.clone();
        state.store.write().await.subscribe(move |event| {
            let _ = events.send(event.clone());
            Ok(())
        });
        state
    }
}

/// Body of the health endpoint.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Fixed liveness marker.
    pub status: &'static str,
    /// Number of tracked sessions.
    pub sessions: usize,
    /// Whether any SSE client is connected.
    pub connected: bool,
}

/// GET /api/health - Liveness and a coarse store summary.
pub async fn get_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let sessions = state.store.read().await.len();
    let connected = state.events.receiver_count() > 0;

    Json(HealthResponse {
        status: "ok",
        sessions,
        connected,
    })
}

/// GET /api/sessions - All sessions, most recently active first.
pub async fn get_sessions(State(state): State<AppState>) -> Json<Vec<Session>> {
    Json(state.store.read().await.list_all())
}

/// GET /api/sessions/active - Active sessions only.
pub async fn get_active_sessions(State(state): State<AppState>) -> Json<Vec<Session>> {
    Json(state.store.read().await.list_active())
}

/// GET /api/sessions/:id - One session by its id or agent id.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Session>, StatusCode> {
    state
        .store
        .read()
        .await
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// GET /api/events - SSE stream of session change events.
pub async fn get_events_sse(
    State(state): State<AppState>,
) -> Sse<impl futures_core::Stream<Item = Result<Event, Infallible>>> {
    let rx = state.events.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(event) => {
                let data = serde_json::to_string(&event).ok()?;
                Some(Ok(Event::default().event(event.kind()).data(data)))
            }
            Err(_) => None, // Skip lagged messages
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
