//! HTTP and SSE transport over the session store.
//!
//! A read-only surface: every route queries the shared store or streams
//! its change events. Nothing here mutates session state.

mod error;
mod handlers;
mod server;

pub use error::ServerError;
pub use handlers::{
    get_active_sessions, get_events_sse, get_health, get_session, get_sessions, AppState,
    HealthResponse, DEFAULT_EVENT_CHANNEL_CAPACITY,
};
pub use server::{MonitorServer, ServerConfig, DEFAULT_PORT};
