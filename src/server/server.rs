//! Monitor HTTP server with axum router and graceful shutdown.

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::error::ServerError;
use super::handlers::{
    get_active_sessions, get_events_sse, get_health, get_session, get_sessions, AppState,
};

/// Default port for the monitor server.
pub const DEFAULT_PORT: u16 = 3000;

/// Configuration for the monitor server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on.
    pub port: u16,
    /// Host address to bind to.
    pub host: String,
    /// Whether to enable permissive CORS.
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            host: "127.0.0.1".to_string(),
            cors_permissive: true,
        }
    }
}

/// HTTP and SSE front end over the session store.
pub struct MonitorServer {
    /// Server configuration.
    config: ServerConfig,
    /// Application state shared across handlers.
    state: AppState,
    /// Token observed for graceful shutdown.
    shutdown: CancellationToken,
}

impl MonitorServer {
    /// Create a new monitor server with default configuration.
    #[must_use]
    pub fn new(state: AppState, shutdown: CancellationToken) -> Self {
        Self {
            config: ServerConfig::default(),
            state,
            shutdown,
        }
    }

    /// Set the server configuration (builder pattern).
    #[must_use]
    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the configured address as a string.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Build the axum router with all routes and middleware.
    pub fn build_router(&self) -> Router {
        let router = Router::new()
            .route("/api/health", get(get_health))
            .route("/api/sessions", get(get_sessions))
            .route("/api/sessions/active", get(get_active_sessions))
            .route("/api/sessions/:id", get(get_session))
            .route("/api/events", get(get_events_sse))
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http());

        if self.config.cors_permissive {
            router.layer(CorsLayer::permissive())
        } else {
            router
        }
    }

    /// Run the server, binding to the configured address.
    ///
    /// The server runs until the shutdown token is triggered, at which
    /// point it performs a graceful shutdown.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind or serve.
    pub async fn run(self) -> Result<(), ServerError> {
        let address = self.address();
        let cancel = self.shutdown.clone();
        let app = self.build_router();

        tracing::info!(%address, "Starting monitor server");

        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| ServerError::Bind {
                address: address.clone(),
                source,
            })?;

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                cancel.cancelled().await;
                tracing::info!("Monitor server shutting down gracefully");
            })
            .await
            .map_err(ServerError::Serve)
    }
}
