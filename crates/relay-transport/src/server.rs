//! WebSocket relay server using Axum.
//!
//! Handles the HTTP upgrade to WebSocket, spawns one lifecycle task per
//! accepted connection, and exposes a JSON health route. The accept loop
//! never blocks on any single connection.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::{State, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
};
use relay_core::{ClientRegistry, Dispatcher};
use serde_json::json;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::connection::handle_connection;

/// Relay server configuration. Read once at startup, immutable thereafter.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on (0 for OS-assigned)
    pub port: u16,
    /// Hostname to bind to
    pub hostname: String,
    /// Maximum concurrent connections
    pub max_connections: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            hostname: "0.0.0.0".into(),
            max_connections: Some(1024),
        }
    }
}

/// Shared state for the transport routes.
struct AppState {
    registry: Arc<ClientRegistry>,
    dispatcher: Arc<Dispatcher>,
    config: ServerConfig,
    /// Flipped on shutdown; every read loop watches it.
    shutdown: watch::Receiver<bool>,
}

/// How long `stop` waits for open connections to finish cleanup.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// The relay server — accepts connections and runs them to completion.
pub struct RelayServer {
    registry: Arc<ClientRegistry>,
    shutdown_tx: Option<watch::Sender<bool>>,
    handle: Option<tokio::task::JoinHandle<()>>,
    port: u16,
}

impl RelayServer {
    /// Start the server with a fresh registry.
    pub async fn start(config: ServerConfig) -> Result<Self, Box<dyn std::error::Error>> {
        Self::start_with_registry(config, Arc::new(ClientRegistry::new())).await
    }

    /// Start the server with an injected registry shared with the caller.
    pub async fn start_with_registry(
        config: ServerConfig,
        registry: Arc<ClientRegistry>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let dispatcher = Arc::new(Dispatcher::new(registry.clone()));

        let state = Arc::new(AppState {
            registry: registry.clone(),
            dispatcher,
            config: config.clone(),
            shutdown: shutdown_rx.clone(),
        });

        let app = Router::new()
            .route("/ws", get(ws_upgrade_handler))
            .route("/health", get(health_handler))
            .with_state(state);

        let addr: SocketAddr = format!("{}:{}", config.hostname, config.port).parse()?;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let actual_port = listener.local_addr()?.port();

        info!("relay listening on ws://{}:{}/ws", config.hostname, actual_port);

        let mut serve_shutdown = shutdown_rx;
        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = serve_shutdown.changed().await;
                })
                .await
                .ok();
        });

        Ok(Self {
            registry,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
            port: actual_port,
        })
    }

    /// The actual bound port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The registry backing this server.
    pub fn registry(&self) -> Arc<ClientRegistry> {
        self.registry.clone()
    }

    /// Gracefully stop: stop accepting, wake every read loop, and wait for
    /// in-flight cleanup under a bounded grace period. Repeated calls are
    /// safe no-ops once stopped.
    pub async fn stop(&mut self) {
        let Some(tx) = self.shutdown_tx.take() else {
            return;
        };
        let _ = tx.send(true);

        if let Some(handle) = self.handle.take() {
            if tokio::time::timeout(SHUTDOWN_GRACE, handle).await.is_err() {
                warn!("shutdown grace period expired with connections still open");
            }
        }
        info!("relay server stopped");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HTTP Handlers
// ─────────────────────────────────────────────────────────────────────────────

async fn ws_upgrade_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    if let Some(max) = state.config.max_connections {
        if state.registry.size() >= max {
            warn!("connection rejected: max connections reached ({max})");
            return StatusCode::SERVICE_UNAVAILABLE.into_response();
        }
    }

    let registry = state.registry.clone();
    let dispatcher = state.dispatcher.clone();
    let shutdown = state.shutdown.clone();
    ws.on_upgrade(move |socket| handle_connection(socket, registry, dispatcher, shutdown))
        .into_response()
}

async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "clients": state.registry.size(),
        "timestamp": chrono::Utc::now(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
