//! Axum HTTP/WebSocket server: `/ws`, `/health` and `/metrics`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::ws::{WebSocketUpgrade, rejection::WebSocketUpgradeRejection};
use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use metrics::counter;
use metrics_exporter_prometheus::PrometheusHandle;
use roster_auth::AuthGate;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::health::{self, HealthResponse};
use crate::metrics::{self as server_metrics, WS_HANDSHAKE_REJECTIONS_TOTAL};
use crate::shutdown::ShutdownCoordinator;
use crate::websocket::connection::run_session;
use crate::websocket::hub::BroadcastHub;
use crate::websocket::registry::SessionRegistry;
use crate::websocket::session::Session;

/// Shared state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Broadcast hub over the live session registry.
    pub hub: BroadcastHub,
    /// Handshake authentication.
    pub gate: AuthGate,
    /// Listener and per-session limits.
    pub config: Arc<ServerConfig>,
    /// Server start time, for uptime.
    pub start_time: Instant,
    /// Prometheus handle, when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

/// The attendance broadcast server.
pub struct RosterServer {
    config: Arc<ServerConfig>,
    gate: AuthGate,
    hub: BroadcastHub,
    shutdown: Arc<ShutdownCoordinator>,
    start_time: Instant,
    metrics: Option<PrometheusHandle>,
}

impl RosterServer {
    /// Create a server with an empty session registry.
    pub fn new(config: ServerConfig, gate: AuthGate, metrics: Option<PrometheusHandle>) -> Self {
        Self {
            config: Arc::new(config),
            gate,
            hub: BroadcastHub::new(Arc::new(SessionRegistry::new())),
            shutdown: Arc::new(ShutdownCoordinator::new()),
            start_time: Instant::now(),
            metrics,
        }
    }

    /// Build the axum router.
    pub fn router(&self) -> Router {
        let state = AppState {
            hub: self.hub.clone(),
            gate: self.gate.clone(),
            config: Arc::clone(&self.config),
            start_time: self.start_time,
            metrics: self.metrics.clone(),
        };

        Router::new()
            .route("/ws", get(ws_handler))
            .route("/health", get(health_handler))
            .route("/metrics", get(metrics_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Bind `host:port` and serve until the shutdown token fires.
    ///
    /// Returns the bound address (useful with port `0`) and the serve task.
    pub async fn listen(&self) -> std::io::Result<(SocketAddr, JoinHandle<()>)> {
        let listener = TcpListener::bind((self.config.host.as_str(), self.config.port)).await?;
        let addr = listener.local_addr()?;
        let router = self.router();
        let token = self.shutdown.token();

        info!(%addr, "roster server listening");
        let handle = tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async move { token.cancelled().await })
                .await;
            if let Err(e) = result {
                error!(error = %e, "server error");
            }
        });
        Ok((addr, handle))
    }

    /// Producer-facing broadcast hub.
    pub fn hub(&self) -> &BroadcastHub {
        &self.hub
    }

    /// Live session registry.
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        self.hub.registry()
    }

    /// Shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// Server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// Authenticate the handshake, then upgrade.
///
/// The gate runs before the upgrade extractor is consulted, so a refused
/// handshake is always `401` and never creates a session.
async fn ws_handler(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let principal = match state.gate.admit(query.as_deref()).await {
        Ok(principal) => principal,
        Err(_) => {
            counter!(WS_HANDSHAKE_REJECTIONS_TOTAL).increment(1);
            return StatusCode::UNAUTHORIZED.into_response();
        }
    };
    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return rejection.into_response(),
    };

    let registry = Arc::clone(state.hub.registry());
    let send_queue = state.config.send_queue;
    ws.max_message_size(state.config.max_message_size)
        .on_upgrade(move |socket| async move {
            let (tx, rx) = mpsc::channel(send_queue);
            let session = Arc::new(Session::new(principal, tx));
            run_session(socket, session, rx, registry).await;
        })
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health::health_check(state.start_time, state.hub.registry().len()))
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => server_metrics::render(handle).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
