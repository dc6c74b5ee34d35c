//! HTTP surface: a health check and the WebSocket upgrade route.

use super::manager::ConnectionManager;
use axum::{
    Router,
    extract::{ConnectInfo, State, WebSocketUpgrade},
    response::{Json, Response},
    routing::get,
};
use serde_json::{Value, json};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, ToSocketAddrs};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Path clients upgrade on.
pub const WEBSOCKET_PATH: &str = "/ws";

/// Liveness check answered with `{"status":"ok"}`.
pub const HEALTH_PATH: &str = "/health";

#[derive(Clone)]
struct AppState {
    manager: Arc<ConnectionManager>,
    shutdown: CancellationToken,
}

pub struct Server {
    listener: TcpListener,
    manager: Arc<ConnectionManager>,
}

impl Server {
    pub async fn bind(
        addr: impl ToSocketAddrs,
        manager: Arc<ConnectionManager>,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, manager })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until `shutdown` is cancelled.
    ///
    /// Open WebSocket connections receive a close frame when shutdown fires.
    pub async fn run(self, shutdown: CancellationToken) -> io::Result<()> {
        info!("Listening on ws://{}{}", self.local_addr()?, WEBSOCKET_PATH);

        let app = router(self.manager, shutdown.clone())
            .into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(self.listener, app)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                info!("Shutting down listener");
            })
            .await
    }
}

/// Unknown paths fall through to axum's 404.
fn router(manager: Arc<ConnectionManager>, shutdown: CancellationToken) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health))
        .route(WEBSOCKET_PATH, get(upgrade))
        .with_state(AppState { manager, shutdown })
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

async fn upgrade(
    ws: WebSocketUpgrade,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| async move {
        let shutdown = state.shutdown.child_token();
        state.manager.serve(socket, peer, shutdown).await;
    })
}
